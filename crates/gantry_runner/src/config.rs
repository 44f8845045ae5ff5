//! Tool invocation configuration types.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// A single external tool invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCommand {
    /// Program to execute (resolved through PATH)
    pub program: String,
    /// Arguments passed to the program
    pub args: Vec<String>,
    /// Working directory for the process
    pub workdir: Option<PathBuf>,
    /// Extra environment variables
    pub env: BTreeMap<String, String>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            workdir: None,
            env: BTreeMap::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn workdir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Render the command line for logging.
    pub fn display(&self) -> String {
        let mut cmd = self.program.clone();
        for arg in &self.args {
            if arg.contains(' ') || arg.contains('=') {
                cmd.push_str(&format!(" '{}'", arg));
            } else {
                cmd.push_str(&format!(" {}", arg));
            }
        }
        cmd
    }
}

/// Run configuration with timeouts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Timeout in seconds (0 = no timeout)
    pub timeout_seconds: u64,
    /// Whether to echo output lines to the log as they arrive
    pub stream_logs: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 1800, // 30 minutes
            stream_logs: false,
        }
    }
}

impl RunConfig {
    pub fn timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    pub fn no_timeout(mut self) -> Self {
        self.timeout_seconds = 0;
        self
    }

    pub fn stream_logs(mut self, enabled: bool) -> Self {
        self.stream_logs = enabled;
        self
    }
}

/// Programs the provisioning pipeline shells out to.
pub struct CommonTools;

impl CommonTools {
    pub const TERRAFORM: &'static str = "terraform";
    pub const ANSIBLE_PLAYBOOK: &'static str = "ansible-playbook";

    /// Terraform invocation rooted at a workspace directory.
    pub fn terraform(workdir: impl Into<PathBuf>) -> ToolCommand {
        ToolCommand::new(Self::TERRAFORM)
            .workdir(workdir)
            .env("TF_IN_AUTOMATION", "1")
    }

    /// Ansible playbook invocation with host key checking disabled.
    pub fn ansible_playbook(workdir: impl Into<PathBuf>) -> ToolCommand {
        ToolCommand::new(Self::ANSIBLE_PLAYBOOK)
            .workdir(workdir)
            .env("ANSIBLE_HOST_KEY_CHECKING", "False")
            .env("ANSIBLE_SSH_ARGS", "-o StrictHostKeyChecking=no")
    }
}
