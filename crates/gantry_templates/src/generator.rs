//! Artifact generation for the Terraform and Ansible layers.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use gantry_spec::{ProvisioningRequest, Secret};

use crate::error::{TemplateError, TemplateResult};
use crate::renderer::TemplateRenderer;

/// Templates rendered into the Terraform workspace, as (template, output).
pub const TERRAFORM_TEMPLATES: &[(&str, &str)] = &[
    ("main.tf.tmpl", "main.tf"),
    ("variables.tf.tmpl", "variables.tf"),
    ("outputs.tf.tmpl", "outputs.tf"),
];

/// Templates rendered into the Ansible directory.
pub const ANSIBLE_TEMPLATES: &[(&str, &str)] = &[("vars.yml.tmpl", "vars.yml")];

/// Ansible files copied without substitution. The playbook carries its own
/// Jinja expressions, which must reach ansible untouched.
pub const ANSIBLE_STATIC: &[&str] = &["playbook.yml"];

/// Where rendered artifacts go.
#[derive(Debug, Clone, Serialize)]
pub struct ArtifactTargets {
    pub terraform_dir: PathBuf,
    pub ansible_dir: PathBuf,
}

impl ArtifactTargets {
    pub fn new(terraform_dir: impl Into<PathBuf>, ansible_dir: impl Into<PathBuf>) -> Self {
        Self {
            terraform_dir: terraform_dir.into(),
            ansible_dir: ansible_dir.into(),
        }
    }
}

/// Files written by a generation run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GeneratedArtifacts {
    pub files: Vec<PathBuf>,
}

/// Produces on-disk infrastructure and configuration definitions.
///
/// Implementations must be pure with respect to their inputs: the same
/// request renders byte-identical files.
pub trait ArtifactGenerator: Send + Sync {
    fn generate(
        &self,
        request: &ProvisioningRequest,
        replication_password: &Secret,
        targets: &ArtifactTargets,
    ) -> TemplateResult<GeneratedArtifacts>;
}

/// Renders artifacts from a template root laid out as
/// `terraform/*.tmpl` and `ansible/*`.
pub struct TemplateGenerator {
    template_root: PathBuf,
    renderer: TemplateRenderer,
}

struct PendingFile {
    path: PathBuf,
    content: Vec<u8>,
}

impl TemplateGenerator {
    pub fn new(template_root: impl Into<PathBuf>) -> Self {
        Self {
            template_root: template_root.into(),
            renderer: TemplateRenderer::new(),
        }
    }

    pub fn template_root(&self) -> &Path {
        &self.template_root
    }

    fn read_template(&self, layer: &str, name: &str) -> TemplateResult<String> {
        let path = self.template_root.join(layer).join(name);
        if !path.is_file() {
            return Err(TemplateError::NotFound(path));
        }
        Ok(fs::read_to_string(&path)?)
    }

    fn render_layer(
        &self,
        layer: &str,
        templates: &[(&str, &str)],
        target_dir: &Path,
        variables: &BTreeMap<String, String>,
        pending: &mut Vec<PendingFile>,
    ) -> TemplateResult<()> {
        for (template, output) in templates {
            let content = self.read_template(layer, template)?;
            let rendered = self
                .renderer
                .render(&format!("{}/{}", layer, template), &content, variables)?;
            pending.push(PendingFile {
                path: target_dir.join(output),
                content: rendered.into_bytes(),
            });
        }
        Ok(())
    }
}

impl ArtifactGenerator for TemplateGenerator {
    fn generate(
        &self,
        request: &ProvisioningRequest,
        replication_password: &Secret,
        targets: &ArtifactTargets,
    ) -> TemplateResult<GeneratedArtifacts> {
        info!(
            "Rendering artifacts from {:?} into {:?} and {:?}",
            self.template_root, targets.terraform_dir, targets.ansible_dir
        );

        let mut variables = request.variables();
        variables.insert(
            "replication_password".to_string(),
            replication_password.expose().to_string(),
        );

        // Render everything in memory first so a bad template leaves the
        // workspace as it was.
        let mut pending = Vec::new();
        self.render_layer(
            "terraform",
            TERRAFORM_TEMPLATES,
            &targets.terraform_dir,
            &variables,
            &mut pending,
        )?;
        self.render_layer(
            "ansible",
            ANSIBLE_TEMPLATES,
            &targets.ansible_dir,
            &variables,
            &mut pending,
        )?;
        for name in ANSIBLE_STATIC {
            let path = self.template_root.join("ansible").join(name);
            if !path.is_file() {
                return Err(TemplateError::NotFound(path));
            }
            pending.push(PendingFile {
                path: targets.ansible_dir.join(name),
                content: fs::read(&path)?,
            });
        }

        fs::create_dir_all(&targets.terraform_dir)?;
        fs::create_dir_all(&targets.ansible_dir)?;

        let mut artifacts = GeneratedArtifacts::default();
        for file in pending {
            fs::write(&file.path, &file.content).map_err(|source| TemplateError::Write {
                path: file.path.clone(),
                source,
            })?;
            debug!("Rendered: {:?}", file.path);
            artifacts.files.push(file.path);
        }

        info!("Rendered {} artifact files", artifacts.files.len());
        Ok(artifacts)
    }
}
