//! Terraform output extraction.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{IacError, IacResult};

/// Output holding the primary node address.
pub const PRIMARY_OUTPUT: &str = "primary_instance_ip";

/// List-shaped output holding every replica address.
pub const REPLICA_LIST_OUTPUT: &str = "replica_instance_ips";

/// One entry of `terraform output -json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputValue {
    pub value: serde_json::Value,
    #[serde(rename = "type", default)]
    pub output_type: serde_json::Value,
    #[serde(default)]
    pub sensitive: bool,
}

/// All outputs of a workspace, keyed by output name.
pub type TerraformOutputs = BTreeMap<String, OutputValue>;

/// Parse the stdout of `terraform output -json`.
pub fn parse_outputs(stdout: &str) -> IacResult<TerraformOutputs> {
    // An empty state prints nothing at all on some terraform versions
    if stdout.trim().is_empty() {
        return Ok(TerraformOutputs::new());
    }
    serde_json::from_str(stdout).map_err(|source| IacError::OutputParse {
        context: "terraform output -json".to_string(),
        source,
    })
}

/// Addresses of the provisioned database nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeAddresses {
    pub primary: String,
    pub replicas: Vec<String>,
}

impl NodeAddresses {
    /// Extract node addresses from terraform outputs.
    ///
    /// Replicas come from the `replica_instance_ips` list when present,
    /// otherwise from numbered `replica_<n>_instance_ip` outputs in order of n.
    pub fn from_outputs(outputs: &TerraformOutputs) -> IacResult<Self> {
        let primary = outputs
            .get(PRIMARY_OUTPUT)
            .ok_or_else(|| IacError::MissingOutput(PRIMARY_OUTPUT.to_string()))
            .and_then(|o| string_value(PRIMARY_OUTPUT, &o.value))?;

        let replicas = match outputs.get(REPLICA_LIST_OUTPUT) {
            Some(list) => {
                let items = list.value.as_array().ok_or_else(|| IacError::InvalidOutput {
                    name: REPLICA_LIST_OUTPUT.to_string(),
                    message: "expected a list of addresses".to_string(),
                })?;
                items
                    .iter()
                    .map(|v| string_value(REPLICA_LIST_OUTPUT, v))
                    .collect::<IacResult<Vec<_>>>()?
            }
            None => numbered_replicas(outputs)?,
        };

        Ok(Self { primary, replicas })
    }

    /// Every address, primary first.
    pub fn all(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.primary.as_str()).chain(self.replicas.iter().map(String::as_str))
    }
}

fn numbered_replicas(outputs: &TerraformOutputs) -> IacResult<Vec<String>> {
    let mut numbered: Vec<(u32, String)> = Vec::new();
    for (name, output) in outputs {
        let index = name
            .strip_prefix("replica_")
            .and_then(|rest| rest.strip_suffix("_instance_ip"))
            .and_then(|n| n.parse::<u32>().ok());
        if let Some(index) = index {
            numbered.push((index, string_value(name, &output.value)?));
        }
    }
    numbered.sort_by_key(|(index, _)| *index);
    Ok(numbered.into_iter().map(|(_, ip)| ip).collect())
}

fn string_value(name: &str, value: &serde_json::Value) -> IacResult<String> {
    match value.as_str() {
        Some(s) if !s.trim().is_empty() => Ok(s.to_string()),
        _ => Err(IacError::InvalidOutput {
            name: name.to_string(),
            message: format!("expected a non-empty address, got {}", value),
        }),
    }
}
