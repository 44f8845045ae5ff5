//! Placeholder substitution.

use std::collections::{BTreeMap, BTreeSet};

use regex::Regex;

use crate::error::{TemplateError, TemplateResult};

/// Renders `{{name}}` placeholders from a variable map.
///
/// Rendering is strict: a placeholder without a value is an error rather
/// than being left in the output, since half-rendered Terraform still
/// parses and would be planned.
pub struct TemplateRenderer {
    variable_pattern: Regex,
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer {
    /// Create a new template renderer.
    pub fn new() -> Self {
        Self {
            // Match {{variable_name}}, tolerating inner whitespace
            variable_pattern: Regex::new(r"\{\{\s*([a-zA-Z_][a-zA-Z0-9_]*)\s*\}\}").unwrap(),
        }
    }

    /// Names of all placeholders in `content`.
    pub fn placeholders(&self, content: &str) -> BTreeSet<String> {
        self.variable_pattern
            .captures_iter(content)
            .map(|caps| caps[1].to_string())
            .collect()
    }

    /// Render content, failing if any placeholder has no value.
    pub fn render(
        &self,
        template_name: &str,
        content: &str,
        variables: &BTreeMap<String, String>,
    ) -> TemplateResult<String> {
        let missing: Vec<String> = self
            .placeholders(content)
            .into_iter()
            .filter(|name| !variables.contains_key(name))
            .collect();

        if !missing.is_empty() {
            return Err(TemplateError::MissingVariable {
                template: template_name.to_string(),
                variables: missing,
            });
        }

        Ok(self
            .variable_pattern
            .replace_all(content, |caps: &regex::Captures| {
                variables.get(&caps[1]).cloned().unwrap_or_default()
            })
            .into_owned())
    }
}
