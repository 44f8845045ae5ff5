//! # gantry_templates
//!
//! Renders the Terraform and Ansible artifacts for a provisioning request.
//!
//! Templates live under a template root:
//!
//! - `terraform/main.tf.tmpl`, `variables.tf.tmpl`, `outputs.tf.tmpl`
//! - `ansible/vars.yml.tmpl` (rendered) and `ansible/playbook.yml` (copied)
//!
//! Placeholders use `{{name}}` and every placeholder must resolve.
//!
//! ## Example
//!
//! ```rust,no_run
//! use gantry_spec::{ProvisioningRequest, Secret};
//! use gantry_templates::{ArtifactGenerator, ArtifactTargets, TemplateGenerator};
//! use std::path::Path;
//!
//! let request = ProvisioningRequest::from_file(Path::new("request.yaml")).unwrap();
//! let generator = TemplateGenerator::new("templates");
//! let targets = ArtifactTargets::new("workspace/terraform", "workspace/ansible");
//!
//! let password = Secret::new("from-the-environment");
//! let artifacts = generator.generate(&request, &password, &targets).unwrap();
//! println!("wrote {} files", artifacts.files.len());
//! ```

pub mod error;
pub mod generator;
pub mod renderer;

pub use error::{TemplateError, TemplateResult};
pub use generator::{
    ArtifactGenerator, ArtifactTargets, GeneratedArtifacts, TemplateGenerator, ANSIBLE_STATIC,
    ANSIBLE_TEMPLATES, TERRAFORM_TEMPLATES,
};
pub use renderer::TemplateRenderer;
