//! # gantry_spec
//!
//! The structured input Gantry provisions from.
//!
//! A [`ProvisioningRequest`] describes a PostgreSQL primary with streaming
//! replicas: instance sizing, replica count, region, network placement,
//! database tuning and replication credentials. Requests are validated in
//! full before any artifact is rendered.
//!
//! ## Example
//!
//! ```rust,no_run
//! use gantry_spec::{ProvisioningRequest, RequestValidator};
//! use std::path::Path;
//!
//! let request = ProvisioningRequest::from_file(Path::new("request.yaml")).unwrap();
//! let warnings = RequestValidator::new().ensure_valid(&request).unwrap();
//! for warning in warnings {
//!     eprintln!("warning: {}", warning);
//! }
//! ```

pub mod error;
pub mod models;
pub mod validator;

pub use error::{SpecError, SpecResult};
pub use models::{ProvisioningRequest, Secret, DEFAULT_REGION, MIN_SECRET_LEN};
pub use validator::{RequestValidator, ValidationResult};
