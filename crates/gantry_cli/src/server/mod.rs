//! HTTP boundary for the approval-gated workflow.

use axum::routing::{get, post};
use axum::Router;

use gantry_core::ApplyController;

mod error;
mod routes;

/// Routes over a single workspace controller.
pub fn router(controller: ApplyController) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/generate-code", post(routes::generate_code))
        .route("/terraform-plan", post(routes::terraform_plan))
        .route("/terraform-approve", post(routes::terraform_approve))
        .route("/terraform-apply-status", get(routes::terraform_apply_status))
        .with_state(controller)
}
