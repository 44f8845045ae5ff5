use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use gantry_core::{ApplyController, ApplyStatus, GenerateAck, PlanResult};
use gantry_spec::ProvisioningRequest;

use super::error::ApiError;

#[derive(Serialize)]
pub struct GenerateResponse {
    message: &'static str,
    #[serde(flatten)]
    ack: GenerateAck,
}

#[derive(Serialize)]
pub struct PlanResponse {
    message: &'static str,
    plan: Option<PlanResult>,
}

#[derive(Debug, Deserialize)]
pub struct ApprovalRequest {
    approved: bool,
}

#[derive(Serialize)]
pub struct ApprovalResponse {
    message: &'static str,
    approved: bool,
    apply_started: bool,
}

pub async fn health() -> &'static str {
    "ok"
}

pub async fn generate_code(
    State(controller): State<ApplyController>,
    Json(request): Json<ProvisioningRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let ack = controller.generate(request).await?;
    Ok(Json(GenerateResponse {
        message: "Code generated successfully",
        ack,
    }))
}

pub async fn terraform_plan(
    State(controller): State<ApplyController>,
) -> Result<Json<PlanResponse>, ApiError> {
    controller.request_plan().await?;
    Ok(Json(PlanResponse {
        message: "Terraform plan executed successfully. Awaiting approval.",
        plan: controller.current_plan(),
    }))
}

pub async fn terraform_approve(
    State(controller): State<ApplyController>,
    Json(body): Json<ApprovalRequest>,
) -> Json<ApprovalResponse> {
    let ack = controller.submit_approval(body.approved);
    Json(ApprovalResponse {
        message: ack.message(),
        approved: body.approved,
        apply_started: ack.handle().is_some(),
    })
}

pub async fn terraform_apply_status(
    State(controller): State<ApplyController>,
) -> Json<ApplyStatus> {
    Json(controller.query_status().await)
}
