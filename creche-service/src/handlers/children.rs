use crate::dtos::directory::{
    ChildListParams, ChildResponse, CreateChildRequest, EnrollmentResponse,
};
use crate::dtos::ApiResponse;
use crate::middleware::TenantContext;
use crate::startup::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use validator::Validate;

/// Enrols the child and records the registration charge in one call.
pub async fn enroll_child(
    State(state): State<AppState>,
    tenant: TenantContext,
    Json(req): Json<CreateChildRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let enrollment = state.billing.enroll_child(&tenant, req.into()).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(EnrollmentResponse::from(enrollment)).with_message("Child enrolled")),
    ))
}

pub async fn list_children(
    State(state): State<AppState>,
    tenant: TenantContext,
    Query(params): Query<ChildListParams>,
) -> Result<impl IntoResponse, AppError> {
    let children = state
        .directory
        .list_children(&tenant.creche_id, params.status)
        .await?;

    Ok(Json(ApiResponse::list(
        children.into_iter().map(ChildResponse::from).collect(),
    )))
}

pub async fn get_child(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(child_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let child = state
        .directory
        .get_child(&tenant.creche_id, &child_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("child {} not found", child_id)))?;

    Ok(Json(ApiResponse::ok(ChildResponse::from(child))))
}
