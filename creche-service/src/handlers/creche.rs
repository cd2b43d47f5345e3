use crate::dtos::directory::{CrecheResponse, UpdateCrecheRequest};
use crate::dtos::ApiResponse;
use crate::middleware::TenantContext;
use crate::startup::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use service_core::error::AppError;
use tracing::info;
use validator::Validate;

pub async fn get_settings(
    State(state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let creche = state
        .directory
        .get_creche(&tenant.creche_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!(
                "creche {} has no settings yet",
                tenant.creche_id
            ))
        })?;

    Ok(Json(ApiResponse::ok(CrecheResponse::from(creche))))
}

pub async fn update_settings(
    State(state): State<AppState>,
    tenant: TenantContext,
    Json(req): Json<UpdateCrecheRequest>,
) -> Result<impl IntoResponse, AppError> {
    if !tenant.role.can_manage_settings() {
        return Err(AppError::Forbidden(anyhow::anyhow!(
            "only administrators can change creche settings"
        )));
    }
    req.validate()?;

    let creche = req.into_creche(tenant.creche_id.clone());
    state.directory.save_creche(&creche).await?;
    info!(
        creche_id = %creche.id,
        max_capacity = creche.max_capacity,
        "Creche settings saved"
    );

    Ok(Json(
        ApiResponse::ok(CrecheResponse::from(creche)).with_message("Settings saved"),
    ))
}
