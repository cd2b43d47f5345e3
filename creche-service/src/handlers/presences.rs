use crate::dtos::directory::{CreatePresenceRequest, PresenceListParams, PresenceResponse};
use crate::dtos::ApiResponse;
use crate::middleware::TenantContext;
use crate::models::{Presence, PresenceKind};
use crate::startup::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use service_core::error::AppError;
use validator::Validate;

pub async fn record_presence(
    State(state): State<AppState>,
    tenant: TenantContext,
    Json(req): Json<CreatePresenceRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let known = match req.kind {
        PresenceKind::Child => state
            .directory
            .get_child(&tenant.creche_id, &req.subject_id)
            .await?
            .is_some(),
        PresenceKind::Staff => state
            .directory
            .get_staff(&tenant.creche_id, &req.subject_id)
            .await?
            .is_some(),
    };
    if !known {
        return Err(AppError::NotFound(anyhow::anyhow!(
            "{} {} not found",
            req.kind.as_str().to_lowercase(),
            req.subject_id
        )));
    }

    let presence = Presence::new(
        tenant.creche_id.clone(),
        req.kind,
        req.subject_id,
        req.date,
        req.status,
        req.notes,
        tenant.user_id.clone(),
    );
    state.directory.insert_presence(&presence).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(PresenceResponse::from(presence)).with_message("Presence recorded")),
    ))
}

pub async fn list_presences(
    State(state): State<AppState>,
    tenant: TenantContext,
    Query(params): Query<PresenceListParams>,
) -> Result<impl IntoResponse, AppError> {
    let filter = params.into_filter(Utc::now().date_naive())?;
    let presences = state
        .directory
        .list_presences(&tenant.creche_id, &filter)
        .await?;

    Ok(Json(ApiResponse::list(
        presences.into_iter().map(PresenceResponse::from).collect(),
    )))
}
