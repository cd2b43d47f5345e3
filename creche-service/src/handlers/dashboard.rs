use crate::dtos::directory::ReconciliationResponse;
use crate::dtos::reports::ChartParams;
use crate::dtos::ApiResponse;
use crate::middleware::TenantContext;
use crate::startup::AppState;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use service_core::error::AppError;

pub async fn stats(
    State(state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let stats = state.reporting.dashboard_stats(&tenant, Utc::now()).await?;

    Ok(Json(ApiResponse::ok(stats)))
}

pub async fn alerts(
    State(state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let alerts = state.reporting.alerts(&tenant, Utc::now()).await?;

    Ok(Json(ApiResponse::list(alerts)))
}

pub async fn charts(
    State(state): State<AppState>,
    tenant: TenantContext,
    Query(params): Query<ChartParams>,
) -> Result<impl IntoResponse, AppError> {
    let charts = state
        .reporting
        .dashboard_charts(&tenant, params.days, Utc::now())
        .await?;

    Ok(Json(ApiResponse::ok(charts)))
}

/// Dual-ledger writes that need manual follow-up.
pub async fn reconciliations(
    State(state): State<AppState>,
    tenant: TenantContext,
) -> Result<impl IntoResponse, AppError> {
    let markers = state.ledger.list_reconciliations(&tenant.creche_id).await?;

    Ok(Json(ApiResponse::list(
        markers.into_iter().map(ReconciliationResponse::from).collect(),
    )))
}
