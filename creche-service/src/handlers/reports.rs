use crate::dtos::reports::{ChildReportResponse, DayParams, StaffReportResponse};
use crate::dtos::{ApiResponse, DateRangeParams};
use crate::middleware::TenantContext;
use crate::startup::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use service_core::error::AppError;

pub async fn financial_report(
    State(state): State<AppState>,
    tenant: TenantContext,
    Query(params): Query<DateRangeParams>,
) -> Result<impl IntoResponse, AppError> {
    let range = params.resolve(Utc::now().date_naive())?;
    let report = state.reporting.financial_report(&tenant, range).await?;

    Ok(Json(ApiResponse::ok(report)))
}

pub async fn daily_balance(
    State(state): State<AppState>,
    tenant: TenantContext,
    Query(params): Query<DayParams>,
) -> Result<impl IntoResponse, AppError> {
    let day = params.date.unwrap_or_else(|| Utc::now().date_naive());
    let balance = state.reporting.daily_balance(&tenant, day).await?;

    Ok(Json(ApiResponse::ok(balance)))
}

pub async fn category_breakdown(
    State(state): State<AppState>,
    tenant: TenantContext,
    Query(params): Query<DateRangeParams>,
) -> Result<impl IntoResponse, AppError> {
    let range = params.resolve(Utc::now().date_naive())?;
    let totals = state.reporting.category_breakdown(&tenant, &range).await?;

    Ok(Json(ApiResponse::list(totals)))
}

pub async fn children_report(
    State(state): State<AppState>,
    tenant: TenantContext,
    Query(params): Query<DateRangeParams>,
) -> Result<impl IntoResponse, AppError> {
    let range = params.resolve(Utc::now().date_naive())?;
    let reports = state.reporting.children_report(&tenant, &range).await?;

    Ok(Json(ApiResponse::list(
        reports.into_iter().map(ChildReportResponse::from).collect(),
    )))
}

pub async fn child_report(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(child_id): Path<String>,
    Query(params): Query<DateRangeParams>,
) -> Result<impl IntoResponse, AppError> {
    let range = params.resolve(Utc::now().date_naive())?;
    let report = state
        .reporting
        .child_report(&tenant, &child_id, &range)
        .await?;

    Ok(Json(ApiResponse::ok(ChildReportResponse::from(report))))
}

pub async fn staff_report(
    State(state): State<AppState>,
    tenant: TenantContext,
    Query(params): Query<DateRangeParams>,
) -> Result<impl IntoResponse, AppError> {
    let range = params.resolve(Utc::now().date_naive())?;
    let reports = state.reporting.staff_report(&tenant, &range).await?;

    Ok(Json(ApiResponse::list(
        reports.into_iter().map(StaffReportResponse::from).collect(),
    )))
}
