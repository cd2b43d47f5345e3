use crate::dtos::directory::{CreateStaffRequest, SalaryRequest, StaffListParams, StaffResponse};
use crate::dtos::payments::PaymentResponse;
use crate::dtos::ApiResponse;
use crate::middleware::TenantContext;
use crate::models::Staff;
use crate::startup::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use tracing::info;
use validator::Validate;

pub async fn create_staff(
    State(state): State<AppState>,
    tenant: TenantContext,
    Json(req): Json<CreateStaffRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let staff = Staff::new(tenant.creche_id.clone(), req.into());
    state.directory.insert_staff(&staff).await?;
    info!(staff_id = %staff.id, creche_id = %tenant.creche_id, "Staff member added");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(StaffResponse::from(staff)).with_message("Staff member added")),
    ))
}

pub async fn list_staff(
    State(state): State<AppState>,
    tenant: TenantContext,
    Query(params): Query<StaffListParams>,
) -> Result<impl IntoResponse, AppError> {
    let staff = state
        .directory
        .list_staff(&tenant.creche_id, params.status)
        .await?;

    Ok(Json(ApiResponse::list(
        staff.into_iter().map(StaffResponse::from).collect(),
    )))
}

pub async fn get_staff(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(staff_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let staff = state
        .directory
        .get_staff(&tenant.creche_id, &staff_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!("staff member {} not found", staff_id))
        })?;

    Ok(Json(ApiResponse::ok(StaffResponse::from(staff))))
}

pub async fn pay_salary(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(staff_id): Path<String>,
    Json(req): Json<SalaryRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let payment = state
        .billing
        .pay_staff_salary(&tenant, &staff_id, req.into_payment()?)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(PaymentResponse::from(payment)).with_message("Salary paid")),
    ))
}

pub async fn salary_history(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(staff_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let payments = state.billing.salary_history(&tenant, &staff_id).await?;

    Ok(Json(ApiResponse::list(
        payments.into_iter().map(PaymentResponse::from).collect(),
    )))
}
