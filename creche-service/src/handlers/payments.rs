use crate::dtos::payments::{
    ChargeResponse, CreatePaymentRequest, MonthlyChargeRequest, PaymentListParams,
    PaymentReceiptResponse, PaymentResponse, UpdatePaymentRequest, ValidatedPaymentResponse,
};
use crate::dtos::ApiResponse;
use crate::middleware::TenantContext;
use crate::models::{Child, Payment, Staff};
use crate::startup::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use service_core::error::AppError;
use std::collections::HashMap;
use validator::Validate;

/// Attaches child and staff display refs, loading each directory once.
async fn with_parties(
    state: &AppState,
    tenant: &TenantContext,
    payments: Vec<Payment>,
) -> Result<Vec<PaymentResponse>, AppError> {
    let children: HashMap<String, Child> = state
        .directory
        .list_children(&tenant.creche_id, None)
        .await?
        .into_iter()
        .map(|c| (c.id.clone(), c))
        .collect();
    let staff: HashMap<String, Staff> = state
        .directory
        .list_staff(&tenant.creche_id, None)
        .await?
        .into_iter()
        .map(|s| (s.id.clone(), s))
        .collect();

    Ok(payments
        .into_iter()
        .map(|payment| {
            let child = payment.child_id.as_deref().and_then(|id| children.get(id));
            let member = payment.staff_id.as_deref().and_then(|id| staff.get(id));
            PaymentResponse::resolved(payment, child, member)
        })
        .collect())
}

async fn with_party(
    state: &AppState,
    tenant: &TenantContext,
    payment: Payment,
) -> Result<PaymentResponse, AppError> {
    let child = match payment.child_id.as_deref() {
        Some(id) => state.directory.get_child(&tenant.creche_id, id).await?,
        None => None,
    };
    let staff = match payment.staff_id.as_deref() {
        Some(id) => state.directory.get_staff(&tenant.creche_id, id).await?,
        None => None,
    };
    Ok(PaymentResponse::resolved(
        payment,
        child.as_ref(),
        staff.as_ref(),
    ))
}

pub async fn create_payment(
    State(state): State<AppState>,
    tenant: TenantContext,
    Json(req): Json<CreatePaymentRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let payment = state
        .billing
        .create_payment(&tenant, req.into_request()?)
        .await?;
    let response = with_party(&state, &tenant, payment).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(response).with_message("Payment recorded")),
    ))
}

pub async fn list_payments(
    State(state): State<AppState>,
    tenant: TenantContext,
    Query(params): Query<PaymentListParams>,
) -> Result<impl IntoResponse, AppError> {
    let filter = params.into_filter(Utc::now().date_naive())?;
    let payments = state.billing.list_payments(&tenant, &filter).await?;
    let responses = with_parties(&state, &tenant, payments).await?;

    Ok(Json(ApiResponse::list(responses)))
}

pub async fn record_monthly_charge(
    State(state): State<AppState>,
    tenant: TenantContext,
    Json(req): Json<MonthlyChargeRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let receipt = state
        .billing
        .record_monthly_charge(&tenant, req.into_charge()?)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(ChargeResponse::from(receipt)).with_message("Monthly fee recorded")),
    ))
}

pub async fn list_child_payments(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(child_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let payments = state.billing.list_child_payments(&tenant, &child_id).await?;
    let responses = with_parties(&state, &tenant, payments).await?;

    Ok(Json(ApiResponse::list(responses)))
}

pub async fn get_payment(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(payment_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let payment = state.billing.get_payment(&tenant, &payment_id).await?;
    let response = with_party(&state, &tenant, payment).await?;

    Ok(Json(ApiResponse::ok(response)))
}

pub async fn update_payment(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(payment_id): Path<String>,
    Json(req): Json<UpdatePaymentRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let payment = state
        .billing
        .update_payment(&tenant, &payment_id, req.into_update()?)
        .await?;
    let response = with_party(&state, &tenant, payment).await?;

    Ok(Json(ApiResponse::ok(response).with_message("Payment updated")))
}

pub async fn delete_payment(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(payment_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let payment = state.billing.delete_payment(&tenant, &payment_id).await?;

    Ok(Json(
        ApiResponse::ok(PaymentResponse::from(payment)).with_message("Payment deleted"),
    ))
}

pub async fn validate_payment(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(payment_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let validated = state.billing.validate_payment(&tenant, &payment_id).await?;

    Ok(Json(
        ApiResponse::ok(ValidatedPaymentResponse::from(validated))
            .with_message("Payment validated"),
    ))
}

pub async fn cancel_payment(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(payment_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let payment = state.billing.cancel_payment(&tenant, &payment_id).await?;

    Ok(Json(
        ApiResponse::ok(PaymentResponse::from(payment)).with_message("Payment cancelled"),
    ))
}

pub async fn payment_receipt(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(payment_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let receipt = state.billing.payment_receipt(&tenant, &payment_id).await?;

    Ok(Json(ApiResponse::ok(PaymentReceiptResponse::from(receipt))))
}
