use crate::dtos::invoices::{
    CreateInvoiceRequest, InvoiceListParams, InvoiceResponse, ValidateInvoiceRequest,
};
use crate::dtos::ApiResponse;
use crate::middleware::TenantContext;
use crate::models::PaymentMethod;
use crate::services::store::InvoiceFilter;
use crate::startup::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use validator::Validate;

pub async fn create_invoice(
    State(state): State<AppState>,
    tenant: TenantContext,
    Json(req): Json<CreateInvoiceRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let invoice = state
        .billing
        .create_invoice(&tenant, req.into_request()?)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(InvoiceResponse::from(invoice)).with_message("Invoice issued")),
    ))
}

pub async fn list_invoices(
    State(state): State<AppState>,
    tenant: TenantContext,
    Query(params): Query<InvoiceListParams>,
) -> Result<impl IntoResponse, AppError> {
    let filter = InvoiceFilter::from(params);
    let invoices = state.billing.list_invoices(&tenant, &filter).await?;

    Ok(Json(ApiResponse::list(
        invoices.into_iter().map(InvoiceResponse::from).collect(),
    )))
}

pub async fn get_invoice(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(invoice_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let invoice = state.billing.get_invoice(&tenant, &invoice_id).await?;

    Ok(Json(ApiResponse::ok(InvoiceResponse::from(invoice))))
}

pub async fn validate_invoice(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(invoice_id): Path<String>,
    body: Option<Json<ValidateInvoiceRequest>>,
) -> Result<impl IntoResponse, AppError> {
    // The body is optional; without one the invoice is settled in cash.
    let Json(req) = body.unwrap_or_default();
    let method = req.payment_method.unwrap_or(PaymentMethod::Cash);
    let invoice = state
        .billing
        .validate_invoice(&tenant, &invoice_id, method)
        .await?;

    Ok(Json(
        ApiResponse::ok(InvoiceResponse::from(invoice)).with_message("Invoice validated"),
    ))
}

pub async fn cancel_invoice(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(invoice_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let invoice = state.billing.cancel_invoice(&tenant, &invoice_id).await?;

    Ok(Json(
        ApiResponse::ok(InvoiceResponse::from(invoice)).with_message("Invoice cancelled"),
    ))
}

/// Streams back the stored receipt of a validated invoice.
pub async fn download_receipt(
    State(state): State<AppState>,
    tenant: TenantContext,
    Path(invoice_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let invoice = state.billing.get_invoice(&tenant, &invoice_id).await?;
    let receipt_ref = invoice.receipt_ref.ok_or_else(|| {
        AppError::NotFound(anyhow::anyhow!("invoice {} has no receipt", invoice_id))
    })?;
    let body = state.storage.download(&receipt_ref).await?;
    let filename = receipt_ref.rsplit('/').next().unwrap_or("receipt.txt").to_string();

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    ))
}
