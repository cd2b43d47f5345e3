use crate::models::{Invoice, InvoiceStatus, InvoiceType, PaymentMethod, Period};
use crate::services::billing::InvoiceRequest;
use crate::services::store::InvoiceFilter;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateInvoiceRequest {
    #[validate(length(min = 1, message = "Child is required"))]
    pub child_id: String,

    #[validate(range(min = 1, max = 12, message = "Month must be between 1 and 12"))]
    pub month: i32,

    #[validate(range(min = 2020, message = "Year must be 2020 or later"))]
    pub year: i32,

    #[validate(range(min = 0_i64, max = 1_000_000_000_000_i64, message = "Amount must be between 0 and 1e12"))]
    pub amount: Option<i64>,

    pub invoice_type: InvoiceType,

    #[validate(length(max = 500))]
    pub description: Option<String>,
}

impl CreateInvoiceRequest {
    pub fn into_request(self) -> Result<InvoiceRequest, AppError> {
        Ok(InvoiceRequest {
            period: Period::new(self.month, self.year)?,
            child_id: self.child_id,
            amount: self.amount,
            invoice_type: self.invoice_type,
            description: self.description,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ValidateInvoiceRequest {
    pub payment_method: Option<PaymentMethod>,
}

#[derive(Debug, Default, Deserialize)]
pub struct InvoiceListParams {
    pub status: Option<InvoiceStatus>,
    pub child_id: Option<String>,
    pub invoice_type: Option<InvoiceType>,
    pub month: Option<i32>,
    pub year: Option<i32>,
}

impl From<InvoiceListParams> for InvoiceFilter {
    fn from(params: InvoiceListParams) -> Self {
        Self {
            status: params.status,
            child_id: params.child_id,
            invoice_type: params.invoice_type,
            month: params.month,
            year: params.year,
            created: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InvoiceResponse {
    pub id: String,
    pub child_id: String,
    pub month: i32,
    pub year: i32,
    pub amount: i64,
    pub status: InvoiceStatus,
    pub invoice_type: InvoiceType,
    pub description: Option<String>,
    pub paid_date: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    pub validated_by: Option<String>,
    pub receipt_number: Option<String>,
    pub receipt_ref: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Invoice> for InvoiceResponse {
    fn from(invoice: Invoice) -> Self {
        Self {
            id: invoice.id,
            child_id: invoice.child_id,
            month: invoice.month,
            year: invoice.year,
            amount: invoice.amount,
            status: invoice.status,
            invoice_type: invoice.invoice_type,
            description: invoice.description,
            paid_date: invoice.paid_date.map(|d| d.to_chrono().to_rfc3339()),
            payment_method: invoice.payment_method,
            validated_by: invoice.validated_by,
            receipt_number: invoice.receipt_number,
            receipt_ref: invoice.receipt_ref,
            created_at: invoice.created_at.to_rfc3339(),
            updated_at: invoice.updated_at.to_rfc3339(),
        }
    }
}
