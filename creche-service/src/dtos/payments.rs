use super::invoices::InvoiceResponse;
use super::DateRangeParams;
use crate::models::{
    Child, Payment, PaymentCategory, PaymentKind, PaymentMethod, PaymentStatus, Period, Staff,
    StaffPosition,
};
use crate::services::billing::{
    MonthlyCharge, PaymentReceipt, PaymentRequest, PaymentUpdate, ValidatedPayment,
};
use crate::services::charge::ChargeReceipt;
use crate::services::store::PaymentFilter;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use validator::Validate;

fn period(month: Option<i32>, year: Option<i32>) -> Result<Option<Period>, AppError> {
    match (month, year) {
        (Some(month), Some(year)) => Period::new(month, year).map(Some),
        (None, None) => Ok(None),
        _ => Err(AppError::BadRequest(anyhow::anyhow!(
            "month and year must be given together"
        ))),
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePaymentRequest {
    pub kind: Option<PaymentKind>,
    pub category: PaymentCategory,

    #[validate(range(min = 0_i64, max = 1_000_000_000_000_i64, message = "Amount must be between 0 and 1e12"))]
    pub amount: i64,

    #[validate(range(min = 0_i64, max = 1_000_000_000_000_i64, message = "Amount paid must be between 0 and 1e12"))]
    pub amount_paid: Option<i64>,

    pub status: Option<PaymentStatus>,
    pub method: Option<PaymentMethod>,

    #[validate(length(min = 1, max = 500, message = "Description is required"))]
    pub description: String,

    pub date: Option<DateTime<Utc>>,
    pub month: Option<i32>,
    pub year: Option<i32>,
    pub child_id: Option<String>,
    pub staff_id: Option<String>,

    #[validate(length(max = 100))]
    pub reference: Option<String>,

    #[validate(length(max = 1000))]
    pub notes: Option<String>,
}

impl CreatePaymentRequest {
    pub fn into_request(self) -> Result<PaymentRequest, AppError> {
        Ok(PaymentRequest {
            period: period(self.month, self.year)?,
            kind: self.kind,
            category: self.category,
            amount: self.amount,
            amount_paid: self.amount_paid,
            status: self.status,
            method: self.method.unwrap_or(PaymentMethod::Cash),
            description: self.description,
            date: self.date,
            child_id: self.child_id,
            staff_id: self.staff_id,
            reference: self.reference,
            notes: self.notes,
        })
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdatePaymentRequest {
    pub category: Option<PaymentCategory>,

    #[validate(range(min = 0_i64, max = 1_000_000_000_000_i64, message = "Amount must be between 0 and 1e12"))]
    pub amount: Option<i64>,

    #[validate(range(min = 0_i64, max = 1_000_000_000_000_i64, message = "Amount paid must be between 0 and 1e12"))]
    pub amount_paid: Option<i64>,

    pub method: Option<PaymentMethod>,

    #[validate(length(min = 1, max = 500))]
    pub description: Option<String>,

    pub date: Option<DateTime<Utc>>,
    pub month: Option<i32>,
    pub year: Option<i32>,
    pub child_id: Option<String>,
    pub staff_id: Option<String>,
    pub reference: Option<String>,
    pub notes: Option<String>,
}

impl UpdatePaymentRequest {
    pub fn into_update(self) -> Result<PaymentUpdate, AppError> {
        Ok(PaymentUpdate {
            period: period(self.month, self.year)?,
            category: self.category,
            amount: self.amount,
            amount_paid: self.amount_paid,
            method: self.method,
            description: self.description,
            date: self.date,
            child_id: self.child_id,
            staff_id: self.staff_id,
            reference: self.reference,
            notes: self.notes,
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct MonthlyChargeRequest {
    #[validate(length(min = 1, message = "Child is required"))]
    pub child_id: String,

    #[validate(range(min = 1, max = 12, message = "Month must be between 1 and 12"))]
    pub month: i32,

    #[validate(range(min = 2020, message = "Year must be 2020 or later"))]
    pub year: i32,

    #[validate(range(min = 0_i64, max = 1_000_000_000_000_i64, message = "Amount must be between 0 and 1e12"))]
    pub amount: Option<i64>,

    pub method: Option<PaymentMethod>,
    pub reference: Option<String>,
    pub notes: Option<String>,
}

impl MonthlyChargeRequest {
    pub fn into_charge(self) -> Result<MonthlyCharge, AppError> {
        Ok(MonthlyCharge {
            period: Period::new(self.month, self.year)?,
            child_id: self.child_id,
            amount: self.amount,
            method: self.method,
            reference: self.reference,
            notes: self.notes,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PaymentListParams {
    pub kind: Option<PaymentKind>,
    pub category: Option<PaymentCategory>,
    pub status: Option<PaymentStatus>,
    pub child_id: Option<String>,
    pub staff_id: Option<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl PaymentListParams {
    pub fn into_filter(self, today: NaiveDate) -> Result<PaymentFilter, AppError> {
        let range = DateRangeParams {
            start: self.start,
            end: self.end,
        }
        .resolve_optional(today)?;
        Ok(PaymentFilter {
            kind: self.kind,
            category: self.category,
            child_id: self.child_id,
            staff_id: self.staff_id,
            statuses: self.status.into_iter().collect(),
            range,
            ..Default::default()
        })
    }
}

/// Display reference to the child or staff member a payment concerns.
#[derive(Debug, Serialize)]
pub struct PartyRef {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registration_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<StaffPosition>,
}

impl From<&Child> for PartyRef {
    fn from(child: &Child) -> Self {
        Self {
            id: child.id.clone(),
            name: child.full_name(),
            registration_number: Some(child.registration_number.clone()),
            position: None,
        }
    }
}

impl From<&Staff> for PartyRef {
    fn from(staff: &Staff) -> Self {
        Self {
            id: staff.id.clone(),
            name: staff.full_name(),
            registration_number: None,
            position: Some(staff.position),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    pub id: String,
    pub kind: PaymentKind,
    pub category: PaymentCategory,
    pub amount: i64,
    pub amount_paid: i64,
    pub amount_remaining: i64,
    pub status: PaymentStatus,
    pub method: PaymentMethod,
    pub description: String,
    pub date: String,
    pub period: Option<Period>,
    pub child_id: Option<String>,
    pub staff_id: Option<String>,
    pub child: Option<PartyRef>,
    pub staff: Option<PartyRef>,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub recorded_by: String,
    pub created_at: String,
    pub updated_at: String,
}

impl PaymentResponse {
    pub fn resolved(payment: Payment, child: Option<&Child>, staff: Option<&Staff>) -> Self {
        let mut response = Self::from(payment);
        response.child = child.map(PartyRef::from);
        response.staff = staff.map(PartyRef::from);
        response
    }
}

impl From<Payment> for PaymentResponse {
    fn from(payment: Payment) -> Self {
        Self {
            amount_remaining: payment.amount_remaining(),
            id: payment.id,
            kind: payment.kind,
            category: payment.category,
            amount: payment.amount,
            amount_paid: payment.amount_paid,
            status: payment.status,
            method: payment.method,
            description: payment.description,
            date: payment.date.to_rfc3339(),
            period: payment.period,
            child_id: payment.child_id,
            staff_id: payment.staff_id,
            child: None,
            staff: None,
            reference: payment.reference,
            notes: payment.notes,
            recorded_by: payment.recorded_by,
            created_at: payment.created_at.to_rfc3339(),
            updated_at: payment.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChargeResponse {
    pub payment: PaymentResponse,
    pub invoice: InvoiceResponse,
}

impl From<ChargeReceipt> for ChargeResponse {
    fn from(receipt: ChargeReceipt) -> Self {
        Self {
            payment: receipt.payment.into(),
            invoice: receipt.invoice.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ValidatedPaymentResponse {
    pub payment: PaymentResponse,
    pub invoice: Option<InvoiceResponse>,
}

impl From<ValidatedPayment> for ValidatedPaymentResponse {
    fn from(validated: ValidatedPayment) -> Self {
        Self {
            payment: validated.payment.into(),
            invoice: validated.invoice.map(Into::into),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PaymentReceiptResponse {
    pub creche_name: Option<String>,
    pub payment: PaymentResponse,
    pub issued_at: String,
}

impl From<PaymentReceipt> for PaymentReceiptResponse {
    fn from(receipt: PaymentReceipt) -> Self {
        Self {
            creche_name: receipt.creche.map(|c| c.name),
            payment: PaymentResponse::resolved(
                receipt.payment,
                receipt.child.as_ref(),
                receipt.staff.as_ref(),
            ),
            issued_at: Utc::now().to_rfc3339(),
        }
    }
}
