use super::payment::{check_amount, PaymentCategory, PaymentMethod, Period};
use chrono::{DateTime, Utc};
use mongodb::bson;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    Pending,
    Paid,
    Cancelled,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "PENDING",
            InvoiceStatus::Paid => "PAID",
            InvoiceStatus::Cancelled => "CANCELLED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceType {
    Registration,
    MonthlyFee,
    LateFee,
    Other,
}

impl InvoiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceType::Registration => "REGISTRATION",
            InvoiceType::MonthlyFee => "MONTHLY_FEE",
            InvoiceType::LateFee => "LATE_FEE",
            InvoiceType::Other => "OTHER",
        }
    }

    /// Invoice type a child-billed income category settles, if any.
    pub fn for_category(category: PaymentCategory) -> Option<Self> {
        match category {
            PaymentCategory::RegistrationFee => Some(InvoiceType::Registration),
            PaymentCategory::MonthlyFee => Some(InvoiceType::MonthlyFee),
            PaymentCategory::LateFee => Some(InvoiceType::LateFee),
            PaymentCategory::OtherIncome => Some(InvoiceType::Other),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InvoiceDraft {
    pub creche_id: String,
    pub child_id: String,
    pub period: Period,
    pub amount: i64,
    pub invoice_type: InvoiceType,
    pub description: Option<String>,
}

/// Statement of an amount owed by a child for a period and type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    #[serde(rename = "_id")]
    pub id: String,
    pub creche_id: String,
    pub child_id: String,
    pub month: i32,
    pub year: i32,
    pub amount: i64,
    pub status: InvoiceStatus,
    pub invoice_type: InvoiceType,
    pub description: Option<String>,
    pub paid_date: Option<bson::DateTime>,
    pub payment_method: Option<PaymentMethod>,
    pub validated_by: Option<String>,
    pub receipt_number: Option<String>,
    pub receipt_ref: Option<String>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    pub fn pending(draft: InvoiceDraft) -> Result<Self, AppError> {
        check_amount(draft.amount)?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            creche_id: draft.creche_id,
            child_id: draft.child_id,
            month: draft.period.month,
            year: draft.period.year,
            amount: draft.amount,
            status: InvoiceStatus::Pending,
            invoice_type: draft.invoice_type,
            description: draft.description,
            paid_date: None,
            payment_method: None,
            validated_by: None,
            receipt_number: None,
            receipt_ref: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Invoice issued already settled, alongside a payment taken at the desk.
    pub fn paid(
        draft: InvoiceDraft,
        method: PaymentMethod,
        validated_by: &str,
    ) -> Result<Self, AppError> {
        let mut invoice = Self::pending(draft)?;
        invoice.mark_paid(method, validated_by);
        Ok(invoice)
    }

    pub fn period(&self) -> Period {
        Period {
            month: self.month,
            year: self.year,
        }
    }

    pub fn mark_paid(&mut self, method: PaymentMethod, validated_by: &str) {
        let now = Utc::now();
        self.status = InvoiceStatus::Paid;
        self.paid_date = Some(bson::DateTime::from_chrono(now));
        self.payment_method = Some(method);
        self.validated_by = Some(validated_by.to_string());
        self.updated_at = now;
    }

    pub fn attach_receipt(&mut self, number: String, reference: String) {
        self.receipt_number = Some(number);
        self.receipt_ref = Some(reference);
    }

    pub fn cancel(&mut self) {
        self.status = InvoiceStatus::Cancelled;
        self.updated_at = Utc::now();
    }
}
