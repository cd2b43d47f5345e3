//! Payment model: the cash-ledger entry.

use chrono::{DateTime, Datelike, Utc};
use mongodb::bson;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use std::fmt;
use uuid::Uuid;

/// Direction of money.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentKind {
    Income,
    Expense,
}

impl PaymentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentKind::Income => "INCOME",
            PaymentKind::Expense => "EXPENSE",
        }
    }
}

/// Ledger category. Every category belongs to exactly one kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentCategory {
    RegistrationFee,
    MonthlyFee,
    LateFee,
    OtherIncome,
    Salaries,
    Supplies,
    Food,
    Maintenance,
    Utilities,
    Insurance,
    Rent,
    Transport,
    OtherExpense,
}

impl PaymentCategory {
    pub const ALL: [PaymentCategory; 13] = [
        PaymentCategory::RegistrationFee,
        PaymentCategory::MonthlyFee,
        PaymentCategory::LateFee,
        PaymentCategory::OtherIncome,
        PaymentCategory::Salaries,
        PaymentCategory::Supplies,
        PaymentCategory::Food,
        PaymentCategory::Maintenance,
        PaymentCategory::Utilities,
        PaymentCategory::Insurance,
        PaymentCategory::Rent,
        PaymentCategory::Transport,
        PaymentCategory::OtherExpense,
    ];

    pub fn kind(&self) -> PaymentKind {
        match self {
            PaymentCategory::RegistrationFee
            | PaymentCategory::MonthlyFee
            | PaymentCategory::LateFee
            | PaymentCategory::OtherIncome => PaymentKind::Income,
            _ => PaymentKind::Expense,
        }
    }

    /// Income categories that are always charged to a child.
    pub fn requires_child(&self) -> bool {
        matches!(
            self,
            PaymentCategory::RegistrationFee
                | PaymentCategory::MonthlyFee
                | PaymentCategory::LateFee
        )
    }

    pub fn requires_staff(&self) -> bool {
        matches!(self, PaymentCategory::Salaries)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentCategory::RegistrationFee => "REGISTRATION_FEE",
            PaymentCategory::MonthlyFee => "MONTHLY_FEE",
            PaymentCategory::LateFee => "LATE_FEE",
            PaymentCategory::OtherIncome => "OTHER_INCOME",
            PaymentCategory::Salaries => "SALARIES",
            PaymentCategory::Supplies => "SUPPLIES",
            PaymentCategory::Food => "FOOD",
            PaymentCategory::Maintenance => "MAINTENANCE",
            PaymentCategory::Utilities => "UTILITIES",
            PaymentCategory::Insurance => "INSURANCE",
            PaymentCategory::Rent => "RENT",
            PaymentCategory::Transport => "TRANSPORT",
            PaymentCategory::OtherExpense => "OTHER_EXPENSE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Partial,
    Cancelled,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Paid => "PAID",
            PaymentStatus::Partial => "PARTIAL",
            PaymentStatus::Cancelled => "CANCELLED",
        }
    }

    /// Statuses that still expect money to come in or go out.
    pub fn is_open(&self) -> bool {
        matches!(self, PaymentStatus::Pending | PaymentStatus::Partial)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    BankTransfer,
    Cheque,
    MobileMoneyA,
    MobileMoneyB,
    Card,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "CASH",
            PaymentMethod::BankTransfer => "BANK_TRANSFER",
            PaymentMethod::Cheque => "CHEQUE",
            PaymentMethod::MobileMoneyA => "MOBILE_MONEY_A",
            PaymentMethod::MobileMoneyB => "MOBILE_MONEY_B",
            PaymentMethod::Card => "CARD",
        }
    }
}

/// Billing cycle a monthly fee or salary covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Period {
    pub month: i32,
    pub year: i32,
}

impl Period {
    pub const MIN_YEAR: i32 = 2020;

    pub fn new(month: i32, year: i32) -> Result<Self, AppError> {
        if !(1..=12).contains(&month) {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "month must be between 1 and 12, got {}",
                month
            )));
        }
        if year < Self::MIN_YEAR {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "year must be {} or later, got {}",
                Self::MIN_YEAR,
                year
            )));
        }
        Ok(Self { month, year })
    }

    pub fn of(date: DateTime<Utc>) -> Self {
        Self {
            month: date.month() as i32,
            year: date.year(),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{}", self.month, self.year)
    }
}

/// Who a payment is about, resolved from the category rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentSubject {
    Child(String),
    Staff(String),
    Unlinked,
}

impl PaymentSubject {
    /// Child-scoped income categories need a child, salaries need a staff
    /// member, a child never appears on an expense and staff never on income.
    pub fn resolve(
        category: PaymentCategory,
        child_id: Option<String>,
        staff_id: Option<String>,
    ) -> Result<Self, AppError> {
        let child_id = child_id.filter(|id| !id.trim().is_empty());
        let staff_id = staff_id.filter(|id| !id.trim().is_empty());

        match (category.kind(), child_id, staff_id) {
            (_, Some(_), Some(_)) => Err(AppError::BadRequest(anyhow::anyhow!(
                "a payment references either a child or a staff member, not both"
            ))),
            (PaymentKind::Income, None, Some(_)) => Err(AppError::BadRequest(anyhow::anyhow!(
                "a staff member can only be referenced by an expense"
            ))),
            (PaymentKind::Expense, Some(_), None) => Err(AppError::BadRequest(anyhow::anyhow!(
                "a child can only be referenced by an income"
            ))),
            (PaymentKind::Income, Some(child_id), None) => Ok(PaymentSubject::Child(child_id)),
            (PaymentKind::Expense, None, Some(staff_id)) => Ok(PaymentSubject::Staff(staff_id)),
            (_, None, None) if category.requires_child() => Err(AppError::BadRequest(
                anyhow::anyhow!("a child is required for {} payments", category.as_str()),
            )),
            (_, None, None) if category.requires_staff() => Err(AppError::BadRequest(
                anyhow::anyhow!("a staff member is required for {} payments", category.as_str()),
            )),
            (_, None, None) => Ok(PaymentSubject::Unlinked),
        }
    }

    pub fn child_id(&self) -> Option<&str> {
        match self {
            PaymentSubject::Child(id) => Some(id),
            _ => None,
        }
    }

    pub fn staff_id(&self) -> Option<&str> {
        match self {
            PaymentSubject::Staff(id) => Some(id),
            _ => None,
        }
    }
}

/// Largest single amount accepted, in minor units. Keeps ledger sums far
/// from `i64` overflow.
pub const MAX_AMOUNT: i64 = 1_000_000_000_000;

pub fn check_amount(amount: i64) -> Result<(), AppError> {
    if !(0..=MAX_AMOUNT).contains(&amount) {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "amount must be between 0 and {} ({} given)",
            MAX_AMOUNT,
            amount
        )));
    }
    Ok(())
}

/// Everything needed to record a payment except its settlement state.
#[derive(Debug, Clone)]
pub struct PaymentDraft {
    pub creche_id: String,
    pub category: PaymentCategory,
    pub subject: PaymentSubject,
    pub amount: i64,
    pub method: PaymentMethod,
    pub description: String,
    pub date: DateTime<Utc>,
    pub period: Option<Period>,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub recorded_by: String,
}

impl PaymentDraft {
    fn check(&self) -> Result<(), AppError> {
        check_amount(self.amount)?;
        if self.description.trim().is_empty() {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "description is required"
            )));
        }
        if self.category == PaymentCategory::MonthlyFee && self.period.is_none() {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "a period is required for MONTHLY_FEE payments"
            )));
        }
        Ok(())
    }
}

/// Payment document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    #[serde(rename = "_id")]
    pub id: String,
    pub creche_id: String,
    pub kind: PaymentKind,
    pub category: PaymentCategory,
    pub amount: i64,
    pub amount_paid: i64,
    pub status: PaymentStatus,
    pub method: PaymentMethod,
    pub description: String,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staff_id: Option<String>,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub recorded_by: String,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Payment {
    /// Money already changed hands: `amount_paid == amount`.
    pub fn settled(draft: PaymentDraft) -> Result<Self, AppError> {
        draft.check()?;
        let amount = draft.amount;
        Ok(Self::build(draft, PaymentStatus::Paid, amount))
    }

    /// Nothing received yet.
    pub fn pending(draft: PaymentDraft) -> Result<Self, AppError> {
        draft.check()?;
        Ok(Self::build(draft, PaymentStatus::Pending, 0))
    }

    /// Part of the amount received; the remainder stays due.
    pub fn partial(draft: PaymentDraft, amount_paid: i64) -> Result<Self, AppError> {
        draft.check()?;
        if amount_paid <= 0 || amount_paid >= draft.amount {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "a partial payment needs 0 < amount_paid < amount ({} given for {})",
                amount_paid,
                draft.amount
            )));
        }
        Ok(Self::build(draft, PaymentStatus::Partial, amount_paid))
    }

    fn build(draft: PaymentDraft, status: PaymentStatus, amount_paid: i64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            creche_id: draft.creche_id,
            kind: draft.category.kind(),
            category: draft.category,
            amount: draft.amount,
            amount_paid,
            status,
            method: draft.method,
            description: draft.description.trim().to_string(),
            date: draft.date,
            period: draft.period,
            child_id: draft.subject.child_id().map(str::to_string),
            staff_id: draft.subject.staff_id().map(str::to_string),
            reference: draft.reference,
            notes: draft.notes,
            recorded_by: draft.recorded_by,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn amount_remaining(&self) -> i64 {
        (self.amount - self.amount_paid).max(0)
    }

    pub fn subject(&self) -> PaymentSubject {
        match (&self.child_id, &self.staff_id) {
            (Some(child_id), _) => PaymentSubject::Child(child_id.clone()),
            (None, Some(staff_id)) => PaymentSubject::Staff(staff_id.clone()),
            (None, None) => PaymentSubject::Unlinked,
        }
    }

    /// Records a new received amount and derives the status from it.
    pub fn apply_amount_paid(&mut self, amount_paid: i64) -> Result<(), AppError> {
        if amount_paid < 0 || amount_paid > self.amount {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "amount_paid must be between 0 and {} ({} given)",
                self.amount,
                amount_paid
            )));
        }
        self.amount_paid = amount_paid;
        self.status = if amount_paid == 0 {
            PaymentStatus::Pending
        } else if amount_paid == self.amount {
            PaymentStatus::Paid
        } else {
            PaymentStatus::Partial
        };
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn settle(&mut self) {
        self.status = PaymentStatus::Paid;
        self.amount_paid = self.amount;
        self.updated_at = Utc::now();
    }

    pub fn cancel(&mut self) {
        self.status = PaymentStatus::Cancelled;
        self.updated_at = Utc::now();
    }
}
