//! Persistence seams for the ledger and the directory.
//!
//! Every operation is scoped by `creche_id`; no method can read or write
//! across tenants.

use crate::models::{
    Child, ChildStatus, Creche, Invoice, InvoiceStatus, InvoiceType, Payment, PaymentCategory,
    PaymentKind, PaymentStatus, Presence, PresenceKind, PresenceStatus, ReconciliationMarker,
    SequenceKind, Staff, StaffStatus,
};
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use service_core::error::AppError;
use std::collections::BTreeMap;

/// Half-open UTC interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, AppError> {
        if end <= start {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "range end must be after its start"
            )));
        }
        Ok(Self { start, end })
    }

    /// `[day 00:00, day+1 00:00)` in UTC.
    pub fn day(day: NaiveDate) -> Self {
        let start = day.and_time(NaiveTime::MIN).and_utc();
        Self {
            start,
            end: start + Duration::days(1),
        }
    }

    /// From the first day through the last day, both inclusive.
    pub fn days(first: NaiveDate, last: NaiveDate) -> Result<Self, AppError> {
        let start = first.and_time(NaiveTime::MIN).and_utc();
        let end = last.and_time(NaiveTime::MIN).and_utc() + Duration::days(1);
        Self::new(start, end)
    }

    /// The `days` calendar days ending with (and including) `today`.
    pub fn trailing_days(today: NaiveDate, days: i64) -> Self {
        let end = today.and_time(NaiveTime::MIN).and_utc() + Duration::days(1);
        Self {
            start: end - Duration::days(days.max(1)),
            end,
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && at < self.end
    }
}

#[derive(Debug, Clone, Default)]
pub struct PaymentFilter {
    pub kind: Option<PaymentKind>,
    pub category: Option<PaymentCategory>,
    pub child_id: Option<String>,
    pub staff_id: Option<String>,
    /// Empty means any status.
    pub statuses: Vec<PaymentStatus>,
    pub range: Option<DateRange>,
    pub period_year: Option<i32>,
    pub period_month: Option<i32>,
    /// Only periods with `month < period_month_before`.
    pub period_month_before: Option<i32>,
}

impl PaymentFilter {
    pub fn matches(&self, payment: &Payment) -> bool {
        if self.kind.is_some_and(|kind| payment.kind != kind) {
            return false;
        }
        if self.category.is_some_and(|category| payment.category != category) {
            return false;
        }
        if let Some(child_id) = &self.child_id {
            if payment.child_id.as_ref() != Some(child_id) {
                return false;
            }
        }
        if let Some(staff_id) = &self.staff_id {
            if payment.staff_id.as_ref() != Some(staff_id) {
                return false;
            }
        }
        if !self.statuses.is_empty() && !self.statuses.contains(&payment.status) {
            return false;
        }
        if self.range.is_some_and(|range| !range.contains(payment.date)) {
            return false;
        }
        if self.period_year.is_some()
            || self.period_month.is_some()
            || self.period_month_before.is_some()
        {
            let Some(period) = payment.period else {
                return false;
            };
            if self.period_year.is_some_and(|year| period.year != year) {
                return false;
            }
            if self.period_month.is_some_and(|month| period.month != month) {
                return false;
            }
            if self
                .period_month_before
                .is_some_and(|month| period.month >= month)
            {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Default)]
pub struct InvoiceFilter {
    pub status: Option<InvoiceStatus>,
    pub child_id: Option<String>,
    pub invoice_type: Option<InvoiceType>,
    pub month: Option<i32>,
    pub year: Option<i32>,
    pub created: Option<DateRange>,
}

impl InvoiceFilter {
    pub fn matches(&self, invoice: &Invoice) -> bool {
        self.status.map_or(true, |s| invoice.status == s)
            && self
                .child_id
                .as_ref()
                .map_or(true, |id| &invoice.child_id == id)
            && self.invoice_type.map_or(true, |t| invoice.invoice_type == t)
            && self.month.map_or(true, |m| invoice.month == m)
            && self.year.map_or(true, |y| invoice.year == y)
            && self.created.map_or(true, |r| r.contains(invoice.created_at))
    }
}

#[derive(Debug, Clone, Default)]
pub struct PresenceFilter {
    pub kind: Option<PresenceKind>,
    pub child_id: Option<String>,
    pub staff_id: Option<String>,
    pub statuses: Vec<PresenceStatus>,
    pub range: Option<DateRange>,
}

impl PresenceFilter {
    pub fn matches(&self, presence: &Presence) -> bool {
        self.kind.map_or(true, |k| presence.kind == k)
            && self
                .child_id
                .as_ref()
                .map_or(true, |id| presence.child_id.as_ref() == Some(id))
            && self
                .staff_id
                .as_ref()
                .map_or(true, |id| presence.staff_id.as_ref() == Some(id))
            && (self.statuses.is_empty() || self.statuses.contains(&presence.status))
            && self.range.map_or(true, |r| r.contains(presence.date))
    }
}

/// Sum of `amount_paid` and record count for one (kind, category) group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTotal {
    pub kind: PaymentKind,
    pub category: PaymentCategory,
    pub total: i64,
    pub count: u64,
}

/// Groups non-cancelled payments by (kind, category), ordered by kind then
/// category.
pub fn fold_category_totals<'a>(
    payments: impl IntoIterator<Item = &'a Payment>,
) -> Vec<CategoryTotal> {
    let mut groups: BTreeMap<(PaymentKind, PaymentCategory), (i64, u64)> = BTreeMap::new();
    for payment in payments {
        if payment.status == PaymentStatus::Cancelled {
            continue;
        }
        let entry = groups
            .entry((payment.kind, payment.category))
            .or_insert((0, 0));
        entry.0 = entry.0.saturating_add(payment.amount_paid);
        entry.1 += 1;
    }
    groups
        .into_iter()
        .map(|((kind, category), (total, count))| CategoryTotal {
            kind,
            category,
            total,
            count,
        })
        .collect()
}

#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn health_check(&self) -> Result<(), AppError>;

    /// Fails with `Conflict` when a MONTHLY_FEE payment already exists for
    /// the same child and period.
    async fn insert_payment(&self, payment: &Payment) -> Result<(), AppError>;
    async fn get_payment(&self, creche_id: &str, id: &str) -> Result<Option<Payment>, AppError>;
    /// Newest first by transaction date.
    async fn list_payments(
        &self,
        creche_id: &str,
        filter: &PaymentFilter,
    ) -> Result<Vec<Payment>, AppError>;
    async fn count_payments(&self, creche_id: &str, filter: &PaymentFilter)
        -> Result<u64, AppError>;
    /// Replaces the stored payment only while its status is one of
    /// `expected`. Returns whether the replacement happened.
    async fn replace_payment_if(
        &self,
        payment: &Payment,
        expected: &[PaymentStatus],
    ) -> Result<bool, AppError>;
    async fn delete_payment(&self, creche_id: &str, id: &str)
        -> Result<Option<Payment>, AppError>;
    async fn category_totals(
        &self,
        creche_id: &str,
        range: &DateRange,
    ) -> Result<Vec<CategoryTotal>, AppError>;

    /// Fails with `Conflict` when an invoice of the same type already exists
    /// for the child and period.
    async fn insert_invoice(&self, invoice: &Invoice) -> Result<(), AppError>;
    async fn get_invoice(&self, creche_id: &str, id: &str) -> Result<Option<Invoice>, AppError>;
    async fn list_invoices(
        &self,
        creche_id: &str,
        filter: &InvoiceFilter,
    ) -> Result<Vec<Invoice>, AppError>;
    async fn replace_invoice_if(
        &self,
        invoice: &Invoice,
        expected: &[InvoiceStatus],
    ) -> Result<bool, AppError>;

    /// Atomically increments and returns the next value, starting at 1.
    async fn next_sequence(
        &self,
        creche_id: &str,
        kind: SequenceKind,
        year: i32,
    ) -> Result<u64, AppError>;

    async fn insert_reconciliation(&self, marker: &ReconciliationMarker) -> Result<(), AppError>;
    async fn list_reconciliations(
        &self,
        creche_id: &str,
    ) -> Result<Vec<ReconciliationMarker>, AppError>;
}

#[async_trait]
pub trait DirectoryStore: Send + Sync {
    async fn insert_child(&self, child: &Child) -> Result<(), AppError>;
    async fn get_child(&self, creche_id: &str, id: &str) -> Result<Option<Child>, AppError>;
    async fn list_children(
        &self,
        creche_id: &str,
        status: Option<ChildStatus>,
    ) -> Result<Vec<Child>, AppError>;
    async fn count_children(
        &self,
        creche_id: &str,
        status: Option<ChildStatus>,
    ) -> Result<u64, AppError>;

    async fn insert_staff(&self, staff: &Staff) -> Result<(), AppError>;
    async fn get_staff(&self, creche_id: &str, id: &str) -> Result<Option<Staff>, AppError>;
    async fn list_staff(
        &self,
        creche_id: &str,
        status: Option<StaffStatus>,
    ) -> Result<Vec<Staff>, AppError>;

    async fn get_creche(&self, creche_id: &str) -> Result<Option<Creche>, AppError>;
    async fn save_creche(&self, creche: &Creche) -> Result<(), AppError>;

    /// Fails with `Conflict` when the subject already has a record that day.
    async fn insert_presence(&self, presence: &Presence) -> Result<(), AppError>;
    async fn list_presences(
        &self,
        creche_id: &str,
        filter: &PresenceFilter,
    ) -> Result<Vec<Presence>, AppError>;
}
