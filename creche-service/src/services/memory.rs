//! In-process store for local development and tests.
//!
//! Enforces the same uniqueness rules as the MongoDB indexes so both
//! backends reject the same duplicates.

use super::store::{
    fold_category_totals, CategoryTotal, DateRange, DirectoryStore, InvoiceFilter, LedgerStore,
    PaymentFilter, PresenceFilter,
};
use crate::models::{
    Child, ChildStatus, Creche, Invoice, InvoiceStatus, Payment, PaymentCategory, PaymentStatus,
    Presence, ReconciliationMarker, SequenceKind, Staff, StaffStatus,
};
use async_trait::async_trait;
use service_core::error::AppError;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
struct MemoryState {
    payments: HashMap<String, Payment>,
    invoices: HashMap<String, Invoice>,
    counters: HashMap<String, u64>,
    reconciliations: Vec<ReconciliationMarker>,
    children: HashMap<String, Child>,
    staff: HashMap<String, Staff>,
    creches: HashMap<String, Creche>,
    presences: Vec<Presence>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, AppError> {
        self.state
            .lock()
            .map_err(|e| AppError::InternalError(anyhow::anyhow!("Memory store mutex poisoned: {}", e)))
    }
}

fn duplicate_monthly_fee(existing: &Payment, candidate: &Payment) -> bool {
    candidate.category == PaymentCategory::MonthlyFee
        && existing.category == PaymentCategory::MonthlyFee
        && existing.id != candidate.id
        && existing.creche_id == candidate.creche_id
        && existing.child_id == candidate.child_id
        && existing.period == candidate.period
}

/// Cancelled invoices do not hold their period.
fn duplicate_invoice(existing: &Invoice, candidate: &Invoice) -> bool {
    existing.status != InvoiceStatus::Cancelled
        && candidate.status != InvoiceStatus::Cancelled
        && existing.id != candidate.id
        && existing.creche_id == candidate.creche_id
        && existing.child_id == candidate.child_id
        && existing.month == candidate.month
        && existing.year == candidate.year
        && existing.invoice_type == candidate.invoice_type
}

fn newest_first(mut payments: Vec<Payment>) -> Vec<Payment> {
    payments.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
    payments
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn health_check(&self) -> Result<(), AppError> {
        self.lock().map(|_| ())
    }

    async fn insert_payment(&self, payment: &Payment) -> Result<(), AppError> {
        let mut state = self.lock()?;
        if state
            .payments
            .values()
            .any(|existing| duplicate_monthly_fee(existing, payment))
        {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "payment already exists for this period"
            )));
        }
        state.payments.insert(payment.id.clone(), payment.clone());
        Ok(())
    }

    async fn get_payment(&self, creche_id: &str, id: &str) -> Result<Option<Payment>, AppError> {
        let state = self.lock()?;
        Ok(state
            .payments
            .get(id)
            .filter(|p| p.creche_id == creche_id)
            .cloned())
    }

    async fn list_payments(
        &self,
        creche_id: &str,
        filter: &PaymentFilter,
    ) -> Result<Vec<Payment>, AppError> {
        let state = self.lock()?;
        let payments = state
            .payments
            .values()
            .filter(|p| p.creche_id == creche_id && filter.matches(p))
            .cloned()
            .collect();
        Ok(newest_first(payments))
    }

    async fn count_payments(
        &self,
        creche_id: &str,
        filter: &PaymentFilter,
    ) -> Result<u64, AppError> {
        let state = self.lock()?;
        Ok(state
            .payments
            .values()
            .filter(|p| p.creche_id == creche_id && filter.matches(p))
            .count() as u64)
    }

    async fn replace_payment_if(
        &self,
        payment: &Payment,
        expected: &[PaymentStatus],
    ) -> Result<bool, AppError> {
        let mut state = self.lock()?;
        let matches = state
            .payments
            .get(&payment.id)
            .is_some_and(|current| {
                current.creche_id == payment.creche_id && expected.contains(&current.status)
            });
        if !matches {
            return Ok(false);
        }
        if state
            .payments
            .values()
            .any(|existing| duplicate_monthly_fee(existing, payment))
        {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "payment already exists for this period"
            )));
        }
        state.payments.insert(payment.id.clone(), payment.clone());
        Ok(true)
    }

    async fn delete_payment(
        &self,
        creche_id: &str,
        id: &str,
    ) -> Result<Option<Payment>, AppError> {
        let mut state = self.lock()?;
        let owned = state
            .payments
            .get(id)
            .is_some_and(|p| p.creche_id == creche_id);
        Ok(if owned { state.payments.remove(id) } else { None })
    }

    async fn category_totals(
        &self,
        creche_id: &str,
        range: &DateRange,
    ) -> Result<Vec<CategoryTotal>, AppError> {
        let state = self.lock()?;
        Ok(fold_category_totals(state.payments.values().filter(|p| {
            p.creche_id == creche_id && range.contains(p.date)
        })))
    }

    async fn insert_invoice(&self, invoice: &Invoice) -> Result<(), AppError> {
        let mut state = self.lock()?;
        if state
            .invoices
            .values()
            .any(|existing| duplicate_invoice(existing, invoice))
        {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "an invoice of this type already exists for this child and period"
            )));
        }
        state.invoices.insert(invoice.id.clone(), invoice.clone());
        Ok(())
    }

    async fn get_invoice(&self, creche_id: &str, id: &str) -> Result<Option<Invoice>, AppError> {
        let state = self.lock()?;
        Ok(state
            .invoices
            .get(id)
            .filter(|i| i.creche_id == creche_id)
            .cloned())
    }

    async fn list_invoices(
        &self,
        creche_id: &str,
        filter: &InvoiceFilter,
    ) -> Result<Vec<Invoice>, AppError> {
        let state = self.lock()?;
        let mut invoices: Vec<Invoice> = state
            .invoices
            .values()
            .filter(|i| i.creche_id == creche_id && filter.matches(i))
            .cloned()
            .collect();
        invoices.sort_by(|a, b| {
            (b.year, b.month)
                .cmp(&(a.year, a.month))
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(invoices)
    }

    async fn replace_invoice_if(
        &self,
        invoice: &Invoice,
        expected: &[InvoiceStatus],
    ) -> Result<bool, AppError> {
        let mut state = self.lock()?;
        let matches = state.invoices.get(&invoice.id).is_some_and(|current| {
            current.creche_id == invoice.creche_id && expected.contains(&current.status)
        });
        if matches {
            state.invoices.insert(invoice.id.clone(), invoice.clone());
        }
        Ok(matches)
    }

    async fn next_sequence(
        &self,
        creche_id: &str,
        kind: SequenceKind,
        year: i32,
    ) -> Result<u64, AppError> {
        let mut state = self.lock()?;
        let seq = state.counters.entry(kind.key(creche_id, year)).or_insert(0);
        *seq += 1;
        Ok(*seq)
    }

    async fn insert_reconciliation(&self, marker: &ReconciliationMarker) -> Result<(), AppError> {
        self.lock()?.reconciliations.push(marker.clone());
        Ok(())
    }

    async fn list_reconciliations(
        &self,
        creche_id: &str,
    ) -> Result<Vec<ReconciliationMarker>, AppError> {
        let state = self.lock()?;
        Ok(state
            .reconciliations
            .iter()
            .filter(|m| m.creche_id == creche_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl DirectoryStore for MemoryStore {
    async fn insert_child(&self, child: &Child) -> Result<(), AppError> {
        let mut state = self.lock()?;
        if state.children.values().any(|c| {
            c.creche_id == child.creche_id && c.registration_number == child.registration_number
        }) {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "registration number {} already in use",
                child.registration_number
            )));
        }
        state.children.insert(child.id.clone(), child.clone());
        Ok(())
    }

    async fn get_child(&self, creche_id: &str, id: &str) -> Result<Option<Child>, AppError> {
        let state = self.lock()?;
        Ok(state
            .children
            .get(id)
            .filter(|c| c.creche_id == creche_id)
            .cloned())
    }

    async fn list_children(
        &self,
        creche_id: &str,
        status: Option<ChildStatus>,
    ) -> Result<Vec<Child>, AppError> {
        let state = self.lock()?;
        let mut children: Vec<Child> = state
            .children
            .values()
            .filter(|c| c.creche_id == creche_id && status.map_or(true, |s| c.status == s))
            .cloned()
            .collect();
        children.sort_by(|a, b| {
            (&a.last_name, &a.first_name).cmp(&(&b.last_name, &b.first_name))
        });
        Ok(children)
    }

    async fn count_children(
        &self,
        creche_id: &str,
        status: Option<ChildStatus>,
    ) -> Result<u64, AppError> {
        let state = self.lock()?;
        Ok(state
            .children
            .values()
            .filter(|c| c.creche_id == creche_id && status.map_or(true, |s| c.status == s))
            .count() as u64)
    }

    async fn insert_staff(&self, staff: &Staff) -> Result<(), AppError> {
        self.lock()?.staff.insert(staff.id.clone(), staff.clone());
        Ok(())
    }

    async fn get_staff(&self, creche_id: &str, id: &str) -> Result<Option<Staff>, AppError> {
        let state = self.lock()?;
        Ok(state
            .staff
            .get(id)
            .filter(|s| s.creche_id == creche_id)
            .cloned())
    }

    async fn list_staff(
        &self,
        creche_id: &str,
        status: Option<StaffStatus>,
    ) -> Result<Vec<Staff>, AppError> {
        let state = self.lock()?;
        let mut staff: Vec<Staff> = state
            .staff
            .values()
            .filter(|s| s.creche_id == creche_id && status.map_or(true, |st| s.status == st))
            .cloned()
            .collect();
        staff.sort_by(|a, b| (&a.last_name, &a.first_name).cmp(&(&b.last_name, &b.first_name)));
        Ok(staff)
    }

    async fn get_creche(&self, creche_id: &str) -> Result<Option<Creche>, AppError> {
        Ok(self.lock()?.creches.get(creche_id).cloned())
    }

    async fn save_creche(&self, creche: &Creche) -> Result<(), AppError> {
        self.lock()?.creches.insert(creche.id.clone(), creche.clone());
        Ok(())
    }

    async fn insert_presence(&self, presence: &Presence) -> Result<(), AppError> {
        let mut state = self.lock()?;
        if state.presences.iter().any(|p| {
            p.creche_id == presence.creche_id
                && p.date == presence.date
                && p.kind == presence.kind
                && p.child_id == presence.child_id
                && p.staff_id == presence.staff_id
        }) {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "a presence is already recorded for this day"
            )));
        }
        state.presences.push(presence.clone());
        Ok(())
    }

    async fn list_presences(
        &self,
        creche_id: &str,
        filter: &PresenceFilter,
    ) -> Result<Vec<Presence>, AppError> {
        let state = self.lock()?;
        let mut presences: Vec<Presence> = state
            .presences
            .iter()
            .filter(|p| p.creche_id == creche_id && filter.matches(p))
            .cloned()
            .collect();
        presences.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(presences)
    }
}
