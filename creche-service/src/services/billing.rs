//! Billing: the Payment + Invoice dual ledger.

use super::charge::{ChargeEvent, ChargeReceipt, InvoiceWrite};
use super::metrics::{record_payment, record_validation};
use super::receipts::{ReceiptData, ReceiptRenderer};
use super::store::{DirectoryStore, InvoiceFilter, LedgerStore, PaymentFilter};
use crate::config::BillingSettings;
use crate::middleware::TenantContext;
use crate::models::{
    check_amount, Child, Creche, Invoice, InvoiceDraft, InvoiceStatus, InvoiceType, NewChild,
    Payment, PaymentCategory, PaymentDraft, PaymentKind, PaymentMethod, PaymentStatus,
    PaymentSubject, Period, ReconciliationMarker, SequenceKind, Staff,
};
use chrono::{DateTime, Datelike, Utc};
use service_core::error::AppError;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Generic payment as requested by a caller.
#[derive(Debug, Clone)]
pub struct PaymentRequest {
    pub kind: Option<PaymentKind>,
    pub category: PaymentCategory,
    pub amount: i64,
    pub amount_paid: Option<i64>,
    pub status: Option<PaymentStatus>,
    pub method: PaymentMethod,
    pub description: String,
    pub date: Option<DateTime<Utc>>,
    pub period: Option<Period>,
    pub child_id: Option<String>,
    pub staff_id: Option<String>,
    pub reference: Option<String>,
    pub notes: Option<String>,
}

/// Fields an update may change; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct PaymentUpdate {
    pub category: Option<PaymentCategory>,
    pub amount: Option<i64>,
    pub amount_paid: Option<i64>,
    pub method: Option<PaymentMethod>,
    pub description: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub period: Option<Period>,
    pub child_id: Option<String>,
    pub staff_id: Option<String>,
    pub reference: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MonthlyCharge {
    pub child_id: String,
    pub period: Period,
    pub amount: Option<i64>,
    pub method: Option<PaymentMethod>,
    pub reference: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SalaryPayment {
    pub period: Period,
    pub amount: Option<i64>,
    pub description: Option<String>,
    pub method: Option<PaymentMethod>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone)]
pub struct InvoiceRequest {
    pub child_id: String,
    pub period: Period,
    pub amount: Option<i64>,
    pub invoice_type: InvoiceType,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EnrollChild {
    pub first_name: String,
    pub last_name: String,
    pub section: Option<String>,
    pub enrolled_at: Option<DateTime<Utc>>,
    pub registration_fee: Option<i64>,
    pub monthly_fee: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct Enrollment {
    pub child: Child,
    pub registration: Option<ChargeReceipt>,
}

#[derive(Debug, Clone)]
pub struct ValidatedPayment {
    pub payment: Payment,
    /// Sibling invoice settled alongside, if one was pending.
    pub invoice: Option<Invoice>,
}

/// Everything a payment receipt shows.
#[derive(Debug, Clone)]
pub struct PaymentReceipt {
    pub payment: Payment,
    pub creche: Option<Creche>,
    pub child: Option<Child>,
    pub staff: Option<Staff>,
}

#[derive(Clone)]
pub struct BillingService {
    ledger: Arc<dyn LedgerStore>,
    directory: Arc<dyn DirectoryStore>,
    renderer: Arc<dyn ReceiptRenderer>,
    settings: BillingSettings,
}

fn not_found(what: &str, id: &str) -> AppError {
    AppError::NotFound(anyhow::anyhow!("{} {} not found", what, id))
}

impl BillingService {
    pub fn new(
        ledger: Arc<dyn LedgerStore>,
        directory: Arc<dyn DirectoryStore>,
        renderer: Arc<dyn ReceiptRenderer>,
        settings: BillingSettings,
    ) -> Self {
        Self {
            ledger,
            directory,
            renderer,
            settings,
        }
    }

    async fn require_child(&self, tenant: &TenantContext, child_id: &str) -> Result<Child, AppError> {
        self.directory
            .get_child(&tenant.creche_id, child_id)
            .await?
            .ok_or_else(|| not_found("child", child_id))
    }

    async fn require_staff(&self, tenant: &TenantContext, staff_id: &str) -> Result<Staff, AppError> {
        self.directory
            .get_staff(&tenant.creche_id, staff_id)
            .await?
            .ok_or_else(|| not_found("staff member", staff_id))
    }

    async fn require_payment(
        &self,
        tenant: &TenantContext,
        payment_id: &str,
    ) -> Result<Payment, AppError> {
        self.ledger
            .get_payment(&tenant.creche_id, payment_id)
            .await?
            .ok_or_else(|| not_found("payment", payment_id))
    }

    async fn require_invoice(
        &self,
        tenant: &TenantContext,
        invoice_id: &str,
    ) -> Result<Invoice, AppError> {
        self.ledger
            .get_invoice(&tenant.creche_id, invoice_id)
            .await?
            .ok_or_else(|| not_found("invoice", invoice_id))
    }

    async fn require_subject(
        &self,
        tenant: &TenantContext,
        subject: &PaymentSubject,
    ) -> Result<(), AppError> {
        match subject {
            PaymentSubject::Child(id) => self.require_child(tenant, id).await.map(|_| ()),
            PaymentSubject::Staff(id) => self.require_staff(tenant, id).await.map(|_| ()),
            PaymentSubject::Unlinked => Ok(()),
        }
    }

    /// Creche tariff first, then the configured default.
    async fn tariffs(&self, tenant: &TenantContext) -> Result<(i64, i64), AppError> {
        let creche = self.directory.get_creche(&tenant.creche_id).await?;
        let registration = creche
            .as_ref()
            .map(|c| c.registration_fee)
            .filter(|fee| *fee > 0)
            .unwrap_or(self.settings.default_registration_fee);
        let monthly = creche
            .as_ref()
            .map(|c| c.monthly_fee)
            .filter(|fee| *fee > 0)
            .unwrap_or(self.settings.default_monthly_fee);
        Ok((registration, monthly))
    }

    /// Registers a child under the next registration number and records the
    /// registration charge. A failed charge does not undo the enrolment.
    #[instrument(
        skip(self, tenant, input),
        fields(service = "creche-service", creche_id = %tenant.creche_id)
    )]
    pub async fn enroll_child(
        &self,
        tenant: &TenantContext,
        input: EnrollChild,
    ) -> Result<Enrollment, AppError> {
        let (default_registration, default_monthly) = self.tariffs(tenant).await?;
        let enrolled_at = input.enrolled_at.unwrap_or_else(Utc::now);
        let year = enrolled_at.year();
        let seq = self
            .ledger
            .next_sequence(&tenant.creche_id, SequenceKind::ChildRegistration, year)
            .await?;
        let registration_number = SequenceKind::ChildRegistration.format(year, seq);

        let child = Child::new(
            tenant.creche_id.clone(),
            registration_number,
            NewChild {
                first_name: input.first_name,
                last_name: input.last_name,
                section: input.section,
                monthly_fee: input.monthly_fee.unwrap_or(default_monthly),
                registration_fee: input.registration_fee.unwrap_or(default_registration),
                enrolled_at,
            },
        );
        self.directory.insert_child(&child).await?;
        info!(
            child_id = %child.id,
            registration_number = %child.registration_number,
            "Child enrolled"
        );

        let registration = match self.record_registration_charge(tenant, &child).await {
            Ok(receipt) => receipt,
            Err(e) => {
                warn!(child_id = %child.id, error = %e, "Registration charge failed");
                None
            }
        };

        Ok(Enrollment {
            child,
            registration,
        })
    }

    /// Settled registration payment plus PAID invoice. Nothing is written
    /// when the fee is zero.
    #[instrument(
        skip(self, tenant, child),
        fields(service = "creche-service", child_id = %child.id)
    )]
    pub async fn record_registration_charge(
        &self,
        tenant: &TenantContext,
        child: &Child,
    ) -> Result<Option<ChargeReceipt>, AppError> {
        let fee = child.registration_fee;
        if fee <= 0 {
            return Ok(None);
        }

        let now = Utc::now();
        let period = Period::of(now);
        let payment = Payment::settled(PaymentDraft {
            creche_id: tenant.creche_id.clone(),
            category: PaymentCategory::RegistrationFee,
            subject: PaymentSubject::Child(child.id.clone()),
            amount: fee,
            method: PaymentMethod::Cash,
            description: format!("Registration fee - {}", child.full_name()),
            date: now,
            period: Some(period),
            reference: None,
            notes: None,
            recorded_by: tenant.user_id.clone(),
        })?;
        let invoice = Invoice::paid(
            InvoiceDraft {
                creche_id: tenant.creche_id.clone(),
                child_id: child.id.clone(),
                period,
                amount: fee,
                invoice_type: InvoiceType::Registration,
                description: Some(format!("Registration fee - {}", child.full_name())),
            },
            PaymentMethod::Cash,
            &tenant.user_id,
        )?;

        let receipt = ChargeEvent::new(payment, InvoiceWrite::Create(invoice))
            .commit(self.ledger.as_ref())
            .await?;
        record_payment(PaymentCategory::RegistrationFee, "PAID");
        info!(payment_id = %receipt.payment.id, "Registration charge recorded");
        Ok(Some(receipt))
    }

    #[instrument(
        skip(self, tenant, charge),
        fields(service = "creche-service", child_id = %charge.child_id, period = %charge.period)
    )]
    pub async fn record_monthly_charge(
        &self,
        tenant: &TenantContext,
        charge: MonthlyCharge,
    ) -> Result<ChargeReceipt, AppError> {
        let child = self.require_child(tenant, &charge.child_id).await?;

        let existing = self
            .ledger
            .count_payments(
                &tenant.creche_id,
                &PaymentFilter {
                    category: Some(PaymentCategory::MonthlyFee),
                    child_id: Some(child.id.clone()),
                    period_year: Some(charge.period.year),
                    period_month: Some(charge.period.month),
                    ..Default::default()
                },
            )
            .await?;
        if existing > 0 {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "payment already exists for this period"
            )));
        }

        let amount = match charge.amount {
            Some(amount) => amount,
            None if child.monthly_fee > 0 => child.monthly_fee,
            None => self.tariffs(tenant).await?.1,
        };
        let method = charge.method.unwrap_or(PaymentMethod::Cash);
        let description = format!("Monthly fee {} - {}", charge.period, child.full_name());

        let payment = Payment::settled(PaymentDraft {
            creche_id: tenant.creche_id.clone(),
            category: PaymentCategory::MonthlyFee,
            subject: PaymentSubject::Child(child.id.clone()),
            amount,
            method,
            description: description.clone(),
            date: Utc::now(),
            period: Some(charge.period),
            reference: charge.reference,
            notes: charge.notes,
            recorded_by: tenant.user_id.clone(),
        })?;

        let pending = self
            .ledger
            .list_invoices(
                &tenant.creche_id,
                &InvoiceFilter {
                    status: Some(InvoiceStatus::Pending),
                    child_id: Some(child.id.clone()),
                    invoice_type: Some(InvoiceType::MonthlyFee),
                    month: Some(charge.period.month),
                    year: Some(charge.period.year),
                    created: None,
                },
            )
            .await?
            .into_iter()
            .next();

        let write = match pending {
            Some(mut invoice) => {
                invoice.mark_paid(method, &tenant.user_id);
                InvoiceWrite::Settle(invoice)
            }
            None => InvoiceWrite::Create(Invoice::paid(
                InvoiceDraft {
                    creche_id: tenant.creche_id.clone(),
                    child_id: child.id.clone(),
                    period: charge.period,
                    amount,
                    invoice_type: InvoiceType::MonthlyFee,
                    description: Some(description),
                },
                method,
                &tenant.user_id,
            )?),
        };

        let receipt = ChargeEvent::new(payment, write)
            .commit(self.ledger.as_ref())
            .await?;
        record_payment(PaymentCategory::MonthlyFee, "PAID");
        info!(payment_id = %receipt.payment.id, "Monthly charge recorded");
        Ok(receipt)
    }

    #[instrument(
        skip(self, tenant, request),
        fields(service = "creche-service", category = request.category.as_str())
    )]
    pub async fn create_payment(
        &self,
        tenant: &TenantContext,
        request: PaymentRequest,
    ) -> Result<Payment, AppError> {
        if let Some(kind) = request.kind {
            if kind != request.category.kind() {
                return Err(AppError::BadRequest(anyhow::anyhow!(
                    "category {} is not an {} category",
                    request.category.as_str(),
                    kind.as_str()
                )));
            }
        }

        let subject =
            PaymentSubject::resolve(request.category, request.child_id, request.staff_id)?;
        self.require_subject(tenant, &subject).await?;

        let draft = PaymentDraft {
            creche_id: tenant.creche_id.clone(),
            category: request.category,
            subject,
            amount: request.amount,
            method: request.method,
            description: request.description,
            date: request.date.unwrap_or_else(Utc::now),
            period: request.period,
            reference: request.reference,
            notes: request.notes,
            recorded_by: tenant.user_id.clone(),
        };

        let payment = match request.status.unwrap_or(PaymentStatus::Paid) {
            PaymentStatus::Paid => Payment::settled(draft)?,
            PaymentStatus::Pending => Payment::pending(draft)?,
            PaymentStatus::Partial => {
                let amount_paid = request.amount_paid.ok_or_else(|| {
                    AppError::BadRequest(anyhow::anyhow!(
                        "amount_paid is required for a PARTIAL payment"
                    ))
                })?;
                Payment::partial(draft, amount_paid)?
            }
            PaymentStatus::Cancelled => {
                return Err(AppError::BadRequest(anyhow::anyhow!(
                    "a payment cannot be created as CANCELLED"
                )))
            }
        };

        self.ledger.insert_payment(&payment).await?;
        record_payment(payment.category, payment.status.as_str());
        info!(payment_id = %payment.id, status = payment.status.as_str(), "Payment recorded");
        Ok(payment)
    }

    #[instrument(skip(self, tenant, update), fields(service = "creche-service"))]
    pub async fn update_payment(
        &self,
        tenant: &TenantContext,
        payment_id: &str,
        update: PaymentUpdate,
    ) -> Result<Payment, AppError> {
        let current = self.require_payment(tenant, payment_id).await?;
        if current.status == PaymentStatus::Cancelled {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "cancelled payments cannot be modified"
            )));
        }

        let category = update.category.unwrap_or(current.category);
        let kind_changed = category.kind() != current.kind;
        let child_id = update
            .child_id
            .or_else(|| (!kind_changed).then(|| current.child_id.clone()).flatten());
        let staff_id = update
            .staff_id
            .or_else(|| (!kind_changed).then(|| current.staff_id.clone()).flatten());
        let subject = PaymentSubject::resolve(category, child_id, staff_id)?;
        if subject != current.subject() {
            self.require_subject(tenant, &subject).await?;
        }

        let mut payment = current.clone();
        payment.category = category;
        payment.kind = category.kind();
        payment.child_id = subject.child_id().map(str::to_string);
        payment.staff_id = subject.staff_id().map(str::to_string);
        if let Some(method) = update.method {
            payment.method = method;
        }
        if let Some(description) = update.description {
            let description = description.trim().to_string();
            if description.is_empty() {
                return Err(AppError::BadRequest(anyhow::anyhow!(
                    "description is required"
                )));
            }
            payment.description = description;
        }
        if let Some(date) = update.date {
            payment.date = date;
        }
        if update.period.is_some() {
            payment.period = update.period;
        }
        if update.reference.is_some() {
            payment.reference = update.reference;
        }
        if update.notes.is_some() {
            payment.notes = update.notes;
        }
        if payment.category == PaymentCategory::MonthlyFee && payment.period.is_none() {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "a period is required for MONTHLY_FEE payments"
            )));
        }

        if let Some(amount) = update.amount {
            check_amount(amount)?;
            payment.amount = amount;
        }
        let amount_paid = match (update.amount_paid, current.status) {
            (Some(amount_paid), _) => amount_paid,
            (None, PaymentStatus::Paid) => payment.amount,
            (None, _) => current.amount_paid,
        };
        payment.apply_amount_paid(amount_paid)?;

        if !self
            .ledger
            .replace_payment_if(&payment, &[current.status])
            .await?
        {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "payment {} was modified concurrently",
                payment_id
            )));
        }
        info!(payment_id = %payment.id, "Payment updated");
        Ok(payment)
    }

    /// PENDING or PARTIAL → PAID, then settles the matching PENDING invoice.
    #[instrument(skip(self, tenant), fields(service = "creche-service"))]
    pub async fn validate_payment(
        &self,
        tenant: &TenantContext,
        payment_id: &str,
    ) -> Result<ValidatedPayment, AppError> {
        let mut payment = self.require_payment(tenant, payment_id).await?;
        match payment.status {
            PaymentStatus::Paid => {
                record_validation("payment", "conflict");
                return Err(AppError::Conflict(anyhow::anyhow!(
                    "payment is already validated"
                )));
            }
            PaymentStatus::Cancelled => {
                record_validation("payment", "conflict");
                return Err(AppError::Conflict(anyhow::anyhow!(
                    "a cancelled payment cannot be validated"
                )));
            }
            PaymentStatus::Pending | PaymentStatus::Partial => {}
        }

        let previous = payment.status;
        payment.settle();
        if !self
            .ledger
            .replace_payment_if(&payment, &[previous])
            .await?
        {
            record_validation("payment", "conflict");
            return Err(AppError::Conflict(anyhow::anyhow!(
                "payment is already validated"
            )));
        }
        record_validation("payment", "ok");
        info!(payment_id = %payment.id, "Payment validated");

        let invoice = self.settle_sibling_invoice(tenant, &payment).await;
        Ok(ValidatedPayment { payment, invoice })
    }

    /// The payment is already settled at this point; failures here are
    /// recorded for reconciliation instead of failing the validation.
    async fn settle_sibling_invoice(
        &self,
        tenant: &TenantContext,
        payment: &Payment,
    ) -> Option<Invoice> {
        let child_id = payment.child_id.clone()?;
        let mut filter = InvoiceFilter {
            status: Some(InvoiceStatus::Pending),
            child_id: Some(child_id),
            ..Default::default()
        };
        match payment.category {
            PaymentCategory::RegistrationFee => {
                filter.invoice_type = Some(InvoiceType::Registration);
            }
            PaymentCategory::MonthlyFee => {
                let period = payment.period?;
                filter.invoice_type = Some(InvoiceType::MonthlyFee);
                filter.month = Some(period.month);
                filter.year = Some(period.year);
            }
            _ => return None,
        }

        let result = async {
            let Some(mut invoice) = self
                .ledger
                .list_invoices(&tenant.creche_id, &filter)
                .await?
                .into_iter()
                .next()
            else {
                return Ok(None);
            };
            invoice.mark_paid(payment.method, &tenant.user_id);
            let settled = self
                .ledger
                .replace_invoice_if(&invoice, &[InvoiceStatus::Pending])
                .await?;
            Ok::<_, AppError>(settled.then_some(invoice))
        }
        .await;

        match result {
            Ok(Some(invoice)) => {
                info!(invoice_id = %invoice.id, "Sibling invoice settled");
                Some(invoice)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(payment_id = %payment.id, error = %e, "Failed to settle sibling invoice");
                let marker = ReconciliationMarker::new(
                    tenant.creche_id.clone(),
                    payment.id.clone(),
                    String::new(),
                    payment.child_id.clone(),
                    format!("sibling invoice not settled after payment validation: {}", e),
                );
                if let Err(e) = self.ledger.insert_reconciliation(&marker).await {
                    tracing::error!(error = %e, "Failed to record reconciliation marker");
                }
                None
            }
        }
    }

    #[instrument(skip(self, tenant), fields(service = "creche-service"))]
    pub async fn cancel_payment(
        &self,
        tenant: &TenantContext,
        payment_id: &str,
    ) -> Result<Payment, AppError> {
        let mut payment = self.require_payment(tenant, payment_id).await?;
        if payment.status == PaymentStatus::Cancelled {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "payment is already cancelled"
            )));
        }
        let previous = payment.status;
        payment.cancel();
        if !self
            .ledger
            .replace_payment_if(&payment, &[previous])
            .await?
        {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "payment {} was modified concurrently",
                payment_id
            )));
        }
        info!(payment_id = %payment.id, "Payment cancelled");
        Ok(payment)
    }

    #[instrument(skip(self, tenant), fields(service = "creche-service", role = ?tenant.role))]
    pub async fn delete_payment(
        &self,
        tenant: &TenantContext,
        payment_id: &str,
    ) -> Result<Payment, AppError> {
        if !tenant.role.can_delete_ledger_entries() {
            return Err(AppError::Forbidden(anyhow::anyhow!(
                "only administrators and directors may delete payments"
            )));
        }
        let payment = self
            .ledger
            .delete_payment(&tenant.creche_id, payment_id)
            .await?
            .ok_or_else(|| not_found("payment", payment_id))?;
        warn!(payment_id = %payment.id, user_id = %tenant.user_id, "Payment deleted");
        Ok(payment)
    }

    pub async fn get_payment(
        &self,
        tenant: &TenantContext,
        payment_id: &str,
    ) -> Result<Payment, AppError> {
        self.require_payment(tenant, payment_id).await
    }

    pub async fn list_payments(
        &self,
        tenant: &TenantContext,
        filter: &PaymentFilter,
    ) -> Result<Vec<Payment>, AppError> {
        self.ledger.list_payments(&tenant.creche_id, filter).await
    }

    pub async fn list_child_payments(
        &self,
        tenant: &TenantContext,
        child_id: &str,
    ) -> Result<Vec<Payment>, AppError> {
        let child = self.require_child(tenant, child_id).await?;
        self.ledger
            .list_payments(
                &tenant.creche_id,
                &PaymentFilter {
                    child_id: Some(child.id),
                    ..Default::default()
                },
            )
            .await
    }

    pub async fn payment_receipt(
        &self,
        tenant: &TenantContext,
        payment_id: &str,
    ) -> Result<PaymentReceipt, AppError> {
        let payment = self.require_payment(tenant, payment_id).await?;
        if payment.status != PaymentStatus::Paid {
            return Err(AppError::NotFound(anyhow::anyhow!(
                "no receipt for payment {}: it is {}",
                payment_id,
                payment.status.as_str()
            )));
        }
        let creche = self.directory.get_creche(&tenant.creche_id).await?;
        let child = match &payment.child_id {
            Some(id) => self.directory.get_child(&tenant.creche_id, id).await?,
            None => None,
        };
        let staff = match &payment.staff_id {
            Some(id) => self.directory.get_staff(&tenant.creche_id, id).await?,
            None => None,
        };
        Ok(PaymentReceipt {
            payment,
            creche,
            child,
            staff,
        })
    }

    #[instrument(
        skip(self, tenant, request),
        fields(service = "creche-service", child_id = %request.child_id)
    )]
    pub async fn create_invoice(
        &self,
        tenant: &TenantContext,
        request: InvoiceRequest,
    ) -> Result<Invoice, AppError> {
        let child = self.require_child(tenant, &request.child_id).await?;
        let amount = match (request.amount, request.invoice_type) {
            (Some(amount), _) => amount,
            (None, InvoiceType::MonthlyFee) if child.monthly_fee > 0 => child.monthly_fee,
            (None, InvoiceType::Registration) if child.registration_fee > 0 => {
                child.registration_fee
            }
            (None, _) => {
                return Err(AppError::BadRequest(anyhow::anyhow!(
                    "amount is required for {} invoices",
                    request.invoice_type.as_str()
                )))
            }
        };

        let invoice = Invoice::pending(InvoiceDraft {
            creche_id: tenant.creche_id.clone(),
            child_id: child.id,
            period: request.period,
            amount,
            invoice_type: request.invoice_type,
            description: request.description,
        })?;
        self.ledger.insert_invoice(&invoice).await?;
        info!(invoice_id = %invoice.id, "Invoice issued");
        Ok(invoice)
    }

    /// PENDING → PAID with a freshly numbered receipt. The receipt is
    /// produced before any state changes, so a generator failure leaves the
    /// invoice untouched.
    #[instrument(skip(self, tenant), fields(service = "creche-service"))]
    pub async fn validate_invoice(
        &self,
        tenant: &TenantContext,
        invoice_id: &str,
        method: PaymentMethod,
    ) -> Result<Invoice, AppError> {
        let mut invoice = self.require_invoice(tenant, invoice_id).await?;
        match invoice.status {
            InvoiceStatus::Paid => {
                record_validation("invoice", "conflict");
                return Err(AppError::Conflict(anyhow::anyhow!("invoice is already paid")));
            }
            InvoiceStatus::Cancelled => {
                record_validation("invoice", "conflict");
                return Err(AppError::Conflict(anyhow::anyhow!("invoice is cancelled")));
            }
            InvoiceStatus::Pending => {}
        }

        let child = self
            .directory
            .get_child(&tenant.creche_id, &invoice.child_id)
            .await?;
        let creche = self.directory.get_creche(&tenant.creche_id).await?;

        let now = Utc::now();
        let year = now.year();
        let seq = self
            .ledger
            .next_sequence(&tenant.creche_id, SequenceKind::InvoiceReceipt, year)
            .await?;
        let receipt_number = SequenceKind::InvoiceReceipt.format(year, seq);

        let data = ReceiptData {
            creche_name: creche
                .map(|c| c.name)
                .unwrap_or_else(|| tenant.creche_id.clone()),
            child_name: child
                .as_ref()
                .map(Child::full_name)
                .unwrap_or_else(|| invoice.child_id.clone()),
            registration_number: child
                .map(|c| c.registration_number)
                .unwrap_or_default(),
            invoice_type: invoice.invoice_type,
            period: invoice.period(),
            amount: invoice.amount,
            method,
            issued_at: now,
        };
        let receipt_ref = self
            .renderer
            .render(&data, &receipt_number, &tenant.user_id)
            .await
            .map_err(|e| {
                record_validation("invoice", "upstream_error");
                warn!(invoice_id = %invoice.id, error = %e, "Receipt generation failed");
                match e {
                    AppError::Upstream(_) => e,
                    other => AppError::Upstream(anyhow::anyhow!(
                        "receipt generation failed: {}",
                        other
                    )),
                }
            })?;

        invoice.mark_paid(method, &tenant.user_id);
        invoice.attach_receipt(receipt_number, receipt_ref);
        if !self
            .ledger
            .replace_invoice_if(&invoice, &[InvoiceStatus::Pending])
            .await?
        {
            record_validation("invoice", "conflict");
            return Err(AppError::Conflict(anyhow::anyhow!("invoice is already paid")));
        }

        record_validation("invoice", "ok");
        info!(
            invoice_id = %invoice.id,
            receipt_number = invoice.receipt_number.as_deref().unwrap_or_default(),
            "Invoice validated"
        );
        Ok(invoice)
    }

    #[instrument(skip(self, tenant), fields(service = "creche-service"))]
    pub async fn cancel_invoice(
        &self,
        tenant: &TenantContext,
        invoice_id: &str,
    ) -> Result<Invoice, AppError> {
        let mut invoice = self.require_invoice(tenant, invoice_id).await?;
        if invoice.status != InvoiceStatus::Pending {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "only pending invoices can be cancelled (invoice is {})",
                invoice.status.as_str()
            )));
        }
        invoice.cancel();
        if !self
            .ledger
            .replace_invoice_if(&invoice, &[InvoiceStatus::Pending])
            .await?
        {
            return Err(AppError::Conflict(anyhow::anyhow!(
                "invoice {} was modified concurrently",
                invoice_id
            )));
        }
        info!(invoice_id = %invoice.id, "Invoice cancelled");
        Ok(invoice)
    }

    pub async fn get_invoice(
        &self,
        tenant: &TenantContext,
        invoice_id: &str,
    ) -> Result<Invoice, AppError> {
        self.require_invoice(tenant, invoice_id).await
    }

    pub async fn list_invoices(
        &self,
        tenant: &TenantContext,
        filter: &InvoiceFilter,
    ) -> Result<Vec<Invoice>, AppError> {
        self.ledger.list_invoices(&tenant.creche_id, filter).await
    }

    #[instrument(skip(self, tenant, salary), fields(service = "creche-service", period = %salary.period))]
    pub async fn pay_staff_salary(
        &self,
        tenant: &TenantContext,
        staff_id: &str,
        salary: SalaryPayment,
    ) -> Result<Payment, AppError> {
        let staff = self.require_staff(tenant, staff_id).await?;
        if !staff.is_active() {
            return Err(AppError::InactiveEntity(anyhow::anyhow!(
                "staff member {} is {}",
                staff.full_name(),
                staff.status.as_str()
            )));
        }

        let description = salary
            .description
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| format!("Salary {} - {}", salary.period, staff.full_name()));
        let payment = Payment::settled(PaymentDraft {
            creche_id: tenant.creche_id.clone(),
            category: PaymentCategory::Salaries,
            subject: PaymentSubject::Staff(staff.id.clone()),
            amount: salary.amount.unwrap_or(staff.salary),
            method: salary.method.unwrap_or(PaymentMethod::BankTransfer),
            description,
            date: Utc::now(),
            period: Some(salary.period),
            reference: None,
            notes: salary.notes,
            recorded_by: tenant.user_id.clone(),
        })?;

        self.ledger.insert_payment(&payment).await?;
        record_payment(PaymentCategory::Salaries, "PAID");
        info!(payment_id = %payment.id, staff_id = %staff.id, "Salary paid");
        Ok(payment)
    }

    pub async fn salary_history(
        &self,
        tenant: &TenantContext,
        staff_id: &str,
    ) -> Result<Vec<Payment>, AppError> {
        let staff = self.require_staff(tenant, staff_id).await?;
        self.ledger
            .list_payments(
                &tenant.creche_id,
                &PaymentFilter {
                    category: Some(PaymentCategory::Salaries),
                    staff_id: Some(staff.id),
                    ..Default::default()
                },
            )
            .await
    }
}
