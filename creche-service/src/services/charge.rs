//! Paired payment + invoice writes.
//!
//! The store has no multi-document transactions, so a charge is written as
//! a saga: payment first, then the invoice. When the invoice write fails the
//! payment is deleted again; when that also fails a reconciliation marker is
//! persisted so the orphan can be found.

use super::metrics::record_compensation;
use super::store::LedgerStore;
use crate::models::{Invoice, InvoiceStatus, Payment, ReconciliationMarker};
use service_core::error::AppError;
use tracing::{error, info, warn};

#[derive(Debug, Clone)]
pub struct ChargeReceipt {
    pub payment: Payment,
    pub invoice: Invoice,
}

#[derive(Debug, Clone)]
pub enum InvoiceWrite {
    /// Insert a new invoice.
    Create(Invoice),
    /// Replace an existing PENDING invoice with its settled form.
    Settle(Invoice),
}

impl InvoiceWrite {
    fn invoice(&self) -> &Invoice {
        match self {
            InvoiceWrite::Create(invoice) | InvoiceWrite::Settle(invoice) => invoice,
        }
    }

    fn into_invoice(self) -> Invoice {
        match self {
            InvoiceWrite::Create(invoice) | InvoiceWrite::Settle(invoice) => invoice,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChargeEvent {
    payment: Payment,
    invoice: InvoiceWrite,
}

impl ChargeEvent {
    pub fn new(payment: Payment, invoice: InvoiceWrite) -> Self {
        Self { payment, invoice }
    }

    pub async fn commit(self, ledger: &dyn LedgerStore) -> Result<ChargeReceipt, AppError> {
        ledger.insert_payment(&self.payment).await?;

        let written = match &self.invoice {
            InvoiceWrite::Create(invoice) => ledger.insert_invoice(invoice).await,
            InvoiceWrite::Settle(invoice) => {
                match ledger
                    .replace_invoice_if(invoice, &[InvoiceStatus::Pending])
                    .await
                {
                    Ok(true) => Ok(()),
                    Ok(false) => Err(AppError::Conflict(anyhow::anyhow!(
                        "invoice {} is no longer pending",
                        invoice.id
                    ))),
                    Err(e) => Err(e),
                }
            }
        };

        match written {
            Ok(()) => Ok(ChargeReceipt {
                payment: self.payment,
                invoice: self.invoice.into_invoice(),
            }),
            Err(err) => {
                self.compensate(ledger, &err).await;
                Err(err)
            }
        }
    }

    async fn compensate(&self, ledger: &dyn LedgerStore, cause: &AppError) {
        let invoice = self.invoice.invoice();
        warn!(
            payment_id = %self.payment.id,
            invoice_id = %invoice.id,
            error = %cause,
            "Invoice write failed, rolling back payment"
        );

        let reason = match ledger
            .delete_payment(&self.payment.creche_id, &self.payment.id)
            .await
        {
            Ok(Some(_)) => {
                record_compensation("rolled_back");
                info!(payment_id = %self.payment.id, "Payment rolled back");
                return;
            }
            Ok(None) => format!("payment vanished before rollback; invoice write failed: {}", cause),
            Err(e) => format!("rollback failed ({}); invoice write failed: {}", e, cause),
        };

        let marker = ReconciliationMarker::new(
            self.payment.creche_id.clone(),
            self.payment.id.clone(),
            invoice.id.clone(),
            self.payment.child_id.clone(),
            reason,
        );
        match ledger.insert_reconciliation(&marker).await {
            Ok(()) => {
                record_compensation("marked");
                warn!(marker_id = %marker.id, "Reconciliation marker recorded");
            }
            Err(e) => {
                record_compensation("lost");
                error!(
                    payment_id = %self.payment.id,
                    error = %e,
                    "Failed to record reconciliation marker"
                );
            }
        }
    }
}
