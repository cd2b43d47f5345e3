//! Receipt generation for settled invoices.

use super::storage::Storage;
use crate::models::{InvoiceType, PaymentMethod, Period};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use service_core::error::AppError;
use std::fmt::Write as _;
use std::sync::Arc;

/// What a receipt shows.
#[derive(Debug, Clone)]
pub struct ReceiptData {
    pub creche_name: String,
    pub child_name: String,
    pub registration_number: String,
    pub invoice_type: InvoiceType,
    pub period: Period,
    pub amount: i64,
    pub method: PaymentMethod,
    pub issued_at: DateTime<Utc>,
}

/// Produces a receipt document and returns a reference to it.
#[async_trait]
pub trait ReceiptRenderer: Send + Sync {
    async fn render(
        &self,
        receipt: &ReceiptData,
        receipt_number: &str,
        actor_id: &str,
    ) -> Result<String, AppError>;
}

pub const RECEIPT_PREFIX: &str = "receipts";

/// Writes plain-text receipts through a [`Storage`] backend.
pub struct StoredReceiptRenderer {
    storage: Arc<dyn Storage>,
}

impl StoredReceiptRenderer {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub fn key_for(receipt_number: &str) -> String {
        format!("{}/recu_{}.txt", RECEIPT_PREFIX, receipt_number)
    }
}

pub fn render_text(receipt: &ReceiptData, receipt_number: &str, actor_id: &str) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail
    let _ = writeln!(out, "{}", receipt.creche_name);
    let _ = writeln!(out, "RECEIPT {}", receipt_number);
    let _ = writeln!(out, "Issued: {}", receipt.issued_at.format("%Y-%m-%d %H:%M UTC"));
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Child: {} ({})",
        receipt.child_name, receipt.registration_number
    );
    let _ = writeln!(out, "Type: {}", receipt.invoice_type.as_str());
    let _ = writeln!(out, "Period: {}", receipt.period);
    let _ = writeln!(out, "Amount: {}", receipt.amount);
    let _ = writeln!(out, "Method: {}", receipt.method.as_str());
    let _ = writeln!(out, "Validated by: {}", actor_id);
    out
}

#[async_trait]
impl ReceiptRenderer for StoredReceiptRenderer {
    #[tracing::instrument(skip(self, receipt), fields(receipt_number = %receipt_number))]
    async fn render(
        &self,
        receipt: &ReceiptData,
        receipt_number: &str,
        actor_id: &str,
    ) -> Result<String, AppError> {
        let key = Self::key_for(receipt_number);
        let body = render_text(receipt, receipt_number, actor_id);
        self.storage
            .upload(&key, body.into_bytes())
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to store receipt");
                AppError::Upstream(anyhow::anyhow!("receipt generation failed: {}", e))
            })?;
        tracing::info!(key = %key, "Receipt stored");
        Ok(key)
    }
}
