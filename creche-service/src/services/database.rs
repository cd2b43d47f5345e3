use super::store::{
    CategoryTotal, DateRange, DirectoryStore, InvoiceFilter, LedgerStore, PaymentFilter,
    PresenceFilter,
};
use crate::models::{
    Child, ChildStatus, Counter, Creche, Invoice, InvoiceStatus, Payment, PaymentCategory,
    PaymentKind, PaymentStatus, Presence, ReconciliationMarker, SequenceKind, Staff, StaffStatus,
};
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{self, doc, Bson, Document},
    options::{
        FindOneAndUpdateOptions, FindOptions, IndexOptions, ReplaceOptions, ReturnDocument,
    },
    Client as MongoClient, Collection, Database, IndexModel,
};
use serde::Deserialize;
use service_core::error::{is_duplicate_key, AppError};

#[derive(Clone)]
pub struct MongoDb {
    client: MongoClient,
    db: Database,
}

impl MongoDb {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, AppError> {
        tracing::info!(database = %database, "Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri).await.map_err(|e| {
            tracing::error!("Failed to connect to MongoDB: {}", e);
            AppError::from(e)
        })?;
        let db = client.database(database);
        tracing::info!(database = %database, "Successfully connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), AppError> {
        tracing::info!("Creating MongoDB indexes for creche-service");

        self.create_index(
            &self.payments(),
            doc! { "creche_id": 1, "date": -1 },
            "tenant_date_lookup",
            None,
        )
        .await?;
        self.create_index(
            &self.payments(),
            doc! { "creche_id": 1, "child_id": 1, "category": 1 },
            "tenant_child_lookup",
            None,
        )
        .await?;
        self.create_index(
            &self.payments(),
            doc! { "creche_id": 1, "staff_id": 1, "date": -1 },
            "tenant_staff_lookup",
            None,
        )
        .await?;
        // One monthly fee per child and period
        self.create_index(
            &self.payments(),
            doc! { "creche_id": 1, "child_id": 1, "period.month": 1, "period.year": 1 },
            "unique_monthly_fee",
            Some(doc! { "category": PaymentCategory::MonthlyFee.as_str() }),
        )
        .await?;

        // Cancelled invoices release their period; partial `$in` needs MongoDB 6.0+
        self.create_index(
            &self.invoices(),
            doc! { "creche_id": 1, "child_id": 1, "month": 1, "year": 1, "invoice_type": 1 },
            "unique_open_invoice_period",
            Some(doc! {
                "status": {
                    "$in": [InvoiceStatus::Pending.as_str(), InvoiceStatus::Paid.as_str()]
                }
            }),
        )
        .await?;
        self.create_index(
            &self.invoices(),
            doc! { "creche_id": 1, "status": 1 },
            "tenant_status_lookup",
            None,
        )
        .await?;

        self.create_index(
            &self.children(),
            doc! { "creche_id": 1, "registration_number": 1 },
            "unique_registration_number",
            Some(doc! {}),
        )
        .await?;
        self.create_index(
            &self.staff(),
            doc! { "creche_id": 1, "status": 1 },
            "tenant_status_lookup",
            None,
        )
        .await?;
        self.create_index(
            &self.presences(),
            doc! { "creche_id": 1, "date": 1, "kind": 1, "child_id": 1, "staff_id": 1 },
            "unique_daily_presence",
            Some(doc! {}),
        )
        .await?;
        self.create_index(
            &self.reconciliations(),
            doc! { "creche_id": 1, "created_at": -1 },
            "tenant_created_lookup",
            None,
        )
        .await?;

        Ok(())
    }

    /// `unique` carries the partial filter for a unique index; an empty
    /// document means unique over the whole collection.
    async fn create_index<T>(
        &self,
        collection: &Collection<T>,
        keys: Document,
        name: &str,
        unique: Option<Document>,
    ) -> Result<(), AppError> {
        let mut options = IndexOptions::builder().name(name.to_string()).build();
        if let Some(partial) = unique {
            options.unique = Some(true);
            if !partial.is_empty() {
                options.partial_filter_expression = Some(partial);
            }
        }
        let index = IndexModel::builder().keys(keys).options(options).build();

        collection.create_index(index, None).await.map_err(|e| {
            tracing::error!(
                "Failed to create index {} on {} collection: {}",
                name,
                collection.name(),
                e
            );
            AppError::from(e)
        })?;
        tracing::info!("Created index {}.{}", collection.name(), name);
        Ok(())
    }

    pub fn payments(&self) -> Collection<Payment> {
        self.db.collection("payments")
    }

    pub fn invoices(&self) -> Collection<Invoice> {
        self.db.collection("invoices")
    }

    pub fn counters(&self) -> Collection<Counter> {
        self.db.collection("counters")
    }

    pub fn reconciliations(&self) -> Collection<ReconciliationMarker> {
        self.db.collection("reconciliations")
    }

    pub fn children(&self) -> Collection<Child> {
        self.db.collection("children")
    }

    pub fn staff(&self) -> Collection<Staff> {
        self.db.collection("staff")
    }

    pub fn creches(&self) -> Collection<Creche> {
        self.db.collection("creches")
    }

    pub fn presences(&self) -> Collection<Presence> {
        self.db.collection("presences")
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

fn range_doc(range: &DateRange) -> Document {
    doc! {
        "$gte": bson::DateTime::from_chrono(range.start),
        "$lt": bson::DateTime::from_chrono(range.end),
    }
}

fn payment_filter_doc(creche_id: &str, filter: &PaymentFilter) -> Document {
    let mut query = doc! { "creche_id": creche_id };
    if let Some(kind) = filter.kind {
        query.insert("kind", kind.as_str());
    }
    if let Some(category) = filter.category {
        query.insert("category", category.as_str());
    }
    if let Some(child_id) = &filter.child_id {
        query.insert("child_id", child_id);
    }
    if let Some(staff_id) = &filter.staff_id {
        query.insert("staff_id", staff_id);
    }
    if !filter.statuses.is_empty() {
        let statuses: Vec<&str> = filter.statuses.iter().map(|s| s.as_str()).collect();
        query.insert("status", doc! { "$in": statuses });
    }
    if let Some(range) = &filter.range {
        query.insert("date", range_doc(range));
    }
    if let Some(year) = filter.period_year {
        query.insert("period.year", year);
    }
    match (filter.period_month, filter.period_month_before) {
        (Some(month), _) => {
            query.insert("period.month", month);
        }
        (None, Some(before)) => {
            query.insert("period.month", doc! { "$lt": before });
        }
        (None, None) => {}
    }
    query
}

fn invoice_filter_doc(creche_id: &str, filter: &InvoiceFilter) -> Document {
    let mut query = doc! { "creche_id": creche_id };
    if let Some(status) = filter.status {
        query.insert("status", status.as_str());
    }
    if let Some(child_id) = &filter.child_id {
        query.insert("child_id", child_id);
    }
    if let Some(invoice_type) = filter.invoice_type {
        query.insert("invoice_type", invoice_type.as_str());
    }
    if let Some(month) = filter.month {
        query.insert("month", month);
    }
    if let Some(year) = filter.year {
        query.insert("year", year);
    }
    if let Some(range) = &filter.created {
        query.insert("created_at", range_doc(range));
    }
    query
}

fn presence_filter_doc(creche_id: &str, filter: &PresenceFilter) -> Document {
    let mut query = doc! { "creche_id": creche_id };
    if let Some(kind) = filter.kind {
        query.insert("kind", kind.as_str());
    }
    if let Some(child_id) = &filter.child_id {
        query.insert("child_id", child_id);
    }
    if let Some(staff_id) = &filter.staff_id {
        query.insert("staff_id", staff_id);
    }
    if !filter.statuses.is_empty() {
        let statuses: Vec<&str> = filter.statuses.iter().map(|s| s.as_str()).collect();
        query.insert("status", doc! { "$in": statuses });
    }
    if let Some(range) = &filter.range {
        query.insert("date", range_doc(range));
    }
    query
}

fn status_in<'a>(statuses: impl IntoIterator<Item = &'a str>) -> Bson {
    Bson::Document(doc! { "$in": statuses.into_iter().collect::<Vec<_>>() })
}

fn conflict_on_duplicate(err: mongodb::error::Error, message: &str) -> AppError {
    if is_duplicate_key(&err) {
        AppError::Conflict(anyhow::anyhow!(message.to_string()))
    } else {
        AppError::from(err)
    }
}

#[derive(Deserialize)]
struct CategoryKey {
    kind: PaymentKind,
    category: PaymentCategory,
}

#[derive(Deserialize)]
struct CategoryRow {
    #[serde(rename = "_id")]
    key: CategoryKey,
    total: i64,
    count: i64,
}

#[async_trait]
impl LedgerStore for MongoDb {
    async fn health_check(&self) -> Result<(), AppError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| {
                tracing::error!("MongoDB health check failed: {}", e);
                AppError::from(e)
            })?;
        Ok(())
    }

    async fn insert_payment(&self, payment: &Payment) -> Result<(), AppError> {
        self.payments()
            .insert_one(payment, None)
            .await
            .map_err(|e| conflict_on_duplicate(e, "payment already exists for this period"))?;
        Ok(())
    }

    async fn get_payment(&self, creche_id: &str, id: &str) -> Result<Option<Payment>, AppError> {
        Ok(self
            .payments()
            .find_one(doc! { "_id": id, "creche_id": creche_id }, None)
            .await?)
    }

    async fn list_payments(
        &self,
        creche_id: &str,
        filter: &PaymentFilter,
    ) -> Result<Vec<Payment>, AppError> {
        let options = FindOptions::builder()
            .sort(doc! { "date": -1, "created_at": -1 })
            .build();
        let cursor = self
            .payments()
            .find(payment_filter_doc(creche_id, filter), options)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn count_payments(
        &self,
        creche_id: &str,
        filter: &PaymentFilter,
    ) -> Result<u64, AppError> {
        Ok(self
            .payments()
            .count_documents(payment_filter_doc(creche_id, filter), None)
            .await?)
    }

    async fn replace_payment_if(
        &self,
        payment: &Payment,
        expected: &[PaymentStatus],
    ) -> Result<bool, AppError> {
        let filter = doc! {
            "_id": &payment.id,
            "creche_id": &payment.creche_id,
            "status": status_in(expected.iter().map(|s| s.as_str())),
        };
        let result = self
            .payments()
            .replace_one(filter, payment, ReplaceOptions::default())
            .await
            .map_err(|e| conflict_on_duplicate(e, "payment already exists for this period"))?;
        Ok(result.matched_count == 1)
    }

    async fn delete_payment(
        &self,
        creche_id: &str,
        id: &str,
    ) -> Result<Option<Payment>, AppError> {
        Ok(self
            .payments()
            .find_one_and_delete(doc! { "_id": id, "creche_id": creche_id }, None)
            .await?)
    }

    async fn category_totals(
        &self,
        creche_id: &str,
        range: &DateRange,
    ) -> Result<Vec<CategoryTotal>, AppError> {
        let pipeline = vec![
            doc! { "$match": {
                "creche_id": creche_id,
                "status": { "$ne": PaymentStatus::Cancelled.as_str() },
                "date": range_doc(range),
            }},
            doc! { "$group": {
                "_id": { "kind": "$kind", "category": "$category" },
                "total": { "$sum": "$amount_paid" },
                "count": { "$sum": 1 },
            }},
            doc! { "$sort": { "_id.kind": 1, "_id.category": 1 } },
        ];

        let mut cursor = self.payments().aggregate(pipeline, None).await?;
        let mut totals = Vec::new();
        while let Some(row) = cursor.try_next().await? {
            let row: CategoryRow = bson::from_document(row).map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Malformed category total: {}", e))
            })?;
            totals.push(CategoryTotal {
                kind: row.key.kind,
                category: row.key.category,
                total: row.total,
                count: row.count.max(0) as u64,
            });
        }
        // Keep the enum order the in-memory fold produces
        totals.sort_by(|a, b| (a.kind, a.category).cmp(&(b.kind, b.category)));
        Ok(totals)
    }

    async fn insert_invoice(&self, invoice: &Invoice) -> Result<(), AppError> {
        self.invoices()
            .insert_one(invoice, None)
            .await
            .map_err(|e| {
                conflict_on_duplicate(
                    e,
                    "an invoice of this type already exists for this child and period",
                )
            })?;
        Ok(())
    }

    async fn get_invoice(&self, creche_id: &str, id: &str) -> Result<Option<Invoice>, AppError> {
        Ok(self
            .invoices()
            .find_one(doc! { "_id": id, "creche_id": creche_id }, None)
            .await?)
    }

    async fn list_invoices(
        &self,
        creche_id: &str,
        filter: &InvoiceFilter,
    ) -> Result<Vec<Invoice>, AppError> {
        let options = FindOptions::builder()
            .sort(doc! { "year": -1, "month": -1, "created_at": -1 })
            .build();
        let cursor = self
            .invoices()
            .find(invoice_filter_doc(creche_id, filter), options)
            .await?;
        Ok(cursor.try_collect().await?)
    }

    async fn replace_invoice_if(
        &self,
        invoice: &Invoice,
        expected: &[InvoiceStatus],
    ) -> Result<bool, AppError> {
        let filter = doc! {
            "_id": &invoice.id,
            "creche_id": &invoice.creche_id,
            "status": status_in(expected.iter().map(|s| s.as_str())),
        };
        let result = self
            .invoices()
            .replace_one(filter, invoice, ReplaceOptions::default())
            .await?;
        Ok(result.matched_count == 1)
    }

    async fn next_sequence(
        &self,
        creche_id: &str,
        kind: SequenceKind,
        year: i32,
    ) -> Result<u64, AppError> {
        let options = FindOneAndUpdateOptions::builder()
            .upsert(true)
            .return_document(ReturnDocument::After)
            .build();
        let counter = self
            .counters()
            .find_one_and_update(
                doc! { "_id": kind.key(creche_id, year) },
                doc! { "$inc": { "seq": 1_i64 } },
                options,
            )
            .await?
            .ok_or_else(|| {
                AppError::DatabaseError(anyhow::anyhow!(
                    "Counter upsert returned no document for {}",
                    kind.key(creche_id, year)
                ))
            })?;
        Ok(counter.seq.max(0) as u64)
    }

    async fn insert_reconciliation(&self, marker: &ReconciliationMarker) -> Result<(), AppError> {
        self.reconciliations().insert_one(marker, None).await?;
        Ok(())
    }

    async fn list_reconciliations(
        &self,
        creche_id: &str,
    ) -> Result<Vec<ReconciliationMarker>, AppError> {
        let options = FindOptions::builder().sort(doc! { "created_at": -1 }).build();
        let cursor = self
            .reconciliations()
            .find(doc! { "creche_id": creche_id }, options)
            .await?;
        Ok(cursor.try_collect().await?)
    }
}

#[async_trait]
impl DirectoryStore for MongoDb {
    async fn insert_child(&self, child: &Child) -> Result<(), AppError> {
        self.children()
            .insert_one(child, None)
            .await
            .map_err(|e| conflict_on_duplicate(e, "registration number already in use"))?;
        Ok(())
    }

    async fn get_child(&self, creche_id: &str, id: &str) -> Result<Option<Child>, AppError> {
        Ok(self
            .children()
            .find_one(doc! { "_id": id, "creche_id": creche_id }, None)
            .await?)
    }

    async fn list_children(
        &self,
        creche_id: &str,
        status: Option<ChildStatus>,
    ) -> Result<Vec<Child>, AppError> {
        let mut filter = doc! { "creche_id": creche_id };
        if let Some(status) = status {
            filter.insert("status", status.as_str());
        }
        let options = FindOptions::builder()
            .sort(doc! { "last_name": 1, "first_name": 1 })
            .build();
        let cursor = self.children().find(filter, options).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn count_children(
        &self,
        creche_id: &str,
        status: Option<ChildStatus>,
    ) -> Result<u64, AppError> {
        let mut filter = doc! { "creche_id": creche_id };
        if let Some(status) = status {
            filter.insert("status", status.as_str());
        }
        Ok(self.children().count_documents(filter, None).await?)
    }

    async fn insert_staff(&self, staff: &Staff) -> Result<(), AppError> {
        self.staff().insert_one(staff, None).await?;
        Ok(())
    }

    async fn get_staff(&self, creche_id: &str, id: &str) -> Result<Option<Staff>, AppError> {
        Ok(self
            .staff()
            .find_one(doc! { "_id": id, "creche_id": creche_id }, None)
            .await?)
    }

    async fn list_staff(
        &self,
        creche_id: &str,
        status: Option<StaffStatus>,
    ) -> Result<Vec<Staff>, AppError> {
        let mut filter = doc! { "creche_id": creche_id };
        if let Some(status) = status {
            filter.insert("status", status.as_str());
        }
        let options = FindOptions::builder()
            .sort(doc! { "last_name": 1, "first_name": 1 })
            .build();
        let cursor = self.staff().find(filter, options).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn get_creche(&self, creche_id: &str) -> Result<Option<Creche>, AppError> {
        Ok(self
            .creches()
            .find_one(doc! { "_id": creche_id }, None)
            .await?)
    }

    async fn save_creche(&self, creche: &Creche) -> Result<(), AppError> {
        let options = ReplaceOptions::builder().upsert(true).build();
        self.creches()
            .replace_one(doc! { "_id": &creche.id }, creche, options)
            .await?;
        Ok(())
    }

    async fn insert_presence(&self, presence: &Presence) -> Result<(), AppError> {
        self.presences()
            .insert_one(presence, None)
            .await
            .map_err(|e| {
                conflict_on_duplicate(e, "a presence is already recorded for this day")
            })?;
        Ok(())
    }

    async fn list_presences(
        &self,
        creche_id: &str,
        filter: &PresenceFilter,
    ) -> Result<Vec<Presence>, AppError> {
        let options = FindOptions::builder().sort(doc! { "date": -1 }).build();
        let cursor = self
            .presences()
            .find(presence_filter_doc(creche_id, filter), options)
            .await?;
        Ok(cursor.try_collect().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    #[test]
    fn payment_filter_scopes_by_tenant_and_status() {
        let filter = PaymentFilter {
            category: Some(PaymentCategory::MonthlyFee),
            statuses: vec![PaymentStatus::Pending, PaymentStatus::Partial],
            period_year: Some(2025),
            period_month_before: Some(4),
            ..Default::default()
        };
        let query = payment_filter_doc("creche-1", &filter);

        assert_eq!(query.get_str("creche_id").unwrap(), "creche-1");
        assert_eq!(query.get_str("category").unwrap(), "MONTHLY_FEE");
        assert_eq!(query.get_i32("period.year").unwrap(), 2025);
        let month = query.get_document("period.month").unwrap();
        assert_eq!(month.get_i32("$lt").unwrap(), 4);
        let status = query.get_document("status").unwrap();
        assert_eq!(status.get_array("$in").unwrap().len(), 2);
    }

    #[test]
    fn range_filter_is_half_open() {
        let range = DateRange::day(NaiveDate::from_ymd_opt(2025, 1, 2).unwrap());
        let query = presence_filter_doc(
            "creche-1",
            &PresenceFilter {
                range: Some(range),
                ..Default::default()
            },
        );
        let date = query.get_document("date").unwrap();
        assert!(date.contains_key("$gte"));
        assert!(date.contains_key("$lt"));
        assert!(!date.contains_key("$lte"));
    }

    #[test]
    fn invoice_filter_omits_unset_fields() {
        let query = invoice_filter_doc("creche-1", &InvoiceFilter::default());
        assert_eq!(query.len(), 1);

        let query = invoice_filter_doc(
            "creche-1",
            &InvoiceFilter {
                status: Some(InvoiceStatus::Pending),
                created: Some(DateRange::day(Utc::now().date_naive())),
                ..Default::default()
            },
        );
        assert_eq!(query.get_str("status").unwrap(), "PENDING");
        assert!(query.contains_key("created_at"));
    }
}
