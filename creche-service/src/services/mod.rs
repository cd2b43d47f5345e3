pub mod billing;
pub mod charge;
pub mod database;
pub mod memory;
pub mod metrics;
pub mod receipts;
pub mod reporting;
pub mod storage;
pub mod store;

pub use billing::BillingService;
pub use database::MongoDb;
pub use memory::MemoryStore;
pub use metrics::{get_metrics, init_metrics};
pub use receipts::{ReceiptRenderer, StoredReceiptRenderer};
pub use reporting::ReportingService;
pub use storage::{LocalStorage, Storage};
pub use store::{DirectoryStore, LedgerStore};
