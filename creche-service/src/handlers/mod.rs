pub mod children;
pub mod creche;
pub mod dashboard;
pub mod health;
pub mod invoices;
pub mod payments;
pub mod presences;
pub mod reports;
pub mod staff;

pub use health::{health_check, metrics_endpoint, readiness_check};
