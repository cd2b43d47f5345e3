use super::directory::{ChildResponse, StaffResponse};
use crate::services::reporting::{BillingStats, ChildReport, PresenceStats, StaffReport};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
pub struct DayParams {
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChartParams {
    pub days: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ChildReportResponse {
    pub child: ChildResponse,
    pub presence: PresenceStats,
    pub billing: BillingStats,
}

impl From<ChildReport> for ChildReportResponse {
    fn from(report: ChildReport) -> Self {
        Self {
            child: report.child.into(),
            presence: report.presence,
            billing: report.billing,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StaffReportResponse {
    pub staff: StaffResponse,
    pub presence: PresenceStats,
    pub salaries_paid: i64,
    pub last_salary_date: Option<String>,
}

impl From<StaffReport> for StaffReportResponse {
    fn from(report: StaffReport) -> Self {
        Self {
            staff: report.staff.into(),
            presence: report.presence,
            salaries_paid: report.salaries_paid,
            last_salary_date: report.last_salary_date.map(|d| d.to_rfc3339()),
        }
    }
}
