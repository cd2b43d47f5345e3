pub mod directory;
pub mod invoices;
pub mod payments;
pub mod reports;

use crate::services::store::DateRange;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;

/// Success envelope shared by every endpoint.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            count: None,
            data,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl<T> ApiResponse<Vec<T>> {
    pub fn list(data: Vec<T>) -> Self {
        Self {
            success: true,
            message: None,
            count: Some(data.len()),
            data,
        }
    }
}

/// `?start=YYYY-MM-DD&end=YYYY-MM-DD`, both days inclusive. Defaults to the
/// current month up to today.
#[derive(Debug, Default, Deserialize)]
pub struct DateRangeParams {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRangeParams {
    pub fn resolve(&self, today: NaiveDate) -> Result<DateRange, AppError> {
        let end = self.end.unwrap_or(today);
        let start = match self.start {
            Some(start) => start,
            None => NaiveDate::from_ymd_opt(end.year(), end.month(), 1).unwrap_or(end),
        };
        if end < start {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "end ({}) is before start ({})",
                end,
                start
            )));
        }
        DateRange::days(start, end)
    }

    /// Only when at least one bound was given.
    pub fn resolve_optional(&self, today: NaiveDate) -> Result<Option<DateRange>, AppError> {
        if self.start.is_none() && self.end.is_none() {
            return Ok(None);
        }
        self.resolve(today).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn defaults_to_month_to_date() {
        let range = DateRangeParams::default().resolve(day(2025, 3, 17)).unwrap();
        assert_eq!(range, DateRange::days(day(2025, 3, 1), day(2025, 3, 17)).unwrap());
    }

    #[test]
    fn end_is_inclusive() {
        let params = DateRangeParams {
            start: Some(day(2025, 1, 1)),
            end: Some(day(2025, 1, 31)),
        };
        let range = params.resolve(day(2025, 3, 17)).unwrap();
        assert_eq!(range.end.date_naive(), day(2025, 2, 1));
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let params = DateRangeParams {
            start: Some(day(2025, 2, 1)),
            end: Some(day(2025, 1, 1)),
        };
        assert!(matches!(
            params.resolve(day(2025, 3, 17)),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn list_envelope_counts_items() {
        let json = serde_json::to_value(ApiResponse::list(vec![1, 2, 3])).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["count"], 3);
        assert!(json.get("message").is_none());
    }
}
