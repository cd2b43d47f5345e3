use super::payments::ChargeResponse;
use super::DateRangeParams;
use crate::models::{
    Child, ChildStatus, Creche, NewStaff, PaymentMethod, Period, Presence, PresenceKind,
    PresenceStatus, ReconciliationMarker, Staff, StaffPosition, StaffStatus,
};
use crate::services::billing::{EnrollChild, Enrollment, SalaryPayment};
use crate::services::store::PresenceFilter;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateChildRequest {
    #[validate(length(min = 1, max = 100, message = "First name is required"))]
    pub first_name: String,

    #[validate(length(min = 1, max = 100, message = "Last name is required"))]
    pub last_name: String,

    #[validate(length(max = 50))]
    pub section: Option<String>,

    pub enrolled_at: Option<DateTime<Utc>>,

    #[validate(range(min = 0_i64, max = 1_000_000_000_000_i64, message = "Registration fee must be between 0 and 1e12"))]
    pub registration_fee: Option<i64>,

    #[validate(range(min = 0_i64, max = 1_000_000_000_000_i64, message = "Monthly fee must be between 0 and 1e12"))]
    pub monthly_fee: Option<i64>,
}

impl From<CreateChildRequest> for EnrollChild {
    fn from(req: CreateChildRequest) -> Self {
        Self {
            first_name: req.first_name,
            last_name: req.last_name,
            section: req.section,
            enrolled_at: req.enrolled_at,
            registration_fee: req.registration_fee,
            monthly_fee: req.monthly_fee,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ChildListParams {
    pub status: Option<ChildStatus>,
}

#[derive(Debug, Serialize)]
pub struct ChildResponse {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub registration_number: String,
    pub status: ChildStatus,
    pub section: Option<String>,
    pub monthly_fee: i64,
    pub registration_fee: i64,
    pub enrolled_at: String,
    pub created_at: String,
}

impl From<Child> for ChildResponse {
    fn from(child: Child) -> Self {
        Self {
            full_name: child.full_name(),
            id: child.id,
            first_name: child.first_name,
            last_name: child.last_name,
            registration_number: child.registration_number,
            status: child.status,
            section: child.section,
            monthly_fee: child.monthly_fee,
            registration_fee: child.registration_fee,
            enrolled_at: child.enrolled_at.to_rfc3339(),
            created_at: child.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EnrollmentResponse {
    pub child: ChildResponse,
    pub registration: Option<ChargeResponse>,
}

impl From<Enrollment> for EnrollmentResponse {
    fn from(enrollment: Enrollment) -> Self {
        Self {
            child: enrollment.child.into(),
            registration: enrollment.registration.map(Into::into),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateStaffRequest {
    #[validate(length(min = 1, max = 100, message = "First name is required"))]
    pub first_name: String,

    #[validate(length(min = 1, max = 100, message = "Last name is required"))]
    pub last_name: String,

    pub position: StaffPosition,

    #[validate(range(min = 0_i64, max = 1_000_000_000_000_i64, message = "Salary must be between 0 and 1e12"))]
    pub salary: i64,

    pub status: Option<StaffStatus>,
    pub hired_at: Option<DateTime<Utc>>,
}

impl From<CreateStaffRequest> for NewStaff {
    fn from(req: CreateStaffRequest) -> Self {
        Self {
            first_name: req.first_name,
            last_name: req.last_name,
            position: req.position,
            salary: req.salary,
            status: req.status.unwrap_or(StaffStatus::Active),
            hired_at: req.hired_at.unwrap_or_else(Utc::now),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct StaffListParams {
    pub status: Option<StaffStatus>,
}

#[derive(Debug, Serialize)]
pub struct StaffResponse {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub position: StaffPosition,
    pub salary: i64,
    pub status: StaffStatus,
    pub hired_at: String,
    pub created_at: String,
}

impl From<Staff> for StaffResponse {
    fn from(staff: Staff) -> Self {
        Self {
            full_name: staff.full_name(),
            id: staff.id,
            first_name: staff.first_name,
            last_name: staff.last_name,
            position: staff.position,
            salary: staff.salary,
            status: staff.status,
            hired_at: staff.hired_at.to_rfc3339(),
            created_at: staff.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct SalaryRequest {
    #[validate(range(min = 1, max = 12, message = "Month must be between 1 and 12"))]
    pub month: i32,

    #[validate(range(min = 2020, message = "Year must be 2020 or later"))]
    pub year: i32,

    #[validate(range(min = 0_i64, max = 1_000_000_000_000_i64, message = "Amount must be between 0 and 1e12"))]
    pub amount: Option<i64>,

    #[validate(length(min = 1, max = 500))]
    pub description: Option<String>,

    pub method: Option<PaymentMethod>,
    pub notes: Option<String>,
}

impl SalaryRequest {
    pub fn into_payment(self) -> Result<SalaryPayment, AppError> {
        Ok(SalaryPayment {
            period: Period::new(self.month, self.year)?,
            amount: self.amount,
            description: self.description,
            method: self.method,
            notes: self.notes,
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCrecheRequest {
    #[validate(length(min = 1, max = 200, message = "Name is required"))]
    pub name: String,

    #[validate(range(min = 1, message = "Capacity must be at least 1"))]
    pub max_capacity: i64,

    #[validate(range(min = 0_i64, max = 1_000_000_000_000_i64, message = "Registration fee must be between 0 and 1e12"))]
    pub registration_fee: i64,

    #[validate(range(min = 0_i64, max = 1_000_000_000_000_i64, message = "Monthly fee must be between 0 and 1e12"))]
    pub monthly_fee: i64,
}

impl UpdateCrecheRequest {
    pub fn into_creche(self, creche_id: String) -> Creche {
        Creche {
            id: creche_id,
            name: self.name,
            max_capacity: self.max_capacity,
            registration_fee: self.registration_fee,
            monthly_fee: self.monthly_fee,
            updated_at: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CrecheResponse {
    pub id: String,
    pub name: String,
    pub max_capacity: i64,
    pub registration_fee: i64,
    pub monthly_fee: i64,
    pub updated_at: String,
}

impl From<Creche> for CrecheResponse {
    fn from(creche: Creche) -> Self {
        Self {
            id: creche.id,
            name: creche.name,
            max_capacity: creche.max_capacity,
            registration_fee: creche.registration_fee,
            monthly_fee: creche.monthly_fee,
            updated_at: creche.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePresenceRequest {
    pub kind: PresenceKind,

    #[validate(length(min = 1, message = "Subject is required"))]
    pub subject_id: String,

    pub date: NaiveDate,
    pub status: PresenceStatus,

    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PresenceListParams {
    pub kind: Option<PresenceKind>,
    pub child_id: Option<String>,
    pub staff_id: Option<String>,
    pub status: Option<PresenceStatus>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl PresenceListParams {
    pub fn into_filter(self, today: NaiveDate) -> Result<PresenceFilter, AppError> {
        let range = DateRangeParams {
            start: self.start,
            end: self.end,
        }
        .resolve_optional(today)?;
        Ok(PresenceFilter {
            kind: self.kind,
            child_id: self.child_id,
            staff_id: self.staff_id,
            statuses: self.status.into_iter().collect(),
            range,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct PresenceResponse {
    pub id: String,
    pub kind: PresenceKind,
    pub child_id: Option<String>,
    pub staff_id: Option<String>,
    pub date: NaiveDate,
    pub status: PresenceStatus,
    pub notes: Option<String>,
    pub recorded_by: String,
    pub created_at: String,
}

impl From<Presence> for PresenceResponse {
    fn from(presence: Presence) -> Self {
        Self {
            id: presence.id,
            kind: presence.kind,
            child_id: presence.child_id,
            staff_id: presence.staff_id,
            date: presence.date.date_naive(),
            status: presence.status,
            notes: presence.notes,
            recorded_by: presence.recorded_by,
            created_at: presence.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReconciliationResponse {
    pub id: String,
    pub payment_id: String,
    pub invoice_id: String,
    pub child_id: Option<String>,
    pub reason: String,
    pub created_at: String,
}

impl From<ReconciliationMarker> for ReconciliationResponse {
    fn from(marker: ReconciliationMarker) -> Self {
        Self {
            id: marker.id,
            payment_id: marker.payment_id,
            invoice_id: marker.invoice_id,
            child_id: marker.child_id,
            reason: marker.reason,
            created_at: marker.created_at.to_rfc3339(),
        }
    }
}
