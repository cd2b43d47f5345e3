use chrono::{DateTime, Utc};
use mongodb::bson;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StaffStatus {
    Active,
    Inactive,
    OnLeave,
    Suspended,
    Left,
}

impl StaffStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StaffStatus::Active => "ACTIVE",
            StaffStatus::Inactive => "INACTIVE",
            StaffStatus::OnLeave => "ON_LEAVE",
            StaffStatus::Suspended => "SUSPENDED",
            StaffStatus::Left => "LEFT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StaffPosition {
    Director,
    Educator,
    Assistant,
    Cook,
    Caretaker,
    Guard,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Staff {
    #[serde(rename = "_id")]
    pub id: String,
    pub creche_id: String,
    pub first_name: String,
    pub last_name: String,
    pub position: StaffPosition,
    pub salary: i64,
    pub status: StaffStatus,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub hired_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewStaff {
    pub first_name: String,
    pub last_name: String,
    pub position: StaffPosition,
    pub salary: i64,
    pub status: StaffStatus,
    pub hired_at: DateTime<Utc>,
}

impl Staff {
    pub fn new(creche_id: String, input: NewStaff) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            creche_id,
            first_name: input.first_name.trim().to_string(),
            last_name: input.last_name.trim().to_string(),
            position: input.position,
            salary: input.salary,
            status: input.status,
            hired_at: input.hired_at,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_active(&self) -> bool {
        self.status == StaffStatus::Active
    }
}
