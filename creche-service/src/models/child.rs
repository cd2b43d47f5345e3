use chrono::{DateTime, Utc};
use mongodb::bson;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChildStatus {
    Active,
    Inactive,
    Suspended,
    Left,
}

impl ChildStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChildStatus::Active => "ACTIVE",
            ChildStatus::Inactive => "INACTIVE",
            ChildStatus::Suspended => "SUSPENDED",
            ChildStatus::Left => "LEFT",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Child {
    #[serde(rename = "_id")]
    pub id: String,
    pub creche_id: String,
    pub first_name: String,
    pub last_name: String,
    pub registration_number: String,
    pub status: ChildStatus,
    pub section: Option<String>,
    pub monthly_fee: i64,
    pub registration_fee: i64,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub enrolled_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewChild {
    pub first_name: String,
    pub last_name: String,
    pub section: Option<String>,
    pub monthly_fee: i64,
    pub registration_fee: i64,
    pub enrolled_at: DateTime<Utc>,
}

impl Child {
    pub fn new(creche_id: String, registration_number: String, input: NewChild) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            creche_id,
            first_name: input.first_name.trim().to_string(),
            last_name: input.last_name.trim().to_string(),
            registration_number,
            status: ChildStatus::Active,
            section: input.section,
            monthly_fee: input.monthly_fee,
            registration_fee: input.registration_fee,
            enrolled_at: input.enrolled_at,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
