use chrono::{DateTime, Utc};
use mongodb::bson;
use serde::{Deserialize, Serialize};

/// Tenant settings. The id is the tenant id itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Creche {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub max_capacity: i64,
    pub registration_fee: i64,
    pub monthly_fee: i64,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Creche {
    /// True once active children reach 90% of capacity.
    pub fn is_near_capacity(&self, active_children: u64) -> bool {
        if self.max_capacity <= 0 {
            return false;
        }
        active_children as i64 * 10 >= self.max_capacity * 9
    }
}
