use chrono::{DateTime, NaiveDate, Utc};
use mongodb::bson;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PresenceKind {
    Child,
    Staff,
}

impl PresenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PresenceKind::Child => "CHILD",
            PresenceKind::Staff => "STAFF",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PresenceStatus {
    Present,
    Absent,
    Late,
    Leave,
    Sick,
    ExcusedAbsence,
    UnexcusedAbsence,
    Holiday,
    Vacation,
}

impl PresenceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PresenceStatus::Present => "PRESENT",
            PresenceStatus::Absent => "ABSENT",
            PresenceStatus::Late => "LATE",
            PresenceStatus::Leave => "LEAVE",
            PresenceStatus::Sick => "SICK",
            PresenceStatus::ExcusedAbsence => "EXCUSED_ABSENCE",
            PresenceStatus::UnexcusedAbsence => "UNEXCUSED_ABSENCE",
            PresenceStatus::Holiday => "HOLIDAY",
            PresenceStatus::Vacation => "VACATION",
        }
    }

    /// Statuses counted by the repeated-absence alert.
    pub const ABSENCES: [PresenceStatus; 2] =
        [PresenceStatus::Absent, PresenceStatus::UnexcusedAbsence];

    /// Days the creche is closed; they do not count towards presence rates.
    pub fn is_closure(&self) -> bool {
        matches!(self, PresenceStatus::Holiday | PresenceStatus::Vacation)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Presence {
    #[serde(rename = "_id")]
    pub id: String,
    pub creche_id: String,
    pub kind: PresenceKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staff_id: Option<String>,
    /// Midnight UTC of the recorded day.
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub date: DateTime<Utc>,
    pub status: PresenceStatus,
    pub notes: Option<String>,
    pub recorded_by: String,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl Presence {
    pub fn new(
        creche_id: String,
        kind: PresenceKind,
        subject_id: String,
        day: NaiveDate,
        status: PresenceStatus,
        notes: Option<String>,
        recorded_by: String,
    ) -> Self {
        let (child_id, staff_id) = match kind {
            PresenceKind::Child => (Some(subject_id), None),
            PresenceKind::Staff => (None, Some(subject_id)),
        };
        Self {
            id: Uuid::new_v4().to_string(),
            creche_id,
            kind,
            child_id,
            staff_id,
            date: day.and_time(chrono::NaiveTime::MIN).and_utc(),
            status,
            notes,
            recorded_by,
            created_at: Utc::now(),
        }
    }

    pub fn subject_id(&self) -> Option<&str> {
        self.child_id.as_deref().or(self.staff_id.as_deref())
    }
}
