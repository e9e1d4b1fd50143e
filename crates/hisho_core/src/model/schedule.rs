//! Schedule domain model and payload shapes.
//!
//! # Invariants
//! - `id` is stable and never reused for another schedule.
//! - `datetime` is an opaque timezone-naive string; format checks happen in
//!   the guided flow, not here.
//! - Snapshots serialize every field so an inverse add/update restores the
//!   record exactly, timestamps included.

use crate::model::{double_option, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a schedule entry.
pub type ScheduleId = Uuid;

/// Lifecycle state of a schedule entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    Active,
    Completed,
    Cancelled,
}

impl ScheduleStatus {
    pub fn as_db(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn parse_db(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

/// Canonical schedule record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: ScheduleId,
    pub title: String,
    pub datetime: String,
    pub location: Option<String>,
    pub items: Vec<String>,
    pub status: ScheduleStatus,
    /// Alarm moment in epoch milliseconds.
    pub alarm: Option<i64>,
    /// Creation timestamp in epoch milliseconds.
    pub created_at: i64,
    /// Last mutation timestamp in epoch milliseconds.
    pub updated_at: i64,
}

/// Full record accepted by schedule add.
///
/// `id`/`created_at`/`updated_at` are only supplied by inverse replay, which
/// must preserve identity and timestamps verbatim.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScheduleDraft {
    #[serde(default)]
    pub id: Option<ScheduleId>,
    pub title: String,
    pub datetime: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub items: Vec<String>,
    #[serde(default)]
    pub status: Option<ScheduleStatus>,
    #[serde(default)]
    pub alarm: Option<i64>,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub updated_at: Option<i64>,
}

impl ScheduleDraft {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyField("title"));
        }
        if self.datetime.trim().is_empty() {
            return Err(ValidationError::EmptyField("datetime"));
        }
        Ok(())
    }
}

/// Partial field map accepted by schedule modify; only present fields merge.
///
/// Nullable fields use a presence-tracking outer `Option`: an explicit
/// `null` clears the field, which lets inverse snapshots restore empty
/// fields exactly.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchedulePatch {
    #[serde(default)]
    pub id: Option<ScheduleId>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub datetime: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub location: Option<Option<String>>,
    #[serde(default)]
    pub items: Option<Vec<String>>,
    #[serde(default)]
    pub status: Option<ScheduleStatus>,
    #[serde(default, deserialize_with = "double_option")]
    pub alarm: Option<Option<i64>>,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub updated_at: Option<i64>,
}

impl SchedulePatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.is_none()
            && self.datetime.is_none()
            && self.location.is_none()
            && self.items.is_none()
            && self.status.is_none()
            && self.alarm.is_none()
            && self.created_at.is_none()
            && self.updated_at.is_none()
        {
            return Err(ValidationError::EmptyPayload("schedule"));
        }
        if let Some(title) = &self.title {
            if title.trim().is_empty() {
                return Err(ValidationError::EmptyField("title"));
            }
        }
        if let Some(datetime) = &self.datetime {
            if datetime.trim().is_empty() {
                return Err(ValidationError::EmptyField("datetime"));
            }
        }
        Ok(())
    }

    /// Reinterprets the patch as a full record for the recreation fallback.
    pub fn into_draft(self) -> Result<ScheduleDraft, ValidationError> {
        let title = self.title.ok_or(ValidationError::MissingField("title"))?;
        let datetime = self
            .datetime
            .ok_or(ValidationError::MissingField("datetime"))?;
        let draft = ScheduleDraft {
            id: self.id,
            title,
            datetime,
            location: self.location.flatten(),
            items: self.items.unwrap_or_default(),
            status: self.status,
            alarm: self.alarm.flatten(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        };
        draft.validate()?;
        Ok(draft)
    }
}

impl Schedule {
    /// Returns a copy with only the patch-supplied fields replaced.
    pub fn merged_with(&self, patch: &SchedulePatch) -> Self {
        Self {
            id: self.id,
            title: patch.title.clone().unwrap_or_else(|| self.title.clone()),
            datetime: patch
                .datetime
                .clone()
                .unwrap_or_else(|| self.datetime.clone()),
            location: patch
                .location
                .clone()
                .unwrap_or_else(|| self.location.clone()),
            items: patch.items.clone().unwrap_or_else(|| self.items.clone()),
            status: patch.status.unwrap_or(self.status),
            alarm: patch.alarm.unwrap_or(self.alarm),
            created_at: patch.created_at.unwrap_or(self.created_at),
            updated_at: patch.updated_at.unwrap_or(self.updated_at),
        }
    }
}
