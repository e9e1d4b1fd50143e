//! Session-scoped user profile.
//!
//! # Invariants
//! - At most one profile exists per session; absent until the first add.
//! - Every field is optional, but add/modify payloads must carry at least
//!   one of them.
//! - Modify merges only the fields present in the payload; an explicit
//!   `null` clears the field (this is what makes inverse snapshots restore
//!   a profile exactly).

use crate::model::{double_option, ValidationError};
use serde::{Deserialize, Serialize};

const AGE_MAX: u32 = 150;

/// The profile record as stored for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub nickname: Option<String>,
    pub name: Option<String>,
    pub age: Option<u32>,
    pub region: Option<String>,
}

/// Flat field map accepted by profile add (replace) and modify (merge).
///
/// Unknown fields are rejected at the boundary. The outer `Option` tracks
/// field presence; the inner one carries the (nullable) value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileData {
    #[serde(default, deserialize_with = "double_option")]
    pub nickname: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub age: Option<Option<u32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub region: Option<Option<String>>,
}

impl ProfileData {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.nickname.is_none() && self.name.is_none() && self.age.is_none()
            && self.region.is_none()
        {
            return Err(ValidationError::EmptyPayload("profile"));
        }
        if let Some(Some(age)) = self.age {
            if age > AGE_MAX {
                return Err(ValidationError::OutOfRange {
                    field: "age",
                    allowed: "0..=150",
                });
            }
        }
        Ok(())
    }
}

impl Profile {
    /// Builds a full profile from an add payload, replacing any previous one.
    pub fn from_data(data: &ProfileData) -> Self {
        Self {
            nickname: data.nickname.clone().flatten(),
            name: data.name.clone().flatten(),
            age: data.age.flatten(),
            region: data.region.clone().flatten(),
        }
    }

    /// Merges only the fields present in `data` into this profile.
    pub fn merge(&mut self, data: &ProfileData) {
        if let Some(nickname) = &data.nickname {
            self.nickname = nickname.clone();
        }
        if let Some(name) = &data.name {
            self.name = name.clone();
        }
        if let Some(age) = data.age {
            self.age = age;
        }
        if let Some(region) = &data.region {
            self.region = region.clone();
        }
    }
}
