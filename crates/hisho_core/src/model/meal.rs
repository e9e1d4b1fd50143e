//! Meal record domain model and payload shapes.
//!
//! # Invariants
//! - `id` is stable and never reused for another meal.
//! - `date` defaults to the store clock when the payload omits it.
//! - `rating` stays within 1..=5.

use crate::model::{double_option, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a meal record.
pub type MealId = Uuid;

const RATING_MIN: u32 = 1;
const RATING_MAX: u32 = 5;
const CALORIES_MAX: u32 = 100_000;

/// Canonical meal record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub id: MealId,
    /// Record date, `YYYY-MM-DD HH:MM`.
    pub date: String,
    pub meal_type: String,
    /// Free-text description of what was eaten.
    pub items: String,
    pub calories: Option<u32>,
    /// References to stored photos.
    pub photos: Vec<String>,
    pub rating: Option<u32>,
    pub notes: Option<String>,
}

/// Full record accepted by meal add.
///
/// `id` is only supplied by inverse replay, which preserves identity.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MealDraft {
    #[serde(default)]
    pub id: Option<MealId>,
    #[serde(default)]
    pub date: Option<String>,
    pub meal_type: String,
    #[serde(default)]
    pub items: String,
    #[serde(default)]
    pub calories: Option<u32>,
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default)]
    pub rating: Option<u32>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl MealDraft {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.meal_type.trim().is_empty() {
            return Err(ValidationError::EmptyField("meal_type"));
        }
        validate_rating(self.rating)?;
        validate_calories(self.calories)?;
        Ok(())
    }
}

/// Partial field map accepted by meal modify; only present fields merge.
///
/// Nullable fields use a presence-tracking outer `Option`: an explicit
/// `null` clears the field, which lets inverse snapshots restore empty
/// fields exactly.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MealPatch {
    #[serde(default)]
    pub id: Option<MealId>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub meal_type: Option<String>,
    #[serde(default)]
    pub items: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub calories: Option<Option<u32>>,
    #[serde(default)]
    pub photos: Option<Vec<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub rating: Option<Option<u32>>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
}

impl MealPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.date.is_none()
            && self.meal_type.is_none()
            && self.items.is_none()
            && self.calories.is_none()
            && self.photos.is_none()
            && self.rating.is_none()
            && self.notes.is_none()
        {
            return Err(ValidationError::EmptyPayload("meal"));
        }
        if let Some(meal_type) = &self.meal_type {
            if meal_type.trim().is_empty() {
                return Err(ValidationError::EmptyField("meal_type"));
            }
        }
        validate_rating(self.rating.flatten())?;
        validate_calories(self.calories.flatten())?;
        Ok(())
    }

    /// Reinterprets the patch as a full record for the recreation fallback.
    pub fn into_draft(self) -> Result<MealDraft, ValidationError> {
        let meal_type = self
            .meal_type
            .ok_or(ValidationError::MissingField("meal_type"))?;
        let draft = MealDraft {
            id: self.id,
            date: self.date,
            meal_type,
            items: self.items.unwrap_or_default(),
            calories: self.calories.flatten(),
            photos: self.photos.unwrap_or_default(),
            rating: self.rating.flatten(),
            notes: self.notes.flatten(),
        };
        draft.validate()?;
        Ok(draft)
    }
}

impl Meal {
    /// Returns a copy with only the patch-supplied fields replaced.
    pub fn merged_with(&self, patch: &MealPatch) -> Self {
        Self {
            id: self.id,
            date: patch.date.clone().unwrap_or_else(|| self.date.clone()),
            meal_type: patch
                .meal_type
                .clone()
                .unwrap_or_else(|| self.meal_type.clone()),
            items: patch.items.clone().unwrap_or_else(|| self.items.clone()),
            calories: patch.calories.unwrap_or(self.calories),
            photos: patch.photos.clone().unwrap_or_else(|| self.photos.clone()),
            rating: patch.rating.unwrap_or(self.rating),
            notes: patch.notes.clone().unwrap_or_else(|| self.notes.clone()),
        }
    }
}

fn validate_rating(rating: Option<u32>) -> Result<(), ValidationError> {
    match rating {
        Some(value) if !(RATING_MIN..=RATING_MAX).contains(&value) => {
            Err(ValidationError::OutOfRange {
                field: "rating",
                allowed: "1..=5",
            })
        }
        _ => Ok(()),
    }
}

fn validate_calories(calories: Option<u32>) -> Result<(), ValidationError> {
    match calories {
        Some(value) if value > CALORIES_MAX => Err(ValidationError::OutOfRange {
            field: "calories",
            allowed: "0..=100000",
        }),
        _ => Ok(()),
    }
}
