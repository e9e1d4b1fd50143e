//! Domain model for profile, schedule and meal records.
//!
//! # Responsibility
//! - Define the canonical records and their wire payload shapes.
//! - Validate payloads before any repository mutation.
//!
//! # Invariants
//! - Schedule/Meal ids are assigned once at creation and never reused.
//! - Payload types reject unknown fields at the decoding boundary.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod action;
pub mod command;
pub mod meal;
pub mod profile;
pub mod schedule;

/// Distinguishes an absent patch field (`None`) from an explicit `null`
/// (`Some(None)`), so merge semantics can clear a field on request and an
/// inverse snapshot restores empty fields exactly.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(deserializer).map(Some)
}

/// Field-level validation failure for command payloads and flow answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field is missing from the payload.
    MissingField(&'static str),
    /// A field is present but blank after trimming.
    EmptyField(&'static str),
    /// A numeric field is outside its allowed range.
    OutOfRange {
        field: &'static str,
        allowed: &'static str,
    },
    /// The payload carries no usable fields at all.
    EmptyPayload(&'static str),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField(field) => write!(f, "missing required field `{field}`"),
            Self::EmptyField(field) => write!(f, "field `{field}` must not be empty"),
            Self::OutOfRange { field, allowed } => {
                write!(f, "field `{field}` is out of range (allowed: {allowed})")
            }
            Self::EmptyPayload(kind) => write!(f, "{kind} payload carries no fields"),
        }
    }
}

impl Error for ValidationError {}
