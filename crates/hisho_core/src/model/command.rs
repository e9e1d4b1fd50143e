//! Wire command contract and typed decoding.
//!
//! # Responsibility
//! - Decode the `{mode, type, data}` wire shape into a discriminated
//!   command union, one variant per (entity kind, action).
//! - Reject unknown mode/type codes before any mutation is attempted.
//!
//! # Invariants
//! - Unknown payload fields never pass the boundary (`deny_unknown_fields`).
//! - `read` commands carry no mutation semantics and are never logged.

use crate::model::meal::{MealDraft, MealId, MealPatch};
use crate::model::profile::ProfileData;
use crate::model::schedule::{ScheduleDraft, ScheduleId, SchedulePatch};
use crate::model::ValidationError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Entity kind selector, carried on the wire as an integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Profile,
    Schedule,
    Meal,
}

impl Mode {
    pub fn code(self) -> i64 {
        match self {
            Self::Profile => 1,
            Self::Schedule => 2,
            Self::Meal => 5,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::Profile),
            2 => Some(Self::Schedule),
            5 => Some(Self::Meal),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::Schedule => "schedule",
            Self::Meal => "meal",
        }
    }
}

impl Display for Mode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Mode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.code())
    }
}

impl<'de> Deserialize<'de> for Mode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = i64::deserialize(deserializer)?;
        Self::from_code(code)
            .ok_or_else(|| serde::de::Error::custom(format!("unsupported mode code {code}")))
    }
}

/// Action selector, carried on the wire as an integer code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionType {
    Add,
    Modify,
    Delete,
    Read,
}

impl ActionType {
    pub fn code(self) -> i64 {
        match self {
            Self::Add => 1,
            Self::Modify => 2,
            Self::Delete => 3,
            Self::Read => 4,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            1 => Some(Self::Add),
            2 => Some(Self::Modify),
            3 => Some(Self::Delete),
            4 => Some(Self::Read),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Modify => "modify",
            Self::Delete => "delete",
            Self::Read => "read",
        }
    }
}

impl Display for ActionType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for ActionType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.code())
    }
}

impl<'de> Deserialize<'de> for ActionType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = i64::deserialize(deserializer)?;
        Self::from_code(code)
            .ok_or_else(|| serde::de::Error::custom(format!("unsupported action code {code}")))
    }
}

/// Raw wire command before typed decoding.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandRequest {
    pub mode: i64,
    #[serde(rename = "type")]
    pub action: i64,
    #[serde(default)]
    pub data: Value,
}

/// Undo request with an optional entity-kind filter.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct UndoRequest {
    #[serde(default)]
    pub mode: Option<i64>,
}

/// Boundary decoding failure.
#[derive(Debug)]
pub enum CommandError {
    /// Unknown `mode`/`type` combination.
    Unsupported { mode: i64, action: Option<i64> },
    /// The payload does not decode into the expected shape.
    Payload { mode: Mode, detail: String },
    /// The payload decoded but fails a field-level check.
    Validation(ValidationError),
}

impl Display for CommandError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unsupported { mode, action } => match action {
                Some(action) => {
                    write!(f, "unsupported command: mode={mode} type={action}")
                }
                None => write!(f, "unsupported mode: {mode}"),
            },
            Self::Payload { mode, detail } => {
                write!(f, "invalid {mode} payload: {detail}")
            }
            Self::Validation(err) => write!(f, "{err}"),
        }
    }
}

impl Error for CommandError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for CommandError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Fully decoded command, one variant per (entity kind, action).
#[derive(Debug, Clone)]
pub enum Command {
    Profile(ProfileCommand),
    Schedule(ScheduleCommand),
    Meal(MealCommand),
}

#[derive(Debug, Clone)]
pub enum ProfileCommand {
    Add(ProfileData),
    Modify(ProfileData),
    Delete,
    Read,
}

#[derive(Debug, Clone)]
pub enum ScheduleCommand {
    Add(ScheduleDraft),
    Modify(SchedulePatch),
    Delete(ScheduleId),
    Read(Option<ScheduleId>),
}

#[derive(Debug, Clone)]
pub enum MealCommand {
    Add(MealDraft),
    Modify(MealPatch),
    Delete(MealId),
    Read(Option<MealId>),
}

impl Command {
    /// Decodes a wire request; rejects unknown codes and malformed payloads.
    pub fn parse(request: &CommandRequest) -> Result<Self, CommandError> {
        let mode = Mode::from_code(request.mode).ok_or(CommandError::Unsupported {
            mode: request.mode,
            action: Some(request.action),
        })?;
        let action = ActionType::from_code(request.action).ok_or(CommandError::Unsupported {
            mode: request.mode,
            action: Some(request.action),
        })?;

        let command = match mode {
            Mode::Profile => Self::Profile(match action {
                ActionType::Add => ProfileCommand::Add(decode_payload(mode, &request.data)?),
                ActionType::Modify => ProfileCommand::Modify(decode_payload(mode, &request.data)?),
                ActionType::Delete => ProfileCommand::Delete,
                ActionType::Read => ProfileCommand::Read,
            }),
            Mode::Schedule => Self::Schedule(match action {
                ActionType::Add => ScheduleCommand::Add(decode_payload(mode, &request.data)?),
                ActionType::Modify => ScheduleCommand::Modify(decode_payload(mode, &request.data)?),
                ActionType::Delete => ScheduleCommand::Delete(require_id(mode, &request.data)?),
                ActionType::Read => ScheduleCommand::Read(optional_id(mode, &request.data)?),
            }),
            Mode::Meal => Self::Meal(match action {
                ActionType::Add => MealCommand::Add(decode_payload(mode, &request.data)?),
                ActionType::Modify => MealCommand::Modify(decode_payload(mode, &request.data)?),
                ActionType::Delete => MealCommand::Delete(require_id(mode, &request.data)?),
                ActionType::Read => MealCommand::Read(optional_id(mode, &request.data)?),
            }),
        };
        Ok(command)
    }

    pub fn mode(&self) -> Mode {
        match self {
            Self::Profile(_) => Mode::Profile,
            Self::Schedule(_) => Mode::Schedule,
            Self::Meal(_) => Mode::Meal,
        }
    }

    pub fn action_type(&self) -> ActionType {
        match self {
            Self::Profile(command) => match command {
                ProfileCommand::Add(_) => ActionType::Add,
                ProfileCommand::Modify(_) => ActionType::Modify,
                ProfileCommand::Delete => ActionType::Delete,
                ProfileCommand::Read => ActionType::Read,
            },
            Self::Schedule(command) => match command {
                ScheduleCommand::Add(_) => ActionType::Add,
                ScheduleCommand::Modify(_) => ActionType::Modify,
                ScheduleCommand::Delete(_) => ActionType::Delete,
                ScheduleCommand::Read(_) => ActionType::Read,
            },
            Self::Meal(command) => match command {
                MealCommand::Add(_) => ActionType::Add,
                MealCommand::Modify(_) => ActionType::Modify,
                MealCommand::Delete(_) => ActionType::Delete,
                MealCommand::Read(_) => ActionType::Read,
            },
        }
    }
}

fn decode_payload<T: DeserializeOwned>(mode: Mode, data: &Value) -> Result<T, CommandError> {
    if !data.is_object() {
        return Err(CommandError::Payload {
            mode,
            detail: "expected a field map".to_string(),
        });
    }
    serde_json::from_value(data.clone()).map_err(|err| CommandError::Payload {
        mode,
        detail: err.to_string(),
    })
}

/// Accepts an id as a bare string or as `{id}` per the delete contract.
fn require_id(mode: Mode, data: &Value) -> Result<Uuid, CommandError> {
    optional_id(mode, data)?.ok_or(CommandError::Payload {
        mode,
        detail: "missing id".to_string(),
    })
}

fn optional_id(mode: Mode, data: &Value) -> Result<Option<Uuid>, CommandError> {
    let text = match data {
        Value::Null => return Ok(None),
        Value::String(text) if text.trim().is_empty() => return Ok(None),
        Value::String(text) => text.clone(),
        Value::Object(map) if map.is_empty() => return Ok(None),
        Value::Object(map) => match map.get("id") {
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
            None => {
                return Err(CommandError::Payload {
                    mode,
                    detail: "missing id".to_string(),
                })
            }
        },
        other => {
            return Err(CommandError::Payload {
                mode,
                detail: format!("expected an id, got {other}"),
            })
        }
    };
    let id = Uuid::parse_str(text.trim()).map_err(|_| CommandError::Payload {
        mode,
        detail: format!("invalid id `{text}`"),
    })?;
    Ok(Some(id))
}
