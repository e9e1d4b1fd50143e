//! Command Executor: applies one typed command and computes its inverse.
//!
//! # Responsibility
//! - Dispatch each (entity kind, action) pair onto the matching repository
//!   mutation, snapshotting before every change.
//! - Return the inverse command that would undo the effect.
//!
//! # Invariants
//! - Snapshots are taken inside the caller's transaction, before mutating.
//! - Read commands never mutate and never produce an inverse.
//! - Ids embedded in replayed payloads are preserved verbatim.

use crate::model::action::InverseCommand;
use crate::model::command::{Command, MealCommand, Mode, ProfileCommand, ScheduleCommand};
use crate::model::meal::{Meal, MealDraft};
use crate::model::profile::Profile;
use crate::model::schedule::{Schedule, ScheduleDraft};
use crate::repo::meal_repo::{MealRepository, SqliteMealRepository};
use crate::repo::profile_repo::{ProfileRepository, SqliteProfileRepository};
use crate::repo::schedule_repo::{ScheduleRepository, SqliteScheduleRepository};
use crate::service::AssistantError;
use rusqlite::Connection;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

/// Entity state returned by executor operations.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EntityRecord {
    Profile(Profile),
    Schedule(Schedule),
    Meal(Meal),
}

/// Result shape of one executed command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    /// Add/Modify result: the stored entity after the mutation.
    Saved(EntityRecord),
    /// Delete result; profile deletion carries no id.
    Deleted { mode: Mode, id: Option<String> },
    /// Single-entity read; `None` for no match.
    One(Option<EntityRecord>),
    /// Collection read.
    Many(Vec<EntityRecord>),
}

/// One applied command plus the bookkeeping the action log needs.
#[derive(Debug)]
pub struct Applied {
    pub outcome: CommandOutcome,
    pub inverse: Option<InverseCommand>,
    pub mutated: bool,
}

impl Applied {
    fn mutation(outcome: CommandOutcome, inverse: InverseCommand) -> Self {
        Self {
            outcome,
            inverse: Some(inverse),
            mutated: true,
        }
    }

    fn read(outcome: CommandOutcome) -> Self {
        Self {
            outcome,
            inverse: None,
            mutated: false,
        }
    }
}

/// Applies typed commands against the entity store.
///
/// Works over whatever connection the caller hands in; for mutations that is
/// the transaction shared with the action log append.
pub struct CommandExecutor<'c> {
    conn: &'c Connection,
    session_key: &'c str,
}

impl<'c> CommandExecutor<'c> {
    pub fn new(conn: &'c Connection, session_key: &'c str) -> Self {
        Self { conn, session_key }
    }

    pub fn apply(&self, command: &Command) -> Result<Applied, AssistantError> {
        match command {
            Command::Profile(command) => self.apply_profile(command),
            Command::Schedule(command) => self.apply_schedule(command),
            Command::Meal(command) => self.apply_meal(command),
        }
    }

    fn apply_profile(&self, command: &ProfileCommand) -> Result<Applied, AssistantError> {
        let repo = SqliteProfileRepository::try_new(self.conn)?;
        match command {
            ProfileCommand::Add(data) => {
                data.validate()?;
                let previous = repo.get(self.session_key)?;
                let profile = Profile::from_data(data);
                repo.upsert(self.session_key, &profile)?;
                let inverse = match previous {
                    Some(previous) => InverseCommand::update(Mode::Profile, encode(&previous)?),
                    None => InverseCommand::delete(Mode::Profile, Value::Null),
                };
                Ok(Applied::mutation(
                    CommandOutcome::Saved(EntityRecord::Profile(profile)),
                    inverse,
                ))
            }
            ProfileCommand::Modify(data) => {
                data.validate()?;
                let current = repo
                    .get(self.session_key)?
                    .ok_or(AssistantError::NotFound {
                        mode: Mode::Profile,
                        id: None,
                    })?;
                let snapshot = encode(&current)?;
                let mut next = current;
                next.merge(data);
                repo.upsert(self.session_key, &next)?;
                Ok(Applied::mutation(
                    CommandOutcome::Saved(EntityRecord::Profile(next)),
                    InverseCommand::update(Mode::Profile, snapshot),
                ))
            }
            ProfileCommand::Delete => {
                let current = repo
                    .get(self.session_key)?
                    .ok_or(AssistantError::NotFound {
                        mode: Mode::Profile,
                        id: None,
                    })?;
                let snapshot = encode(&current)?;
                repo.delete(self.session_key)?;
                Ok(Applied::mutation(
                    CommandOutcome::Deleted {
                        mode: Mode::Profile,
                        id: None,
                    },
                    InverseCommand::add(Mode::Profile, snapshot),
                ))
            }
            ProfileCommand::Read => Ok(Applied::read(CommandOutcome::One(
                repo.get(self.session_key)?.map(EntityRecord::Profile),
            ))),
        }
    }

    fn apply_schedule(&self, command: &ScheduleCommand) -> Result<Applied, AssistantError> {
        let repo = SqliteScheduleRepository::try_new(self.conn)?;
        match command {
            ScheduleCommand::Add(draft) => {
                draft.validate()?;
                insert_schedule(&repo, draft.clone())
            }
            ScheduleCommand::Modify(patch) => {
                patch.validate()?;
                let existing = match patch.id {
                    Some(id) => repo.get(id)?,
                    None => None,
                };
                match existing {
                    Some(current) => {
                        let snapshot = encode(&current)?;
                        // Inverse replay carries explicit timestamps; a
                        // normal patch lets the store clock refresh them.
                        let keep_timestamps = patch.updated_at.is_some();
                        let merged = current.merged_with(patch);
                        repo.update(&merged, keep_timestamps)?;
                        let stored =
                            repo.get(merged.id)?.ok_or(AssistantError::Inconsistent(
                                "updated schedule not found in read-back",
                            ))?;
                        Ok(Applied::mutation(
                            CommandOutcome::Saved(EntityRecord::Schedule(stored)),
                            InverseCommand::update(Mode::Schedule, snapshot),
                        ))
                    }
                    // Recreation fallback: the patch is reinterpreted as a
                    // full record and stored under the supplied or fresh id.
                    None => insert_schedule(&repo, patch.clone().into_draft()?),
                }
            }
            ScheduleCommand::Delete(id) => {
                let current = repo.get(*id)?.ok_or_else(|| AssistantError::NotFound {
                    mode: Mode::Schedule,
                    id: Some(id.to_string()),
                })?;
                let snapshot = encode(&current)?;
                repo.delete(*id)?;
                Ok(Applied::mutation(
                    CommandOutcome::Deleted {
                        mode: Mode::Schedule,
                        id: Some(id.to_string()),
                    },
                    InverseCommand::add(Mode::Schedule, snapshot),
                ))
            }
            ScheduleCommand::Read(Some(id)) => Ok(Applied::read(CommandOutcome::One(
                repo.get(*id)?.map(EntityRecord::Schedule),
            ))),
            ScheduleCommand::Read(None) => Ok(Applied::read(CommandOutcome::Many(
                repo.list()?
                    .into_iter()
                    .map(EntityRecord::Schedule)
                    .collect(),
            ))),
        }
    }

    fn apply_meal(&self, command: &MealCommand) -> Result<Applied, AssistantError> {
        let repo = SqliteMealRepository::try_new(self.conn)?;
        match command {
            MealCommand::Add(draft) => {
                draft.validate()?;
                insert_meal(&repo, draft.clone())
            }
            MealCommand::Modify(patch) => {
                patch.validate()?;
                let existing = match patch.id {
                    Some(id) => repo.get(id)?,
                    None => None,
                };
                match existing {
                    Some(current) => {
                        let snapshot = encode(&current)?;
                        let merged = current.merged_with(patch);
                        repo.update(&merged)?;
                        Ok(Applied::mutation(
                            CommandOutcome::Saved(EntityRecord::Meal(merged)),
                            InverseCommand::update(Mode::Meal, snapshot),
                        ))
                    }
                    None => insert_meal(&repo, patch.clone().into_draft()?),
                }
            }
            MealCommand::Delete(id) => {
                let current = repo.get(*id)?.ok_or_else(|| AssistantError::NotFound {
                    mode: Mode::Meal,
                    id: Some(id.to_string()),
                })?;
                let snapshot = encode(&current)?;
                repo.delete(*id)?;
                Ok(Applied::mutation(
                    CommandOutcome::Deleted {
                        mode: Mode::Meal,
                        id: Some(id.to_string()),
                    },
                    InverseCommand::add(Mode::Meal, snapshot),
                ))
            }
            MealCommand::Read(Some(id)) => Ok(Applied::read(CommandOutcome::One(
                repo.get(*id)?.map(EntityRecord::Meal),
            ))),
            MealCommand::Read(None) => Ok(Applied::read(CommandOutcome::Many(
                repo.list()?.into_iter().map(EntityRecord::Meal).collect(),
            ))),
        }
    }
}

fn insert_schedule(
    repo: &SqliteScheduleRepository<'_>,
    draft: ScheduleDraft,
) -> Result<Applied, AssistantError> {
    let id = draft.id.unwrap_or_else(Uuid::new_v4);
    repo.insert(id, &draft)?;
    let stored = repo
        .get(id)?
        .ok_or(AssistantError::Inconsistent(
            "created schedule not found in read-back",
        ))?;
    Ok(Applied::mutation(
        CommandOutcome::Saved(EntityRecord::Schedule(stored)),
        InverseCommand::delete(Mode::Schedule, Value::String(id.to_string())),
    ))
}

fn insert_meal(
    repo: &SqliteMealRepository<'_>,
    draft: MealDraft,
) -> Result<Applied, AssistantError> {
    let id = draft.id.unwrap_or_else(Uuid::new_v4);
    repo.insert(id, &draft)?;
    let stored = repo.get(id)?.ok_or(AssistantError::Inconsistent(
        "created meal not found in read-back",
    ))?;
    Ok(Applied::mutation(
        CommandOutcome::Saved(EntityRecord::Meal(stored)),
        InverseCommand::delete(Mode::Meal, Value::String(id.to_string())),
    ))
}

fn encode<T: Serialize>(value: &T) -> Result<Value, AssistantError> {
    serde_json::to_value(value)
        .map_err(|_| AssistantError::Inconsistent("snapshot serialization failed"))
}
