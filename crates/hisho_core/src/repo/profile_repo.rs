//! Session-keyed profile repository.
//!
//! # Responsibility
//! - Persist at most one profile row per session key.
//!
//! # Invariants
//! - `upsert` replaces the whole row; merge semantics live in the executor.

use crate::model::profile::Profile;
use crate::repo::{ensure_connection_ready, RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension};

const PROFILE_COLUMNS: &[&str] = &["session_key", "nickname", "name", "age", "region"];

/// Repository interface for session profiles.
pub trait ProfileRepository {
    fn get(&self, session_key: &str) -> RepoResult<Option<Profile>>;
    fn upsert(&self, session_key: &str, profile: &Profile) -> RepoResult<()>;
    fn delete(&self, session_key: &str) -> RepoResult<()>;
}

/// SQLite-backed profile repository.
pub struct SqliteProfileRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteProfileRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, "profiles", PROFILE_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl ProfileRepository for SqliteProfileRepository<'_> {
    fn get(&self, session_key: &str) -> RepoResult<Option<Profile>> {
        let row = self
            .conn
            .query_row(
                "SELECT nickname, name, age, region
                 FROM profiles
                 WHERE session_key = ?1;",
                [session_key],
                |row| {
                    Ok((
                        row.get::<_, Option<String>>("nickname")?,
                        row.get::<_, Option<String>>("name")?,
                        row.get::<_, Option<i64>>("age")?,
                        row.get::<_, Option<String>>("region")?,
                    ))
                },
            )
            .optional()?;

        let Some((nickname, name, age, region)) = row else {
            return Ok(None);
        };
        let age = match age {
            Some(value) => Some(u32::try_from(value).map_err(|_| {
                RepoError::InvalidData(format!("invalid age value `{value}` in profiles.age"))
            })?),
            None => None,
        };
        Ok(Some(Profile {
            nickname,
            name,
            age,
            region,
        }))
    }

    fn upsert(&self, session_key: &str, profile: &Profile) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO profiles (session_key, nickname, name, age, region, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, (strftime('%s', 'now') * 1000))
             ON CONFLICT (session_key) DO UPDATE SET
                nickname = excluded.nickname,
                name = excluded.name,
                age = excluded.age,
                region = excluded.region,
                updated_at = excluded.updated_at;",
            params![
                session_key,
                profile.nickname.as_deref(),
                profile.name.as_deref(),
                profile.age.map(i64::from),
                profile.region.as_deref(),
            ],
        )?;
        Ok(())
    }

    fn delete(&self, session_key: &str) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM profiles WHERE session_key = ?1;", [session_key])?;
        if changed == 0 {
            return Err(RepoError::NotFound(session_key.to_string()));
        }
        Ok(())
    }
}
