//! Meal repository contract and SQLite implementation.
//!
//! # Invariants
//! - `photos` persists as a JSON array column.
//! - A missing `date` is assigned by the store clock in the original
//!   product's `YYYY-MM-DD HH:MM` shape.

use crate::model::meal::{Meal, MealDraft, MealId};
use crate::repo::{ensure_connection_ready, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

const MEAL_SELECT_SQL: &str = "SELECT
    id,
    date,
    meal_type,
    items,
    calories,
    photos_json,
    rating,
    notes
FROM meals";

const MEAL_COLUMNS: &[&str] = &[
    "id",
    "date",
    "meal_type",
    "items",
    "calories",
    "photos_json",
    "rating",
    "notes",
];

/// Repository interface for meal CRUD operations.
pub trait MealRepository {
    fn insert(&self, id: MealId, draft: &MealDraft) -> RepoResult<()>;
    fn update(&self, meal: &Meal) -> RepoResult<()>;
    fn get(&self, id: MealId) -> RepoResult<Option<Meal>>;
    fn list(&self) -> RepoResult<Vec<Meal>>;
    fn delete(&self, id: MealId) -> RepoResult<()>;
}

/// SQLite-backed meal repository.
pub struct SqliteMealRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteMealRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, "meals", MEAL_COLUMNS)?;
        Ok(Self { conn })
    }
}

impl MealRepository for SqliteMealRepository<'_> {
    fn insert(&self, id: MealId, draft: &MealDraft) -> RepoResult<()> {
        let photos_json = encode_photos(&draft.photos)?;
        self.conn.execute(
            "INSERT INTO meals (
                id,
                date,
                meal_type,
                items,
                calories,
                photos_json,
                rating,
                notes
            ) VALUES (
                ?1,
                COALESCE(?2, strftime('%Y-%m-%d %H:%M', 'now', 'localtime')),
                ?3, ?4, ?5, ?6, ?7, ?8
            );",
            params![
                id.to_string(),
                draft.date.as_deref(),
                draft.meal_type.as_str(),
                draft.items.as_str(),
                draft.calories.map(i64::from),
                photos_json,
                draft.rating.map(i64::from),
                draft.notes.as_deref(),
            ],
        )?;
        Ok(())
    }

    fn update(&self, meal: &Meal) -> RepoResult<()> {
        let photos_json = encode_photos(&meal.photos)?;
        let changed = self.conn.execute(
            "UPDATE meals
             SET
                date = ?2,
                meal_type = ?3,
                items = ?4,
                calories = ?5,
                photos_json = ?6,
                rating = ?7,
                notes = ?8
             WHERE id = ?1;",
            params![
                meal.id.to_string(),
                meal.date.as_str(),
                meal.meal_type.as_str(),
                meal.items.as_str(),
                meal.calories.map(i64::from),
                photos_json,
                meal.rating.map(i64::from),
                meal.notes.as_deref(),
            ],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(meal.id.to_string()));
        }
        Ok(())
    }

    fn get(&self, id: MealId) -> RepoResult<Option<Meal>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{MEAL_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_meal_row(row)?));
        }
        Ok(None)
    }

    fn list(&self) -> RepoResult<Vec<Meal>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{MEAL_SELECT_SQL} ORDER BY date DESC, id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut meals = Vec::new();
        while let Some(row) = rows.next()? {
            meals.push(parse_meal_row(row)?);
        }
        Ok(meals)
    }

    fn delete(&self, id: MealId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM meals WHERE id = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

fn encode_photos(photos: &[String]) -> RepoResult<String> {
    serde_json::to_string(photos)
        .map_err(|err| RepoError::InvalidData(format!("failed to encode meal photos: {err}")))
}

fn parse_meal_row(row: &Row<'_>) -> RepoResult<Meal> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{id_text}` in meals.id")))?;

    let photos_json: String = row.get("photos_json")?;
    let photos: Vec<String> = serde_json::from_str(&photos_json).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid photos value `{photos_json}` in meals.photos_json"
        ))
    })?;

    Ok(Meal {
        id,
        date: row.get("date")?,
        meal_type: row.get("meal_type")?,
        items: row.get("items")?,
        calories: parse_u32_column(row, "calories")?,
        photos,
        rating: parse_u32_column(row, "rating")?,
        notes: row.get("notes")?,
    })
}

fn parse_u32_column(row: &Row<'_>, column: &'static str) -> RepoResult<Option<u32>> {
    match row.get::<_, Option<i64>>(column)? {
        Some(value) => {
            let parsed = u32::try_from(value).map_err(|_| {
                RepoError::InvalidData(format!("invalid value `{value}` in meals.{column}"))
            })?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}
