use rusqlite::{Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::error::FieldOpsError;

/// A line of service the operator offers. `curbside_pickup` is the explicit
/// capability flag that decides whether contracts in this category track
/// collection-authority calendars; nothing keys off category names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceCategory {
    pub category_id: i64,
    pub name: String,
    pub curbside_pickup: bool,
    pub created_at: i64,
}

impl ServiceCategory {
    pub fn create(
        conn: &Connection,
        name: &str,
        curbside_pickup: bool,
    ) -> Result<Self, FieldOpsError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(FieldOpsError::Error("Category name is empty".into()));
        }

        let now = chrono::Utc::now().timestamp();

        let category_id: i64 = conn.query_row(
            "INSERT INTO service_categories (name, curbside_pickup, created_at)
             VALUES (?, ?, ?)
             RETURNING category_id",
            rusqlite::params![name, curbside_pickup, now],
            |row| row.get(0),
        )?;

        Ok(ServiceCategory {
            category_id,
            name: name.to_owned(),
            curbside_pickup,
            created_at: now,
        })
    }

    pub fn get_by_id(conn: &Connection, category_id: i64) -> Result<Option<Self>, FieldOpsError> {
        conn.query_row(
            "SELECT category_id, name, curbside_pickup, created_at
             FROM service_categories
             WHERE category_id = ?",
            [category_id],
            Self::from_row,
        )
        .optional()
        .map_err(FieldOpsError::DatabaseError)
    }

    pub fn list(conn: &Connection) -> Result<Vec<Self>, FieldOpsError> {
        let mut stmt = conn.prepare(
            "SELECT category_id, name, curbside_pickup, created_at
             FROM service_categories
             ORDER BY name COLLATE NOCASE ASC",
        )?;

        let categories = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(FieldOpsError::DatabaseError)?;

        Ok(categories)
    }

    fn from_row(row: &rusqlite::Row) -> Result<Self, rusqlite::Error> {
        Ok(ServiceCategory {
            category_id: row.get(0)?,
            name: row.get(1)?,
            curbside_pickup: row.get(2)?,
            created_at: row.get(3)?,
        })
    }
}
