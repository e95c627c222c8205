use rusqlite::{Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::error::FieldOpsError;

/// A serviced property. The address is the key the external pickup-calendar
/// lookup is resolved against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Property {
    pub property_id: i64,
    pub address: String,
    pub borough: Option<String>,
    pub unit_count: i64,
    pub created_at: i64,
}

impl Property {
    pub fn create(
        conn: &Connection,
        address: &str,
        borough: Option<&str>,
        unit_count: i64,
    ) -> Result<Self, FieldOpsError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(FieldOpsError::Error("Property address is empty".into()));
        }
        if unit_count < 1 {
            return Err(FieldOpsError::Error(format!(
                "Unit count must be at least 1, got: {}",
                unit_count
            )));
        }

        let now = chrono::Utc::now().timestamp();

        let property_id: i64 = conn.query_row(
            "INSERT INTO properties (address, borough, unit_count, created_at)
             VALUES (?, ?, ?, ?)
             RETURNING property_id",
            rusqlite::params![address, borough, unit_count, now],
            |row| row.get(0),
        )?;

        Ok(Property {
            property_id,
            address: address.to_owned(),
            borough: borough.map(str::to_owned),
            unit_count,
            created_at: now,
        })
    }

    pub fn get_by_id(conn: &Connection, property_id: i64) -> Result<Option<Self>, FieldOpsError> {
        conn.query_row(
            "SELECT property_id, address, borough, unit_count, created_at
             FROM properties
             WHERE property_id = ?",
            [property_id],
            Self::from_row,
        )
        .optional()
        .map_err(FieldOpsError::DatabaseError)
    }

    pub fn get_by_address(conn: &Connection, address: &str) -> Result<Option<Self>, FieldOpsError> {
        conn.query_row(
            "SELECT property_id, address, borough, unit_count, created_at
             FROM properties
             WHERE address = ?",
            [address],
            Self::from_row,
        )
        .optional()
        .map_err(FieldOpsError::DatabaseError)
    }

    pub fn list(conn: &Connection) -> Result<Vec<Self>, FieldOpsError> {
        let mut stmt = conn.prepare(
            "SELECT property_id, address, borough, unit_count, created_at
             FROM properties
             ORDER BY address COLLATE NOCASE ASC",
        )?;

        let properties = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(FieldOpsError::DatabaseError)?;

        Ok(properties)
    }

    fn from_row(row: &rusqlite::Row) -> Result<Self, rusqlite::Error> {
        Ok(Property {
            property_id: row.get(0)?,
            address: row.get(1)?,
            borough: row.get(2)?,
            unit_count: row.get(3)?,
            created_at: row.get(4)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ensure_schema;
    use pretty_assertions::assert_eq;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        conn
    }

    #[test]
    fn test_create_and_get() {
        let conn = test_conn();
        let property = Property::create(&conn, "221 Hicks St", Some("Brooklyn"), 12).unwrap();

        let found = Property::get_by_id(&conn, property.property_id)
            .unwrap()
            .unwrap();
        assert_eq!(found.address, "221 Hicks St");
        assert_eq!(found.borough.as_deref(), Some("Brooklyn"));
        assert_eq!(found.unit_count, 12);

        let by_address = Property::get_by_address(&conn, "221 Hicks St")
            .unwrap()
            .unwrap();
        assert_eq!(by_address.property_id, property.property_id);
    }

    #[test]
    fn test_empty_address_rejected() {
        let conn = test_conn();
        assert!(Property::create(&conn, "  ", None, 1).is_err());
    }

    #[test]
    fn test_zero_unit_count_rejected() {
        let conn = test_conn();
        assert!(Property::create(&conn, "221 Hicks St", None, 0).is_err());
    }

    #[test]
    fn test_list_is_ordered_by_address() {
        let conn = test_conn();
        Property::create(&conn, "9 Water St", None, 1).unwrap();
        Property::create(&conn, "100 Court St", None, 1).unwrap();

        let listed = Property::list(&conn).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].address, "100 Court St");
    }
}
