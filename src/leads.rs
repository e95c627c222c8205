use rusqlite::{Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::error::FieldOpsError;

/// Pipeline status of a lead
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(i64)]
pub enum LeadStatus {
    New = 0,
    Contacted = 1,
    Qualified = 2,
    Converted = 3,
    Lost = 4,
}

impl LeadStatus {
    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::New),
            1 => Some(Self::Contacted),
            2 => Some(Self::Qualified),
            3 => Some(Self::Converted),
            4 => Some(Self::Lost),
            _ => None,
        }
    }

    pub fn as_i64(self) -> i64 {
        self as i64
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub lead_id: i64,
    pub contact_name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub property_id: Option<i64>,
    pub status: LeadStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Lead {
    pub fn create(
        conn: &Connection,
        contact_name: &str,
        phone: Option<&str>,
        email: Option<&str>,
        property_id: Option<i64>,
    ) -> Result<Self, FieldOpsError> {
        let contact_name = contact_name.trim();
        if contact_name.is_empty() {
            return Err(FieldOpsError::Error("Lead contact name is empty".into()));
        }

        let now = chrono::Utc::now().timestamp();

        let lead_id: i64 = conn.query_row(
            "INSERT INTO leads (contact_name, phone, email, property_id, status, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             RETURNING lead_id",
            rusqlite::params![
                contact_name,
                phone,
                email,
                property_id,
                LeadStatus::New.as_i64(),
                now,
                now,
            ],
            |row| row.get(0),
        )?;

        Ok(Lead {
            lead_id,
            contact_name: contact_name.to_owned(),
            phone: phone.map(str::to_owned),
            email: email.map(str::to_owned),
            property_id,
            status: LeadStatus::New,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn get_by_id(conn: &Connection, lead_id: i64) -> Result<Option<Self>, FieldOpsError> {
        conn.query_row(
            "SELECT lead_id, contact_name, phone, email, property_id, status, created_at, updated_at
             FROM leads
             WHERE lead_id = ?",
            [lead_id],
            Self::from_row,
        )
        .optional()
        .map_err(FieldOpsError::DatabaseError)
    }

    pub fn list(conn: &Connection) -> Result<Vec<Self>, FieldOpsError> {
        let mut stmt = conn.prepare(
            "SELECT lead_id, contact_name, phone, email, property_id, status, created_at, updated_at
             FROM leads
             ORDER BY created_at DESC, lead_id DESC",
        )?;

        let leads = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(FieldOpsError::DatabaseError)?;

        Ok(leads)
    }

    pub fn set_status(
        conn: &Connection,
        lead_id: i64,
        status: LeadStatus,
    ) -> Result<(), FieldOpsError> {
        let now = chrono::Utc::now().timestamp();

        let rows_affected = conn.execute(
            "UPDATE leads SET status = ?, updated_at = ? WHERE lead_id = ?",
            rusqlite::params![status.as_i64(), now, lead_id],
        )?;

        if rows_affected == 0 {
            return Err(FieldOpsError::Error(format!(
                "Lead with id {} not found",
                lead_id
            )));
        }

        Ok(())
    }

    fn from_row(row: &rusqlite::Row) -> Result<Self, rusqlite::Error> {
        Ok(Lead {
            lead_id: row.get(0)?,
            contact_name: row.get(1)?,
            phone: row.get(2)?,
            email: row.get(3)?,
            property_id: row.get(4)?,
            status: LeadStatus::from_i64(row.get(5)?).ok_or_else(|| {
                rusqlite::Error::InvalidColumnType(
                    5,
                    "status".to_string(),
                    rusqlite::types::Type::Integer,
                )
            })?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
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
    fn test_lead_lifecycle() {
        let conn = test_conn();
        let lead = Lead::create(&conn, "Dana Velez", Some("718-555-0134"), None, None).unwrap();
        assert_eq!(lead.status, LeadStatus::New);

        Lead::set_status(&conn, lead.lead_id, LeadStatus::Qualified).unwrap();
        let found = Lead::get_by_id(&conn, lead.lead_id).unwrap().unwrap();
        assert_eq!(found.status, LeadStatus::Qualified);
    }

    #[test]
    fn test_set_status_unknown_lead_fails() {
        let conn = test_conn();
        assert!(Lead::set_status(&conn, 999, LeadStatus::Lost).is_err());
    }

    #[test]
    fn test_status_conversion() {
        assert_eq!(LeadStatus::from_i64(3), Some(LeadStatus::Converted));
        assert_eq!(LeadStatus::from_i64(99), None);
        assert_eq!(LeadStatus::Lost.as_i64(), 4);
    }
}
