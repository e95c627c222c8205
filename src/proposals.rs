use rusqlite::{Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::contracts::{Contract, CreateContractParams};
use crate::database::Database;
use crate::error::FieldOpsError;
use crate::leads::{Lead, LeadStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(i64)]
pub enum ProposalStatus {
    Draft = 0,
    Sent = 1,
    Accepted = 2,
    Declined = 3,
}

impl ProposalStatus {
    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::Draft),
            1 => Some(Self::Sent),
            2 => Some(Self::Accepted),
            3 => Some(Self::Declined),
            _ => None,
        }
    }

    pub fn as_i64(self) -> i64 {
        self as i64
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposal {
    pub proposal_id: i64,
    pub lead_id: Option<i64>,
    pub property_id: i64,
    pub service_category_id: i64,
    pub title: String,
    pub status: ProposalStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Proposal {
    pub fn create(
        conn: &Connection,
        lead_id: Option<i64>,
        property_id: i64,
        service_category_id: i64,
        title: &str,
    ) -> Result<Self, FieldOpsError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(FieldOpsError::Error("Proposal title is empty".into()));
        }

        let now = chrono::Utc::now().timestamp();

        let proposal_id: i64 = conn.query_row(
            "INSERT INTO proposals (lead_id, property_id, service_category_id, title, status, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             RETURNING proposal_id",
            rusqlite::params![
                lead_id,
                property_id,
                service_category_id,
                title,
                ProposalStatus::Draft.as_i64(),
                now,
                now,
            ],
            |row| row.get(0),
        )?;

        Ok(Proposal {
            proposal_id,
            lead_id,
            property_id,
            service_category_id,
            title: title.to_owned(),
            status: ProposalStatus::Draft,
            created_at: now,
            updated_at: now,
        })
    }

    /// Create a proposal from a qualified lead and mark the lead converted,
    /// atomically.
    pub fn create_from_lead(
        conn: &Connection,
        lead_id: i64,
        service_category_id: i64,
        title: &str,
    ) -> Result<Self, FieldOpsError> {
        Database::immediate_transaction(conn, |c| {
            let lead = Lead::get_by_id(c, lead_id)?
                .ok_or_else(|| FieldOpsError::Error(format!("Lead {} not found", lead_id)))?;

            let property_id = lead.property_id.ok_or_else(|| {
                FieldOpsError::Error(format!(
                    "Lead {} has no property; attach one before converting",
                    lead_id
                ))
            })?;

            let proposal =
                Self::create(c, Some(lead_id), property_id, service_category_id, title)?;
            Lead::set_status(c, lead_id, LeadStatus::Converted)?;

            Ok(proposal)
        })
    }

    pub fn get_by_id(conn: &Connection, proposal_id: i64) -> Result<Option<Self>, FieldOpsError> {
        conn.query_row(
            "SELECT proposal_id, lead_id, property_id, service_category_id, title, status, created_at, updated_at
             FROM proposals
             WHERE proposal_id = ?",
            [proposal_id],
            Self::from_row,
        )
        .optional()
        .map_err(FieldOpsError::DatabaseError)
    }

    pub fn list(conn: &Connection) -> Result<Vec<Self>, FieldOpsError> {
        let mut stmt = conn.prepare(
            "SELECT proposal_id, lead_id, property_id, service_category_id, title, status, created_at, updated_at
             FROM proposals
             ORDER BY created_at DESC, proposal_id DESC",
        )?;

        let proposals = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(FieldOpsError::DatabaseError)?;

        Ok(proposals)
    }

    pub fn set_status(
        conn: &Connection,
        proposal_id: i64,
        status: ProposalStatus,
    ) -> Result<(), FieldOpsError> {
        let now = chrono::Utc::now().timestamp();

        let rows_affected = conn.execute(
            "UPDATE proposals SET status = ?, updated_at = ? WHERE proposal_id = ?",
            rusqlite::params![status.as_i64(), now, proposal_id],
        )?;

        if rows_affected == 0 {
            return Err(FieldOpsError::Error(format!(
                "Proposal with id {} not found",
                proposal_id
            )));
        }

        Ok(())
    }

    /// Accept a proposal and create the contract it described. This is a
    /// one-shot conversion (a single contract insert); scheduling happens
    /// later, against the contract.
    pub fn accept(
        conn: &Connection,
        proposal_id: i64,
        terms: CreateContractParams,
    ) -> Result<Contract, FieldOpsError> {
        Database::immediate_transaction(conn, |c| {
            let proposal = Self::get_by_id(c, proposal_id)?.ok_or_else(|| {
                FieldOpsError::Error(format!("Proposal {} not found", proposal_id))
            })?;

            if proposal.status == ProposalStatus::Accepted {
                return Err(FieldOpsError::Error(format!(
                    "Proposal {} is already accepted",
                    proposal_id
                )));
            }

            if terms.property_id != proposal.property_id {
                return Err(FieldOpsError::Error(
                    "Contract property does not match the proposal".to_string(),
                ));
            }

            let contract = Contract::create(c, terms)?;
            Self::set_status(c, proposal_id, ProposalStatus::Accepted)?;

            Ok(contract)
        })
    }

    fn from_row(row: &rusqlite::Row) -> Result<Self, rusqlite::Error> {
        Ok(Proposal {
            proposal_id: row.get(0)?,
            lead_id: row.get(1)?,
            property_id: row.get(2)?,
            service_category_id: row.get(3)?,
            title: row.get(4)?,
            status: ProposalStatus::from_i64(row.get(5)?).ok_or_else(|| {
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
    use crate::engine::RecurrenceKind;
    use crate::properties::Property;
    use crate::schema::ensure_schema;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        conn
    }

    fn seed(conn: &Connection) -> (i64, i64) {
        let property = Property::create(conn, "48 Grove St", None, 4).unwrap();
        let lead = Lead::create(
            conn,
            "Sam Okafor",
            None,
            Some("sam@example.com"),
            Some(property.property_id),
        )
        .unwrap();
        (property.property_id, lead.lead_id)
    }

    fn terms(property_id: i64) -> CreateContractParams {
        CreateContractParams {
            property_id,
            service_category_id: 1,
            title: "Porter service".to_string(),
            start_date: NaiveDate::from_ymd_opt(2025, 2, 3).unwrap(),
            recurrence_type: RecurrenceKind::Weekly,
            recurrence_interval: 1,
            recurrence_weekdays: vec![],
            recurrence_end_date: None,
            recurrence_max_visits: Some(4),
            manual_task_weekdays: vec![],
            tracked_collection_types: vec![],
        }
    }

    #[test]
    fn test_create_from_lead_marks_lead_converted() {
        let conn = test_conn();
        let (_pid, lead_id) = seed(&conn);

        let proposal =
            Proposal::create_from_lead(&conn, lead_id, 1, "Porter service").unwrap();
        assert_eq!(proposal.lead_id, Some(lead_id));

        let lead = Lead::get_by_id(&conn, lead_id).unwrap().unwrap();
        assert_eq!(lead.status, LeadStatus::Converted);
    }

    #[test]
    fn test_create_from_lead_without_property_fails() {
        let conn = test_conn();
        let lead = Lead::create(&conn, "No Property", None, None, None).unwrap();

        let result = Proposal::create_from_lead(&conn, lead.lead_id, 1, "Porter service");
        assert!(result.is_err());

        // Rolled back: lead status unchanged
        let lead = Lead::get_by_id(&conn, lead.lead_id).unwrap().unwrap();
        assert_eq!(lead.status, LeadStatus::New);
    }

    #[test]
    fn test_accept_creates_contract_once() {
        let conn = test_conn();
        let (pid, lead_id) = seed(&conn);
        let proposal =
            Proposal::create_from_lead(&conn, lead_id, 1, "Porter service").unwrap();

        let contract = Proposal::accept(&conn, proposal.proposal_id, terms(pid)).unwrap();
        assert_eq!(contract.property_id, pid);

        let proposal = Proposal::get_by_id(&conn, proposal.proposal_id)
            .unwrap()
            .unwrap();
        assert_eq!(proposal.status, ProposalStatus::Accepted);

        // Second acceptance is refused
        assert!(Proposal::accept(&conn, proposal.proposal_id, terms(pid)).is_err());
    }

    #[test]
    fn test_accept_rejects_property_mismatch() {
        let conn = test_conn();
        let (pid, lead_id) = seed(&conn);
        let other = Property::create(&conn, "9 Jay St", None, 2).unwrap();
        let proposal =
            Proposal::create_from_lead(&conn, lead_id, 1, "Porter service").unwrap();

        let mut bad_terms = terms(pid);
        bad_terms.property_id = other.property_id;
        assert!(Proposal::accept(&conn, proposal.proposal_id, bad_terms).is_err());
    }
}
