use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::contracts::Contract;
use crate::engine::ExpansionBounds;
use crate::error::FieldOpsError;
use crate::materialize::{materialize_instances, MaterializeOutcome};
use crate::pickup::PickupLookup;
use crate::utils::{date_from_db, date_to_db};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(i64)]
pub enum JobStatus {
    Scheduled = 0,
    InProgress = 1,
    Completed = 2,
    Canceled = 3,
}

impl JobStatus {
    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::Scheduled),
            1 => Some(Self::InProgress),
            2 => Some(Self::Completed),
            3 => Some(Self::Canceled),
            _ => None,
        }
    }

    pub fn as_i64(self) -> i64 {
        self as i64
    }
}

/// A field job. A recurring parent owns a batch of job instances; a
/// one-shot job stands alone.
#[derive(Debug, Clone, Serialize)]
pub struct Job {
    pub job_id: i64,
    pub contract_id: Option<i64>,
    pub property_id: i64,
    pub title: String,
    pub status: JobStatus,
    pub scheduled_date: NaiveDate,
    pub is_recurring_parent: bool,
    pub notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Result of scheduling a contract: the parent job (already created) and
/// the child-batch outcome, reported separately per the store's
/// no-multi-row-guarantee contract.
#[derive(Debug, Serialize)]
pub struct ScheduleOutcome {
    pub job: Job,
    pub materialization: MaterializeOutcome,
}

impl Job {
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        conn: &Connection,
        contract_id: Option<i64>,
        property_id: i64,
        title: &str,
        scheduled_date: NaiveDate,
        is_recurring_parent: bool,
        notes: Option<&str>,
    ) -> Result<Self, FieldOpsError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(FieldOpsError::Error("Job title is empty".into()));
        }

        let now = chrono::Utc::now().timestamp();

        let job_id: i64 = conn.query_row(
            "INSERT INTO jobs (
                contract_id, property_id, title, status, scheduled_date,
                is_recurring_parent, notes, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING job_id",
            rusqlite::params![
                contract_id,
                property_id,
                title,
                JobStatus::Scheduled.as_i64(),
                date_to_db(scheduled_date),
                is_recurring_parent,
                notes,
                now,
                now,
            ],
            |row| row.get(0),
        )?;

        Ok(Job {
            job_id,
            contract_id,
            property_id,
            title: title.to_owned(),
            status: JobStatus::Scheduled,
            scheduled_date,
            is_recurring_parent,
            notes: notes.map(str::to_owned),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn get_by_id(conn: &Connection, job_id: i64) -> Result<Option<Self>, FieldOpsError> {
        conn.query_row(
            &format!("{} WHERE job_id = ?", Self::SELECT),
            [job_id],
            Self::from_row,
        )
        .optional()
        .map_err(FieldOpsError::DatabaseError)
    }

    pub fn list(conn: &Connection) -> Result<Vec<Self>, FieldOpsError> {
        let mut stmt = conn.prepare(&format!(
            "{} ORDER BY scheduled_date ASC, job_id ASC",
            Self::SELECT
        ))?;

        let jobs = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(FieldOpsError::DatabaseError)?;

        Ok(jobs)
    }

    pub fn list_for_contract(
        conn: &Connection,
        contract_id: i64,
    ) -> Result<Vec<Self>, FieldOpsError> {
        let mut stmt = conn.prepare(&format!(
            "{} WHERE contract_id = ? ORDER BY scheduled_date ASC, job_id ASC",
            Self::SELECT
        ))?;

        let jobs = stmt
            .query_map([contract_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(FieldOpsError::DatabaseError)?;

        Ok(jobs)
    }

    pub fn set_status(
        conn: &Connection,
        job_id: i64,
        status: JobStatus,
    ) -> Result<(), FieldOpsError> {
        let now = chrono::Utc::now().timestamp();

        let rows_affected = conn.execute(
            "UPDATE jobs SET status = ?, updated_at = ? WHERE job_id = ?",
            rusqlite::params![status.as_i64(), now, job_id],
        )?;

        if rows_affected == 0 {
            return Err(FieldOpsError::Error(format!(
                "Job with id {} not found",
                job_id
            )));
        }

        Ok(())
    }

    /// Schedule a contract's recurring visits: create the consolidated
    /// parent job, expand the contract's rule, and materialize one child
    /// instance per date. The parent insert and the child batch are
    /// separate store operations; a child-batch failure leaves the parent
    /// in place and is reported in the outcome, not as an error.
    pub fn schedule_recurring(
        conn: &Connection,
        contract: &Contract,
        lookup: &dyn PickupLookup,
    ) -> Result<ScheduleOutcome, FieldOpsError> {
        // Materialization is not idempotent, so double submission is refused
        // here rather than left to UI submit-button gating
        let existing: Option<i64> = conn
            .query_row(
                "SELECT job_id FROM jobs WHERE contract_id = ? AND is_recurring_parent = 1 LIMIT 1",
                [contract.contract_id],
                |row| row.get(0),
            )
            .optional()?;

        if let Some(job_id) = existing {
            return Err(FieldOpsError::Error(format!(
                "Contract {} is already scheduled as job {}",
                contract.contract_id, job_id
            )));
        }

        let context = contract.plan_context(conn, lookup)?;
        let plan = context.plan(contract.start_date, &ExpansionBounds::materialize());

        let notes = format!(
            "{} scheduled visit(s) for '{}'. {}",
            plan.len(),
            contract.title,
            context.provenance_note()
        );

        let job = Job::create(
            conn,
            Some(contract.contract_id),
            contract.property_id,
            &contract.title,
            contract.start_date,
            true,
            Some(&notes),
        )?;

        let materialization = materialize_instances(conn, job.job_id, &plan);
        if !materialization.is_complete() {
            log::warn!(
                "Job {} created but only {} of {} instances were persisted",
                job.job_id,
                materialization.inserted,
                materialization.requested
            );
        }

        Ok(ScheduleOutcome {
            job,
            materialization,
        })
    }

    const SELECT: &'static str = "SELECT
            job_id, contract_id, property_id, title, status, scheduled_date,
            is_recurring_parent, notes, created_at, updated_at
        FROM jobs";

    fn from_row(row: &rusqlite::Row) -> Result<Self, rusqlite::Error> {
        let scheduled: String = row.get(5)?;
        Ok(Job {
            job_id: row.get(0)?,
            contract_id: row.get(1)?,
            property_id: row.get(2)?,
            title: row.get(3)?,
            status: JobStatus::from_i64(row.get(4)?).ok_or_else(|| {
                rusqlite::Error::InvalidColumnType(
                    4,
                    "status".to_string(),
                    rusqlite::types::Type::Integer,
                )
            })?,
            scheduled_date: date_from_db(5, &scheduled)?,
            is_recurring_parent: row.get(6)?,
            notes: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::CreateContractParams;
    use crate::engine::{CollectionType, RecurrenceKind, FALLBACK_TASK};
    use crate::materialize::JobInstance;
    use crate::pickup::DbPickupLookup;
    use crate::properties::Property;
    use crate::schema::ensure_schema;
    use pretty_assertions::assert_eq;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        conn
    }

    fn seeded_contract(conn: &Connection, max_visits: Option<u32>) -> Contract {
        let property = Property::create(conn, "221 Hicks St", Some("Brooklyn"), 8).unwrap();
        Contract::create(
            conn,
            CreateContractParams {
                property_id: property.property_id,
                service_category_id: 1,
                title: "Weekly porter service".to_string(),
                start_date: NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
                recurrence_type: RecurrenceKind::Weekly,
                recurrence_interval: 1,
                recurrence_weekdays: vec![],
                recurrence_end_date: None,
                recurrence_max_visits: max_visits,
                manual_task_weekdays: vec![1],
                tracked_collection_types: vec![CollectionType::Refuse],
            },
        )
        .unwrap()
    }

    #[test]
    fn test_schedule_recurring_materializes_count_bound() {
        let conn = test_conn();
        let contract = seeded_contract(&conn, Some(3));
        let lookup = DbPickupLookup::new(&conn);

        let outcome = Job::schedule_recurring(&conn, &contract, &lookup).unwrap();
        assert!(outcome.materialization.is_complete());
        assert_eq!(outcome.materialization.inserted, 3);
        assert!(outcome.job.is_recurring_parent);

        let instances = JobInstance::list_for_job(&conn, outcome.job.job_id).unwrap();
        assert_eq!(instances.len(), 3);
        // Weekly from a Monday: all visits carry the Monday manual task
        for instance in &instances {
            assert_eq!(instance.weekday_label, "Monday");
            assert!(instance.task_summary.contains("Interior cleaning"));
        }
    }

    #[test]
    fn test_schedule_recurring_refuses_double_submission() {
        let conn = test_conn();
        let contract = seeded_contract(&conn, Some(2));
        let lookup = DbPickupLookup::new(&conn);

        Job::schedule_recurring(&conn, &contract, &lookup).unwrap();
        assert!(Job::schedule_recurring(&conn, &contract, &lookup).is_err());

        // Still exactly one parent job for the contract
        let jobs = Job::list_for_contract(&conn, contract.contract_id).unwrap();
        assert_eq!(jobs.len(), 1);
    }

    #[test]
    fn test_schedule_recurring_caps_unbounded_rules() {
        let conn = test_conn();
        let contract = seeded_contract(&conn, None);
        let lookup = DbPickupLookup::new(&conn);

        let outcome = Job::schedule_recurring(&conn, &contract, &lookup).unwrap();
        assert_eq!(
            outcome.materialization.inserted,
            crate::engine::INSTANCE_CEILING
        );
    }

    #[test]
    fn test_schedule_notes_disclose_simulated_provenance() {
        let conn = test_conn();
        // No calendar rows for the property: the simulated fallback kicks in
        let contract = seeded_contract(&conn, Some(2));
        let lookup = DbPickupLookup::new(&conn);

        let outcome = Job::schedule_recurring(&conn, &contract, &lookup).unwrap();
        let notes = outcome.job.notes.unwrap();
        assert!(notes.contains("Pickup data: simulated"), "notes: {}", notes);
    }

    #[test]
    fn test_one_shot_job_has_no_instances() {
        let conn = test_conn();
        let property = Property::create(&conn, "9 Jay St", None, 2).unwrap();
        let job = Job::create(
            &conn,
            None,
            property.property_id,
            "Gutter repair",
            NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
            false,
            None,
        )
        .unwrap();

        let instances = JobInstance::list_for_job(&conn, job.job_id).unwrap();
        assert!(instances.is_empty());
    }

    #[test]
    fn test_fallback_task_on_quiet_days() {
        let conn = test_conn();
        let property = Property::create(&conn, "9 Jay St", None, 2).unwrap();
        // Daily rule, no manual tasks, no tracked types: every visit gets
        // the fallback label
        let contract = Contract::create(
            &conn,
            CreateContractParams {
                property_id: property.property_id,
                service_category_id: 2,
                title: "Daily check".to_string(),
                start_date: NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
                recurrence_type: RecurrenceKind::Daily,
                recurrence_interval: 1,
                recurrence_weekdays: vec![],
                recurrence_end_date: None,
                recurrence_max_visits: Some(2),
                manual_task_weekdays: vec![],
                tracked_collection_types: vec![],
            },
        )
        .unwrap();
        let lookup = DbPickupLookup::new(&conn);

        let outcome = Job::schedule_recurring(&conn, &contract, &lookup).unwrap();
        let instances = JobInstance::list_for_job(&conn, outcome.job.job_id).unwrap();
        for instance in &instances {
            assert_eq!(instance.task_summary, FALLBACK_TASK);
        }
    }

    #[test]
    fn test_status_round_trip() {
        let conn = test_conn();
        let property = Property::create(&conn, "9 Jay St", None, 2).unwrap();
        let job = Job::create(
            &conn,
            None,
            property.property_id,
            "Gutter repair",
            NaiveDate::from_ymd_opt(2025, 4, 1).unwrap(),
            false,
            None,
        )
        .unwrap();

        Job::set_status(&conn, job.job_id, JobStatus::Completed).unwrap();
        let found = Job::get_by_id(&conn, job.job_id).unwrap().unwrap();
        assert_eq!(found.status, JobStatus::Completed);
    }
}
