use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Serialize;

use crate::engine::DailyAggregate;
use crate::error::FieldOpsError;
use crate::utils::{date_from_db, date_to_db};

/// One persisted visit of a recurring job. Written once by
/// [`materialize_instances`] and never mutated by the engine afterward.
#[derive(Debug, Clone, Serialize)]
pub struct JobInstance {
    pub instance_id: i64,
    pub base_job_id: i64,
    pub sequence_number: i64,
    pub scheduled_date: NaiveDate,
    pub weekday_label: String,
    pub task_summary: String,
    pub is_recurring_instance: bool,
}

impl JobInstance {
    pub fn list_for_job(conn: &Connection, base_job_id: i64) -> Result<Vec<Self>, FieldOpsError> {
        let mut stmt = conn.prepare(
            "SELECT instance_id, base_job_id, sequence_number, scheduled_date,
                    weekday_label, task_summary, is_recurring_instance
             FROM job_instances
             WHERE base_job_id = ?
             ORDER BY sequence_number ASC",
        )?;

        let instances = stmt
            .query_map([base_job_id], |row| {
                let scheduled: String = row.get(3)?;
                Ok(JobInstance {
                    instance_id: row.get(0)?,
                    base_job_id: row.get(1)?,
                    sequence_number: row.get(2)?,
                    scheduled_date: date_from_db(3, &scheduled)?,
                    weekday_label: row.get(4)?,
                    task_summary: row.get(5)?,
                    is_recurring_instance: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()
            .map_err(FieldOpsError::DatabaseError)?;

        Ok(instances)
    }
}

/// What happened to a child-instance batch. The parent job's creation is
/// reported by its own call; this outcome only describes the children, and
/// the two must never be collapsed into one success/failure answer because
/// the store gives no multi-row guarantee across them.
#[derive(Debug, Clone, Serialize)]
pub struct MaterializeOutcome {
    pub requested: usize,
    pub inserted: usize,
    pub error: Option<String>,
}

impl MaterializeOutcome {
    pub fn is_complete(&self) -> bool {
        self.error.is_none() && self.inserted == self.requested
    }
}

/// Persist one child job row per planned date, with contiguous 1-based
/// sequence numbers. Rows are written one at a time; on the first failure
/// the batch stops and the outcome reports how many made it in, leaving the
/// earlier rows in place.
pub fn materialize_instances(
    conn: &Connection,
    base_job_id: i64,
    plan: &[DailyAggregate],
) -> MaterializeOutcome {
    let now = chrono::Utc::now().timestamp();
    let mut inserted = 0usize;

    for (index, aggregate) in plan.iter().enumerate() {
        let sequence_number = index as i64 + 1;

        let result = conn.execute(
            "INSERT INTO job_instances (
                base_job_id, sequence_number, scheduled_date,
                weekday_label, task_summary, is_recurring_instance, created_at
            ) VALUES (?, ?, ?, ?, ?, 1, ?)",
            rusqlite::params![
                base_job_id,
                sequence_number,
                date_to_db(aggregate.date),
                aggregate.weekday_label,
                aggregate.summary(),
                now,
            ],
        );

        match result {
            Ok(_) => inserted += 1,
            Err(e) => {
                log::error!(
                    "Instance batch for job {} failed at visit {} of {}: {}",
                    base_job_id,
                    sequence_number,
                    plan.len(),
                    e
                );
                return MaterializeOutcome {
                    requested: plan.len(),
                    inserted,
                    error: Some(e.to_string()),
                };
            }
        }
    }

    MaterializeOutcome {
        requested: plan.len(),
        inserted,
        error: None,
    }
}
