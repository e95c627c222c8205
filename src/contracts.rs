use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::engine::{
    overall_provenance, CollectionType, EndBound, ManualTaskSchedule, PlanContext, PrepIndex,
    RecurrenceKind, RecurrenceRule,
};
use crate::error::FieldOpsError;
use crate::pickup::{resolve_schedules, PickupLookup};
use crate::properties::Property;
use crate::utils::{date_from_db, date_to_db, weekdays_from_db};

/// The fixed task a contract's manual weekday set schedules.
pub const MANUAL_TASK_LABEL: &str = "Interior cleaning";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(i64)]
pub enum ContractStatus {
    Draft = 0,
    Active = 1,
    Paused = 2,
    Ended = 3,
}

impl ContractStatus {
    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::Draft),
            1 => Some(Self::Active),
            2 => Some(Self::Paused),
            3 => Some(Self::Ended),
            _ => None,
        }
    }

    pub fn as_i64(self) -> i64 {
        self as i64
    }
}

/// Parameters for creating a new contract
#[derive(Debug, Clone, Deserialize)]
pub struct CreateContractParams {
    pub property_id: i64,
    pub service_category_id: i64,
    pub title: String,
    pub start_date: NaiveDate,
    pub recurrence_type: RecurrenceKind,
    #[serde(default = "default_interval")]
    pub recurrence_interval: u32,
    #[serde(default)]
    pub recurrence_weekdays: Vec<u8>,
    #[serde(default)]
    pub recurrence_end_date: Option<NaiveDate>,
    #[serde(default)]
    pub recurrence_max_visits: Option<u32>,
    /// Weekdays the manual task recurs on. Independent of
    /// `recurrence_weekdays`: one set drives date expansion, the other marks
    /// task content, and they are combined only in the aggregator.
    #[serde(default)]
    pub manual_task_weekdays: Vec<u8>,
    #[serde(default)]
    pub tracked_collection_types: Vec<CollectionType>,
}

fn default_interval() -> u32 {
    1
}

/// A service contract. Recurrence columns are surfaced through
/// [`Contract::recurrence_rule`], which is also validated at creation time
/// so bad rules never reach expansion.
#[derive(Debug, Clone, Serialize)]
pub struct Contract {
    pub contract_id: i64,
    pub property_id: i64,
    pub service_category_id: i64,
    pub title: String,
    pub status: ContractStatus,
    pub start_date: NaiveDate,
    pub recurrence_type: RecurrenceKind,
    pub recurrence_interval: u32,
    pub recurrence_weekdays: Vec<u8>,
    pub recurrence_end_date: Option<NaiveDate>,
    pub recurrence_max_visits: Option<u32>,
    pub manual_task_weekdays: Vec<u8>,
    pub tracked_collection_types: Vec<CollectionType>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Contract {
    pub fn create(conn: &Connection, params: CreateContractParams) -> Result<Self, FieldOpsError> {
        let title = params.title.trim().to_owned();
        if title.is_empty() {
            return Err(FieldOpsError::Error("Contract title is empty".into()));
        }

        // Build the typed rule first so invalid recurrence input fails fast,
        // before any row is written
        let rule = RecurrenceRule::new(
            params.recurrence_type,
            params.recurrence_interval,
            params.recurrence_weekdays.clone(),
            EndBound {
                until: params.recurrence_end_date,
                max_visits: params.recurrence_max_visits,
            },
        )?;

        if params
            .manual_task_weekdays
            .iter()
            .any(|&day| day > 6)
        {
            return Err(FieldOpsError::Error(
                "Manual task weekdays must be 0-6".to_string(),
            ));
        }

        let now = chrono::Utc::now().timestamp();
        let weekdays_json = serde_json::to_string(rule.weekdays())?;
        let manual_json = serde_json::to_string(&params.manual_task_weekdays)?;
        let tracked_json = serde_json::to_string(&params.tracked_collection_types)?;

        let contract_id: i64 = conn.query_row(
            "INSERT INTO contracts (
                property_id, service_category_id, title, status, start_date,
                recurrence_type, recurrence_interval, recurrence_weekdays,
                recurrence_end_date, recurrence_max_visits,
                manual_task_weekdays, tracked_collection_types,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING contract_id",
            rusqlite::params![
                params.property_id,
                params.service_category_id,
                title,
                ContractStatus::Draft.as_i64(),
                date_to_db(params.start_date),
                params.recurrence_type.as_i64(),
                params.recurrence_interval as i64,
                weekdays_json,
                params.recurrence_end_date.map(date_to_db),
                params.recurrence_max_visits.map(|c| c as i64),
                manual_json,
                tracked_json,
                now,
                now,
            ],
            |row| row.get(0),
        )?;

        Ok(Contract {
            contract_id,
            property_id: params.property_id,
            service_category_id: params.service_category_id,
            title,
            status: ContractStatus::Draft,
            start_date: params.start_date,
            recurrence_type: params.recurrence_type,
            recurrence_interval: params.recurrence_interval,
            recurrence_weekdays: rule.weekdays().to_vec(),
            recurrence_end_date: params.recurrence_end_date,
            recurrence_max_visits: params.recurrence_max_visits,
            manual_task_weekdays: params.manual_task_weekdays,
            tracked_collection_types: params.tracked_collection_types,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn get_by_id(conn: &Connection, contract_id: i64) -> Result<Option<Self>, FieldOpsError> {
        conn.query_row(
            &format!("{} WHERE contract_id = ?", Self::SELECT),
            [contract_id],
            Self::from_row,
        )
        .optional()
        .map_err(FieldOpsError::DatabaseError)
    }

    pub fn list(conn: &Connection) -> Result<Vec<Self>, FieldOpsError> {
        let mut stmt =
            conn.prepare(&format!("{} ORDER BY contract_id ASC", Self::SELECT))?;

        let contracts = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(FieldOpsError::DatabaseError)?;

        Ok(contracts)
    }

    pub fn set_status(
        conn: &Connection,
        contract_id: i64,
        status: ContractStatus,
    ) -> Result<(), FieldOpsError> {
        let now = chrono::Utc::now().timestamp();

        let rows_affected = conn.execute(
            "UPDATE contracts SET status = ?, updated_at = ? WHERE contract_id = ?",
            rusqlite::params![status.as_i64(), now, contract_id],
        )?;

        if rows_affected == 0 {
            return Err(FieldOpsError::Error(format!(
                "Contract with id {} not found",
                contract_id
            )));
        }

        Ok(())
    }

    /// The typed recurrence rule stored on this contract.
    pub fn recurrence_rule(&self) -> Result<RecurrenceRule, FieldOpsError> {
        RecurrenceRule::new(
            self.recurrence_type,
            self.recurrence_interval,
            self.recurrence_weekdays.clone(),
            EndBound {
                until: self.recurrence_end_date,
                max_visits: self.recurrence_max_visits,
            },
        )
    }

    pub fn manual_schedule(&self) -> ManualTaskSchedule {
        if self.manual_task_weekdays.is_empty() {
            ManualTaskSchedule::none()
        } else {
            ManualTaskSchedule::new(MANUAL_TASK_LABEL, self.manual_task_weekdays.clone())
        }
    }

    /// Resolve everything planning needs for this contract: the typed rule,
    /// the manual set, and the prep index from the property's pickup
    /// calendars. Both preview and materialization start here, so they can
    /// never disagree about inputs.
    pub fn plan_context(
        &self,
        conn: &Connection,
        lookup: &dyn PickupLookup,
    ) -> Result<PlanContext, FieldOpsError> {
        let rule = self.recurrence_rule()?;

        let property = Property::get_by_id(conn, self.property_id)?.ok_or_else(|| {
            FieldOpsError::Error(format!("Property {} not found", self.property_id))
        })?;

        let schedules = resolve_schedules(lookup, &property.address, &self.tracked_collection_types);
        let provenance = overall_provenance(&schedules);

        Ok(PlanContext {
            rule,
            manual: self.manual_schedule(),
            prep: PrepIndex::build(&schedules),
            provenance,
        })
    }

    const SELECT: &'static str = "SELECT
            contract_id, property_id, service_category_id, title, status,
            start_date, recurrence_type, recurrence_interval, recurrence_weekdays,
            recurrence_end_date, recurrence_max_visits,
            manual_task_weekdays, tracked_collection_types,
            created_at, updated_at
        FROM contracts";

    fn from_row(row: &rusqlite::Row) -> Result<Self, rusqlite::Error> {
        let start_date: String = row.get(5)?;
        let end_date: Option<String> = row.get(9)?;
        let weekdays: String = row.get(8)?;
        let manual: String = row.get(11)?;
        let tracked: String = row.get(12)?;

        Ok(Contract {
            contract_id: row.get(0)?,
            property_id: row.get(1)?,
            service_category_id: row.get(2)?,
            title: row.get(3)?,
            status: ContractStatus::from_i64(row.get(4)?).ok_or_else(|| {
                rusqlite::Error::InvalidColumnType(
                    4,
                    "status".to_string(),
                    rusqlite::types::Type::Integer,
                )
            })?,
            start_date: date_from_db(5, &start_date)?,
            recurrence_type: RecurrenceKind::from_i64(row.get(6)?).ok_or_else(|| {
                rusqlite::Error::InvalidColumnType(
                    6,
                    "recurrence_type".to_string(),
                    rusqlite::types::Type::Integer,
                )
            })?,
            recurrence_interval: row.get::<_, i64>(7)? as u32,
            recurrence_weekdays: weekdays_from_db(8, &weekdays)?,
            recurrence_end_date: end_date
                .map(|d| date_from_db(9, &d))
                .transpose()?,
            recurrence_max_visits: row.get::<_, Option<i64>>(10)?.map(|c| c as u32),
            manual_task_weekdays: weekdays_from_db(11, &manual)?,
            tracked_collection_types: serde_json::from_str(&tracked).map_err(|_| {
                rusqlite::Error::InvalidColumnType(
                    12,
                    "tracked_collection_types".to_string(),
                    rusqlite::types::Type::Text,
                )
            })?,
            created_at: row.get(13)?,
            updated_at: row.get(14)?,
        })
    }
}
