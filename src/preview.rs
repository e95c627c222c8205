use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Serialize;

use crate::contracts::Contract;
use crate::engine::{DailyAggregate, ExpansionBounds, Provenance};
use crate::error::FieldOpsError;
use crate::pickup::PickupLookup;

/// Horizons the preview UI offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[repr(u32)]
pub enum PreviewHorizon {
    Week = 7,
    TwoWeeks = 14,
    Month = 30,
    TwoMonths = 60,
    Quarter = 90,
}

impl PreviewHorizon {
    pub fn from_days(days: u32) -> Option<Self> {
        match days {
            7 => Some(Self::Week),
            14 => Some(Self::TwoWeeks),
            30 => Some(Self::Month),
            60 => Some(Self::TwoMonths),
            90 => Some(Self::Quarter),
            _ => None,
        }
    }

    pub fn days(self) -> u32 {
        self as u32
    }
}

impl Default for PreviewHorizon {
    fn default() -> Self {
        Self::Month
    }
}

/// A read-only projection of what scheduling a contract would produce
/// within the horizon. Rows are the same `DailyAggregate` shape the
/// materializer persists, plus the provenance disclosure.
#[derive(Debug, Serialize)]
pub struct SchedulePreview {
    pub contract_id: i64,
    pub horizon_days: u32,
    pub provenance: Provenance,
    pub visits: Vec<DailyAggregate>,
}

/// Project a contract's upcoming visits without writing anything. Goes
/// through the contract's plan context and the shared plan builder, so the
/// rows shown here are exactly what materialization would persist — an
/// empty `visits` list is a valid answer ("no scheduled visits"), not an
/// error.
pub fn preview_contract(
    conn: &Connection,
    contract: &Contract,
    lookup: &dyn PickupLookup,
    today: NaiveDate,
    horizon: PreviewHorizon,
) -> Result<SchedulePreview, FieldOpsError> {
    let context = contract.plan_context(conn, lookup)?;
    let visits = context.plan(
        contract.start_date,
        &ExpansionBounds::preview(today, horizon.days()),
    );

    Ok(SchedulePreview {
        contract_id: contract.contract_id,
        horizon_days: horizon.days(),
        provenance: context.provenance,
        visits,
    })
}
