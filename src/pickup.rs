use std::str::FromStr;

use rusqlite::Connection;

use crate::engine::{CollectionSchedule, CollectionType, Provenance};
use crate::error::FieldOpsError;

/// Address-keyed lookup against the external collection authority's
/// calendar. Implementations may fail or come back empty; callers go through
/// [`resolve_schedules`], which never propagates either condition.
pub trait PickupLookup {
    fn lookup(&self, address: &str) -> Result<Option<Vec<CollectionSchedule>>, FieldOpsError>;
}

/// Lookup over the locally synced `pickup_calendars` table. Rows carry their
/// own provenance ('real' for authority data, 'sampled' for district-level
/// sample datasets loaded in bulk).
pub struct DbPickupLookup<'a> {
    conn: &'a Connection,
}

impl<'a> DbPickupLookup<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl PickupLookup for DbPickupLookup<'_> {
    fn lookup(&self, address: &str) -> Result<Option<Vec<CollectionSchedule>>, FieldOpsError> {
        let mut stmt = self.conn.prepare(
            "SELECT collection_type, pickup_weekdays, provenance
             FROM pickup_calendars
             WHERE address = ?
             ORDER BY calendar_id ASC",
        )?;

        let rows = stmt.query_map([address], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut schedules: Vec<CollectionSchedule> = Vec::new();
        for row in rows {
            let (type_str, weekdays_json, provenance_str) = row?;

            let collection_type = CollectionType::from_str(&type_str).map_err(|_| {
                FieldOpsError::Error(format!("Unknown collection type: '{}'", type_str))
            })?;
            let provenance = Provenance::from_str(&provenance_str).map_err(|_| {
                FieldOpsError::Error(format!("Unknown provenance: '{}'", provenance_str))
            })?;
            let pickup_weekdays: Vec<u8> = serde_json::from_str(&weekdays_json)?;

            schedules.push(CollectionSchedule {
                collection_type,
                pickup_weekdays,
                provenance,
            });
        }

        if schedules.is_empty() {
            Ok(None)
        } else {
            Ok(Some(schedules))
        }
    }
}

/// Store or replace the calendar rows for an address. Used by calendar sync
/// and by tests; provenance travels with each entry.
pub fn store_calendar(
    conn: &Connection,
    address: &str,
    schedules: &[CollectionSchedule],
) -> Result<(), FieldOpsError> {
    let now = chrono::Utc::now().timestamp();

    for schedule in schedules {
        let weekdays_json = serde_json::to_string(&schedule.pickup_weekdays)?;
        conn.execute(
            "INSERT INTO pickup_calendars (address, collection_type, pickup_weekdays, provenance, created_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT (address, collection_type)
             DO UPDATE SET pickup_weekdays = excluded.pickup_weekdays,
                           provenance = excluded.provenance",
            rusqlite::params![
                address,
                schedule.collection_type.to_string(),
                weekdays_json,
                schedule.provenance.to_string(),
                now,
            ],
        )?;
    }

    Ok(())
}

/// Typical weekly pattern used when no calendar is available. Clearly tagged
/// simulated so every downstream surface can disclose it.
pub fn simulated_defaults(tracked: &[CollectionType]) -> Vec<CollectionSchedule> {
    tracked
        .iter()
        .map(|&collection_type| {
            let pickup_weekdays = match collection_type {
                CollectionType::Refuse => vec![1, 4],  // Mon, Thu
                CollectionType::Recycling => vec![3],  // Wed
                CollectionType::Organics => vec![1],   // Mon
                CollectionType::Bulk => vec![5],       // Fri
            };
            CollectionSchedule {
                collection_type,
                pickup_weekdays,
                provenance: Provenance::Simulated,
            }
        })
        .collect()
}

/// Resolve the collection schedules to plan against: the lookup's answer
/// filtered and ordered by the tracked types, or the simulated fallback when
/// the lookup fails or has nothing for the address. Lookup failure is logged
/// and recovered, never surfaced to the caller.
pub fn resolve_schedules(
    lookup: &dyn PickupLookup,
    address: &str,
    tracked: &[CollectionType],
) -> Vec<CollectionSchedule> {
    if tracked.is_empty() {
        return Vec::new();
    }

    let found = match lookup.lookup(address) {
        Ok(Some(schedules)) => schedules,
        Ok(None) => {
            log::info!(
                "No pickup calendar for '{}'; using simulated schedule",
                address
            );
            return simulated_defaults(tracked);
        }
        Err(e) => {
            log::warn!(
                "Pickup calendar lookup failed for '{}': {}; using simulated schedule",
                address,
                e
            );
            return simulated_defaults(tracked);
        }
    };

    // Tracked order drives task ordering downstream, so reorder the lookup's
    // answer by the tracked list rather than trusting its row order
    tracked
        .iter()
        .filter_map(|&wanted| {
            found
                .iter()
                .find(|s| s.collection_type == wanted)
                .cloned()
        })
        .collect()
}
