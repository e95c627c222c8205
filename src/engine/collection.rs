use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Waste collection types the external authority services. The wire name is
/// the lowercase form used in API bodies and the `pickup_calendars` table.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CollectionType {
    Refuse,
    Recycling,
    Organics,
    Bulk,
}

impl CollectionType {
    /// Human-facing label used in task lines and job notes.
    pub fn label(&self) -> &'static str {
        match self {
            CollectionType::Refuse => "Refuse",
            CollectionType::Recycling => "Recycling",
            CollectionType::Organics => "Organics",
            CollectionType::Bulk => "Bulk",
        }
    }
}

/// Where a collection schedule came from. Carried through to previews and
/// job notes so downstream consumers can disclose data quality; this tag is
/// part of the contract, not cosmetic.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Provenance {
    /// Straight from the authority's published calendar
    Real,
    /// Drawn from a district-level sample dataset
    Sampled,
    /// Synthesized locally because no calendar was available
    Simulated,
}

/// Weekly pickup calendar for one collection type at one property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSchedule {
    pub collection_type: CollectionType,
    pub pickup_weekdays: Vec<u8>,
    pub provenance: Provenance,
}

/// Prep happens the calendar day before pickup. Total and pure on {0..6};
/// the inverse is [`pickup_weekday_for_prep`].
pub fn prep_weekday(pickup_weekday: u8) -> u8 {
    (pickup_weekday + 6) % 7
}

pub fn pickup_weekday_for_prep(prep_weekday: u8) -> u8 {
    (prep_weekday + 1) % 7
}

/// For every weekday 0-6, the collection types whose prep falls on that day.
/// Built once from the resolved calendar list; type order within a slot
/// follows the order schedules were supplied in, which the aggregator
/// preserves into task lists.
#[derive(Debug, Clone, Default)]
pub struct PrepIndex {
    by_weekday: [Vec<CollectionType>; 7],
}

impl PrepIndex {
    pub fn build(schedules: &[CollectionSchedule]) -> Self {
        let mut index = PrepIndex::default();

        for schedule in schedules {
            for &pickup in &schedule.pickup_weekdays {
                let prep = prep_weekday(pickup);
                let slot = &mut index.by_weekday[(prep % 7) as usize];
                if !slot.contains(&schedule.collection_type) {
                    slot.push(schedule.collection_type);
                }
            }
        }

        index
    }

    pub fn types_for(&self, weekday: u8) -> &[CollectionType] {
        &self.by_weekday[(weekday % 7) as usize]
    }

    pub fn is_empty(&self) -> bool {
        self.by_weekday.iter().all(|slot| slot.is_empty())
    }
}

/// Worst-case provenance across a calendar list: any simulated entry marks
/// the whole plan simulated, then sampled, then real.
pub fn overall_provenance(schedules: &[CollectionSchedule]) -> Provenance {
    let mut overall = Provenance::Real;
    for schedule in schedules {
        match (overall, schedule.provenance) {
            (_, Provenance::Simulated) => return Provenance::Simulated,
            (Provenance::Real, Provenance::Sampled) => overall = Provenance::Sampled,
            _ => {}
        }
    }
    overall
}
