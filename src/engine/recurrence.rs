use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::FieldOpsError;

/// Recurrence kind: None, Daily, Weekly, Monthly, or Custom weekday set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(i64)]
pub enum RecurrenceKind {
    None = 0,
    Daily = 1,
    Weekly = 2,
    Monthly = 3,
    Custom = 4,
}

impl RecurrenceKind {
    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::Daily),
            2 => Some(Self::Weekly),
            3 => Some(Self::Monthly),
            4 => Some(Self::Custom),
            _ => None,
        }
    }

    pub fn as_i64(self) -> i64 {
        self as i64
    }
}

/// End conditions for a rule. Both bounds may be present; expansion stops at
/// whichever is reached first. Neither bound means the rule is unbounded and
/// only the caller's horizon or instance ceiling limits it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndBound {
    pub until: Option<NaiveDate>,
    pub max_visits: Option<u32>,
}

impl EndBound {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn until(date: NaiveDate) -> Self {
        Self {
            until: Some(date),
            max_visits: None,
        }
    }

    pub fn max_visits(count: u32) -> Self {
        Self {
            until: None,
            max_visits: Some(count),
        }
    }
}

/// A validated description of "when": constructing one rejects inputs that
/// must never reach expansion (zero interval, out-of-range weekdays, weekday
/// sets on non-custom kinds). Deliberately not deserializable; rules enter
/// the system through `new` so validation cannot be skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecurrenceRule {
    kind: RecurrenceKind,
    interval: u32,
    weekdays: Vec<u8>,
    end: EndBound,
}

impl RecurrenceRule {
    /// Build and validate a rule. `weekdays` is meaningful only for
    /// `Custom`; an empty custom set is accepted and expands to nothing.
    pub fn new(
        kind: RecurrenceKind,
        interval: u32,
        weekdays: Vec<u8>,
        end: EndBound,
    ) -> Result<Self, FieldOpsError> {
        let mut weekdays = weekdays;
        weekdays.sort_unstable();
        weekdays.dedup();

        let rule = RecurrenceRule {
            kind,
            interval,
            weekdays,
            end,
        };

        rule.validate()
            .map_err(|e| FieldOpsError::Error(format!("Invalid recurrence rule: {}", e)))?;

        Ok(rule)
    }

    /// Convenience constructor for a one-shot rule (no recurrence).
    pub fn one_shot() -> Self {
        RecurrenceRule {
            kind: RecurrenceKind::None,
            interval: 1,
            weekdays: Vec::new(),
            end: EndBound::none(),
        }
    }

    fn validate(&self) -> Result<(), String> {
        match self.kind {
            RecurrenceKind::Daily | RecurrenceKind::Weekly | RecurrenceKind::Monthly => {
                // Interval of 0 is rejected outright, not coerced to 1
                if self.interval == 0 {
                    return Err("recurrence interval must be positive".to_string());
                }
                if !self.weekdays.is_empty() {
                    return Err(format!(
                        "{:?} rules do not take a weekday set",
                        self.kind
                    ));
                }
            }
            RecurrenceKind::Custom => {
                if let Some(&day) = self.weekdays.iter().find(|&&d| d > 6) {
                    return Err(format!("weekday {} is out of range (0-6)", day));
                }
            }
            RecurrenceKind::None => {
                if !self.weekdays.is_empty() {
                    return Err("one-shot rules do not take a weekday set".to_string());
                }
            }
        }

        Ok(())
    }

    pub fn kind(&self) -> RecurrenceKind {
        self.kind
    }

    pub fn interval(&self) -> u32 {
        self.interval
    }

    pub fn weekdays(&self) -> &[u8] {
        &self.weekdays
    }

    pub fn end(&self) -> &EndBound {
        &self.end
    }
}
