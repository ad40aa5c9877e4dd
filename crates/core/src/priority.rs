//! Notification priority levels.
//!
//! Lower numbers are more urgent. The numeric values are part of the wire
//! format (payload `priority` field) and of the `SMALLINT` columns in the
//! database, so they must never be renumbered.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Urgency of a notification, `1` (most urgent) through `4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Priority {
    Emergency = 1,
    /// Sent as `2` and called "priority" by senders.
    High = 2,
    Routine = 3,
    Informational = 4,
}

impl Priority {
    pub fn as_i16(self) -> i16 {
        self as i16
    }

    /// Limit `self` to the most urgent level an authorization permits.
    ///
    /// `max` is the ceiling in urgency terms: a request that is more urgent
    /// (numerically smaller) than `max` is lowered to `max`. Requests at or
    /// below the ceiling pass through unchanged.
    pub fn clamp_to(self, max: Priority) -> Priority {
        if self < max {
            max
        } else {
            self
        }
    }
}

impl TryFrom<u8> for Priority {
    type Error = CoreError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Priority::Emergency),
            2 => Ok(Priority::High),
            3 => Ok(Priority::Routine),
            4 => Ok(Priority::Informational),
            other => Err(CoreError::Validation(format!(
                "Priority must be between 1 and 4, got {other}"
            ))),
        }
    }
}

impl TryFrom<i16> for Priority {
    type Error = CoreError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .map_err(|_| CoreError::Validation(format!("Priority out of range: {value}")))
            .and_then(Priority::try_from)
    }
}

impl From<Priority> for u8 {
    fn from(p: Priority) -> Self {
        p as u8
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Priority::Emergency => "emergency",
            Priority::High => "priority",
            Priority::Routine => "routine",
            Priority::Informational => "informational",
        };
        f.write_str(name)
    }
}
