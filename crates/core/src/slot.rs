use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::types::AnalystId;

/// Resolution at which slot start times are compared.
///
/// Two requests whose start times fall into the same bucket address the same
/// slot. The default drops sub-second precision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotGranularity {
    #[default]
    Second,
    Minute,
}

impl SlotGranularity {
    /// Length of one bucket in seconds.
    #[must_use]
    pub fn seconds(self) -> i64 {
        match self {
            Self::Second => 1,
            Self::Minute => 60,
        }
    }

    /// Truncate a timestamp down to the start of its bucket.
    #[must_use]
    pub fn truncate(self, at: DateTime<Utc>) -> DateTime<Utc> {
        let secs = at.timestamp();
        let floored = secs - secs.rem_euclid(self.seconds());
        DateTime::from_timestamp(floored, 0).unwrap_or(at)
    }
}

/// Identity of a bookable unit: one analyst at one slot start time.
///
/// Used both as the lock name and as the uniqueness predicate for confirmed
/// reservations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SlotKey {
    analyst_id: AnalystId,
    slot_time: DateTime<Utc>,
}

impl SlotKey {
    /// Build a slot key, truncating the start time to `granularity`.
    #[must_use]
    pub fn new(
        analyst_id: impl Into<AnalystId>,
        slot_time: DateTime<Utc>,
        granularity: SlotGranularity,
    ) -> Self {
        Self {
            analyst_id: analyst_id.into(),
            slot_time: granularity.truncate(slot_time),
        }
    }

    pub fn analyst_id(&self) -> &AnalystId {
        &self.analyst_id
    }

    pub fn slot_time(&self) -> DateTime<Utc> {
        self.slot_time
    }

    /// Name under which the slot is locked: `booking:{analyst}:{rfc3339 start}`.
    #[must_use]
    pub fn lock_name(&self) -> String {
        format!(
            "booking:{}:{}",
            self.analyst_id,
            self.slot_time.to_rfc3339_opts(SecondsFormat::Secs, true)
        )
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}",
            self.analyst_id,
            self.slot_time.to_rfc3339_opts(SecondsFormat::Secs, true)
        )
    }
}
