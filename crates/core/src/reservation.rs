use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::slot::{SlotGranularity, SlotKey};
use crate::types::{AnalystId, RequesterId, ReservationId};

/// Default booking length when the request does not specify one.
pub const DEFAULT_DURATION_MINUTES: u32 = 30;

/// Longest booking a single request may ask for.
pub const MAX_DURATION_MINUTES: u32 = 480;

/// Upper bound on identifier length accepted from callers.
pub const MAX_ID_LEN: usize = 128;

/// Lifecycle status of a reservation row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Confirmed,
    Cancelled,
}

impl ReservationStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReservationStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(Self::Confirmed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(ValidationError::UnknownStatus(other.to_owned())),
        }
    }
}

/// A durable booking of one slot by one requester.
///
/// At most one reservation per [`SlotKey`] may be `confirmed` at a time.
/// Rows are never deleted; cancellation only flips the status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Reservation {
    pub id: ReservationId,
    #[serde(rename = "user_id")]
    pub requester_id: RequesterId,
    pub analyst_id: AnalystId,
    pub slot_time: DateTime<Utc>,
    pub duration_minutes: u32,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Reservation {
    /// Create a new confirmed reservation with a freshly generated id.
    #[must_use]
    pub fn confirmed(slot: &SlotKey, requester_id: RequesterId, duration_minutes: u32) -> Self {
        let now = Utc::now();
        Self {
            id: ReservationId::generate(),
            requester_id,
            analyst_id: slot.analyst_id().clone(),
            slot_time: slot.slot_time(),
            duration_minutes,
            status: ReservationStatus::Confirmed,
            created_at: now,
            updated_at: now,
        }
    }

    /// The slot this reservation occupies. The stored start time is already
    /// truncated, so no further granularity is applied.
    #[must_use]
    pub fn slot_key(&self) -> SlotKey {
        SlotKey::new(
            self.analyst_id.clone(),
            self.slot_time,
            SlotGranularity::Second,
        )
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == ReservationStatus::Confirmed
    }
}

fn default_duration() -> u32 {
    DEFAULT_DURATION_MINUTES
}

/// Inbound request to book a slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BookingRequest {
    #[serde(rename = "user_id")]
    pub requester_id: RequesterId,
    pub analyst_id: AnalystId,
    pub slot_time: DateTime<Utc>,
    #[serde(default = "default_duration")]
    pub duration_minutes: u32,
}

impl BookingRequest {
    #[must_use]
    pub fn new(
        requester_id: impl Into<RequesterId>,
        analyst_id: impl Into<AnalystId>,
        slot_time: DateTime<Utc>,
    ) -> Self {
        Self {
            requester_id: requester_id.into(),
            analyst_id: analyst_id.into(),
            slot_time,
            duration_minutes: DEFAULT_DURATION_MINUTES,
        }
    }

    #[must_use]
    pub fn with_duration(mut self, minutes: u32) -> Self {
        self.duration_minutes = minutes;
        self
    }

    /// Check field-level constraints before any store is touched.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_id("user_id", &self.requester_id)?;
        check_id("analyst_id", &self.analyst_id)?;
        if self.duration_minutes == 0 || self.duration_minutes > MAX_DURATION_MINUTES {
            return Err(ValidationError::Duration(self.duration_minutes));
        }
        Ok(())
    }

    #[must_use]
    pub fn slot_key(&self, granularity: SlotGranularity) -> SlotKey {
        SlotKey::new(self.analyst_id.clone(), self.slot_time, granularity)
    }
}

fn check_id(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty(field));
    }
    if value.len() > MAX_ID_LEN {
        return Err(ValidationError::TooLong {
            field,
            max: MAX_ID_LEN,
        });
    }
    Ok(())
}
