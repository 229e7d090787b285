use serde::Deserialize;
use slotguard_core::SlotGranularity;

/// Booking semantics.
///
/// ```toml
/// [booking]
/// granularity = "minute"
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct BookingConfig {
    /// Precision at which slot start times are compared: `"second"` or
    /// `"minute"`.
    #[serde(default)]
    pub granularity: SlotGranularity,
}
