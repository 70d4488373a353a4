//! Button events — raw remote presses awaiting resolution.
//!
//! Rows are created by the physical-layer listeners (BLE/X10, out of scope
//! here) and consumed by the resolver. `executed` is terminal even when no
//! mapping existed: unknown combinations are drained, not retried.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::time::Timestamp;

/// Lifecycle status of a [`ButtonEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonEventStatus {
    Received,
    Processing,
    Executed,
}

impl ButtonEventStatus {
    /// Lowercase string form used in the store.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Processing => "processing",
            Self::Executed => "executed",
        }
    }
}

impl std::fmt::Display for ButtonEventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ButtonEventStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "received" => Ok(Self::Received),
            "processing" => Ok(Self::Processing),
            "executed" => Ok(Self::Executed),
            other => Err(ValidationError::UnknownStatus(other.to_string())),
        }
    }
}

/// One physical button press, as inserted by a listener process.
#[derive(Debug, Clone)]
pub struct ButtonEvent {
    /// Store row id.
    pub id: i64,
    /// Name of the remote the press came from.
    pub remote_name: String,
    /// Button number on that remote.
    pub button_number: u8,
    pub status: ButtonEventStatus,
    pub timestamp: Timestamp,
}
