//! Device — a read-only directory entry describing a controllable light.
//!
//! The device directory is maintained by external collaborators (UI CRUD,
//! discovery listeners); the command pipeline only reads it to resolve a
//! device id into its model/brand and to sample power state for toggles.

use serde::{Deserialize, Serialize};

use crate::id::DeviceId;

/// A vendor ecosystem with its own API and adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Brand {
    Hue,
    Govee,
    Vesync,
}

impl Brand {
    /// Lowercase string form used in the store.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hue => "hue",
            Self::Govee => "govee",
            Self::Vesync => "vesync",
        }
    }
}

impl std::fmt::Display for Brand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Brand {
    type Err = crate::error::ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hue" => Ok(Self::Hue),
            "govee" => Ok(Self::Govee),
            "vesync" => Ok(Self::Vesync),
            other => Err(crate::error::ValidationError::UnknownBrand(
                other.to_string(),
            )),
        }
    }
}

/// Discrete power state of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerState {
    On,
    Off,
}

impl PowerState {
    /// Whether the device is currently on.
    #[must_use]
    pub fn is_on(self) -> bool {
        matches!(self, Self::On)
    }
}

impl std::fmt::Display for PowerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::On => f.write_str("on"),
            Self::Off => f.write_str("off"),
        }
    }
}

impl std::str::FromStr for PowerState {
    type Err = crate::error::ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "on" => Ok(Self::On),
            "off" => Ok(Self::Off),
            other => Err(crate::error::ValidationError::UnknownStatus(
                other.to_string(),
            )),
        }
    }
}

/// A controllable light as known to the device directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    /// Vendor-assigned device id.
    pub device: DeviceId,
    /// Vendor model string (required by some cloud APIs, e.g. Govee).
    pub model: String,
    /// Which vendor ecosystem controls this device.
    pub brand: Brand,
    /// Last known power state, maintained externally.
    pub power_state: PowerState,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn should_roundtrip_brand_through_str() {
        for brand in [Brand::Hue, Brand::Govee, Brand::Vesync] {
            let parsed = Brand::from_str(brand.as_str()).unwrap();
            assert_eq!(parsed, brand);
        }
    }

    #[test]
    fn should_return_error_when_parsing_unknown_brand() {
        let result = Brand::from_str("philips");
        assert!(result.is_err());
    }

    #[test]
    fn should_serialize_brand_lowercase() {
        let json = serde_json::to_string(&Brand::Hue).unwrap();
        assert_eq!(json, "\"hue\"");
    }

    #[test]
    fn should_report_power_state() {
        assert!(PowerState::On.is_on());
        assert!(!PowerState::Off.is_on());
    }

    #[test]
    fn should_roundtrip_power_state_through_str() {
        assert_eq!(PowerState::from_str("on").unwrap(), PowerState::On);
        assert_eq!(PowerState::from_str("off").unwrap(), PowerState::Off);
        assert!(PowerState::from_str("dimmed").is_err());
    }
}
