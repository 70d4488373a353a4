//! # lumeq-adapter-govee
//!
//! Govee cloud vendor adapter — implements the `VendorAdapter` port against
//! the developer API.
//!
//! ## Protocol
//!
//! `PUT {base_url}/v1/devices/control` with the API key in the
//! `Govee-API-Key` header and body
//! `{"device": ..., "model": ..., "cmd": {"name": ..., "value": ...}}`.
//! The cloud answers HTTP 200 with a `code` field; anything but `200` there
//! is a vendor-reported failure. Govee hardware powers on implicitly when a
//! brightness command arrives, so no separate power attribute is needed.
//!
//! ## Dependency rule
//! Depends on `lumeq-app` (for the port trait) and `lumeq-domain`.

use std::time::Duration;

use serde::Deserialize;

use lumeq_app::ports::VendorAdapter;
use lumeq_domain::command::AbstractCommand;
use lumeq_domain::device::{Brand, PowerState};
use lumeq_domain::error::{LumeqError, ValidationError, VendorError};
use lumeq_domain::id::DeviceId;

/// Connection settings for the Govee cloud API.
#[derive(Debug, Clone, Deserialize)]
pub struct GoveeConfig {
    /// API root, normally `https://developer-api.govee.com`.
    #[serde(default = "GoveeConfig::default_base_url")]
    pub base_url: String,
    /// Developer API key.
    pub api_key: String,
    /// Per-request timeout.
    #[serde(default = "GoveeConfig::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl GoveeConfig {
    fn default_base_url() -> String {
        "https://developer-api.govee.com".to_string()
    }

    fn default_timeout_secs() -> u64 {
        10
    }
}

#[derive(Debug, Deserialize)]
struct GoveeResponseBody {
    code: i64,
    #[serde(default)]
    message: String,
}

/// Vendor adapter for Govee cloud-controlled devices.
pub struct GoveeAdapter {
    config: GoveeConfig,
    client: reqwest::Client,
}

impl GoveeAdapter {
    /// Build the adapter and its HTTP client.
    ///
    /// # Errors
    ///
    /// Returns the underlying client-construction error.
    pub fn new(config: GoveeConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { config, client })
    }

    fn control_url(&self) -> String {
        format!("{}/v1/devices/control", self.config.base_url)
    }
}

impl VendorAdapter for GoveeAdapter {
    fn brand(&self) -> Brand {
        Brand::Govee
    }

    fn validate(&self, command: &AbstractCommand) -> Result<(), LumeqError> {
        match command {
            AbstractCommand::Toggle(_) => Err(ValidationError::UnresolvedToggle.into()),
            other => other.validate(),
        }
    }

    fn transform(&self, command: &AbstractCommand) -> Result<serde_json::Value, LumeqError> {
        self.validate(command)?;
        match command {
            AbstractCommand::Brightness(value) => Ok(serde_json::json!({
                "name": "brightness",
                "value": value,
            })),
            AbstractCommand::Turn(state) => Ok(serde_json::json!({
                "name": "turn",
                "value": match state {
                    PowerState::On => "on",
                    PowerState::Off => "off",
                },
            })),
            AbstractCommand::Toggle(_) => Err(ValidationError::UnresolvedToggle.into()),
        }
    }

    async fn send_command(
        &self,
        device: &DeviceId,
        model: &str,
        payload: serde_json::Value,
    ) -> Result<(), VendorError> {
        let body = serde_json::json!({
            "device": device.as_str(),
            "model": model,
            "cmd": payload,
        });
        tracing::debug!(device = %device, model, %payload, "govee request");

        let response = self
            .client
            .put(self.control_url())
            .header("Govee-API-Key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|err| VendorError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VendorError::Transport(format!(
                "govee request failed with status {status}: {body}"
            )));
        }

        let body: GoveeResponseBody = response
            .json()
            .await
            .map_err(|err| VendorError::Protocol(format!("unreadable govee response: {err}")))?;

        if body.code != 200 {
            return Err(VendorError::Protocol(format!(
                "govee error {}: {}",
                body.code, body.message
            )));
        }

        Ok(())
    }
}
