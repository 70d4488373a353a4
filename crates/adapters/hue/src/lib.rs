//! # lumeq-adapter-hue
//!
//! Hue bridge vendor adapter — implements the `VendorAdapter` port against
//! the bridge's CLIP v2 REST API.
//!
//! ## Protocol
//!
//! `PUT {base_url}/resource/light/{device}` with the application key in the
//! `application-key` header. The body sets `on` and, for brightness
//! commands, `dimming` as well: the bridge only makes a brightness change
//! visible when power-on accompanies it. An HTTP 200 with a non-empty
//! `errors` array in the body is still a failure.
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

/// Connection settings for one Hue bridge.
#[derive(Debug, Clone, Deserialize)]
pub struct HueConfig {
    /// Base URL up to the resource tree, e.g. `https://192.168.4.21/clip/v2`.
    pub base_url: String,
    /// Application key minted by pressing the bridge link button.
    pub application_key: String,
    /// Per-request timeout.
    #[serde(default = "HueConfig::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl HueConfig {
    fn default_timeout_secs() -> u64 {
        10
    }
}

/// Error envelope entry in a CLIP v2 response body.
#[derive(Debug, Deserialize)]
struct HueErrorEntry {
    description: String,
}

#[derive(Debug, Default, Deserialize)]
struct HueResponseBody {
    #[serde(default)]
    errors: Vec<HueErrorEntry>,
}

/// Vendor adapter for Hue bridges.
pub struct HueAdapter {
    config: HueConfig,
    client: reqwest::Client,
}

impl HueAdapter {
    /// Build the adapter and its HTTP client.
    ///
    /// The bridge serves a self-signed certificate on the LAN, so
    /// certificate verification is deliberately disabled for this client
    /// (local-network trust model). The timeouts bound every call.
    ///
    /// # Errors
    ///
    /// Returns the underlying client-construction error.
    pub fn new(config: HueConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { config, client })
    }

    fn light_url(&self, device: &DeviceId) -> String {
        format!("{}/resource/light/{}", self.config.base_url, device)
    }
}

/// Extract the failure out of a CLIP v2 response body, if any.
fn protocol_error(body: &HueResponseBody) -> Option<VendorError> {
    if body.errors.is_empty() {
        return None;
    }
    let descriptions: Vec<&str> = body
        .errors
        .iter()
        .map(|e| e.description.as_str())
        .collect();
    Some(VendorError::Protocol(descriptions.join("; ")))
}

impl VendorAdapter for HueAdapter {
    fn brand(&self) -> Brand {
        Brand::Hue
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
            // Power-on must accompany the brightness change or the bridge
            // applies it invisibly.
            AbstractCommand::Brightness(value) => Ok(serde_json::json!({
                "on": { "on": true },
                "dimming": { "brightness": value },
            })),
            AbstractCommand::Turn(state) => Ok(serde_json::json!({
                "on": { "on": matches!(state, PowerState::On) },
            })),
            AbstractCommand::Toggle(_) => Err(ValidationError::UnresolvedToggle.into()),
        }
    }

    async fn send_command(
        &self,
        device: &DeviceId,
        _model: &str,
        payload: serde_json::Value,
    ) -> Result<(), VendorError> {
        let url = self.light_url(device);
        tracing::debug!(device = %device, %payload, "hue request");

        let response = self
            .client
            .put(&url)
            .header("application-key", &self.config.application_key)
            .json(&payload)
            .send()
            .await
            .map_err(|err| VendorError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VendorError::Transport(format!(
                "hue request failed with status {status}: {body}"
            )));
        }

        let body: HueResponseBody = response
            .json()
            .await
            .map_err(|err| VendorError::Protocol(format!("unreadable hue response: {err}")))?;

        match protocol_error(&body) {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
