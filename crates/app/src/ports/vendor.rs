//! Vendor adapter port — translating abstract commands into bridge calls.

use std::future::Future;

use lumeq_domain::command::AbstractCommand;
use lumeq_domain::device::Brand;
use lumeq_domain::error::{LumeqError, VendorError};
use lumeq_domain::id::DeviceId;

/// One adapter per vendor ecosystem.
///
/// New brands plug in by implementing this trait and wiring a processor for
/// them in the binary — dispatch logic never branches on brand strings.
pub trait VendorAdapter: Send + Sync {
    /// The brand this adapter serves.
    fn brand(&self) -> Brand;

    /// Reject unknown names and malformed values before any network call.
    ///
    /// `toggle` is always rejected here: it must be resolved into a concrete
    /// command upstream.
    ///
    /// # Errors
    ///
    /// Returns [`LumeqError::Validation`] for commands this vendor cannot
    /// express.
    fn validate(&self, command: &AbstractCommand) -> Result<(), LumeqError>;

    /// Build the vendor wire payload for a validated command.
    ///
    /// The payload depends on command identity only, never on prior device
    /// state.
    ///
    /// # Errors
    ///
    /// Returns [`LumeqError::Validation`] for commands this vendor cannot
    /// express.
    fn transform(&self, command: &AbstractCommand) -> Result<serde_json::Value, LumeqError>;

    /// Perform the network call against the vendor's control endpoint.
    ///
    /// Implementations classify any non-success transport status, and any
    /// vendor error envelope embedded in a success response, as a
    /// [`VendorError`] carrying a human-readable message.
    fn send_command(
        &self,
        device: &DeviceId,
        model: &str,
        payload: serde_json::Value,
    ) -> impl Future<Output = Result<(), VendorError>> + Send;
}
