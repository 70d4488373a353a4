//! Button event port — consuming raw presses inserted by listener processes.

use std::future::Future;

use lumeq_domain::button::ButtonEvent;
use lumeq_domain::error::LumeqError;

/// Access to the shared button-event table.
///
/// Listener processes (BLE/X10, external to this system) insert `received`
/// rows; resolvers advance them to `processing` and finally `executed`.
pub trait ButtonEventRepository: Send + Sync {
    /// Fetch up to `limit` events still in `received`, oldest first.
    fn fetch_received(
        &self,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<ButtonEvent>, LumeqError>> + Send;

    /// Compare-and-set the event from `received` to `processing`.
    ///
    /// Returns `false` when the event was no longer `received` (a concurrent
    /// resolver won the race) — a no-op, not an error.
    fn try_claim(&self, id: i64) -> impl Future<Output = Result<bool, LumeqError>> + Send;

    /// Mark the event `executed` (terminal, also used to drain unmapped
    /// presses).
    fn mark_executed(&self, id: i64) -> impl Future<Output = Result<(), LumeqError>> + Send;
}
