//! Command queue port — the claim/complete protocol over the durable queue.

use std::future::Future;

use lumeq_domain::command::{CommandRecord, CompletionOutcome, NewCommand};
use lumeq_domain::device::Brand;
use lumeq_domain::error::LumeqError;
use lumeq_domain::id::CommandId;

/// The shared durable queue of command records.
///
/// The store is the single source of truth — there is no in-memory queue —
/// and the conditional status transitions below are the only cross-process
/// synchronization primitive in the system.
pub trait CommandQueue: Send + Sync {
    /// Insert a fresh `pending` record.
    fn enqueue(
        &self,
        command: NewCommand,
    ) -> impl Future<Output = Result<CommandRecord, LumeqError>> + Send;

    /// Atomically claim up to `limit` pending records for `brand`, oldest
    /// first, flipping them to `processing`.
    ///
    /// Implementations must first reclaim stale claims (records stuck in
    /// `processing` beyond the staleness window) back to `pending`, then
    /// select and transition, all within one transaction so that no two
    /// concurrent callers receive the same record. Returns an empty vec when
    /// nothing is eligible; never blocks indefinitely.
    fn claim_batch(
        &self,
        brand: Brand,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<CommandRecord>, LumeqError>> + Send;

    /// Record the terminal outcome for a claimed record, stamping
    /// `processed_at` and the error message on failure.
    ///
    /// Idempotent: repeating the call is safe, last write wins.
    fn mark_complete(
        &self,
        id: CommandId,
        outcome: &CompletionOutcome,
    ) -> impl Future<Output = Result<(), LumeqError>> + Send;
}
