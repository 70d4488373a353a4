//! Processor loop — the per-brand polling worker.

use std::time::Duration;

use crate::ports::{CommandQueue, VendorAdapter};
use crate::services::dispatch::DispatchService;

/// Tuning knobs for one polling worker.
#[derive(Debug, Clone)]
pub struct ProcessorConfig {
    /// Maximum records claimed per cycle.
    pub batch_size: u32,
    /// Pause between cycles; keeps the loop from busy-spinning.
    pub poll_interval: Duration,
    /// Longer pause after a cycle-level error (store unreachable, …).
    pub error_backoff: Duration,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            poll_interval: Duration::from_millis(100),
            error_backoff: Duration::from_secs(5),
        }
    }
}

/// Infinite polling cycle around a [`DispatchService`], one per brand.
///
/// Transient errors never terminate the loop: the cycle is logged, the loop
/// backs off, and polling resumes (the sqlx pool re-establishes broken
/// connections on the next round-trip). Only the initial store connection at
/// process start is allowed to be fatal, and that happens before this loop
/// is ever constructed.
pub struct CommandProcessor<Q, A> {
    dispatch: DispatchService<Q, A>,
    config: ProcessorConfig,
}

impl<Q: CommandQueue, A: VendorAdapter> CommandProcessor<Q, A> {
    /// Create a processor around an already-wired dispatch service.
    pub fn new(dispatch: DispatchService<Q, A>, config: ProcessorConfig) -> Self {
        Self { dispatch, config }
    }

    /// Run one claim-and-dispatch cycle.
    ///
    /// # Errors
    ///
    /// Propagates storage-level failures so [`run`](Self::run) can back off.
    pub async fn run_cycle(&self) -> Result<usize, lumeq_domain::error::LumeqError> {
        let report = self.dispatch.process_batch(self.config.batch_size).await?;
        if report.processed > 0 {
            let failed = report.outcomes.iter().filter(|o| !o.succeeded()).count();
            tracing::info!(
                processed = report.processed,
                failed,
                "dispatch cycle finished"
            );
        }
        Ok(report.processed)
    }

    /// Poll forever: cycle, sleep, repeat; back off on cycle errors.
    pub async fn run(&self) {
        loop {
            match self.run_cycle().await {
                Ok(_) => tokio::time::sleep(self.config.poll_interval).await,
                Err(err) => {
                    tracing::error!(error = %err, "processor cycle failed, backing off");
                    tokio::time::sleep(self.config.error_backoff).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_default_to_small_batches_and_short_polls() {
        let config = ProcessorConfig::default();
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.poll_interval, Duration::from_millis(100));
        assert_eq!(config.error_backoff, Duration::from_secs(5));
    }
}
