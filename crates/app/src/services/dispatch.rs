//! Dispatch service — claim a batch and push each record through an adapter.

use lumeq_domain::command::{CommandRecord, CompletionOutcome};
use lumeq_domain::error::LumeqError;
use lumeq_domain::id::{CommandId, DeviceId};

use crate::ports::{CommandQueue, VendorAdapter};

/// Per-command result inside a [`BatchReport`].
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    pub id: CommandId,
    pub device: DeviceId,
    /// `None` on success, the recorded failure message otherwise.
    pub error: Option<String>,
}

impl CommandOutcome {
    /// Whether the command completed successfully.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregate result of one `process_batch` call.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Number of records claimed and completed (success or failure).
    pub processed: usize,
    pub outcomes: Vec<CommandOutcome>,
}

/// Claims batches from the queue and dispatches them through one vendor
/// adapter.
///
/// The claim transaction commits before any network call happens, so a slow
/// or hung bridge can never block other workers' claims.
pub struct DispatchService<Q, A> {
    queue: Q,
    adapter: A,
}

impl<Q: CommandQueue, A: VendorAdapter> DispatchService<Q, A> {
    /// Create a new service for the adapter's brand.
    pub fn new(queue: Q, adapter: A) -> Self {
        Self { queue, adapter }
    }

    /// Claim up to `max_commands` records and dispatch each one, marking
    /// every claimed record complete exactly once.
    ///
    /// One command's failure never aborts the rest of the batch: the failure
    /// is recorded on that record and processing continues.
    ///
    /// # Errors
    ///
    /// Returns [`LumeqError::Storage`] when the claim or a completion write
    /// fails — command-level validation and vendor failures are recorded on
    /// the record, not surfaced here.
    #[tracing::instrument(skip(self), fields(brand = %self.adapter.brand()))]
    pub async fn process_batch(&self, max_commands: u32) -> Result<BatchReport, LumeqError> {
        let batch = self
            .queue
            .claim_batch(self.adapter.brand(), max_commands)
            .await?;

        let mut outcomes = Vec::with_capacity(batch.len());
        for record in batch {
            let outcome = match self.dispatch_one(&record).await {
                Ok(()) => {
                    tracing::info!(command_id = %record.id, device = %record.device, "command completed");
                    CompletionOutcome::Completed
                }
                Err(err) => {
                    let message = failure_message(&err);
                    tracing::warn!(
                        command_id = %record.id,
                        device = %record.device,
                        error = %message,
                        "command failed"
                    );
                    CompletionOutcome::Failed(message)
                }
            };

            self.queue.mark_complete(record.id, &outcome).await?;
            outcomes.push(CommandOutcome {
                id: record.id,
                device: record.device,
                error: outcome.error_message().map(str::to_string),
            });
        }

        Ok(BatchReport {
            processed: outcomes.len(),
            outcomes,
        })
    }

    /// `validate → transform → send`, failing fast before any network call
    /// on a malformed command.
    async fn dispatch_one(&self, record: &CommandRecord) -> Result<(), LumeqError> {
        self.adapter.validate(&record.command)?;
        let payload = self.adapter.transform(&record.command)?;
        self.adapter
            .send_command(&record.device, &record.model, payload)
            .await?;
        Ok(())
    }
}

/// The message stored in `error_message` — the inner error's own display,
/// not the generic top-level wrapper text.
fn failure_message(err: &LumeqError) -> String {
    match err {
        LumeqError::Validation(inner) => inner.to_string(),
        LumeqError::Vendor(inner) => inner.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;
    use std::sync::Mutex;

    use lumeq_domain::command::{AbstractCommand, CommandStatus, NewCommand};
    use lumeq_domain::device::{Brand, PowerState};
    use lumeq_domain::error::VendorError;

    struct InMemoryQueue {
        records: Mutex<Vec<CommandRecord>>,
    }

    impl InMemoryQueue {
        fn with_records(records: Vec<CommandRecord>) -> Self {
            Self {
                records: Mutex::new(records),
            }
        }

        fn snapshot(&self) -> Vec<CommandRecord> {
            self.records.lock().unwrap().clone()
        }
    }

    impl CommandQueue for InMemoryQueue {
        fn enqueue(
            &self,
            command: NewCommand,
        ) -> impl Future<Output = Result<CommandRecord, LumeqError>> + Send {
            let record = CommandRecord::new(command);
            self.records.lock().unwrap().push(record.clone());
            async { Ok(record) }
        }

        fn claim_batch(
            &self,
            brand: Brand,
            limit: u32,
        ) -> impl Future<Output = Result<Vec<CommandRecord>, LumeqError>> + Send {
            let mut records = self.records.lock().unwrap();
            let mut claimed = Vec::new();
            for record in records.iter_mut() {
                if claimed.len() >= limit as usize {
                    break;
                }
                if record.status == CommandStatus::Pending && record.brand == brand {
                    record.status = CommandStatus::Processing;
                    claimed.push(record.clone());
                }
            }
            async { Ok(claimed) }
        }

        fn mark_complete(
            &self,
            id: CommandId,
            outcome: &CompletionOutcome,
        ) -> impl Future<Output = Result<(), LumeqError>> + Send {
            let mut records = self.records.lock().unwrap();
            if let Some(record) = records.iter_mut().find(|r| r.id == id) {
                record.status = outcome.status();
                record.error_message = outcome.error_message().map(str::to_string);
            }
            async { Ok(()) }
        }
    }

    /// Adapter that fails transport for devices whose id starts with `bad`.
    struct FakeAdapter {
        sent: Mutex<Vec<String>>,
    }

    impl FakeAdapter {
        fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
            }
        }
    }

    impl VendorAdapter for FakeAdapter {
        fn brand(&self) -> Brand {
            Brand::Hue
        }

        fn validate(&self, command: &AbstractCommand) -> Result<(), LumeqError> {
            if command.is_toggle() {
                return Err(lumeq_domain::error::ValidationError::UnresolvedToggle.into());
            }
            command.validate()
        }

        fn transform(&self, command: &AbstractCommand) -> Result<serde_json::Value, LumeqError> {
            self.validate(command)?;
            Ok(serde_json::json!({"name": command.name()}))
        }

        fn send_command(
            &self,
            device: &DeviceId,
            _model: &str,
            _payload: serde_json::Value,
        ) -> impl Future<Output = Result<(), VendorError>> + Send {
            let result = if device.as_str().starts_with("bad") {
                Err(VendorError::Transport("connection refused".to_string()))
            } else {
                self.sent.lock().unwrap().push(device.to_string());
                Ok(())
            };
            async { result }
        }
    }

    fn record(device: &str, brand: Brand, command: AbstractCommand) -> CommandRecord {
        CommandRecord::new(NewCommand {
            device: DeviceId::from(device),
            model: "LCA003".to_string(),
            brand,
            command,
        })
    }

    #[tokio::test]
    async fn should_complete_all_commands_when_all_succeed() {
        let queue = InMemoryQueue::with_records(vec![
            record("light-1", Brand::Hue, AbstractCommand::Turn(PowerState::On)),
            record("light-2", Brand::Hue, AbstractCommand::Brightness(40)),
        ]);
        let service = DispatchService::new(queue, FakeAdapter::new());

        let report = service.process_batch(10).await.unwrap();
        assert_eq!(report.processed, 2);
        assert!(report.outcomes.iter().all(CommandOutcome::succeeded));

        let records = service.queue.snapshot();
        assert!(records.iter().all(|r| r.status == CommandStatus::Completed));
    }

    #[tokio::test]
    async fn should_continue_batch_when_one_command_fails() {
        let queue = InMemoryQueue::with_records(vec![
            record("bad-light", Brand::Hue, AbstractCommand::Turn(PowerState::On)),
            record("light-2", Brand::Hue, AbstractCommand::Turn(PowerState::Off)),
        ]);
        let service = DispatchService::new(queue, FakeAdapter::new());

        let report = service.process_batch(10).await.unwrap();
        assert_eq!(report.processed, 2);

        let records = service.queue.snapshot();
        let failed = records.iter().find(|r| r.device.as_str() == "bad-light").unwrap();
        assert_eq!(failed.status, CommandStatus::Failed);
        assert_eq!(
            failed.error_message.as_deref(),
            Some("transport error: connection refused")
        );

        let completed = records.iter().find(|r| r.device.as_str() == "light-2").unwrap();
        assert_eq!(completed.status, CommandStatus::Completed);
    }

    #[tokio::test]
    async fn should_fail_fast_without_network_call_when_command_invalid() {
        let queue = InMemoryQueue::with_records(vec![record(
            "light-1",
            Brand::Hue,
            AbstractCommand::Toggle(50),
        )]);
        let service = DispatchService::new(queue, FakeAdapter::new());

        let report = service.process_batch(10).await.unwrap();
        assert_eq!(report.processed, 1);
        assert!(!report.outcomes[0].succeeded());

        // The adapter never saw a send for the invalid command.
        assert!(service.adapter.sent.lock().unwrap().is_empty());

        let records = service.queue.snapshot();
        assert_eq!(records[0].status, CommandStatus::Failed);
        assert_eq!(
            records[0].error_message.as_deref(),
            Some("toggle must be resolved before dispatch")
        );
    }

    #[tokio::test]
    async fn should_only_claim_records_for_own_brand() {
        let queue = InMemoryQueue::with_records(vec![
            record("light-1", Brand::Hue, AbstractCommand::Turn(PowerState::On)),
            record("strip-1", Brand::Govee, AbstractCommand::Turn(PowerState::On)),
        ]);
        let service = DispatchService::new(queue, FakeAdapter::new());

        let report = service.process_batch(10).await.unwrap();
        assert_eq!(report.processed, 1);

        let records = service.queue.snapshot();
        let govee = records.iter().find(|r| r.brand == Brand::Govee).unwrap();
        assert_eq!(govee.status, CommandStatus::Pending);
    }

    #[tokio::test]
    async fn should_return_empty_report_when_nothing_pending() {
        let queue = InMemoryQueue::with_records(vec![]);
        let service = DispatchService::new(queue, FakeAdapter::new());

        let report = service.process_batch(10).await.unwrap();
        assert_eq!(report.processed, 0);
        assert!(report.outcomes.is_empty());
    }
}
