//! `SQLite` implementation of [`CommandQueue`] — the claim/complete protocol.

use std::future::Future;
use std::str::FromStr;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use lumeq_app::ports::CommandQueue;
use lumeq_domain::command::{
    AbstractCommand, CommandRecord, CommandStatus, CompletionOutcome, NewCommand,
};
use lumeq_domain::device::Brand;
use lumeq_domain::error::LumeqError;
use lumeq_domain::id::{CommandId, DeviceId};
use lumeq_domain::time;

use crate::error::StorageError;

/// Wrapper for converting database rows into domain [`CommandRecord`].
struct Wrapper(CommandRecord);

impl Wrapper {
    fn maybe(value: Option<Self>) -> Option<CommandRecord> {
        value.map(|w| w.0)
    }
}

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let device: String = row.try_get("device")?;
        let model: String = row.try_get("model")?;
        let brand: String = row.try_get("brand")?;
        let command_json: String = row.try_get("command")?;
        let status: String = row.try_get("status")?;
        let created_at: String = row.try_get("created_at")?;
        let processed_at: Option<String> = row.try_get("processed_at")?;
        let error_message: Option<String> = row.try_get("error_message")?;

        let id = CommandId::from_str(&id).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        let brand = Brand::from_str(&brand).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        let command: AbstractCommand = serde_json::from_str(&command_json)
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        let status =
            CommandStatus::from_str(&status).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        let created_at = chrono::DateTime::parse_from_rfc3339(&created_at)
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?
            .to_utc();
        let processed_at = processed_at
            .map(|s| chrono::DateTime::parse_from_rfc3339(&s).map(|dt| dt.to_utc()))
            .transpose()
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?;

        Ok(Self(CommandRecord {
            id,
            device: DeviceId::from(device),
            model,
            brand,
            command,
            status,
            created_at,
            processed_at,
            error_message,
        }))
    }
}

const INSERT: &str = r"
    INSERT INTO command_queue (id, device, model, brand, command, status, created_at, processed_at, error_message)
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
";

const RECLAIM_STALE: &str = r"
    UPDATE command_queue
    SET status = 'pending', processed_at = NULL
    WHERE status = 'processing' AND processed_at < ?
";

const SELECT_PENDING: &str = r"
    SELECT * FROM command_queue
    WHERE status = 'pending' AND brand = ?
    ORDER BY created_at ASC
    LIMIT ?
";

const CLAIM_ONE: &str = r"
    UPDATE command_queue
    SET status = 'processing', processed_at = ?
    WHERE id = ?
";

const COMPLETE: &str = r"
    UPDATE command_queue
    SET status = ?, processed_at = ?, error_message = ?
    WHERE id = ?
";

const SELECT_BY_ID: &str = "SELECT * FROM command_queue WHERE id = ?";

/// `SQLite`-backed command queue.
///
/// All claim-side mutations happen inside a single transaction, making the
/// conditional status flips safe against concurrent pollers — including
/// pollers in other OS processes sharing the database file.
pub struct SqliteCommandQueue {
    pool: SqlitePool,
    stale_after: chrono::Duration,
}

impl SqliteCommandQueue {
    /// Default staleness window after which an unfinished claim is assumed
    /// abandoned.
    const DEFAULT_STALE_AFTER_SECS: i64 = 300;

    /// Create a new queue using the given connection pool and the default
    /// 5-minute staleness window.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            stale_after: chrono::Duration::seconds(Self::DEFAULT_STALE_AFTER_SECS),
        }
    }

    /// Override the staleness window.
    #[must_use]
    pub fn with_stale_after(mut self, stale_after: chrono::Duration) -> Self {
        self.stale_after = stale_after;
        self
    }

    /// Fetch one record by id (operator/UI inspection; not part of the
    /// claim protocol).
    ///
    /// # Errors
    ///
    /// Returns [`LumeqError::Storage`] when the query fails.
    pub async fn get_by_id(&self, id: CommandId) -> Result<Option<CommandRecord>, LumeqError> {
        let row: Option<Wrapper> = sqlx::query_as(SELECT_BY_ID)
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;

        Ok(Wrapper::maybe(row))
    }
}

impl CommandQueue for SqliteCommandQueue {
    fn enqueue(
        &self,
        command: NewCommand,
    ) -> impl Future<Output = Result<CommandRecord, LumeqError>> + Send {
        let pool = self.pool.clone();
        async move {
            let record = CommandRecord::new(command);
            let command_json =
                serde_json::to_string(&record.command).map_err(StorageError::from)?;

            sqlx::query(INSERT)
                .bind(record.id.to_string())
                .bind(record.device.as_str())
                .bind(&record.model)
                .bind(record.brand.as_str())
                .bind(&command_json)
                .bind(record.status.as_str())
                .bind(record.created_at.to_rfc3339())
                .bind(record.processed_at.map(|ts| ts.to_rfc3339()))
                .bind(&record.error_message)
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(record)
        }
    }

    fn claim_batch(
        &self,
        brand: Brand,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<CommandRecord>, LumeqError>> + Send {
        let pool = self.pool.clone();
        let stale_after = self.stale_after;
        async move {
            let mut tx = pool.begin().await.map_err(StorageError::from)?;

            // Recover claims abandoned by a crashed worker before selecting.
            let stale_cutoff = (time::now() - stale_after).to_rfc3339();
            sqlx::query(RECLAIM_STALE)
                .bind(&stale_cutoff)
                .execute(&mut *tx)
                .await
                .map_err(StorageError::from)?;

            let rows = sqlx::query(SELECT_PENDING)
                .bind(brand.as_str())
                .bind(i64::from(limit))
                .fetch_all(&mut *tx)
                .await
                .map_err(StorageError::from)?;

            let claimed_at = time::now();
            let claimed_at_str = claimed_at.to_rfc3339();

            // Decode row by row: a record whose stored command no longer
            // parses (hand-edited re-enqueue, vocabulary drift) is marked
            // failed like any other invalid command instead of wedging the
            // whole brand queue behind it.
            let mut records = Vec::with_capacity(rows.len());
            for row in rows {
                match Wrapper::from_row(&row) {
                    Ok(wrapper) => records.push(wrapper.0),
                    Err(err) => {
                        let Ok(id) = row.try_get::<String, _>("id") else {
                            continue;
                        };
                        tracing::warn!(
                            command_id = %id,
                            error = %err,
                            "undecodable queue row, marking failed"
                        );
                        sqlx::query(COMPLETE)
                            .bind(CommandStatus::Failed.as_str())
                            .bind(&claimed_at_str)
                            .bind(err.to_string())
                            .bind(&id)
                            .execute(&mut *tx)
                            .await
                            .map_err(StorageError::from)?;
                    }
                }
            }

            for record in &mut records {
                sqlx::query(CLAIM_ONE)
                    .bind(&claimed_at_str)
                    .bind(record.id.to_string())
                    .execute(&mut *tx)
                    .await
                    .map_err(StorageError::from)?;
                record.status = CommandStatus::Processing;
                record.processed_at = Some(claimed_at);
            }

            // Commit before any dispatch happens; on failure everything
            // rolls back and no partial claim is visible to other callers.
            tx.commit().await.map_err(StorageError::from)?;

            Ok(records)
        }
    }

    fn mark_complete(
        &self,
        id: CommandId,
        outcome: &CompletionOutcome,
    ) -> impl Future<Output = Result<(), LumeqError>> + Send {
        let pool = self.pool.clone();
        let status = outcome.status();
        let error_message = outcome.error_message().map(str::to_string);
        async move {
            sqlx::query(COMPLETE)
                .bind(status.as_str())
                .bind(time::now().to_rfc3339())
                .bind(error_message)
                .bind(id.to_string())
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::Config;
    use lumeq_domain::device::PowerState;

    async fn setup() -> SqliteCommandQueue {
        let db = Config {
            database_url: "sqlite::memory:".to_string(),
        }
        .build()
        .await
        .unwrap();
        SqliteCommandQueue::new(db.pool().clone())
    }

    fn new_command(device: &str, brand: Brand) -> NewCommand {
        NewCommand {
            device: DeviceId::from(device),
            model: "LCA003".to_string(),
            brand,
            command: AbstractCommand::Turn(PowerState::On),
        }
    }

    #[tokio::test]
    async fn should_enqueue_pending_record() {
        let queue = setup().await;
        let record = queue.enqueue(new_command("light-1", Brand::Hue)).await.unwrap();

        let fetched = queue.get_by_id(record.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, CommandStatus::Pending);
        assert_eq!(fetched.device.as_str(), "light-1");
        assert_eq!(fetched.brand, Brand::Hue);
        assert_eq!(fetched.command, AbstractCommand::Turn(PowerState::On));
        assert!(fetched.processed_at.is_none());
    }

    #[tokio::test]
    async fn should_claim_fifo_within_brand() {
        let queue = setup().await;
        let first = queue.enqueue(new_command("light-1", Brand::Hue)).await.unwrap();
        let second = queue.enqueue(new_command("light-2", Brand::Hue)).await.unwrap();
        let third = queue.enqueue(new_command("light-3", Brand::Hue)).await.unwrap();

        let batch = queue.claim_batch(Brand::Hue, 10).await.unwrap();
        let ids: Vec<CommandId> = batch.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![first.id, second.id, third.id]);
        assert!(batch.iter().all(|r| r.status == CommandStatus::Processing));
        assert!(batch.iter().all(|r| r.processed_at.is_some()));
    }

    #[tokio::test]
    async fn should_never_hand_same_record_to_two_claimers() {
        let queue = setup().await;
        queue.enqueue(new_command("light-1", Brand::Hue)).await.unwrap();
        queue.enqueue(new_command("light-2", Brand::Hue)).await.unwrap();

        let first_worker = queue.claim_batch(Brand::Hue, 10).await.unwrap();
        let second_worker = queue.claim_batch(Brand::Hue, 10).await.unwrap();

        assert_eq!(first_worker.len(), 2);
        assert!(second_worker.is_empty());
    }

    #[tokio::test]
    async fn should_respect_claim_limit() {
        let queue = setup().await;
        for n in 0..5 {
            queue
                .enqueue(new_command(&format!("light-{n}"), Brand::Hue))
                .await
                .unwrap();
        }

        let batch = queue.claim_batch(Brand::Hue, 3).await.unwrap();
        assert_eq!(batch.len(), 3);

        let rest = queue.claim_batch(Brand::Hue, 10).await.unwrap();
        assert_eq!(rest.len(), 2);
    }

    #[tokio::test]
    async fn should_only_claim_records_for_requested_brand() {
        let queue = setup().await;
        queue.enqueue(new_command("light-1", Brand::Hue)).await.unwrap();
        queue.enqueue(new_command("strip-1", Brand::Govee)).await.unwrap();

        let batch = queue.claim_batch(Brand::Govee, 10).await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].device.as_str(), "strip-1");
    }

    #[tokio::test]
    async fn should_reclaim_stale_processing_records() {
        let queue = setup().await;
        let record = queue.enqueue(new_command("light-1", Brand::Hue)).await.unwrap();

        let claimed = queue.claim_batch(Brand::Hue, 10).await.unwrap();
        assert_eq!(claimed.len(), 1);

        // Simulate a worker that crashed ten minutes ago mid-dispatch.
        let stale = (time::now() - chrono::Duration::minutes(10)).to_rfc3339();
        sqlx::query("UPDATE command_queue SET processed_at = ? WHERE id = ?")
            .bind(&stale)
            .bind(record.id.to_string())
            .execute(&queue.pool)
            .await
            .unwrap();

        let reclaimed = queue.claim_batch(Brand::Hue, 10).await.unwrap();
        assert_eq!(reclaimed.len(), 1);
        assert_eq!(reclaimed[0].id, record.id);
        assert_eq!(reclaimed[0].status, CommandStatus::Processing);
    }

    #[tokio::test]
    async fn should_not_reclaim_fresh_processing_records() {
        let queue = setup().await;
        queue.enqueue(new_command("light-1", Brand::Hue)).await.unwrap();

        let claimed = queue.claim_batch(Brand::Hue, 10).await.unwrap();
        assert_eq!(claimed.len(), 1);

        // A second pass right away must not steal the fresh claim.
        let second = queue.claim_batch(Brand::Hue, 10).await.unwrap();
        assert!(second.is_empty());
    }

    #[tokio::test]
    async fn should_mark_completed_and_stamp_processed_at() {
        let queue = setup().await;
        let record = queue.enqueue(new_command("light-1", Brand::Hue)).await.unwrap();
        queue.claim_batch(Brand::Hue, 10).await.unwrap();

        queue
            .mark_complete(record.id, &CompletionOutcome::Completed)
            .await
            .unwrap();

        let fetched = queue.get_by_id(record.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, CommandStatus::Completed);
        assert!(fetched.processed_at.is_some());
        assert!(fetched.error_message.is_none());
    }

    #[tokio::test]
    async fn should_record_error_message_when_failed() {
        let queue = setup().await;
        let record = queue.enqueue(new_command("light-1", Brand::Hue)).await.unwrap();
        queue.claim_batch(Brand::Hue, 10).await.unwrap();

        queue
            .mark_complete(
                record.id,
                &CompletionOutcome::Failed("bridge unreachable".to_string()),
            )
            .await
            .unwrap();

        let fetched = queue.get_by_id(record.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, CommandStatus::Failed);
        assert_eq!(fetched.error_message.as_deref(), Some("bridge unreachable"));
    }

    #[tokio::test]
    async fn should_keep_last_write_when_completion_repeated() {
        let queue = setup().await;
        let record = queue.enqueue(new_command("light-1", Brand::Hue)).await.unwrap();
        queue.claim_batch(Brand::Hue, 10).await.unwrap();

        queue
            .mark_complete(record.id, &CompletionOutcome::Completed)
            .await
            .unwrap();
        queue
            .mark_complete(record.id, &CompletionOutcome::Completed)
            .await
            .unwrap();

        let fetched = queue.get_by_id(record.id).await.unwrap().unwrap();
        assert_eq!(fetched.status, CommandStatus::Completed);
    }

    #[tokio::test]
    async fn should_not_claim_completed_or_failed_records() {
        let queue = setup().await;
        let done = queue.enqueue(new_command("light-1", Brand::Hue)).await.unwrap();
        queue.claim_batch(Brand::Hue, 10).await.unwrap();
        queue
            .mark_complete(done.id, &CompletionOutcome::Completed)
            .await
            .unwrap();

        // Even a stale processed_at must not resurrect a terminal record.
        let stale = (time::now() - chrono::Duration::minutes(10)).to_rfc3339();
        sqlx::query("UPDATE command_queue SET processed_at = ? WHERE id = ?")
            .bind(&stale)
            .bind(done.id.to_string())
            .execute(&queue.pool)
            .await
            .unwrap();

        let batch = queue.claim_batch(Brand::Hue, 10).await.unwrap();
        assert!(batch.is_empty());
    }

    #[tokio::test]
    async fn should_fail_undecodable_row_and_still_claim_the_rest() {
        let queue = setup().await;

        // A hand-edited re-enqueue with a command outside the vocabulary,
        // sitting at the head of the brand queue.
        let poison_id = "3b8f7a90-6c1d-4e2a-9f05-1d2c3b4a5e6f";
        sqlx::query(
            "INSERT INTO command_queue (id, device, model, brand, command, status, created_at)
             VALUES (?, 'light-0', 'LCA003', 'hue', ?, 'pending', ?)",
        )
        .bind(poison_id)
        .bind(r#"{"name":"color","value":"red"}"#)
        .bind(time::now().to_rfc3339())
        .execute(&queue.pool)
        .await
        .unwrap();

        let valid = queue.enqueue(new_command("light-1", Brand::Hue)).await.unwrap();

        let batch = queue.claim_batch(Brand::Hue, 10).await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].id, valid.id);

        let (status, error_message): (String, Option<String>) =
            sqlx::query_as("SELECT status, error_message FROM command_queue WHERE id = ?")
                .bind(poison_id)
                .fetch_one(&queue.pool)
                .await
                .unwrap();
        assert_eq!(status, "failed");
        assert!(error_message.is_some());

        // The failed row stays terminal on later passes.
        let again = queue.claim_batch(Brand::Hue, 10).await.unwrap();
        assert!(again.is_empty());
    }

    #[tokio::test]
    async fn should_store_command_id_as_text() {
        let queue = setup().await;
        let record = queue.enqueue(new_command("light-1", Brand::Hue)).await.unwrap();

        let (type_name, stored): (String, String) =
            sqlx::query_as("SELECT typeof(id), id FROM command_queue")
                .fetch_one(&queue.pool)
                .await
                .unwrap();
        assert_eq!(type_name, "text");
        assert_eq!(stored, record.id.to_string());
    }
}
