//! `SQLite` implementation of [`ButtonEventRepository`].

use std::future::Future;
use std::str::FromStr;

use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use lumeq_app::ports::ButtonEventRepository;
use lumeq_domain::button::{ButtonEvent, ButtonEventStatus};
use lumeq_domain::error::LumeqError;

use crate::error::StorageError;

/// Wrapper for converting database rows into domain [`ButtonEvent`].
struct Wrapper(ButtonEvent);

impl<'r> FromRow<'r, SqliteRow> for Wrapper {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let id: i64 = row.try_get("id")?;
        let remote_name: String = row.try_get("remote_name")?;
        let button_number: i64 = row.try_get("button_number")?;
        let status: String = row.try_get("status")?;
        let timestamp: String = row.try_get("timestamp")?;

        let button_number =
            u8::try_from(button_number).map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        let status = ButtonEventStatus::from_str(&status)
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?;
        let timestamp = chrono::DateTime::parse_from_rfc3339(&timestamp)
            .map_err(|err| sqlx::Error::Decode(Box::new(err)))?
            .to_utc();

        Ok(Self(ButtonEvent {
            id,
            remote_name,
            button_number,
            status,
            timestamp,
        }))
    }
}

const SELECT_RECEIVED: &str = r"
    SELECT * FROM remote_buttons
    WHERE status = 'received'
    ORDER BY timestamp ASC
    LIMIT ?
";

// The affected-row count is the race arbiter: zero rows means another
// resolver already claimed the event.
const CLAIM: &str = r"
    UPDATE remote_buttons
    SET status = 'processing'
    WHERE id = ? AND status = 'received'
";

const MARK_EXECUTED: &str = "UPDATE remote_buttons SET status = 'executed' WHERE id = ?";

/// `SQLite`-backed button event repository.
pub struct SqliteButtonEventRepository {
    pool: SqlitePool,
}

impl SqliteButtonEventRepository {
    /// Create a new repository using the given connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl ButtonEventRepository for SqliteButtonEventRepository {
    fn fetch_received(
        &self,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<ButtonEvent>, LumeqError>> + Send {
        let pool = self.pool.clone();
        async move {
            let rows = sqlx::query(SELECT_RECEIVED)
                .bind(i64::from(limit))
                .fetch_all(&pool)
                .await
                .map_err(StorageError::from)?;

            // Listener processes write these rows directly. One that does
            // not decode (a button number past 255, a status typo) is
            // drained like an unmapped press so it cannot block every later
            // press behind it.
            let mut events = Vec::with_capacity(rows.len());
            for row in rows {
                match Wrapper::from_row(&row) {
                    Ok(wrapper) => events.push(wrapper.0),
                    Err(err) => {
                        let Ok(id) = row.try_get::<i64, _>("id") else {
                            continue;
                        };
                        tracing::warn!(
                            event_id = id,
                            error = %err,
                            "undecodable button row, draining"
                        );
                        sqlx::query(MARK_EXECUTED)
                            .bind(id)
                            .execute(&pool)
                            .await
                            .map_err(StorageError::from)?;
                    }
                }
            }

            Ok(events)
        }
    }

    fn try_claim(&self, id: i64) -> impl Future<Output = Result<bool, LumeqError>> + Send {
        let pool = self.pool.clone();
        async move {
            let result = sqlx::query(CLAIM)
                .bind(id)
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(result.rows_affected() == 1)
        }
    }

    fn mark_executed(&self, id: i64) -> impl Future<Output = Result<(), LumeqError>> + Send {
        let pool = self.pool.clone();
        async move {
            sqlx::query(MARK_EXECUTED)
                .bind(id)
                .execute(&pool)
                .await
                .map_err(StorageError::from)?;

            Ok(())
        }
    }
}
