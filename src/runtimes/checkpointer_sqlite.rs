/*!
SQLite Checkpointer

This module provides the `SQLiteCheckpointer` async implementation of the
`Checkpointer` trait defined in `runtimes/checkpointer.rs`.

## Behavior

- One row per session: `save` UPSERTs, replacing the stored state and
  bumping the version counter in the same statement. No step history is
  retained; the latest checkpoint is the only checkpoint.
- Uses serde-based persistence models (see `runtimes::persistence`) for
  encoding `SupportState` as JSON.
- When the `sqlite-migrations` feature is enabled (default), embedded
  migrations (`sqlx::migrate!("./migrations")`) are executed on connect;
  disabling the feature assumes external migration orchestration.

## Database Schema

- `sessions.id` ← session id
- `sessions.state_json` ← serialized `PersistedState`
- `sessions.version` ← save counter, starting at 1
- `sessions.updated_at` ← RFC3339 timestamp of the last save
*/

use std::sync::Arc;

use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use tracing::instrument;

use crate::runtimes::checkpointer::{Checkpoint, Checkpointer, CheckpointerError, Result};
use crate::runtimes::persistence::{PersistedCheckpoint, PersistedState};
use crate::state::SupportState;

/// SQLite-backed checkpointer with one durable row per session.
///
/// Storage stays proportional to the number of sessions, not the number
/// of runs: each save replaces the session's row. Delete rows (or call
/// [`Checkpointer::clear`]) when sessions expire.
pub struct SQLiteCheckpointer {
    /// Shared SQLite connection pool for concurrent checkpoint operations
    pool: Arc<SqlitePool>,
}

impl std::fmt::Debug for SQLiteCheckpointer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SQLiteCheckpointer").finish()
    }
}

impl SQLiteCheckpointer {
    /// Connect (or create) a SQLite database at `database_url`.
    /// Example URLs: `"sqlite://supportflow.db?mode=rwc"` for a file,
    /// `"sqlite::memory:"` for tests.
    ///
    /// Returns a configured `SQLiteCheckpointer` ready for use.
    #[must_use = "checkpointer must be used to persist state"]
    #[instrument(skip(database_url))]
    pub async fn connect(database_url: &str) -> std::result::Result<Self, CheckpointerError> {
        let pool =
            SqlitePool::connect(database_url)
                .await
                .map_err(|e| CheckpointerError::Backend {
                    message: format!("connect error: {e}"),
                })?;
        // Run embedded migrations only if the feature is enabled (idempotent).
        #[cfg(feature = "sqlite-migrations")]
        {
            if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
                return Err(CheckpointerError::Backend {
                    message: format!("migration failure: {e}"),
                });
            }
        }
        #[cfg(not(feature = "sqlite-migrations"))]
        {
            // Feature disabled: assume external migration orchestration already applied schema.
        }
        Ok(Self {
            pool: Arc::new(pool),
        })
    }
}

#[async_trait::async_trait]
impl Checkpointer for SQLiteCheckpointer {
    #[instrument(skip(self, state), err)]
    async fn save(&self, session_id: &str, state: &SupportState) -> Result<()> {
        let state_json = PersistedState::from(state)
            .to_json_string()
            .map_err(|e| CheckpointerError::Other {
                message: format!("state encode: {e}"),
            })?;

        sqlx::query(
            r#"
            INSERT INTO sessions (id, state_json, version, updated_at)
            VALUES (?1, ?2, 1, ?3)
            ON CONFLICT(id) DO UPDATE SET
                state_json = excluded.state_json,
                version = sessions.version + 1,
                updated_at = excluded.updated_at
        "#,
        )
        .bind(session_id)
        .bind(&state_json)
        .bind(Utc::now().to_rfc3339())
        .execute(&*self.pool)
        .await
        .map_err(|e| CheckpointerError::Backend {
            message: format!("upsert session: {e}"),
        })?;

        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn load_latest(&self, session_id: &str) -> Result<Option<Checkpoint>> {
        let row = sqlx::query(
            r#"
            SELECT state_json, version, updated_at
            FROM sessions
            WHERE id = ?1
            "#,
        )
        .bind(session_id)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| CheckpointerError::Backend {
            message: format!("select session: {e}"),
        })?;

        let Some(row) = row else {
            return Ok(None);
        };

        let state_json: String = row.get("state_json");
        let version: i64 = row.get("version");
        let updated_at_str: String = row.get("updated_at");

        let persisted = PersistedCheckpoint {
            session_id: session_id.to_string(),
            state: PersistedState::from_json_str(&state_json).map_err(|e| {
                CheckpointerError::Other {
                    message: format!("state decode: {e}"),
                }
            })?,
            version: version as u64,
        };
        let updated_at = DateTime::parse_from_rfc3339(&updated_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());
        let checkpoint = persisted
            .try_into_checkpoint(updated_at)
            .map_err(|e| CheckpointerError::Other {
                message: format!("state convert: {e}"),
            })?;

        Ok(Some(checkpoint))
    }

    #[instrument(skip(self), err)]
    async fn clear(&self, session_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE id = ?1")
            .bind(session_id)
            .execute(&*self.pool)
            .await
            .map_err(|e| CheckpointerError::Backend {
                message: format!("delete session: {e}"),
            })?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn list_sessions(&self) -> Result<Vec<String>> {
        let rows = sqlx::query(
            r#"
            SELECT id FROM sessions
            ORDER BY updated_at DESC
            "#,
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| CheckpointerError::Backend {
            message: format!("list sessions: {e}"),
        })?;

        Ok(rows.into_iter().map(|r| r.get::<String, _>("id")).collect())
    }
}
