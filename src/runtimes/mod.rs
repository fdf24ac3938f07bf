//! Workflow runtime infrastructure: session execution and state persistence.
//!
//! This layer wraps the bare executor ([`crate::app::App`]) with everything a
//! long-lived service needs: session-keyed checkpointing, resumption,
//! per-session serialization of concurrent runs, and runtime configuration.
//!
//! # Architecture
//!
//! - **[`WorkflowRunner`]** - Drives a compiled app step by step, saving a
//!   checkpoint after every successful merge and serializing runs per session.
//! - **[`Checkpointer`]** - Trait for pluggable state persistence.
//! - **Persistence models** - Serde-friendly record types
//!   ([`PersistedState`], [`PersistedCheckpoint`]) defining the stored layout.
//! - **[`RuntimeConfig`]** - Backend selection, database name resolution, and
//!   event sink configuration.
//!
//! # Persistence backends
//!
//! - **[`InMemoryCheckpointer`]** - Volatile storage for tests and development.
//! - **[`SQLiteCheckpointer`]** - Durable SQLite-backed persistence (default
//!   `sqlite` feature).
//!
//! # Usage example
//!
//! ```rust,no_run
//! use supportflow::runtimes::{RuntimeConfig, WorkflowRunner};
//! # use supportflow::app::App;
//! # async fn example(app: App) -> Result<(), Box<dyn std::error::Error>> {
//! let runner = WorkflowRunner::new(app, RuntimeConfig::default()).await?;
//! let reply = runner.run_query("cust-001", "อินเทอร์เน็ตใช้ไม่ได้").await?;
//! println!("{} / {} -> {}", reply.category, reply.sentiment, reply.response);
//! # Ok(())
//! # }
//! ```

pub mod checkpointer;
#[cfg(feature = "sqlite")]
pub mod checkpointer_sqlite;
pub mod persistence;
pub mod runner;
pub mod runtime_config;

pub use checkpointer::{
    Checkpoint, Checkpointer, CheckpointerError, CheckpointerType, InMemoryCheckpointer,
};
#[cfg(feature = "sqlite")]
pub use checkpointer_sqlite::SQLiteCheckpointer;
pub use persistence::{PersistedCheckpoint, PersistedState, PersistenceError};
pub use runner::{RunnerError, WorkflowRunner};
pub use runtime_config::{EventBusConfig, RuntimeConfig, SinkConfig, generate_session_id};
