//! Runtime configuration for workflow runners.
//!
//! Controls which checkpoint backend a runner uses, where the SQLite
//! database lives, and which event sinks receive workflow events.

use uuid::Uuid;

use super::CheckpointerType;
use crate::event_bus::{EventBus, EventSink, MemorySink, StdOutSink};

/// Generates a fresh session identifier.
///
/// Used by demos and callers that do not bring their own session naming
/// scheme. Ids are unique per call; reusing one across calls is what
/// links runs into a conversation.
#[must_use]
pub fn generate_session_id() -> String {
    format!("session-{}", Uuid::new_v4())
}

/// Configuration consumed by
/// [`WorkflowRunner`](crate::runtimes::WorkflowRunner).
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    /// Checkpoint backend to use; `None` disables checkpointing.
    pub checkpointer: Option<CheckpointerType>,
    /// SQLite database file name for the durable backend.
    pub sqlite_db_name: Option<String>,
    /// Event sinks wired into the runner's event bus.
    pub event_bus: EventBusConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            checkpointer: Some(CheckpointerType::InMemory),
            sqlite_db_name: Self::resolve_sqlite_db_name(None),
            event_bus: EventBusConfig::default(),
        }
    }
}

impl RuntimeConfig {
    fn resolve_sqlite_db_name(provided: Option<String>) -> Option<String> {
        if let Some(name) = provided {
            return Some(name);
        }
        dotenvy::dotenv().ok();
        Some(std::env::var("SUPPORTFLOW_DB_NAME").unwrap_or_else(|_| "supportflow.db".to_string()))
    }

    pub fn new(checkpointer: Option<CheckpointerType>, sqlite_db_name: Option<String>) -> Self {
        Self {
            checkpointer,
            sqlite_db_name: Self::resolve_sqlite_db_name(sqlite_db_name),
            event_bus: EventBusConfig::default(),
        }
    }

    /// Connection URL for the configured SQLite database.
    ///
    /// `mode=rwc` creates the file on first use.
    #[must_use]
    pub fn sqlite_database_url(&self) -> Option<String> {
        self.sqlite_db_name
            .as_ref()
            .map(|name| format!("sqlite://{name}?mode=rwc"))
    }

    #[must_use]
    pub fn with_event_bus(mut self, event_bus: EventBusConfig) -> Self {
        self.event_bus = event_bus;
        self
    }

    #[must_use]
    pub fn with_stdout_event_bus(self) -> Self {
        self.with_event_bus(EventBusConfig::with_stdout_only())
    }

    #[must_use]
    pub fn with_memory_event_bus(self) -> Self {
        self.with_event_bus(EventBusConfig::with_memory_sink())
    }
}

/// Declarative sink choice, turned into a live sink by
/// [`EventBusConfig::build_event_bus`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SinkConfig {
    StdOut,
    Memory,
}

/// Event sink selection for a runner's event bus.
#[derive(Clone, Debug)]
pub struct EventBusConfig {
    pub sinks: Vec<SinkConfig>,
}

impl EventBusConfig {
    #[must_use]
    pub fn new(sinks: Vec<SinkConfig>) -> Self {
        Self { sinks }
    }

    #[must_use]
    pub fn with_stdout_only() -> Self {
        Self::new(vec![SinkConfig::StdOut])
    }

    #[must_use]
    pub fn with_memory_sink() -> Self {
        Self::new(vec![SinkConfig::StdOut, SinkConfig::Memory])
    }

    #[must_use]
    pub fn add_sink(mut self, sink: SinkConfig) -> Self {
        if !self.sinks.contains(&sink) {
            self.sinks.push(sink);
        }
        self
    }

    pub fn sinks(&self) -> &[SinkConfig] {
        &self.sinks
    }

    /// Builds an [`EventBus`] with the configured sinks attached.
    #[must_use]
    pub fn build_event_bus(&self) -> EventBus {
        let sinks: Vec<Box<dyn EventSink>> = self
            .sinks
            .iter()
            .map(|sink| match sink {
                SinkConfig::StdOut => Box::new(StdOutSink::default()) as Box<dyn EventSink>,
                SinkConfig::Memory => Box::new(MemorySink::new()) as Box<dyn EventSink>,
            })
            .collect();
        EventBus::with_sinks(sinks)
    }
}

impl Default for EventBusConfig {
    fn default() -> Self {
        Self::with_stdout_only()
    }
}
