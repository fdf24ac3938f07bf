use std::sync::Arc;

use miette::Diagnostic;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::instrument;

use crate::app::{App, ExecutorError, InvokeOptions};
use crate::control::CancelToken;
use crate::event_bus::{Event, EventBus};
use crate::runtimes::{
    Checkpointer, CheckpointerError, CheckpointerType, InMemoryCheckpointer, RuntimeConfig,
};
use crate::state::SupportState;
use crate::support::SupportReply;

/// Errors surfaced by [`WorkflowRunner`] operations.
#[derive(Debug, Error, Diagnostic)]
pub enum RunnerError {
    /// The underlying workflow run failed.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Run(#[from] ExecutorError),

    /// A checkpoint backend operation failed.
    #[error(transparent)]
    #[diagnostic(code(supportflow::runner::checkpointer))]
    Checkpoint(#[from] CheckpointerError),

    /// `resume` was called for a session with no stored checkpoint.
    #[error("no checkpoint recorded for session {session_id}")]
    #[diagnostic(
        code(supportflow::runner::no_checkpoint),
        help("Run a query for this session first; resume only continues interrupted runs.")
    )]
    NoCheckpoint { session_id: String },

    /// The workflow completed without any handler setting a response.
    #[error("workflow completed without producing a response")]
    #[diagnostic(
        code(supportflow::runner::missing_response),
        help("Every path from the entry should pass through a handler node before End.")
    )]
    MissingResponse,
}

/// Session-aware execution environment around a compiled [`App`].
///
/// The runner adds what the bare executor leaves out:
///
/// - **Checkpointing**: the state is saved after every successfully merged
///   step, so a failed run can be picked up with [`resume`](Self::resume).
///   Nothing is saved before the first step completes; a first-node failure
///   leaves the session's prior checkpoint (or its absence) untouched.
/// - **Session serialization**: concurrent runs for the *same* session id
///   queue on a per-session async lock, so their saves never interleave.
///   Different sessions run fully in parallel.
/// - **Eventing**: node events and runner lifecycle diagnostics flow into
///   one [`EventBus`] owned by the runner.
///
/// Checkpoint saves are advisory for a run in flight: a failed save is
/// logged and the run continues. Loads are not; a resume that cannot read
/// its checkpoint fails with [`RunnerError::Checkpoint`].
///
/// # Example
///
/// ```rust,no_run
/// use supportflow::graphs::GraphBuilder;
/// use supportflow::runtimes::{RuntimeConfig, WorkflowRunner};
/// use supportflow::types::NodeKind;
/// # use async_trait::async_trait;
/// # use supportflow::node::{Node, NodeContext, NodeError};
/// # use supportflow::state::{StatePatch, StateSnapshot};
/// # struct Reply;
/// # #[async_trait]
/// # impl Node for Reply {
/// #     async fn run(&self, _: StateSnapshot, _: NodeContext) -> Result<StatePatch, NodeError> {
/// #         Ok(StatePatch::default().with_response("done"))
/// #     }
/// # }
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let app = GraphBuilder::new()
///     .add_node(NodeKind::Custom("reply".into()), Reply)
///     .add_edge(NodeKind::Custom("reply".into()), NodeKind::End)
///     .set_entry(NodeKind::Custom("reply".into()))
///     .compile()?;
///
/// let runner = WorkflowRunner::new(app, RuntimeConfig::default()).await?;
/// let reply = runner.run_query("session-1", "ขอใบเสร็จย้อนหลัง").await?;
/// println!("{}", reply.response);
/// # Ok(())
/// # }
/// ```
pub struct WorkflowRunner {
    app: Arc<App>,
    checkpointer: Option<Arc<dyn Checkpointer>>,
    /// One async lock per session id, retained for the runner's lifetime.
    session_locks: Mutex<FxHashMap<String, Arc<tokio::sync::Mutex<()>>>>,
    event_bus: EventBus,
}

impl WorkflowRunner {
    /// Creates a runner from a compiled app and runtime configuration.
    ///
    /// Builds the event bus from the config's sink set and starts its
    /// listener. Fails if the configured checkpoint backend cannot be
    /// initialized.
    pub async fn new(app: App, config: RuntimeConfig) -> Result<Self, RunnerError> {
        Self::from_arc(Arc::new(app), config).await
    }

    /// Like [`new`](Self::new) for an app already wrapped in an `Arc`.
    pub async fn from_arc(app: Arc<App>, config: RuntimeConfig) -> Result<Self, RunnerError> {
        let event_bus = config.event_bus.build_event_bus();
        Self::with_bus(app, config, event_bus, true).await
    }

    /// Full-control constructor accepting a preconfigured [`EventBus`].
    ///
    /// Use this to attach custom sinks (a memory sink in tests, say) or to
    /// defer starting the listener.
    pub async fn with_bus(
        app: Arc<App>,
        config: RuntimeConfig,
        event_bus: EventBus,
        start_listener: bool,
    ) -> Result<Self, RunnerError> {
        let checkpointer = Self::create_checkpointer(&config).await?;
        if start_listener {
            event_bus.listen_for_events();
        }
        Ok(Self {
            app,
            checkpointer,
            session_locks: Mutex::new(FxHashMap::default()),
            event_bus,
        })
    }

    /// Replaces the checkpoint backend with a preconstructed one.
    ///
    /// Lets tests and embedders share a store handle with the runner.
    #[must_use]
    pub fn with_checkpointer(mut self, checkpointer: Arc<dyn Checkpointer>) -> Self {
        self.checkpointer = Some(checkpointer);
        self
    }

    async fn create_checkpointer(
        config: &RuntimeConfig,
    ) -> Result<Option<Arc<dyn Checkpointer>>, RunnerError> {
        match &config.checkpointer {
            None => Ok(None),
            Some(CheckpointerType::InMemory) => Ok(Some(Arc::new(InMemoryCheckpointer::new()))),
            #[cfg(feature = "sqlite")]
            Some(CheckpointerType::Sqlite) => {
                let url = config
                    .sqlite_database_url()
                    .unwrap_or_else(|| "sqlite://supportflow.db?mode=rwc".to_string());
                let checkpointer = crate::runtimes::SQLiteCheckpointer::connect(&url).await?;
                Ok(Some(Arc::new(checkpointer)))
            }
        }
    }

    /// The compiled workflow this runner executes.
    #[must_use]
    pub fn app(&self) -> &App {
        &self.app
    }

    /// The event bus receiving node events and runner diagnostics.
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Runs the workflow to completion for one `(session, query)` pair.
    ///
    /// Builds a fresh state from `query`, drives the graph from its entry,
    /// and projects the final state into a [`SupportReply`]. Fails with
    /// [`RunnerError::MissingResponse`] if the graph completed without a
    /// handler setting `response`.
    #[instrument(skip(self, query), fields(session = %session_id), err)]
    pub async fn run_query(
        &self,
        session_id: &str,
        query: &str,
    ) -> Result<SupportReply, RunnerError> {
        let state = self.run(session_id, SupportState::new(query)).await?;
        SupportReply::from_state(&state).ok_or(RunnerError::MissingResponse)
    }

    /// Runs the workflow to completion over an explicit initial state.
    ///
    /// The per-session lock is held for the whole run, serializing
    /// concurrent runs (and their checkpoint saves) for this session.
    #[instrument(skip(self, initial), fields(session = %session_id), err)]
    pub async fn run(
        &self,
        session_id: &str,
        initial: SupportState,
    ) -> Result<SupportState, RunnerError> {
        let lock = self.session_lock(session_id);
        let _guard = lock.lock().await;
        self.drive(session_id, initial, None).await
    }

    /// Cancellable variant of [`run`](Self::run).
    ///
    /// Cancelling mid-node discards that node's work: no partial patch is
    /// applied, no checkpoint is written for the interrupted step, and the
    /// run fails with the executor's cancelled error.
    #[instrument(skip(self, initial, cancel), fields(session = %session_id), err)]
    pub async fn run_with(
        &self,
        session_id: &str,
        initial: SupportState,
        cancel: CancelToken,
    ) -> Result<SupportState, RunnerError> {
        let lock = self.session_lock(session_id);
        let _guard = lock.lock().await;
        self.drive(session_id, initial, Some(cancel)).await
    }

    /// Continues an interrupted run from the session's latest checkpoint.
    ///
    /// The persisted record carries state but no node cursor, so the replay
    /// starts from the entry node; handlers skip themselves when the field
    /// they would set is already populated, which makes the replay land on
    /// the first node that had not completed.
    #[instrument(skip(self), fields(session = %session_id), err)]
    pub async fn resume(&self, session_id: &str) -> Result<SupportState, RunnerError> {
        let lock = self.session_lock(session_id);
        let _guard = lock.lock().await;

        let Some(checkpointer) = &self.checkpointer else {
            return Err(RunnerError::NoCheckpoint {
                session_id: session_id.to_string(),
            });
        };
        let Some(checkpoint) = checkpointer.load_latest(session_id).await? else {
            return Err(RunnerError::NoCheckpoint {
                session_id: session_id.to_string(),
            });
        };
        tracing::info!(
            session = %session_id,
            version = checkpoint.version,
            "resuming from checkpoint"
        );
        self.drive(session_id, checkpoint.state, None).await
    }

    /// Removes the session's stored checkpoint, if any.
    #[instrument(skip(self), fields(session = %session_id), err)]
    pub async fn clear_session(&self, session_id: &str) -> Result<(), RunnerError> {
        let lock = self.session_lock(session_id);
        let _guard = lock.lock().await;
        if let Some(checkpointer) = &self.checkpointer {
            checkpointer.clear(session_id).await?;
        }
        Ok(())
    }

    /// Ids of all sessions with a stored checkpoint.
    pub async fn list_sessions(&self) -> Result<Vec<String>, RunnerError> {
        match &self.checkpointer {
            Some(checkpointer) => Ok(checkpointer.list_sessions().await?),
            None => Ok(Vec::new()),
        }
    }

    /// Stops the event bus listener after the queued events have drained.
    pub async fn shutdown(&self) {
        self.event_bus.stop_listener().await;
    }

    fn session_lock(&self, session_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.session_locks.lock();
        locks.entry(session_id.to_string()).or_default().clone()
    }

    /// The step loop. Caller must hold the session lock.
    async fn drive(
        &self,
        session_id: &str,
        mut state: SupportState,
        cancel: Option<CancelToken>,
    ) -> Result<SupportState, RunnerError> {
        let mut options = InvokeOptions::new()
            .with_session_id(session_id)
            .with_event_sender(self.event_bus.get_sender());
        if let Some(cancel) = cancel {
            options = options.with_cancel(cancel);
        }

        tracing::info!(session = %session_id, "workflow run started");
        self.emit_diagnostic(format!("session {session_id}: run started"));

        let mut current = self.app.entry().clone();
        let mut step: u32 = 0;
        loop {
            step += 1;
            if step > self.app.max_steps() {
                let limit = self.app.max_steps();
                self.emit_diagnostic(format!(
                    "session {session_id}: aborted at step ceiling {limit}"
                ));
                return Err(RunnerError::Run(ExecutorError::StepCeiling { limit }));
            }

            let next = match self.app.step(&mut state, &current, step, &options).await {
                Ok(next) => next,
                Err(error) => {
                    self.emit_diagnostic(format!(
                        "session {session_id}: run failed at step {step}: {error}"
                    ));
                    return Err(RunnerError::Run(error));
                }
            };
            self.save_checkpoint(session_id, step, &state).await;

            match next {
                Some(next) => {
                    self.emit_diagnostic(format!(
                        "session {session_id}: step {step}: {current} -> {next}"
                    ));
                    current = next;
                }
                None => break,
            }
        }

        tracing::info!(session = %session_id, step, "workflow run completed");
        self.emit_diagnostic(format!(
            "session {session_id}: run completed after {step} steps"
        ));
        Ok(state)
    }

    /// Persists the post-merge state; failures are logged, not fatal.
    async fn save_checkpoint(&self, session_id: &str, step: u32, state: &SupportState) {
        let Some(checkpointer) = &self.checkpointer else {
            return;
        };
        if let Err(error) = checkpointer.save(session_id, state).await {
            tracing::warn!(
                session = %session_id,
                step,
                error = %error,
                "checkpoint save failed"
            );
        }
    }

    fn emit_diagnostic(&self, message: String) {
        let _ = self
            .event_bus
            .get_sender()
            .send(Event::diagnostic("runner", message));
    }
}
