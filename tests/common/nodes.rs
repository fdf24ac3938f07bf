//! Minimal nodes for graph and executor tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::time::{Duration, sleep};

use supportflow::node::{Node, NodeContext, NodeError};
use supportflow::state::{StatePatch, StateSnapshot};

/// Returns the same patch on every invocation.
pub struct PatchNode {
    patch: StatePatch,
}

impl PatchNode {
    pub fn new(patch: StatePatch) -> Self {
        Self { patch }
    }

    pub fn respond(text: &str) -> Self {
        Self::new(StatePatch::default().with_response(text))
    }

    pub fn noop() -> Self {
        Self::new(StatePatch::default())
    }
}

#[async_trait]
impl Node for PatchNode {
    async fn run(
        &self,
        _snapshot: StateSnapshot,
        _ctx: NodeContext,
    ) -> Result<StatePatch, NodeError> {
        Ok(self.patch.clone())
    }
}

/// Counts invocations, changes nothing.
pub struct CountingNode {
    calls: Arc<AtomicUsize>,
}

impl CountingNode {
    pub fn new() -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                calls: calls.clone(),
            },
            calls,
        )
    }
}

#[async_trait]
impl Node for CountingNode {
    async fn run(
        &self,
        _snapshot: StateSnapshot,
        _ctx: NodeContext,
    ) -> Result<StatePatch, NodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(StatePatch::default())
    }
}

/// Always fails with a missing-input error.
pub struct FailingNode;

#[async_trait]
impl Node for FailingNode {
    async fn run(
        &self,
        _snapshot: StateSnapshot,
        _ctx: NodeContext,
    ) -> Result<StatePatch, NodeError> {
        Err(NodeError::MissingInput { what: "query" })
    }
}

/// Sleeps before patching, so a test can cancel it mid-flight.
pub struct SlowNode {
    pub delay: Duration,
}

#[async_trait]
impl Node for SlowNode {
    async fn run(
        &self,
        _snapshot: StateSnapshot,
        _ctx: NodeContext,
    ) -> Result<StatePatch, NodeError> {
        sleep(self.delay).await;
        Ok(StatePatch::default().with_response("slow node finished"))
    }
}
