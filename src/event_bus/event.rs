use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// A structured event flowing through the workflow's event bus.
///
/// Nodes emit [`Node`](Event::Node) events through their context; the
/// session runner emits [`Diagnostic`](Event::Diagnostic) events for
/// lifecycle milestones (run started, routed, completed, failed).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Event {
    Node(NodeEvent),
    Diagnostic(DiagnosticEvent),
}

impl Event {
    /// Node-scoped event carrying the emitting node's id and step.
    pub fn node_message(
        node_id: impl Into<String>,
        step: u32,
        scope: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Event::Node(NodeEvent {
            node_id: node_id.into(),
            step,
            scope: scope.into(),
            message: message.into(),
        })
    }

    /// Engine-scoped diagnostic event.
    pub fn diagnostic(scope: impl Into<String>, message: impl Into<String>) -> Self {
        Event::Diagnostic(DiagnosticEvent {
            scope: scope.into(),
            message: message.into(),
        })
    }

    pub fn scope_label(&self) -> &str {
        match self {
            Event::Node(node) => &node.scope,
            Event::Diagnostic(diag) => &diag.scope,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Event::Node(node) => &node.message,
            Event::Diagnostic(diag) => &diag.message,
        }
    }

    /// Convert the event to a structured JSON value with a normalized schema.
    ///
    /// # Example
    ///
    /// ```
    /// use supportflow::event_bus::Event;
    ///
    /// let event = Event::node_message("classify", 1, "classify", "category assigned");
    /// let json = event.to_json_value();
    ///
    /// assert_eq!(json["type"], "node");
    /// assert_eq!(json["scope"], "classify");
    /// assert_eq!(json["metadata"]["step"], 1);
    /// ```
    pub fn to_json_value(&self) -> Value {
        let (event_type, metadata) = match self {
            Event::Node(node) => (
                "node",
                json!({ "node_id": node.node_id, "step": node.step }),
            ),
            Event::Diagnostic(_) => ("diagnostic", json!({})),
        };

        json!({
            "type": event_type,
            "scope": self.scope_label(),
            "message": self.message(),
            "timestamp": Utc::now().to_rfc3339(),
            "metadata": metadata,
        })
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Node(node) => write!(
                f,
                "[{}@{}] {}: {}",
                node.node_id, node.step, node.scope, node.message
            ),
            Event::Diagnostic(diag) => write!(f, "[{}] {}", diag.scope, diag.message),
        }
    }
}

/// Progress event emitted by a node during execution.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeEvent {
    /// Identifier of the emitting node.
    pub node_id: String,
    /// Step number at emission time.
    pub step: u32,
    /// Short label grouping related emissions.
    pub scope: String,
    /// Human-readable event text.
    pub message: String,
}

/// Engine lifecycle event (routing decisions, run completion, failures).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiagnosticEvent {
    /// Short label grouping related emissions.
    pub scope: String,
    /// Human-readable event text.
    pub message: String,
}
