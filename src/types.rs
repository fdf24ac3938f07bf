//! Core identifier types for the supportflow workflow engine.
//!
//! This module defines [`NodeKind`], the identity of a node within a
//! workflow graph. Node identities are used as map keys in the graph
//! definition, as routing targets, and in persisted checkpoints and logs.
//!
//! # Examples
//!
//! ```rust
//! use supportflow::types::NodeKind;
//!
//! let classify = NodeKind::Custom("classify".to_string());
//! let end = NodeKind::End;
//!
//! // Encode for persistence
//! assert_eq!(classify.encode(), "Custom:classify");
//! assert_eq!(NodeKind::decode("Custom:classify"), classify);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a node within a workflow graph.
///
/// `NodeKind` serves as the unique identifier for nodes in the workflow
/// execution graph. Application nodes use the [`Custom`](Self::Custom)
/// variant; [`End`](Self::End) is the terminal marker that completes a run.
///
/// There is no synthetic start marker: the entry node is designated
/// explicitly on the graph builder via `set_entry`.
///
/// # Persistence
///
/// `NodeKind` supports serialization for checkpointing through both serde
/// and the [`encode`](Self::encode)/[`decode`](Self::decode) methods.
///
/// # Examples
///
/// ```rust
/// use supportflow::types::NodeKind;
///
/// let handler = NodeKind::Custom("handle_billing".to_string());
///
/// // Persistence round-trip
/// let encoded = handler.encode();
/// let decoded = NodeKind::decode(&encoded);
/// assert_eq!(handler, decoded);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    /// Terminal marker that completes workflow execution.
    ///
    /// `End` is virtual: it has no node implementation and no outgoing
    /// edges. Reaching it (as an edge target or a routed label target)
    /// finishes the run.
    End,

    /// Application node identified by a user-defined string.
    ///
    /// The string should be descriptive and unique within the workflow.
    /// Common patterns include handler names or step descriptions.
    Custom(String),
}

impl NodeKind {
    /// Encode a NodeKind into its persisted string form.
    ///
    /// The encoding format is human-readable and forward-compatible:
    /// - `End` → `"End"`
    /// - `Custom("X")` → `"Custom:X"`
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use supportflow::types::NodeKind;
    /// assert_eq!(NodeKind::End.encode(), "End");
    /// assert_eq!(NodeKind::Custom("classify".to_string()).encode(), "Custom:classify");
    /// ```
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            NodeKind::End => "End".to_string(),
            NodeKind::Custom(s) => format!("Custom:{s}"),
        }
    }

    /// Decode a persisted string form back into a NodeKind.
    ///
    /// Provides forward compatibility by falling back to `Custom(s)` for
    /// any unrecognized format.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use supportflow::types::NodeKind;
    /// assert_eq!(NodeKind::decode("End"), NodeKind::End);
    /// assert_eq!(NodeKind::decode("Custom:classify"), NodeKind::Custom("classify".to_string()));
    ///
    /// // Forward compatibility - unknown formats become Custom
    /// assert_eq!(NodeKind::decode("legacy"), NodeKind::Custom("legacy".to_string()));
    /// ```
    pub fn decode(s: &str) -> Self {
        if s == "End" {
            NodeKind::End
        } else if let Some(rest) = s.strip_prefix("Custom:") {
            NodeKind::Custom(rest.to_string())
        } else {
            NodeKind::Custom(s.to_string())
        }
    }

    /// Returns `true` if this is the [`End`](Self::End) marker.
    #[must_use]
    pub fn is_end(&self) -> bool {
        matches!(self, Self::End)
    }

    /// Returns `true` if this is an application node.
    #[must_use]
    pub fn is_custom(&self) -> bool {
        matches!(self, Self::Custom(_))
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::End => write!(f, "End"),
            Self::Custom(name) => write!(f, "{}", name),
        }
    }
}

// Developer experience: allow string literals where a NodeKind is expected.
impl From<&str> for NodeKind {
    fn from(s: &str) -> Self {
        match s {
            "End" => NodeKind::End,
            other => NodeKind::Custom(other.to_string()),
        }
    }
}
