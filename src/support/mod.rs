//! The customer support workflow: triage, routing, and response drafting.
//!
//! This module assembles the domain nodes into a runnable [`App`]:
//!
//! ```text
//! classify ──> sentiment ──┬─[escalate]──> escalate ──> End
//!                          ├─[package]───> package ───> End
//!                          ├─[technical]─> technical ─> End
//!                          ├─[billing]───> billing ───> End
//!                          └─[general]───> general ───> End
//! ```
//!
//! Both triage nodes always run; the router then picks exactly one handler.
//! Negative sentiment short-circuits to escalation no matter what the
//! classifier said, so an upset billing customer still reaches a human.
//!
//! [`build_support_app`] wires the graph from injected collaborators and a
//! [`SupportConfig`]; [`SupportReply`] is the caller-facing view of a
//! finished run.

pub mod catalog;
pub mod config;
pub mod nodes;
pub mod prompts;
pub mod router;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::app::App;
use crate::collaborators::{ChatModel, ConversationMemory, Retriever};
use crate::graphs::{GraphBuilder, GraphValidationError};
use crate::state::{Category, Sentiment, SupportState};
use crate::types::NodeKind;

pub use catalog::{seed_package_index, PackageCatalog, PackagePlan};
pub use config::{Language, SupportConfig};
pub use nodes::{
    BillingNode, ClassifyNode, EscalateNode, GeneralNode, PackageNode, SentimentNode,
    TechnicalNode,
};
pub use router::route;

/// Node id of the category classifier, the workflow entry point.
const CLASSIFY: &str = "classify";
/// Node id of the sentiment analyzer, the branch point.
const SENTIMENT: &str = "sentiment";

fn node(id: &str) -> NodeKind {
    NodeKind::Custom(id.to_string())
}

/// Builds the validated support workflow from its collaborators.
///
/// Handler nodes share one chat model and one [`SupportConfig`]; the
/// package advisor additionally takes the retriever and conversation
/// memory. Validation failures here mean the wiring in this function is
/// wrong, they are not runtime conditions.
pub fn build_support_app(
    chat: Arc<dyn ChatModel>,
    retriever: Arc<dyn Retriever>,
    memory: Arc<dyn ConversationMemory>,
    config: SupportConfig,
) -> Result<App, GraphValidationError> {
    let config = Arc::new(config);

    GraphBuilder::new()
        .add_node(node(CLASSIFY), ClassifyNode::new(chat.clone()))
        .add_node(node(SENTIMENT), SentimentNode::new(chat.clone()))
        .add_node(
            node(router::TECHNICAL),
            TechnicalNode::new(chat.clone(), config.clone()),
        )
        .add_node(
            node(router::BILLING),
            BillingNode::new(chat.clone(), config.clone()),
        )
        .add_node(
            node(router::GENERAL),
            GeneralNode::new(chat.clone(), config.clone()),
        )
        .add_node(
            node(router::PACKAGE),
            PackageNode::new(chat, retriever, memory, config.clone()),
        )
        .add_node(node(router::ESCALATE), EscalateNode::new(config))
        .add_edge(node(CLASSIFY), node(SENTIMENT))
        .add_conditional_edges(
            node(SENTIMENT),
            Arc::new(router::route),
            [
                (router::ESCALATE, node(router::ESCALATE)),
                (router::PACKAGE, node(router::PACKAGE)),
                (router::TECHNICAL, node(router::TECHNICAL)),
                (router::BILLING, node(router::BILLING)),
                (router::GENERAL, node(router::GENERAL)),
            ],
        )
        .add_edge(node(router::TECHNICAL), NodeKind::End)
        .add_edge(node(router::BILLING), NodeKind::End)
        .add_edge(node(router::GENERAL), NodeKind::End)
        .add_edge(node(router::PACKAGE), NodeKind::End)
        .add_edge(node(router::ESCALATE), NodeKind::End)
        .set_entry(node(CLASSIFY))
        .compile()
}

/// Caller-facing view of a completed support run.
///
/// Exists so callers get the triage verdict next to the answer without
/// digging through workflow state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportReply {
    /// What the query was classified as.
    pub category: Category,
    /// The assessed tone of the query.
    pub sentiment: Sentiment,
    /// The drafted (or canned, for escalations) answer.
    pub response: String,
}

impl SupportReply {
    /// Extracts the reply from a finished run's state.
    ///
    /// Returns `None` when no response was drafted, which callers treat as
    /// a wiring defect rather than a customer-visible outcome. Missing
    /// triage fields fall back to the neutral defaults.
    #[must_use]
    pub fn from_state(state: &SupportState) -> Option<Self> {
        let response = state.response.clone()?;
        Some(Self {
            category: state.category.unwrap_or(Category::General),
            sentiment: state.sentiment.unwrap_or(Sentiment::Neutral),
            response,
        })
    }
}
