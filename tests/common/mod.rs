#![allow(dead_code)]

pub mod collaborators;
pub mod nodes;

pub use collaborators::*;
pub use nodes::*;

use std::sync::Arc;

use supportflow::app::App;
use supportflow::collaborators::InMemoryConversationMemory;
use supportflow::support::{SupportConfig, build_support_app};
use supportflow::types::NodeKind;

pub fn custom(id: &str) -> NodeKind {
    NodeKind::Custom(id.to_string())
}

/// The full support graph over the keyword chat double, a retriever with
/// no documents, and fresh in-process conversation memory.
pub fn keyword_support_app() -> App {
    build_support_app(
        Arc::new(KeywordChat),
        Arc::new(StaticRetriever::empty()),
        Arc::new(InMemoryConversationMemory::new()),
        SupportConfig::default(),
    )
    .expect("support graph must validate")
}
