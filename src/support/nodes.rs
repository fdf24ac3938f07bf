//! The workflow nodes behind customer support triage and response.
//!
//! Two triage nodes annotate the state (category, then sentiment), five
//! handler nodes draft the reply for whichever branch the router picked.
//! Every node skips its work and returns an empty patch when its output
//! field is already populated, so replaying a checkpointed run never
//! repeats a collaborator call.

use std::sync::Arc;

use async_trait::async_trait;

use crate::collaborators::{ChatModel, ConversationMemory, ConversationTurn, Retriever};
use crate::node::{Node, NodeContext, NodeError};
use crate::state::{Category, Sentiment, StatePatch, StateSnapshot};
use crate::support::config::SupportConfig;
use crate::support::prompts;

/// Buckets the query into one of the four support categories.
///
/// As the workflow entry point this node also gates input: a blank query
/// is rejected before any collaborator is called, so malformed requests
/// fail fast with [`NodeError::MissingInput`].
pub struct ClassifyNode {
    chat: Arc<dyn ChatModel>,
}

impl ClassifyNode {
    #[must_use]
    pub fn new(chat: Arc<dyn ChatModel>) -> Self {
        Self { chat }
    }
}

#[async_trait]
impl Node for ClassifyNode {
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<StatePatch, NodeError> {
        if snapshot.query.trim().is_empty() {
            return Err(NodeError::MissingInput { what: "query" });
        }
        if snapshot.category.is_some() {
            return Ok(StatePatch::default());
        }
        let raw = self
            .chat
            .generate(&prompts::classify_prompt(&snapshot.query))
            .await?;
        let category = Category::normalize(&raw);
        ctx.emit("classify", format!("categorized as {category}"))?;
        Ok(StatePatch::default().with_category(category))
    }
}

/// Assesses the emotional tone of the query.
pub struct SentimentNode {
    chat: Arc<dyn ChatModel>,
}

impl SentimentNode {
    #[must_use]
    pub fn new(chat: Arc<dyn ChatModel>) -> Self {
        Self { chat }
    }
}

#[async_trait]
impl Node for SentimentNode {
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<StatePatch, NodeError> {
        if snapshot.sentiment.is_some() {
            return Ok(StatePatch::default());
        }
        let raw = self
            .chat
            .generate(&prompts::sentiment_prompt(&snapshot.query))
            .await?;
        let sentiment = Sentiment::normalize(&raw);
        ctx.emit("sentiment", format!("assessed as {sentiment}"))?;
        Ok(StatePatch::default().with_sentiment(sentiment))
    }
}

/// Drafts a reply for technical queries.
pub struct TechnicalNode {
    chat: Arc<dyn ChatModel>,
    config: Arc<SupportConfig>,
}

impl TechnicalNode {
    #[must_use]
    pub fn new(chat: Arc<dyn ChatModel>, config: Arc<SupportConfig>) -> Self {
        Self { chat, config }
    }
}

#[async_trait]
impl Node for TechnicalNode {
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<StatePatch, NodeError> {
        let prompt = prompts::technical_prompt(&self.config, &snapshot.query);
        draft_reply(&self.chat, &snapshot, &ctx, "technical", prompt).await
    }
}

/// Drafts a reply for billing queries.
pub struct BillingNode {
    chat: Arc<dyn ChatModel>,
    config: Arc<SupportConfig>,
}

impl BillingNode {
    #[must_use]
    pub fn new(chat: Arc<dyn ChatModel>, config: Arc<SupportConfig>) -> Self {
        Self { chat, config }
    }
}

#[async_trait]
impl Node for BillingNode {
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<StatePatch, NodeError> {
        let prompt = prompts::billing_prompt(&self.config, &snapshot.query);
        draft_reply(&self.chat, &snapshot, &ctx, "billing", prompt).await
    }
}

/// Drafts a reply for anything the classifier could not place.
pub struct GeneralNode {
    chat: Arc<dyn ChatModel>,
    config: Arc<SupportConfig>,
}

impl GeneralNode {
    #[must_use]
    pub fn new(chat: Arc<dyn ChatModel>, config: Arc<SupportConfig>) -> Self {
        Self { chat, config }
    }
}

#[async_trait]
impl Node for GeneralNode {
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<StatePatch, NodeError> {
        let prompt = prompts::general_prompt(&self.config, &snapshot.query);
        draft_reply(&self.chat, &snapshot, &ctx, "general", prompt).await
    }
}

/// Shared body of the three plain handler nodes: skip when a response
/// already exists, otherwise ask the chat model to draft one.
async fn draft_reply(
    chat: &Arc<dyn ChatModel>,
    snapshot: &StateSnapshot,
    ctx: &NodeContext,
    kind: &str,
    prompt: String,
) -> Result<StatePatch, NodeError> {
    if snapshot.response.is_some() {
        return Ok(StatePatch::default());
    }
    ctx.emit("respond", format!("drafting {kind} reply"))?;
    let response = chat.generate(&prompt).await?;
    Ok(StatePatch::default().with_response(response))
}

/// Recommends a subscription plan, grounded in retrieved catalog entries
/// and the session's prior turns.
///
/// This is the only node that touches conversation memory: it reads the
/// history to keep multi-turn advice consistent, and records the finished
/// exchange once the reply is drafted. Both steps are skipped for
/// anonymous runs with no session id.
pub struct PackageNode {
    chat: Arc<dyn ChatModel>,
    retriever: Arc<dyn Retriever>,
    memory: Arc<dyn ConversationMemory>,
    config: Arc<SupportConfig>,
}

impl PackageNode {
    #[must_use]
    pub fn new(
        chat: Arc<dyn ChatModel>,
        retriever: Arc<dyn Retriever>,
        memory: Arc<dyn ConversationMemory>,
        config: Arc<SupportConfig>,
    ) -> Self {
        Self {
            chat,
            retriever,
            memory,
            config,
        }
    }
}

#[async_trait]
impl Node for PackageNode {
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<StatePatch, NodeError> {
        if snapshot.response.is_some() {
            return Ok(StatePatch::default());
        }

        let hits = self
            .retriever
            .search(&snapshot.query, self.config.retrieval_k)
            .await?;
        ctx.emit("retrieve", format!("{} knowledge-base hits", hits.len()))?;
        let context: Vec<String> = hits.into_iter().map(|hit| hit.text).collect();

        let history = match ctx.session_id.as_deref() {
            Some(session_id) => render_history(&self.memory.history(session_id).await?),
            None => String::new(),
        };

        let prompt = prompts::package_prompt(
            &self.config,
            &snapshot.query,
            &history,
            &context.join("\n"),
        );
        let response = self.chat.generate(&prompt).await?;

        if let Some(session_id) = ctx.session_id.as_deref() {
            self.memory
                .append(session_id, &snapshot.query, &response)
                .await?;
        }

        Ok(StatePatch::default()
            .with_context(context)
            .with_response(response))
    }
}

/// Hands upset customers a human contact instead of a drafted reply.
///
/// Purely local: no collaborator is consulted, so escalation works even
/// when the chat backend is down.
pub struct EscalateNode {
    config: Arc<SupportConfig>,
}

impl EscalateNode {
    #[must_use]
    pub fn new(config: Arc<SupportConfig>) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Node for EscalateNode {
    async fn run(
        &self,
        snapshot: StateSnapshot,
        ctx: NodeContext,
    ) -> Result<StatePatch, NodeError> {
        if snapshot.response.is_some() {
            return Ok(StatePatch::default());
        }
        ctx.emit(
            "escalate",
            format!("handing off to {}", self.config.escalation_contact),
        )?;
        Ok(StatePatch::default()
            .with_response(prompts::escalation_message(&self.config.escalation_contact)))
    }
}

/// Flattens recorded turns into the `Customer:`/`Agent:` transcript the
/// package prompt expects. No turns renders as an empty string.
fn render_history(turns: &[ConversationTurn]) -> String {
    turns
        .iter()
        .map(|turn| format!("Customer: {}\nAgent: {}", turn.input, turn.output))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use chrono::Utc;

    use super::*;
    use crate::collaborators::{
        ChatError, DocumentHit, InMemoryConversationMemory, RetrievalError,
    };
    use crate::state::SupportState;

    /// Chat double that pops pre-scripted replies and records each prompt.
    struct ScriptedChat {
        replies: Mutex<VecDeque<String>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedChat {
        fn new(replies: impl IntoIterator<Item = &'static str>) -> Self {
            Self {
                replies: Mutex::new(replies.into_iter().map(String::from).collect()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedChat {
        async fn generate(&self, prompt: &str) -> Result<String, ChatError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| ChatError::Provider {
                    message: "unscripted chat call".to_string(),
                })
        }
    }

    struct FixedRetriever {
        hits: Vec<DocumentHit>,
    }

    #[async_trait]
    impl Retriever for FixedRetriever {
        async fn search(&self, _query: &str, k: usize) -> Result<Vec<DocumentHit>, RetrievalError> {
            Ok(self.hits.iter().take(k).cloned().collect())
        }
    }

    fn ctx(session_id: Option<&str>) -> NodeContext {
        let (sender, receiver) = flume::unbounded();
        // Leak the receiver so emits during the test never error out.
        std::mem::forget(receiver);
        NodeContext {
            node_id: "test-node".to_string(),
            step: 1,
            session_id: session_id.map(String::from),
            event_bus_sender: sender,
        }
    }

    fn snapshot_for(query: &str) -> StateSnapshot {
        SupportState::new(query).snapshot()
    }

    #[tokio::test]
    async fn classify_rejects_blank_queries_before_calling_chat() {
        let chat = Arc::new(ScriptedChat::new([]));
        let node = ClassifyNode::new(chat.clone());
        let err = node
            .run(snapshot_for("   \n"), ctx(None))
            .await
            .unwrap_err();
        assert!(matches!(err, NodeError::MissingInput { what: "query" }));
        assert!(chat.prompts().is_empty());
    }

    #[tokio::test]
    async fn classify_normalizes_model_output() {
        let chat = Arc::new(ScriptedChat::new(["TECHNICAL", "gibberish"]));
        let node = ClassifyNode::new(chat.clone());

        let patch = node
            .run(snapshot_for("my printer is on fire"), ctx(None))
            .await
            .unwrap();
        assert_eq!(patch.category, Some(Category::Technical));

        let patch = node
            .run(snapshot_for("hello there"), ctx(None))
            .await
            .unwrap();
        assert_eq!(patch.category, Some(Category::General));

        let prompts = chat.prompts();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].contains("my printer is on fire"));
    }

    #[tokio::test]
    async fn classify_skips_when_category_already_present() {
        let chat = Arc::new(ScriptedChat::new([]));
        let node = ClassifyNode::new(chat.clone());
        let mut state = SupportState::new("repeat run");
        state.category = Some(Category::Billing);

        let patch = node.run(state.snapshot(), ctx(None)).await.unwrap();
        assert!(patch.is_empty());
        assert!(chat.prompts().is_empty());
    }

    #[tokio::test]
    async fn sentiment_normalizes_model_output() {
        let chat = Arc::new(ScriptedChat::new(["NEGATIVE"]));
        let node = SentimentNode::new(chat);
        let patch = node
            .run(snapshot_for("this is unacceptable"), ctx(None))
            .await
            .unwrap();
        assert_eq!(patch.sentiment, Some(Sentiment::Negative));
    }

    #[tokio::test]
    async fn handler_drafts_reply_in_configured_language() {
        let chat = Arc::new(ScriptedChat::new(["lets fix your modem"]));
        let config = Arc::new(SupportConfig::default());
        let node = TechnicalNode::new(chat.clone(), config);

        let patch = node
            .run(snapshot_for("internet down"), ctx(None))
            .await
            .unwrap();
        assert_eq!(patch.response.as_deref(), Some("lets fix your modem"));
        assert!(chat.prompts()[0].contains("Reply in Thai."));
    }

    #[tokio::test]
    async fn handler_skips_when_response_already_present() {
        let chat = Arc::new(ScriptedChat::new([]));
        let node = BillingNode::new(chat.clone(), Arc::new(SupportConfig::default()));
        let mut state = SupportState::new("invoice?");
        state.response = Some("already answered".to_string());

        let patch = node.run(state.snapshot(), ctx(None)).await.unwrap();
        assert!(patch.is_empty());
        assert!(chat.prompts().is_empty());
    }

    #[tokio::test]
    async fn package_node_grounds_reply_and_records_the_turn() {
        let chat = Arc::new(ScriptedChat::new(["Package M fits you"]));
        let retriever = Arc::new(FixedRetriever {
            hits: vec![
                DocumentHit {
                    text: "Package S - ...".to_string(),
                    metadata: serde_json::Value::Null,
                    score: 0.9,
                },
                DocumentHit {
                    text: "Package M - ...".to_string(),
                    metadata: serde_json::Value::Null,
                    score: 0.8,
                },
            ],
        });
        let memory = Arc::new(InMemoryConversationMemory::new());
        memory
            .append("session-7", "earlier question", "earlier answer")
            .await
            .unwrap();
        let node = PackageNode::new(
            chat.clone(),
            retriever,
            memory.clone(),
            Arc::new(SupportConfig::default()),
        );

        let patch = node
            .run(snapshot_for("which plan for 8 pages?"), ctx(Some("session-7")))
            .await
            .unwrap();

        assert_eq!(
            patch.context.as_deref(),
            Some(&["Package S - ...".to_string(), "Package M - ...".to_string()][..])
        );
        assert_eq!(patch.response.as_deref(), Some("Package M fits you"));

        let prompt = chat.prompts().remove(0);
        assert!(prompt.contains("Customer: earlier question\nAgent: earlier answer"));
        assert!(prompt.contains("Package S - ...\nPackage M - ..."));

        let turns = memory.history("session-7").await.unwrap();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1].input, "which plan for 8 pages?");
        assert_eq!(turns[1].output, "Package M fits you");
    }

    #[tokio::test]
    async fn package_node_skips_memory_for_anonymous_runs() {
        let chat = Arc::new(ScriptedChat::new(["any plan works"]));
        let retriever = Arc::new(FixedRetriever { hits: Vec::new() });
        let memory = Arc::new(InMemoryConversationMemory::new());
        let node = PackageNode::new(
            chat.clone(),
            retriever,
            memory.clone(),
            Arc::new(SupportConfig::default()),
        );

        let patch = node
            .run(snapshot_for("cheapest plan?"), ctx(None))
            .await
            .unwrap();

        assert_eq!(patch.context.as_deref(), Some(&[][..]));
        assert_eq!(patch.response.as_deref(), Some("any plan works"));
        assert!(chat.prompts()[0].contains("Previous conversation history: \n"));
    }

    #[tokio::test]
    async fn escalate_replies_without_any_collaborator() {
        let node = EscalateNode::new(Arc::new(SupportConfig::default()));
        let patch = node
            .run(snapshot_for("I want to complain"), ctx(None))
            .await
            .unwrap();
        let response = patch.response.unwrap();
        assert!(response.contains("02-123-4567"));
    }

    #[test]
    fn history_rendering_is_transcript_shaped() {
        let turns = vec![
            ConversationTurn {
                input: "a".to_string(),
                output: "b".to_string(),
                at: Utc::now(),
            },
            ConversationTurn {
                input: "c".to_string(),
                output: "d".to_string(),
                at: Utc::now(),
            },
        ];
        assert_eq!(
            render_history(&turns),
            "Customer: a\nAgent: b\nCustomer: c\nAgent: d"
        );
        assert_eq!(render_history(&[]), "");
    }
}
