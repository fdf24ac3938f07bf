//! Collaborator doubles shared across the integration suites.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::{Duration, sleep};

use supportflow::collaborators::{
    ChatError, ChatModel, DEFAULT_EMBEDDING_DIMENSION, DocumentHit, Embedder, EmbeddingError,
    RetrievalError, Retriever,
};

/// Pops pre-scripted replies in order and records every prompt.
///
/// Running out of script is an error, so a test that triggers more chat
/// calls than it scripted fails loudly instead of silently looping.
pub struct ScriptedChat {
    replies: Mutex<VecDeque<Result<String, ChatError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedChat {
    pub fn new(replies: impl IntoIterator<Item = &'static str>) -> Self {
        Self::from_results(replies.into_iter().map(|reply| Ok(reply.to_string())))
    }

    pub fn from_results(replies: impl IntoIterator<Item = Result<String, ChatError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().len()
    }
}

#[async_trait]
impl ChatModel for ScriptedChat {
    async fn generate(&self, prompt: &str) -> Result<String, ChatError> {
        self.prompts.lock().push(prompt.to_string());
        self.replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| {
                Err(ChatError::Provider {
                    message: "unscripted chat call".to_string(),
                })
            })
    }
}

/// Answers triage prompts by keyword, handler prompts with an echo.
///
/// Lets whole-workflow tests steer the route through the query text alone:
/// "package" routes to the package advisor, "internet" to technical,
/// "charge" to billing, "terrible" forces a negative sentiment.
pub struct KeywordChat;

#[async_trait]
impl ChatModel for KeywordChat {
    async fn generate(&self, prompt: &str) -> Result<String, ChatError> {
        if prompt.starts_with("Categorize this query") {
            let category = if prompt.contains("package") {
                "Package"
            } else if prompt.contains("internet") || prompt.contains("router") {
                "Technical"
            } else if prompt.contains("charge") || prompt.contains("invoice") {
                "Billing"
            } else {
                "General"
            };
            return Ok(category.to_string());
        }
        if prompt.starts_with("Analyze the sentiment") {
            let sentiment = if prompt.contains("terrible") || prompt.contains("furious") {
                "Negative"
            } else {
                "Neutral"
            };
            return Ok(sentiment.to_string());
        }
        Ok(format!("reply to: {prompt}"))
    }
}

/// Fails transiently for the first `failures` calls, then succeeds.
pub struct FlakyChat {
    remaining: AtomicUsize,
    calls: AtomicUsize,
    reply: String,
}

impl FlakyChat {
    pub fn new(failures: usize, reply: &str) -> Self {
        Self {
            remaining: AtomicUsize::new(failures),
            calls: AtomicUsize::new(0),
            reply: reply.to_string(),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatModel for FlakyChat {
    async fn generate(&self, _prompt: &str) -> Result<String, ChatError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(ChatError::RateLimited);
        }
        Ok(self.reply.clone())
    }
}

/// Takes longer than any test deadline should tolerate.
pub struct SlowChat {
    pub delay: Duration,
}

#[async_trait]
impl ChatModel for SlowChat {
    async fn generate(&self, _prompt: &str) -> Result<String, ChatError> {
        sleep(self.delay).await;
        Ok("late reply".to_string())
    }
}

/// Serves a fixed hit list, honoring `k`.
pub struct StaticRetriever {
    hits: Vec<DocumentHit>,
}

impl StaticRetriever {
    pub fn empty() -> Self {
        Self { hits: Vec::new() }
    }

    pub fn with_texts(texts: impl IntoIterator<Item = &'static str>) -> Self {
        let hits = texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| DocumentHit {
                text: text.to_string(),
                metadata: serde_json::Value::Null,
                score: 1.0 - i as f32 * 0.1,
            })
            .collect();
        Self { hits }
    }
}

#[async_trait]
impl Retriever for StaticRetriever {
    async fn search(&self, _query: &str, k: usize) -> Result<Vec<DocumentHit>, RetrievalError> {
        Ok(self.hits.iter().take(k).cloned().collect())
    }
}

/// Deterministic byte-histogram embedder at the default dimensionality.
pub struct HashEmbedder;

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vector = vec![0.0f32; DEFAULT_EMBEDDING_DIMENSION];
        for (i, byte) in text.bytes().enumerate() {
            vector[(byte as usize * 7 + i) % DEFAULT_EMBEDDING_DIMENSION] += 1.0;
        }
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        DEFAULT_EMBEDDING_DIMENSION
    }
}
