//! End-to-end tour of the support workflow with scripted collaborators.
//!
//! Everything runs offline: the chat model is keyword-driven, the embedder
//! is deterministic, and checkpoints live in process memory. What you see
//! is the real pipeline (triage, routing, retrieval, memory, eventing),
//! just without network calls.
//!
//! Running:
//! ```bash
//! cargo run --bin support_demo
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use miette::Result;
use tracing::info;

use supportflow::collaborators::{
    ChatError, ChatModel, DEFAULT_EMBEDDING_DIMENSION, Embedder, EmbeddingError,
    InMemoryConversationMemory, VectorIndex,
};
use supportflow::runtimes::{RuntimeConfig, WorkflowRunner, generate_session_id};
use supportflow::support::{SupportConfig, build_support_app, seed_package_index};
use supportflow::telemetry::init_tracing;

/// Keyword-driven stand-in for a hosted chat model.
///
/// Triage prompts are answered by inspecting the embedded query text;
/// handler prompts get a canned reply that echoes what the prompt carried,
/// so retrieval context and conversation history are visible in the output.
struct DemoChat;

#[async_trait]
impl ChatModel for DemoChat {
    async fn generate(&self, prompt: &str) -> Result<String, ChatError> {
        if prompt.starts_with("Categorize this query") {
            let category = if prompt.contains("แพ็กเกจ") || prompt.contains("package") {
                "Package"
            } else if prompt.contains("เน็ต") || prompt.contains("internet") {
                "Technical"
            } else if prompt.contains("ใบเสร็จ") || prompt.contains("charge") {
                "Billing"
            } else {
                "General"
            };
            return Ok(category.to_string());
        }
        if prompt.starts_with("Analyze the sentiment") {
            let sentiment = if prompt.contains("แย่") || prompt.contains("terrible") {
                "Negative"
            } else {
                "Neutral"
            };
            return Ok(sentiment.to_string());
        }
        if prompt.starts_with("You are a customer service agent") {
            let grounded = prompt.contains("Package S");
            let remembered = prompt.contains("Customer:");
            return Ok(format!(
                "แนะนำ Package M ค่ะ (retrieved context: {grounded}, prior turns: {remembered})"
            ));
        }
        Ok("ขอบคุณที่ติดต่อเข้ามาค่ะ เดี๋ยวช่วยดูให้นะคะ".to_string())
    }
}

/// Deterministic byte-histogram embedder. Similar texts land close together,
/// which is all the demo's retrieval needs.
struct DemoEmbedder;

#[async_trait]
impl Embedder for DemoEmbedder {
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

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    miette::set_panic_hook();
    demo().await
}

async fn demo() -> Result<()> {
    info!("=== supportflow demo: triage, routing, retrieval, memory ===");

    let config = SupportConfig::default();

    info!("step 1: seeding the package knowledge base");
    let index = Arc::new(VectorIndex::new(Arc::new(DemoEmbedder)));
    seed_package_index(&index, &config.catalog).await?;
    info!(documents = index.len(), "knowledge base ready");

    info!("step 2: compiling the support workflow");
    let app = build_support_app(
        Arc::new(DemoChat),
        index,
        Arc::new(InMemoryConversationMemory::new()),
        config,
    )?;

    let runner = WorkflowRunner::new(app, RuntimeConfig::default()).await?;

    info!("step 3: a technical query takes the technical branch");
    let session = generate_session_id();
    let reply = runner.run_query(&session, "เน็ตบ้านใช้ไม่ได้ตั้งแต่เมื่อคืน").await?;
    info!(
        category = %reply.category,
        sentiment = %reply.sentiment,
        "reply: {}",
        reply.response
    );

    info!("step 4: package advice is grounded and remembers the session");
    let advice_session = generate_session_id();
    let first = runner
        .run_query(&advice_session, "สนใจแพ็กเกจสำหรับเพจ 8 เพจ")
        .await?;
    info!("first turn: {}", first.response);
    let second = runner
        .run_query(&advice_session, "แพ็กเกจที่แนะนำมีส่วนลดไหม package")
        .await?;
    info!("second turn: {}", second.response);

    info!("step 5: an upset customer is escalated, no model call involved");
    let upset_session = generate_session_id();
    let escalated = runner
        .run_query(&upset_session, "บริการแย่มาก terrible จะยกเลิก")
        .await?;
    info!(
        category = %escalated.category,
        sentiment = %escalated.sentiment,
        "reply: {}",
        escalated.response
    );

    let sessions = runner.list_sessions().await?;
    info!(count = sessions.len(), "checkpointed sessions");

    runner.shutdown().await;
    info!("demo finished");
    Ok(())
}
