//! Backend contract shared by every checkpointer implementation.

use std::sync::Arc;

use supportflow::runtimes::{Checkpointer, InMemoryCheckpointer};
use supportflow::state::{Category, Sentiment, SupportState};

/// The behavior callers rely on regardless of backend: fresh sessions load
/// as `None`, saves replace and bump the version, sessions are independent,
/// and clearing is idempotent.
async fn backend_contract(checkpointer: Arc<dyn Checkpointer>) {
    assert!(
        checkpointer
            .load_latest("contract-s1")
            .await
            .unwrap()
            .is_none()
    );

    let mut first = SupportState::new("สนใจแพ็กเกจไหนดี");
    first.category = Some(Category::Package);
    checkpointer.save("contract-s1", &first).await.unwrap();

    let saved = checkpointer
        .load_latest("contract-s1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(saved.session_id, "contract-s1");
    assert_eq!(saved.version, 1);
    assert_eq!(saved.state, first);

    let mut second = first.clone();
    second.sentiment = Some(Sentiment::Neutral);
    second.context = vec!["Package M - ฿1,900/month".to_string()];
    second.response = Some("แนะนำ Package M ค่ะ".to_string());
    checkpointer.save("contract-s1", &second).await.unwrap();

    let replaced = checkpointer
        .load_latest("contract-s1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(replaced.version, 2);
    assert_eq!(replaced.state, second);
    assert!(replaced.updated_at >= saved.updated_at);

    checkpointer
        .save("contract-s2", &SupportState::new("other session"))
        .await
        .unwrap();
    let sessions = checkpointer.list_sessions().await.unwrap();
    assert!(sessions.contains(&"contract-s1".to_string()));
    assert!(sessions.contains(&"contract-s2".to_string()));

    checkpointer.clear("contract-s1").await.unwrap();
    assert!(
        checkpointer
            .load_latest("contract-s1")
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        checkpointer
            .load_latest("contract-s2")
            .await
            .unwrap()
            .is_some()
    );

    // Clearing a session that never existed is not an error.
    checkpointer.clear("contract-never").await.unwrap();
}

#[tokio::test]
async fn in_memory_backend_honors_the_contract() {
    backend_contract(Arc::new(InMemoryCheckpointer::new())).await;
}

#[cfg(feature = "sqlite")]
#[tokio::test]
async fn sqlite_backend_honors_the_contract() {
    use supportflow::runtimes::SQLiteCheckpointer;

    let checkpointer = SQLiteCheckpointer::connect("sqlite::memory:")
        .await
        .unwrap();
    backend_contract(Arc::new(checkpointer)).await;
}

#[tokio::test]
async fn in_memory_lists_sessions_in_sorted_order() {
    let checkpointer = InMemoryCheckpointer::new();
    for id in ["zulu", "alpha", "mike"] {
        checkpointer.save(id, &SupportState::new("q")).await.unwrap();
    }
    assert_eq!(
        checkpointer.list_sessions().await.unwrap(),
        vec!["alpha".to_string(), "mike".to_string(), "zulu".to_string()]
    );
}
