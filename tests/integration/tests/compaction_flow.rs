//! Context manager behaviour across many turns and sessions.

use parley_agent::{ContextManager, HistoryCompactor, SessionStore, UnavailableSummarizer};
use parley_core::context::{estimate_messages, CompactionPolicy};
use parley_core::types::{MessageKind, Role, SessionId};
use parley_integration_tests::CountingSummarizer;
use std::sync::Arc;
use std::time::Duration;

fn manager_with(
    summarizer: Arc<dyn parley_agent::Summarizer>,
    store: SessionStore,
) -> ContextManager {
    ContextManager::new(
        Arc::new(store),
        HistoryCompactor::new(summarizer).with_policy(
            CompactionPolicy::new(40)
                .with_min_messages(6)
                .with_keep_recent(4),
        ),
    )
}

#[tokio::test]
async fn test_history_stays_bounded_over_long_conversation() {
    let summarizer = Arc::new(CountingSummarizer::new("the crew argued about the map"));
    let mgr = manager_with(summarizer.clone(), SessionStore::new());
    let id = SessionId::new("voyage");
    mgr.set_system_prompt(&id, "You are Aliya.").await.unwrap();

    for i in 0..30 {
        let history = mgr
            .append(&id, &format!("question {} about the northern passage", i))
            .await
            .unwrap();
        assert_eq!(history[0].content, "You are Aliya.");
        mgr.record_reply(&id, &format!("answer {} with some detail", i))
            .await
            .unwrap();

        let snapshot = mgr.history(&id).await.unwrap();
        let summaries = snapshot
            .iter()
            .filter(|m| m.kind == MessageKind::Summary)
            .count();
        assert!(summaries <= 1);
        assert_eq!(
            mgr.status(&id).await.unwrap().total_tokens,
            estimate_messages(&snapshot)
        );
    }

    let status = mgr.status(&id).await.unwrap();
    assert!(status.has_summary);
    assert!(status.compactions >= 1);
    assert_eq!(status.compactions as usize, summarizer.calls());
    assert!(status.message_count <= 8);
}

#[tokio::test]
async fn test_without_summarizer_history_is_truncated() {
    let mgr = manager_with(Arc::new(UnavailableSummarizer), SessionStore::new());
    let id = SessionId::new("plain");
    mgr.set_system_prompt(&id, "You are Aliya.").await.unwrap();

    for i in 0..20 {
        mgr.append(&id, &format!("question {} about the northern passage", i))
            .await
            .unwrap();
        mgr.record_reply(&id, &format!("answer {} with some detail", i))
            .await
            .unwrap();
    }

    let history = mgr.history(&id).await.unwrap();
    assert!(history.iter().all(|m| m.kind != MessageKind::Summary));
    assert!(!mgr.status(&id).await.unwrap().has_summary);
    assert_eq!(history.last().unwrap().role, Role::Assistant);
}

#[tokio::test]
async fn test_capacity_evicts_least_recent_session() {
    let mgr = manager_with(
        Arc::new(UnavailableSummarizer),
        SessionStore::new().with_capacity(Some(2)),
    );

    mgr.append(&SessionId::new("a"), "hi").await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    mgr.append(&SessionId::new("b"), "hi").await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    mgr.append(&SessionId::new("c"), "hi").await.unwrap();

    assert_eq!(mgr.store().len(), 2);
    assert!(!mgr.store().contains(&SessionId::new("a")));
    assert!(mgr.store().contains(&SessionId::new("c")));
}
