use super::*;
use crate::test_helpers::{MockBackend, logged_in_session, session_with};

#[tokio::test]
async fn subscribe_then_unsubscribe() {
    let backend = MockBackend::new();
    let (session, _) = logged_in_session(&backend, "ada@example.test", None).await;
    let client = ChannelClient::new(session);

    client.subscribe(5).await.unwrap();
    assert!(client.is_subscribed(5).await.unwrap());
    assert_eq!(client.subscriber_count(5).await.unwrap(), 1);

    client.unsubscribe(5).await.unwrap();
    assert!(!client.is_subscribed(5).await.unwrap());
    assert_eq!(client.subscriber_count(5).await.unwrap(), 0);
    assert_eq!(backend.count("DELETE /channels/5/unsubscribe"), 1);
}

#[tokio::test]
async fn anonymous_is_subscribed_skips_backend() {
    let backend = MockBackend::new();
    let (session, _) = session_with(&backend);
    let client = ChannelClient::new(session);
    assert!(!client.is_subscribed(5).await.unwrap());
    assert!(backend.calls().is_empty());
}

#[tokio::test]
async fn subscriber_count_works_anonymously() {
    let backend = MockBackend::new();
    backend.seed_subscription(100, 5);
    backend.seed_subscription(101, 5);
    let (session, _) = session_with(&backend);
    assert_eq!(ChannelClient::new(session).subscriber_count(5).await.unwrap(), 2);
}
