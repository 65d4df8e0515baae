use super::*;
use crate::test_helpers::{MockBackend, logged_in_session, session_with};

const POLL: Duration = Duration::from_secs(30);

/// Let every runnable task finish. With paused time the runtime only
/// advances the clock once nothing else can make progress.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

fn open(session: &Session, video_id: VideoId) -> VideoView {
    VideoView::open(video_id, Clients::new(session), session.clone(), POLL)
}

#[tokio::test(start_paused = true)]
async fn activation_loads_everything() {
    let backend = MockBackend::new();
    let video = backend.add_video("Intro", Some((9, "Chan")));
    backend.seed_comment(video.id, None, "first!");
    backend.seed_video_like(500, video.id);
    backend.seed_subscription(500, 9);
    let (session, _) = logged_in_session(&backend, "ada@example.test", None).await;

    let view = open(&session, video.id);
    settle().await;
    let state = view.state();
    assert_eq!(state.video.as_ref().map(|v| v.title.as_str()), Some("Intro"));
    assert!(state.is_authenticated);
    assert_eq!(state.like_count, 1);
    assert!(!state.is_liked);
    assert_eq!(state.subscriber_count, 1);
    assert!(!state.is_subscribed);
    assert_eq!(state.comments.len(), 1);
    assert!(state.load_error.is_none());
}

#[tokio::test(start_paused = true)]
async fn anonymous_view_never_asks_for_personal_status() {
    let backend = MockBackend::new();
    let video = backend.add_video("Intro", Some((9, "Chan")));
    let (session, _) = session_with(&backend);

    let view = open(&session, video.id);
    settle().await;
    let state = view.state();
    assert!(!state.is_authenticated);
    assert!(!state.is_liked);
    assert!(!state.is_subscribed);
    assert_eq!(backend.count_matching("/user-liked"), 0);
    assert_eq!(backend.count_matching("/is-subscribed"), 0);
    assert_eq!(backend.count("GET /channels/9/subscriber-count"), 1);
}

#[tokio::test(start_paused = true)]
async fn video_without_channel_skips_channel_requests() {
    let backend = MockBackend::new();
    let video = backend.add_video("Orphan", None);
    let (session, _) = logged_in_session(&backend, "ada@example.test", None).await;

    let view = open(&session, video.id);
    settle().await;
    assert_eq!(view.state().subscriber_count, 0);
    assert_eq!(backend.count_matching("/channels/"), 0);

    let err = view.toggle_subscribe().await.unwrap_err();
    assert!(matches!(err, ClientError::NoChannel));
}

#[tokio::test(start_paused = true)]
async fn failed_video_load_sets_error() {
    let backend = MockBackend::new();
    backend.fail("GET /videos/77", 404);
    let (session, _) = session_with(&backend);

    let view = open(&session, 77);
    settle().await;
    let state = view.state();
    assert!(state.video.is_none());
    assert!(state.load_error.as_deref().is_some_and(|m| m.contains("404")));
    assert_eq!(backend.count_matching("/channels/"), 0);
}

#[tokio::test(start_paused = true)]
async fn toggle_like_refreshes_likes_only() {
    let backend = MockBackend::new();
    let video = backend.add_video("Intro", Some((9, "Chan")));
    let (session, _) = logged_in_session(&backend, "ada@example.test", None).await;
    let view = open(&session, video.id);
    settle().await;
    backend.clear_calls();

    assert!(view.toggle_like().await.unwrap());
    settle().await;
    let state = view.state();
    assert!(state.is_liked);
    assert_eq!(state.like_count, 1);
    assert_eq!(backend.count(&format!("GET /videos/{}/like-count", video.id)), 1);
    assert_eq!(backend.count(&format!("GET /videos/{}/user-liked", video.id)), 1);
    assert_eq!(backend.count_matching("/channels/"), 0);

    // Second toggle restores the original state.
    assert!(!view.toggle_like().await.unwrap());
    settle().await;
    let state = view.state();
    assert!(!state.is_liked);
    assert_eq!(state.like_count, 0);
}

#[tokio::test(start_paused = true)]
async fn toggle_subscribe_refreshes_channel_only() {
    let backend = MockBackend::new();
    let video = backend.add_video("Intro", Some((9, "Chan")));
    let (session, _) = logged_in_session(&backend, "ada@example.test", None).await;
    let view = open(&session, video.id);
    settle().await;
    backend.clear_calls();

    assert!(view.toggle_subscribe().await.unwrap());
    settle().await;
    let state = view.state();
    assert!(state.is_subscribed);
    assert_eq!(state.subscriber_count, 1);
    assert_eq!(backend.count_matching("/videos/"), 0);

    assert!(!view.toggle_subscribe().await.unwrap());
    settle().await;
    assert!(!view.state().is_subscribed);
    assert_eq!(backend.count("DELETE /channels/9/unsubscribe"), 1);
}

#[tokio::test(start_paused = true)]
async fn cannot_subscribe_to_own_channel() {
    let backend = MockBackend::new();
    let video = backend.add_video("Mine", Some((9, "Chan")));
    let (session, _) = logged_in_session(&backend, "owner@example.test", Some((9, "Chan"))).await;
    let view = open(&session, video.id);
    settle().await;
    backend.clear_calls();

    let err = view.toggle_subscribe().await.unwrap_err();
    assert!(matches!(err, ClientError::OwnChannel));
    assert!(backend.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn anonymous_actions_need_login() {
    let backend = MockBackend::new();
    let video = backend.add_video("Intro", Some((9, "Chan")));
    let (session, _) = session_with(&backend);
    let view = open(&session, video.id);
    settle().await;
    backend.clear_calls();

    assert!(view.toggle_like().await.unwrap_err().is_login_required());
    assert!(view.toggle_subscribe().await.unwrap_err().is_login_required());
    assert!(view.add_comment("hello").await.unwrap_err().is_login_required());
    assert!(backend.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn add_comment_validates_then_refreshes() {
    let backend = MockBackend::new();
    let video = backend.add_video("Intro", None);
    let (session, _) = logged_in_session(&backend, "ada@example.test", None).await;
    let view = open(&session, video.id);
    settle().await;
    backend.clear_calls();

    assert!(matches!(view.add_comment("   ").await, Err(ClientError::EmptyContent)));
    assert!(backend.calls().is_empty());

    let posted = view.add_comment("  nice video ").await.unwrap();
    assert_eq!(posted.content, "nice video");
    let state = view.wait_for(|s| s.comments.len() == 1).await.unwrap();
    assert_eq!(state.comments[0].id, posted.id);
}

#[tokio::test(start_paused = true)]
async fn login_while_open_refetches_personal_status() {
    let backend = MockBackend::new();
    let video = backend.add_video("Intro", Some((9, "Chan")));
    backend.add_user("ada@example.test", "pw", None);
    let (session, _) = session_with(&backend);
    let view = open(&session, video.id);
    settle().await;
    backend.clear_calls();

    session.login("ada@example.test", "pw").await.unwrap();
    let state = view.wait_for(|s| s.is_authenticated).await.unwrap();
    assert!(state.is_authenticated);
    settle().await;
    assert_eq!(backend.count(&format!("GET /videos/{}/user-liked", video.id)), 1);
    assert_eq!(backend.count("GET /channels/9/is-subscribed"), 1);
    assert_eq!(backend.count_matching("/comments/"), 0);
}

#[tokio::test(start_paused = true)]
async fn comments_poll_on_fixed_period() {
    let backend = MockBackend::new();
    let video = backend.add_video("Intro", None);
    let (session, _) = session_with(&backend);
    let list_call = format!("GET /comments/video/{}", video.id);

    let view = open(&session, video.id);
    settle().await;
    assert_eq!(backend.count(&list_call), 1);

    tokio::time::sleep(POLL - Duration::from_secs(1)).await;
    assert_eq!(backend.count(&list_call), 1);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(backend.count(&list_call), 2);

    // Comments posted elsewhere show up on the next tick.
    backend.seed_comment(video.id, None, "from another tab");
    tokio::time::sleep(POLL).await;
    assert_eq!(backend.count(&list_call), 3);
    assert_eq!(view.state().comments.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn dropping_view_stops_polling() {
    let backend = MockBackend::new();
    let video = backend.add_video("Intro", None);
    let (session, _) = session_with(&backend);
    let list_call = format!("GET /comments/video/{}", video.id);

    let view = open(&session, video.id);
    settle().await;
    let mut rx = view.subscribe();
    assert!(rx.borrow_and_update().comments.is_empty());
    view.close();

    tokio::time::sleep(POLL * 4).await;
    assert_eq!(backend.count(&list_call), 1);
    assert!(rx.changed().await.is_err());
}

#[tokio::test(start_paused = true)]
async fn failed_refresh_keeps_previous_value() {
    let backend = MockBackend::new();
    let video = backend.add_video("Intro", None);
    backend.seed_comment(video.id, None, "kept");
    let (session, _) = session_with(&backend);
    let view = open(&session, video.id);
    settle().await;
    assert_eq!(view.state().comments.len(), 1);

    backend.fail(&format!("GET /comments/video/{}", video.id), 500);
    view.refresh_comments().unwrap();
    settle().await;
    assert_eq!(view.state().comments.len(), 1);
}
