//! A session subscribed to the SQLite-backed collection.

use std::sync::Arc;
use std::time::Duration;

use pb_core::{DemoGenerator, FeedMode, MemoryStore, Notice, PinDraft, RemoteFeed, Session, SessionHandle};
use pb_remote_sqlite::SqliteRemoteFeed;

async fn remote_handle() -> (SessionHandle, Arc<SqliteRemoteFeed>) {
    let feed = Arc::new(SqliteRemoteFeed::new("sqlite::memory:", Duration::from_millis(10)).await.unwrap());
    let handle = SessionHandle::new(Box::new(MemoryStore::new()), DemoGenerator::seeded(21), Some(feed.clone()));
    (handle, feed)
}

/// Polls the session until `check` holds or two seconds pass.
async fn eventually(handle: &SessionHandle, check: impl Fn(&Session) -> bool) -> bool {
    for _ in 0..200 {
        if handle.read(&check) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

#[tokio::test]
async fn empty_collection_shows_the_demo_fallback() {
    let (handle, _feed) = remote_handle().await;
    assert_eq!(handle.read(Session::mode), FeedMode::Remote);
    handle.start();
    assert!(eventually(&handle, |s| s.repository().is_showing_fallback()).await);
    assert_eq!(handle.read(|s| s.pins().len()), 24);
    handle.shutdown();
}

#[tokio::test]
async fn published_pin_arrives_through_the_next_snapshot() {
    let (handle, _feed) = remote_handle().await;
    handle.start();
    assert!(eventually(&handle, |s| s.repository().is_showing_fallback()).await);

    handle.update(Session::open_upload);
    let draft = PinDraft { title: "Solo texto".into(), cat: "Viajes".into(), ..Default::default() };
    let pin = handle.publish(draft).await.unwrap();
    assert!(pin.src.starts_with("https://picsum.photos/seed/"));
    assert_eq!(handle.update(Session::take_notices), vec![Notice::Published]);

    let id = pin.id.clone();
    assert!(eventually(&handle, move |s| s.pins().len() == 1 && s.pins()[0].id == id).await);
    assert_eq!(handle.read(|s| s.pins()[0].title.clone()), "Solo texto");
    assert!(!handle.read(|s| s.repository().is_showing_fallback()));
    handle.shutdown();
}

#[tokio::test]
async fn restarting_keeps_a_single_subscription() {
    let (handle, feed) = remote_handle().await;
    handle.start();
    handle.start();
    assert!(handle.is_subscribed());

    handle.shutdown();
    assert!(!handle.is_subscribed());

    // No subscriber is left to pick this up.
    let draft = pb_core::NewPin {
        src: "https://img.example/late.jpg".into(),
        w: 1,
        h: 1,
        title: "late".into(),
        desc: String::new(),
        author: "x".into(),
        cat: "Arte".into(),
        tags: vec![],
        created_at: 1,
    };
    feed.create(draft).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(handle.read(|s| s.pins().iter().all(|p| p.title != "late")));
}
