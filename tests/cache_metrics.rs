mod support;

use std::sync::OnceLock;

use feedline::{domain::policy::Actor, infra::telemetry};
use metrics_util::debugging::{DebugValue, DebuggingRecorder, Snapshotter};
use serial_test::serial;
use uuid::Uuid;

use support::Harness;

fn snapshotter() -> &'static Snapshotter {
    static SNAPSHOTTER: OnceLock<Snapshotter> = OnceLock::new();
    SNAPSHOTTER.get_or_init(|| {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();
        recorder
            .install()
            .expect("debugging recorder should install");
        telemetry::describe_metrics();
        snapshotter
    })
}

/// Sum of every counter named `name`, across label sets.
fn counter_total(name: &str) -> u64 {
    snapshotter()
        .snapshot()
        .into_vec()
        .into_iter()
        .filter(|(key, _, _, _)| key.key().name() == name)
        .map(|(_, _, _, value)| match value {
            DebugValue::Counter(count) => count,
            _ => 0,
        })
        .sum()
}

#[tokio::test]
#[serial]
async fn reads_record_hits_and_misses() {
    snapshotter();
    let harness = Harness::new();
    let user = Uuid::new_v4();
    harness.post(user, "counted").await;

    let hits = counter_total("feedline_cache_hit_total");
    let misses = counter_total("feedline_cache_miss_total");
    let stores = counter_total("feedline_cache_store_total");

    // Cold read misses both the id list and the hydrated feed.
    harness.app.timeline.list_timeline(user, None).await.unwrap();
    assert_eq!(counter_total("feedline_cache_miss_total") - misses, 2);
    assert_eq!(counter_total("feedline_cache_store_total") - stores, 2);
    assert_eq!(counter_total("feedline_cache_hit_total") - hits, 0);

    harness.app.timeline.list_timeline(user, None).await.unwrap();
    assert_eq!(counter_total("feedline_cache_hit_total") - hits, 2);
    assert_eq!(counter_total("feedline_cache_miss_total") - misses, 2);
}

#[tokio::test]
#[serial]
async fn busts_count_deleted_keys_and_record_latency() {
    snapshotter();
    let harness = Harness::new();
    let author = Uuid::new_v4();
    let busted = counter_total("feedline_cache_bust_keys_total");

    let post = harness.post(author, "to delete").await;
    // Posts, Timeline and PostsTimeline of the author.
    assert_eq!(counter_total("feedline_cache_bust_keys_total") - busted, 3);

    harness
        .app
        .posts
        .delete_post(&Actor::User(author), post.id)
        .await
        .unwrap();
    // Plus every comment view of the post.
    assert_eq!(counter_total("feedline_cache_bust_keys_total") - busted, 9);

    let names: Vec<String> = snapshotter()
        .snapshot()
        .into_vec()
        .into_iter()
        .map(|(key, _, _, _)| key.key().name().to_string())
        .collect();
    assert!(names.iter().any(|name| name == "feedline_cache_bust_ms"));
}
