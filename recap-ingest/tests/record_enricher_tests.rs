//! Record enrichment integration tests
//!
//! Run under paused time so pacing and cooldown assertions are exact.

mod helpers;

use helpers::*;
use recap_common::events::{EventBus, RecapEvent, SnapshotCollection};
use recap_ingest::config::RecordEnrichmentSettings;
use recap_ingest::models::{CsvRow, FilteredExport, Record, RecordKind};
use recap_ingest::services::{FetchError, RecordEnricher, SourceUrls};
use recap_ingest::store::RecordStore;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

fn post_record(id: &str, community: &str) -> Record {
    Record::from_row(
        RecordKind::Post,
        &CsvRow::from_pairs([
            ("id", id.to_string()),
            ("permalink", post_permalink(community, id)),
            ("date", "2025-06-01 10:00:00 UTC".to_string()),
            ("subreddit", community.to_string()),
        ]),
    )
}

fn comment_record(id: &str, community: &str) -> Record {
    Record::from_row(
        RecordKind::Comment,
        &CsvRow::from_pairs([
            ("id", id.to_string()),
            ("permalink", comment_permalink(community, id)),
            ("date", "2025-06-02 10:00:00 UTC".to_string()),
            ("subreddit", community.to_string()),
        ]),
    )
}

fn posts(count: usize) -> Vec<Record> {
    (0..count)
        .map(|i| post_record(&format!("p{}", i), "rust"))
        .collect()
}

fn comments(count: usize) -> Vec<Record> {
    (0..count)
        .map(|i| comment_record(&format!("c{}", i), "rust"))
        .collect()
}

fn enricher_with(
    fetcher: Arc<ScriptedFetcher>,
    store: &RecordStore,
    settings: RecordEnrichmentSettings,
) -> RecordEnricher {
    RecordEnricher::new(fetcher, store.clone(), SourceUrls::new(SOURCE_BASE), settings)
}

#[tokio::test(start_paused = true)]
async fn throttled_twice_then_success_enriches_record() {
    let permalink = post_permalink("rust", "p1");
    let url = record_url(&permalink);
    let fetcher = Arc::new(ScriptedFetcher::new(Err(FetchError::Transport(
        "unscripted".to_string(),
    ))));
    fetcher.script(
        &url,
        [
            Err(FetchError::Throttled { status: 429 }),
            Err(FetchError::Throttled { status: 429 }),
            Ok(post_body(42, 7)),
        ],
    );

    let store = RecordStore::new();
    let enricher = enricher_with(fetcher.clone(), &store, default_record_settings());
    let data = FilteredExport {
        posts: vec![post_record("p1", "rust")],
        ..Default::default()
    };

    let start = Instant::now();
    let summary = enricher
        .enrich(Uuid::new_v4(), data, &CancellationToken::new())
        .await;
    let elapsed = start.elapsed();

    assert_eq!(fetcher.calls_for(&url), 3);
    assert_eq!(summary.throttled_attempts, 2);
    assert_eq!(summary.fetched, 1);
    assert_eq!(summary.defaulted, 0);

    // Two 10 s throttle cooldowns plus three pacing intervals of 500..=1000 ms
    assert!(elapsed >= Duration::from_millis(2 * 10_000 + 3 * 500));
    assert!(elapsed <= Duration::from_millis(2 * 10_000 + 3 * 1_000));

    let posts = store.snapshot().unwrap().posts;
    assert_eq!(posts.len(), 1);
    assert!(posts[0].enriched);
    assert_eq!(posts[0].upvotes, 42);
    assert_eq!(posts[0].comment_count, Some(7));
}

#[tokio::test(start_paused = true)]
async fn exhausted_attempts_default_and_processing_continues() {
    let failing_url = record_url(&post_permalink("rust", "p0"));
    let fetcher = Arc::new(ScriptedFetcher::new(Ok(post_body(5, 1))));
    fetcher.script(
        &failing_url,
        [
            Err(FetchError::Transport("connection reset".to_string())),
            Err(FetchError::Status { status: 500 }),
            Err(FetchError::Transport("timed out".to_string())),
        ],
    );

    let store = RecordStore::new();
    let enricher = enricher_with(fetcher.clone(), &store, default_record_settings());
    let data = FilteredExport {
        posts: posts(2),
        ..Default::default()
    };

    let start = Instant::now();
    let summary = enricher
        .enrich(Uuid::new_v4(), data, &CancellationToken::new())
        .await;

    assert_eq!(fetcher.calls_for(&failing_url), 3);
    assert_eq!(fetcher.call_count(), 4);
    assert_eq!(summary.failed_attempts, 3);
    assert_eq!(summary.defaulted, 1);
    assert_eq!(summary.fetched, 1);
    assert_eq!(summary.posts_processed, 2);
    assert!(!summary.cancelled);

    // Three 2 s failure cooldowns on the first record
    assert!(start.elapsed() >= Duration::from_millis(3 * 2_000));

    let posts = store.snapshot().unwrap().posts;
    assert!(posts[0].enriched);
    assert_eq!(posts[0].upvotes, 0);
    assert_eq!(posts[0].comment_count, Some(0));
    assert!(posts[1].enriched);
    assert_eq!(posts[1].upvotes, 5);
}

#[tokio::test(start_paused = true)]
async fn comment_metrics_come_from_second_listing() {
    let fetcher = Arc::new(ScriptedFetcher::new(Ok(comment_body(9))));
    let store = RecordStore::new();
    let enricher = enricher_with(fetcher, &store, fast_record_settings());
    let data = FilteredExport {
        comments: comments(1),
        ..Default::default()
    };

    let summary = enricher
        .enrich(Uuid::new_v4(), data, &CancellationToken::new())
        .await;

    assert_eq!(summary.comments_processed, 1);
    let comments = store.snapshot().unwrap().comments;
    assert!(comments[0].enriched);
    assert_eq!(comments[0].upvotes, 9);
    assert_eq!(comments[0].comment_count, None);
}

#[tokio::test(start_paused = true)]
async fn unexpected_body_shape_falls_back_to_defaults() {
    let fetcher = Arc::new(ScriptedFetcher::new(Ok(serde_json::json!({"error": 404}))));
    let store = RecordStore::new();
    let enricher = enricher_with(fetcher.clone(), &store, fast_record_settings());
    let data = FilteredExport {
        posts: posts(1),
        ..Default::default()
    };

    let summary = enricher
        .enrich(Uuid::new_v4(), data, &CancellationToken::new())
        .await;

    // A decodable success is not retried
    assert_eq!(fetcher.call_count(), 1);
    assert_eq!(summary.decode_fallbacks, 1);
    let posts = store.snapshot().unwrap().posts;
    assert!(posts[0].enriched);
    assert_eq!(posts[0].upvotes, 0);
}

#[tokio::test(start_paused = true)]
async fn publications_follow_stride_and_final_record() {
    let fetcher = Arc::new(ScriptedFetcher::new(Ok(post_body(1, 1))));
    let store = RecordStore::new();
    let event_bus = EventBus::new(100);
    let mut rx = event_bus.subscribe();
    let enricher =
        enricher_with(fetcher, &store, fast_record_settings()).with_event_bus(event_bus.clone());

    let data = FilteredExport {
        posts: posts(7),
        comments: comments(5),
        ..Default::default()
    };
    enricher
        .enrich(Uuid::new_v4(), data, &CancellationToken::new())
        .await;

    let mut published = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let RecapEvent::SnapshotPublished {
            collection,
            processed,
            total,
            ..
        } = event
        {
            published.push((collection, processed, total));
        }
    }

    assert_eq!(
        published,
        vec![
            (SnapshotCollection::Posts, 1, 7),
            (SnapshotCollection::Posts, 4, 7),
            (SnapshotCollection::Posts, 7, 7),
            (SnapshotCollection::Comments, 1, 5),
            (SnapshotCollection::Comments, 5, 5),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn records_are_fetched_strictly_in_sequence() {
    let fetcher = Arc::new(
        ScriptedFetcher::new(Ok(post_body(3, 0))).with_latency(Duration::from_millis(300)),
    );
    let store = RecordStore::new();
    let enricher = enricher_with(fetcher.clone(), &store, default_record_settings());
    let data = FilteredExport {
        posts: posts(3),
        comments: comments(2),
        ..Default::default()
    };

    enricher
        .enrich(Uuid::new_v4(), data, &CancellationToken::new())
        .await;

    let calls = fetcher.calls();
    assert_eq!(calls.len(), 5);

    let expected: Vec<String> = posts(3)
        .iter()
        .chain(comments(2).iter())
        .map(|record| record_url(&record.permalink))
        .collect();
    assert_eq!(fetcher.urls(), expected);

    for pair in calls.windows(2) {
        // Never overlapping, and at least one pacing interval apart
        assert!(pair[1].started >= pair[0].finished + Duration::from_millis(500));
    }
}

#[tokio::test(start_paused = true)]
async fn published_progress_never_regresses() {
    let fetcher = Arc::new(
        ScriptedFetcher::new(Ok(post_body(2, 2))).with_latency(Duration::from_millis(50)),
    );
    let store = RecordStore::new();
    let data = FilteredExport {
        posts: posts(10),
        ..Default::default()
    };
    store.set(data.to_snapshot(None));

    let observed = Arc::new(Mutex::new(Vec::new()));
    let mut rx = store.subscribe();
    let sink = Arc::clone(&observed);
    let watcher = tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let snapshot = rx.borrow_and_update().clone();
            if let Some(snapshot) = snapshot {
                let enriched = snapshot.posts.iter().filter(|r| r.enriched).count();
                sink.lock().unwrap().push((enriched, snapshot.posts.len()));
            }
        }
    });

    let enricher = enricher_with(fetcher, &store, fast_record_settings());
    enricher
        .enrich(Uuid::new_v4(), data, &CancellationToken::new())
        .await;
    tokio::task::yield_now().await;
    watcher.abort();

    let observed = observed.lock().unwrap().clone();
    assert!(!observed.is_empty());
    for (_, len) in &observed {
        assert_eq!(*len, 10);
    }
    for pair in observed.windows(2) {
        assert!(pair[1].0 >= pair[0].0);
    }

    let final_posts = store.snapshot().unwrap().posts;
    assert!(final_posts.iter().all(|r| r.enriched));
}

#[tokio::test(start_paused = true)]
async fn cancellation_publishes_working_sequence_and_stops() {
    let fetcher = Arc::new(
        ScriptedFetcher::new(Ok(post_body(8, 0))).with_latency(Duration::from_secs(1)),
    );
    let store = RecordStore::new();
    let data = FilteredExport {
        posts: posts(6),
        comments: comments(2),
        ..Default::default()
    };
    store.set(data.to_snapshot(None));

    let enricher = Arc::new(enricher_with(fetcher.clone(), &store, fast_record_settings()));
    let cancel = CancellationToken::new();

    let task = {
        let enricher = Arc::clone(&enricher);
        let cancel = cancel.clone();
        tokio::spawn(async move { enricher.enrich(Uuid::new_v4(), data, &cancel).await })
    };

    // Two records finish at 1 s and 2 s; the third is in flight
    tokio::time::sleep(Duration::from_millis(2_500)).await;
    cancel.cancel();
    let summary = task.await.unwrap();

    assert!(summary.cancelled);
    assert_eq!(summary.posts_processed, 2);
    assert_eq!(summary.comments_processed, 0);
    assert_eq!(fetcher.call_count(), 2);

    let snapshot = store.snapshot().unwrap();
    assert_eq!(snapshot.posts.len(), 6);
    let enriched: Vec<bool> = snapshot.posts.iter().map(|r| r.enriched).collect();
    assert_eq!(enriched, vec![true, true, false, false, false, false]);
    assert!(snapshot.comments.iter().all(|r| !r.enriched));
}
