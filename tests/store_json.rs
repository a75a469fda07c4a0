// tests/store_json.rs
//
// The file-backed seen store across process restarts, driven through the
// pipeline with the dry-run transport.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{FixedOffset, TimeZone};
use serde_json::Value;

use writeup_notifier::error::FeedError;
use writeup_notifier::notify::DryRunTransport;
use writeup_notifier::store::write_last_check;
use writeup_notifier::{
    FeedReader, FeedSource, Item, JsonFileStore, Pipeline, PipelineSettings, Router, SeenStore,
    SourceKind,
};

const FEED: &str = "https://medium.com/feed/tag/bug-bounty";

struct OneFeed(Vec<Item>);

#[async_trait]
impl FeedReader for OneFeed {
    async fn fetch(&self, _source: &FeedSource) -> Result<Vec<Item>, FeedError> {
        Ok(self.0.clone())
    }
}

fn items() -> Vec<Item> {
    vec![
        Item {
            identifier: "https://medium.com/p/aa".into(),
            title: "Open redirect to ATO".into(),
            published: "Mon, 19 Oct 2026 06:00:00 +0200".into(),
            kind: SourceKind::Article,
        },
        Item {
            identifier: "https://medium.com/p/bb".into(),
            title: "GraphQL introspection leaks".into(),
            published: "2026-10-19T09:30:00+02:00".into(),
            kind: SourceKind::Article,
        },
    ]
}

#[tokio::test]
async fn seen_items_survive_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data").join("found-url.json");
    let reader = OneFeed(items());
    let router = Router::new(Vec::new(), Some("1".into()));
    let settings = PipelineSettings {
        inter_feed_delay: Duration::ZERO,
        ..Default::default()
    };
    let cest = FixedOffset::east_opt(2 * 3600).unwrap();
    let now = cest.with_ymd_and_hms(2026, 10, 19, 18, 0, 0).unwrap();
    let feeds = vec![FeedSource::new(FEED)];

    {
        let store = JsonFileStore::open(&path).await.unwrap();
        let summary = Pipeline::new(settings.clone(), &router, &reader, &store, &DryRunTransport)
            .run(&feeds, &now)
            .await;
        assert_eq!(summary.delivered, 2);
        assert_eq!(store.len().await, 2);
    }

    let doc: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let urls = doc["urls"].as_array().unwrap();
    assert_eq!(urls.len(), 2);
    assert_eq!(urls[0]["url"], "https://medium.com/p/aa");
    assert_eq!(urls[0]["title"], "Open redirect to ATO");

    let reopened = JsonFileStore::open(&path).await.unwrap();
    let summary = Pipeline::new(settings, &router, &reader, &reopened, &DryRunTransport)
        .run(&feeds, &now)
        .await;
    assert_eq!(summary.delivered, 0);
    assert!(reopened.exists("GraphQL introspection leaks").await.unwrap());
    assert_eq!(reopened.len().await, 2);
}

#[tokio::test]
async fn empty_file_is_an_empty_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("found-url.json");
    std::fs::write(&path, "\n").unwrap();

    let store = JsonFileStore::open(&path).await.unwrap();
    assert_eq!(store.len().await, 0);
    assert_eq!(store.path(), path.as_path());
}

#[tokio::test]
async fn concurrent_inserts_are_all_kept() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("found-url.json");
    let store = std::sync::Arc::new(JsonFileStore::open(&path).await.unwrap());

    let mut handles = Vec::new();
    for i in 0..8 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store
                .insert(&format!("https://a.test/{i}"), &format!("Post {i}"))
                .await
                .unwrap();
        }));
    }
    for h in handles {
        h.await.unwrap();
    }

    let reopened = JsonFileStore::open(&path).await.unwrap();
    assert_eq!(reopened.len().await, 8);
    for i in 0..8 {
        assert!(reopened.exists(&format!("Post {i}")).await.unwrap());
    }
}

#[tokio::test]
async fn last_check_uses_local_wall_clock() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("last-check.txt");
    let cest = FixedOffset::east_opt(2 * 3600).unwrap();
    let at = cest.with_ymd_and_hms(2026, 10, 19, 18, 5, 9).unwrap();

    write_last_check(&path, &at).await.unwrap();
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "2026-10-19 18:05:09"
    );
}
