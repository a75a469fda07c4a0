// tests/feed_parse.rs
//
// Real-shaped Medium RSS and YouTube Atom documents, HTML entities leaking
// into feed XML, plus the HTTP reader against a local server.

use axum::{http::StatusCode, routing::get, Router};
use chrono::{TimeZone, Utc};

use writeup_notifier::dedup::{parse_published, within_window};
use writeup_notifier::error::FeedError;
use writeup_notifier::feed::http::HttpFeedReader;
use writeup_notifier::feed::parse::parse_feed;
use writeup_notifier::{FeedReader, FeedSource, SourceKind};

const MEDIUM_RSS: &str = include_str!("fixtures/medium_rss.xml");
const YOUTUBE_ATOM: &str = include_str!("fixtures/youtube_atom.xml");

#[test]
fn medium_rss_items() {
    let items = parse_feed(MEDIUM_RSS, SourceKind::Article).unwrap();
    assert_eq!(items.len(), 2);

    let first = &items[0];
    assert_eq!(first.identifier, "https://medium.com/p/3f1c2a9b7d10");
    assert_eq!(
        first.title,
        "How I earned $1,000 from a forgotten staging subdomain"
    );
    assert_eq!(first.published, "Mon, 19 Oct 2026 08:15:42 GMT");
    assert_eq!(first.kind, SourceKind::Article);

    // Numeric HTML entity inside CDATA is decoded in the title.
    assert_eq!(items[1].title, "TryHackMe \u{2013} Pickle Rick walkthrough");
}

#[test]
fn youtube_atom_entries() {
    let items = parse_feed(YOUTUBE_ATOM, SourceKind::Video).unwrap();
    assert_eq!(items.len(), 2);

    assert_eq!(items[0].identifier, "https://www.youtube.com/watch?v=dQ8xH2kP0aA");
    assert_eq!(items[0].title, "Hacking a smart lock & what the vendor said");
    assert_eq!(items[0].published, "2026-10-18T16:00:06+00:00");
    assert!(items.iter().all(|i| i.kind == SourceKind::Video));
}

#[test]
fn fixture_dates_fall_where_expected() {
    let reference = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();

    let articles = parse_feed(MEDIUM_RSS, SourceKind::Article).unwrap();
    let in_window: Vec<_> = articles
        .iter()
        .filter(|i| {
            let published = parse_published(&i.published).unwrap();
            within_window(&published, i.kind, &reference)
        })
        .map(|i| i.identifier.as_str())
        .collect();
    assert_eq!(in_window, vec!["https://medium.com/p/3f1c2a9b7d10"]);

    let videos = parse_feed(YOUTUBE_ATOM, SourceKind::Video).unwrap();
    let fresh: Vec<_> = videos
        .iter()
        .filter(|i| {
            let published = parse_published(&i.published).unwrap();
            within_window(&published, i.kind, &reference)
        })
        .collect();
    assert_eq!(fresh.len(), 1);
    assert!(fresh[0].identifier.ends_with("dQ8xH2kP0aA"));
}

#[test]
fn html_named_entities_in_titles() {
    let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Writeups</title>
    <item>
      <title>Caf&eacute; XSS &ndash; stored via &laquo;name&raquo;</title>
      <link>https://blog.test/cafe-xss</link>
      <pubDate>Mon, 19 Oct 2026 08:00:00 GMT</pubDate>
    </item>
    <item>
      <title>Pwning a printer &copy; 2026</title>
      <link>https://blog.test/printer</link>
      <pubDate>Mon, 19 Oct 2026 09:00:00 GMT</pubDate>
    </item>
  </channel>
</rss>"#;
    let items = parse_feed(xml, SourceKind::Article).unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(
        items[0].title,
        "Caf\u{e9} XSS \u{2013} stored via \u{ab}name\u{bb}"
    );
    assert_eq!(items[1].title, "Pwning a printer \u{a9} 2026");
}

#[test]
fn garbage_is_a_parse_error() {
    for doc in ["", "not xml at all", "<rss><channel><item>"] {
        let err = parse_feed(doc, SourceKind::Article).unwrap_err();
        assert!(matches!(err, FeedError::Parse(_)), "{doc:?} should not parse");
    }
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn http_reader_fetches_and_parses() {
    let app = Router::new()
        .route("/feed", get(|| async { MEDIUM_RSS }))
        .route(
            "/gone",
            get(|| async { (StatusCode::NOT_FOUND, "no such feed") }),
        );
    let base = serve(app).await;
    let reader = HttpFeedReader::new().unwrap();

    let items = reader
        .fetch(&FeedSource::new(format!("{base}/feed")))
        .await
        .unwrap();
    assert_eq!(items.len(), 2);

    let err = reader
        .fetch(&FeedSource::new(format!("{base}/gone")))
        .await
        .unwrap_err();
    assert!(matches!(err, FeedError::Status(404)));
}
