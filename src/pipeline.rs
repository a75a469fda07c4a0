//! One notifier run: feeds in declared order, each item through dedup,
//! routing and delivery, delivered items recorded as seen.
//!
//! Strictly sequential. A slow backoff or a long feed list stretches the run;
//! nothing overlaps.

use std::time::Duration;

use chrono::{DateTime, TimeZone};
use metrics::counter;

use crate::dedup::{DedupConfig, DedupEngine};
use crate::feed::{FeedReader, FeedSource, Item, SourceKind};
use crate::notify::{
    DeliveryConfig, DeliveryEngine, DeliveryOutcome, MessageTransport, Notification,
};
use crate::routing::Router;
use crate::store::SeenStore;
use crate::telemetry::{ensure_described, FEED_ERRORS, ITEMS_NEW, STORE_ERRORS};

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub dedup: DedupConfig,
    pub delivery: DeliveryConfig,
    /// Fixed destination for video items; they skip keyword routing.
    pub video_thread_id: Option<String>,
    pub inter_feed_delay: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            dedup: DedupConfig::default(),
            delivery: DeliveryConfig::default(),
            video_thread_id: None,
            inter_feed_delay: Duration::from_secs(3),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub feeds: usize,
    pub feed_errors: usize,
    pub new_items: usize,
    pub delivered: usize,
    pub exhausted: usize,
}

/// `► title / Published: … / Link: …`
pub fn format_message(item: &Item) -> String {
    format!(
        "\u{25BA} {}\nPublished: {}\nLink: {}",
        item.title, item.published, item.identifier
    )
}

pub struct Pipeline<'a> {
    reader: &'a dyn FeedReader,
    store: &'a dyn SeenStore,
    transport: &'a dyn MessageTransport,
    router: &'a Router,
    dedup: DedupEngine,
    delivery: DeliveryEngine,
    video_thread_id: Option<String>,
    inter_feed_delay: Duration,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        settings: PipelineSettings,
        router: &'a Router,
        reader: &'a dyn FeedReader,
        store: &'a dyn SeenStore,
        transport: &'a dyn MessageTransport,
    ) -> Self {
        Self {
            reader,
            store,
            transport,
            router,
            dedup: DedupEngine::new(settings.dedup),
            delivery: DeliveryEngine::new(settings.delivery),
            video_thread_id: settings.video_thread_id,
            inter_feed_delay: settings.inter_feed_delay,
        }
    }

    /// Where a notification for `item` goes.
    pub fn destination(&self, item: &Item) -> Option<String> {
        match item.kind {
            SourceKind::Video => self.video_thread_id.clone(),
            SourceKind::Article => self.router.route(&item.title).map(str::to_string),
        }
    }

    /// Process every feed once. `summary.delivered` is the run's new-item count.
    pub async fn run<Tz: TimeZone>(
        &self,
        feeds: &[FeedSource],
        reference: &DateTime<Tz>,
    ) -> RunSummary {
        ensure_described();
        let mut summary = RunSummary {
            feeds: feeds.len(),
            ..Default::default()
        };

        for (i, feed) in feeds.iter().enumerate() {
            tracing::info!(feed = %feed.url, kind = ?feed.kind, "processing feed");
            self.process_feed(feed, reference, &mut summary).await;

            // Courtesy pause for the feed hosts.
            if i + 1 < feeds.len() && !self.inter_feed_delay.is_zero() {
                tokio::time::sleep(self.inter_feed_delay).await;
            }
        }

        tracing::info!(
            feeds = summary.feeds,
            feed_errors = summary.feed_errors,
            delivered = summary.delivered,
            exhausted = summary.exhausted,
            "run finished"
        );
        summary
    }

    async fn process_feed<Tz: TimeZone>(
        &self,
        feed: &FeedSource,
        reference: &DateTime<Tz>,
        summary: &mut RunSummary,
    ) {
        let items = match self.reader.fetch(feed).await {
            Ok(items) => items,
            Err(e) => {
                counter!(FEED_ERRORS).increment(1);
                summary.feed_errors += 1;
                tracing::warn!(feed = %feed.url, error = %e, "feed skipped");
                return;
            }
        };

        for item in &items {
            if !self.dedup.is_new(item, reference, self.store).await {
                continue;
            }
            counter!(ITEMS_NEW).increment(1);
            summary.new_items += 1;

            let notification = Notification {
                text: format_message(item),
                thread_id: self.destination(item),
            };

            match self.delivery.deliver(&notification, self.transport).await {
                DeliveryOutcome::Delivered { .. } => {
                    summary.delivered += 1;
                    tracing::info!(
                        title = %item.title,
                        link = %item.identifier,
                        thread = notification.thread_id.as_deref().unwrap_or("-"),
                        "new item delivered"
                    );
                    // Already sent; a failed insert can only cause a repeat next run.
                    if let Err(e) = self.store.insert(&item.identifier, &item.title).await {
                        counter!(STORE_ERRORS).increment(1);
                        tracing::warn!(
                            link = %item.identifier,
                            error = %e,
                            "delivered but not recorded as seen"
                        );
                    }
                }
                DeliveryOutcome::Exhausted { attempts, last_error } => {
                    summary.exhausted += 1;
                    tracing::warn!(
                        title = %item.title,
                        attempts,
                        error = %last_error,
                        "item not delivered; left unrecorded for the next run"
                    );
                }
            }
        }
    }
}
