//! New-item decision: recency window + seen-store lookup.
//!
//! Windows are calendar days in the reference time's offset, not rolling
//! 24h spans. An article published at 00:00:01 today is in; one from 23:59
//! yesterday is out.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone};
use metrics::counter;
use serde::{Deserialize, Serialize};

use crate::feed::{Item, SourceKind};
use crate::store::SeenStore;
use crate::telemetry::STORE_ERRORS;

/// Timezone-less fallback, e.g. `Mon, 19 Oct 2026 08:15:00` (read as UTC).
const NAIVE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S";

/// Which item field is looked up in the seen store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DedupKey {
    Identifier,
    Title,
}

impl DedupKey {
    pub fn of<'a>(&self, item: &'a Item) -> &'a str {
        match self {
            DedupKey::Identifier => &item.identifier,
            DedupKey::Title => &item.title,
        }
    }
}

/// What a failed store lookup means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OnLookupError {
    /// Treat as not seen: a possible duplicate beats a silently lost item.
    #[default]
    AssumeNotSeen,
    AssumeSeen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupConfig {
    pub article_key: DedupKey,
    pub video_key: DedupKey,
    pub on_lookup_error: OnLookupError,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            article_key: DedupKey::Title,
            video_key: DedupKey::Identifier,
            on_lookup_error: OnLookupError::AssumeNotSeen,
        }
    }
}

impl DedupConfig {
    pub fn key_for(&self, kind: SourceKind) -> DedupKey {
        match kind {
            SourceKind::Article => self.article_key,
            SourceKind::Video => self.video_key,
        }
    }
}

/// RFC 2822 (numeric offset or named zone), then RFC 3339, then the
/// zone-less fallback in UTC.
pub fn parse_published(s: &str) -> Option<DateTime<FixedOffset>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }
    NaiveDateTime::parse_from_str(s, NAIVE_FORMAT)
        .ok()
        .map(|naive| naive.and_utc().fixed_offset())
}

/// Articles: same calendar day as `reference`. Videos: that day or the one before.
pub fn within_window<Tz: TimeZone>(
    published: &DateTime<FixedOffset>,
    kind: SourceKind,
    reference: &DateTime<Tz>,
) -> bool {
    let published_day = published.with_timezone(&reference.timezone()).date_naive();
    let today = reference.date_naive();
    match kind {
        SourceKind::Article => published_day == today,
        SourceKind::Video => published_day == today || today.pred_opt() == Some(published_day),
    }
}

#[derive(Debug, Clone, Default)]
pub struct DedupEngine {
    cfg: DedupConfig,
}

impl DedupEngine {
    pub fn new(cfg: DedupConfig) -> Self {
        Self { cfg }
    }

    /// True iff the item is inside its recency window and its dedup key is
    /// not in the store. Unparseable dates are never new.
    pub async fn is_new<Tz: TimeZone>(
        &self,
        item: &Item,
        reference: &DateTime<Tz>,
        store: &dyn SeenStore,
    ) -> bool {
        let Some(published) = parse_published(&item.published) else {
            tracing::debug!(
                title = %item.title,
                published = %item.published,
                "unparseable publication date, skipping"
            );
            return false;
        };
        if !within_window(&published, item.kind, reference) {
            return false;
        }

        let key = self.cfg.key_for(item.kind).of(item);
        match store.exists(key).await {
            Ok(seen) => !seen,
            Err(e) => {
                counter!(STORE_ERRORS).increment(1);
                let assume_new = self.cfg.on_lookup_error == OnLookupError::AssumeNotSeen;
                tracing::warn!(
                    error = %e,
                    key = %key,
                    assume_new,
                    "seen-store lookup failed"
                );
                assume_new
            }
        }
    }
}
