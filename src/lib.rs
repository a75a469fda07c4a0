// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod config;
pub mod dedup;
pub mod error;
pub mod feed;
pub mod notify;
pub mod pipeline;
pub mod routing;
pub mod store;
pub mod telemetry;

// Flat re-exports for the binary and tests.
pub use crate::config::{AppConfig, Cli};
pub use crate::dedup::{DedupConfig, DedupEngine, DedupKey, OnLookupError};
pub use crate::feed::{FeedReader, FeedSource, Item, SourceKind};
pub use crate::notify::{
    DeliveryConfig, DeliveryEngine, DeliveryOutcome, MessageTransport, Notification,
};
pub use crate::pipeline::{Pipeline, PipelineSettings, RunSummary};
pub use crate::routing::{route, Router, RoutingRule};
pub use crate::store::{JsonFileStore, MemoryStore, SeenStore};
