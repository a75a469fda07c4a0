//! Writeup notifier binary entrypoint.
//! Loads configuration, runs every feed once and exits.
//!
//! Only configuration problems end the process with a non-zero status;
//! feed, delivery and store failures are logged and the run goes on.

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use writeup_notifier::feed::{http::HttpFeedReader, load_feed_list};
use writeup_notifier::notify::{DryRunTransport, MessageTransport, TelegramTransport};
use writeup_notifier::routing::{compile_rules, load_rule_spec};
use writeup_notifier::store::write_last_check;
use writeup_notifier::{AppConfig, Cli, JsonFileStore, Pipeline, Router};

/// Compact text logs by default, JSON lines with LOG_FORMAT=json.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("writeup_notifier=info,warn"));

    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env when present; real env vars win.
    let dotenv = dotenvy::dotenv();
    init_tracing();
    if let Err(e) = dotenv {
        tracing::debug!("no .env loaded: {e}");
    }

    let cli = Cli::parse();
    let cfg = AppConfig::from_env(&cli).context("invalid configuration")?;
    tracing::info!(
        telegram = cfg.telegram.is_some(),
        proxy = cfg.proxy.as_ref().map(|p| p.as_str()).unwrap_or("-"),
        "starting writeup notifier"
    );

    let spec = load_rule_spec(&cfg.keywords_path).context("loading keyword rules")?;
    let rules = compile_rules(&spec, &cfg.rule_destinations(&spec))
        .with_context(|| format!("compiling keyword rules {}", cfg.keywords_path.display()))?;
    let router = Router::new(rules, cfg.main_thread_id.clone());
    if router.is_empty() {
        tracing::warn!(
            path = %cfg.keywords_path.display(),
            "no keyword rules, every item goes to the main thread"
        );
    } else {
        tracing::info!(
            path = %cfg.keywords_path.display(),
            groups = spec.groups.len(),
            rules = router.len(),
            "keyword rules loaded"
        );
    }

    let feeds = load_feed_list(&cfg.feeds_path).context("loading feed list")?;
    let store = JsonFileStore::open(&cfg.store_path)
        .await
        .with_context(|| format!("opening seen store {}", cfg.store_path.display()))?;
    let reader = HttpFeedReader::new().context("building feed client")?;
    tracing::info!(
        feeds = feeds.len(),
        store = %store.path().display(),
        "ready to scan"
    );

    let transport: Box<dyn MessageTransport> = match &cfg.telegram {
        Some(tg) => Box::new(
            TelegramTransport::new(
                &tg.api_base,
                &tg.bot_token,
                tg.chat_id.clone(),
                cfg.proxy.as_ref(),
            )
            .context("building Telegram client")?,
        ),
        None => Box::new(DryRunTransport),
    };

    let now = chrono::Local::now();
    let pipeline = Pipeline::new(
        cfg.pipeline_settings(),
        &router,
        &reader,
        &store,
        transport.as_ref(),
    );
    let summary = pipeline.run(&feeds, &now).await;

    if let Err(e) = write_last_check(&cfg.last_check_path(), &now).await {
        tracing::warn!("writing last-check: {e}");
    }

    tracing::info!(
        total_new = summary.delivered,
        dropped = summary.exhausted,
        "writeup notifier completed"
    );
    Ok(())
}
