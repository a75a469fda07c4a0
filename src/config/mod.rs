// src/config/mod.rs
//! Run configuration, built once at startup from CLI flags and environment
//! (`.env` included) and then only passed around by reference.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use url::Url;

use crate::dedup::DedupConfig;
use crate::error::ConfigError;
use crate::notify::proxy::validate_proxy_url;
use crate::notify::telegram::DEFAULT_API_BASE;
use crate::notify::DeliveryConfig;
use crate::pipeline::PipelineSettings;
use crate::routing::rules::{destinations_from_vars, RuleSpec};

pub const ENV_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
pub const ENV_CHAT_ID: &str = "CHAT_ID";
pub const ENV_MAIN_THREAD_ID: &str = "MAIN_THREAD_ID";
pub const ENV_YOUTUBE_THREAD_ID: &str = "YOUTUBE_THREAD_ID";
pub const ENV_API_BASE: &str = "TELEGRAM_API_BASE";
pub const ENV_FEEDS_PATH: &str = "NOTIFIER_FEEDS_PATH";
pub const ENV_KEYWORDS_PATH: &str = "NOTIFIER_KEYWORDS_PATH";
pub const ENV_STORE_PATH: &str = "NOTIFIER_STORE_PATH";

const DEFAULT_FEEDS_PATH: &str = "data/url.txt";
const DEFAULT_KEYWORDS_PATH: &str = "data/keywords.json";
const DEFAULT_STORE_PATH: &str = "data/found-url.json";
const LAST_CHECK_FILE: &str = "last-check.txt";

/// Command-line flags.
#[derive(Debug, Clone, Default, Parser)]
#[command(
    name = "writeup-notifier",
    version,
    about = "Find new writeups and videos in RSS/Atom feeds and post them to Telegram"
)]
pub struct Cli {
    /// Actually send to Telegram (otherwise messages are only logged)
    #[arg(short = 't', long = "telegram")]
    pub telegram: bool,

    /// Proxy for Telegram requests (http, https or socks5); needs --telegram
    #[arg(long)]
    pub proxy: Option<String>,

    /// Feed list, one URL per line [env: NOTIFIER_FEEDS_PATH]
    #[arg(long)]
    pub feeds: Option<PathBuf>,

    /// Keyword routing rules (JSON or TOML) [env: NOTIFIER_KEYWORDS_PATH]
    #[arg(long)]
    pub keywords: Option<PathBuf>,

    /// Seen-item store [env: NOTIFIER_STORE_PATH]
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// Pause between feeds, in seconds
    #[arg(long, default_value_t = 3)]
    pub inter_feed_delay_secs: u64,
}

#[derive(Clone)]
pub struct TelegramSettings {
    pub api_base: String,
    pub bot_token: String,
    pub chat_id: String,
}

// Keep the bot token out of logs.
impl fmt::Debug for TelegramSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramSettings")
            .field("api_base", &self.api_base)
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub feeds_path: PathBuf,
    pub keywords_path: PathBuf,
    pub store_path: PathBuf,
    /// `None` means dry run.
    pub telegram: Option<TelegramSettings>,
    pub proxy: Option<Url>,
    pub main_thread_id: Option<String>,
    pub video_thread_id: Option<String>,
    /// Every non-empty `*_THREAD_ID` variable, keyed by name.
    pub thread_destinations: HashMap<String, String>,
    pub inter_feed_delay: Duration,
    pub delivery: DeliveryConfig,
    pub dedup: DedupConfig,
}

impl AppConfig {
    pub fn from_env(cli: &Cli) -> Result<Self, ConfigError> {
        Self::from_vars(cli, std::env::vars())
    }

    /// `vars` stands in for the process environment.
    pub fn from_vars<I>(cli: &Cli, vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: HashMap<String, String> = vars.into_iter().collect();
        let get = |k: &str| {
            vars.get(k)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if cli.proxy.is_some() && !cli.telegram {
            return Err(ConfigError::ProxyWithoutTelegram);
        }
        let proxy = cli.proxy.as_deref().map(validate_proxy_url).transpose()?;

        let telegram = if cli.telegram {
            Some(TelegramSettings {
                api_base: get(ENV_API_BASE).unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
                bot_token: get(ENV_BOT_TOKEN).ok_or(ConfigError::MissingEnv(ENV_BOT_TOKEN))?,
                chat_id: get(ENV_CHAT_ID).ok_or(ConfigError::MissingEnv(ENV_CHAT_ID))?,
            })
        } else {
            None
        };

        let path = |flag: &Option<PathBuf>, env: &str, default: &str| {
            flag.clone()
                .or_else(|| get(env).map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from(default))
        };

        Ok(Self {
            feeds_path: path(&cli.feeds, ENV_FEEDS_PATH, DEFAULT_FEEDS_PATH),
            keywords_path: path(&cli.keywords, ENV_KEYWORDS_PATH, DEFAULT_KEYWORDS_PATH),
            store_path: path(&cli.store, ENV_STORE_PATH, DEFAULT_STORE_PATH),
            telegram,
            proxy,
            main_thread_id: get(ENV_MAIN_THREAD_ID),
            video_thread_id: get(ENV_YOUTUBE_THREAD_ID),
            thread_destinations: destinations_from_vars(vars.clone()),
            inter_feed_delay: Duration::from_secs(cli.inter_feed_delay_secs),
            delivery: DeliveryConfig::default(),
            dedup: DedupConfig::default(),
        })
    }

    /// Destination map for compiling `spec`. A dry run fills keys missing
    /// from the environment with the key name itself, so the shipped rule
    /// file works without any thread IDs; real delivery stays strict.
    pub fn rule_destinations(&self, spec: &RuleSpec) -> HashMap<String, String> {
        let mut dest = self.thread_destinations.clone();
        if self.telegram.is_none() {
            for key in spec.destination_keys() {
                if !dest.contains_key(key) {
                    tracing::debug!(key, "thread ID not set, dry run uses the key name");
                    dest.insert(key.to_string(), key.to_string());
                }
            }
        }
        dest
    }

    pub fn last_check_path(&self) -> PathBuf {
        self.store_path
            .parent()
            .map(|d| d.join(LAST_CHECK_FILE))
            .unwrap_or_else(|| PathBuf::from(LAST_CHECK_FILE))
    }

    pub fn pipeline_settings(&self) -> PipelineSettings {
        PipelineSettings {
            dedup: self.dedup,
            delivery: self.delivery,
            video_thread_id: self.video_thread_id.clone(),
            inter_feed_delay: self.inter_feed_delay,
        }
    }
}
