use std::env;

use log::*;
use stripe_tools::StripeConfig;

const DEFAULT_BO_HOST: &str = "127.0.0.1";
const DEFAULT_BO_PORT: u16 = 8370;
const DEFAULT_EVENT_BUFFER: usize = 25;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// Queue length of each event handler. Publishers wait when a queue is full.
    pub event_buffer: usize,
    pub notifications: NotificationConfig,
    pub stripe: StripeConfig,
}

/// Where order notifications go once an order becomes valid.
#[derive(Clone, Debug, Default)]
pub struct NotificationConfig {
    /// Valid orders are posted here as JSON for the sales spreadsheet. Sheet syncing is off when unset.
    pub sheet_sync_url: Option<String>,
    /// Sender address on receipts.
    pub receipt_from: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_BO_HOST.to_string(),
            port: DEFAULT_BO_PORT,
            database_url: String::default(),
            event_buffer: DEFAULT_EVENT_BUFFER,
            notifications: NotificationConfig::default(),
            stripe: StripeConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("BO_HOST").ok().unwrap_or_else(|| DEFAULT_BO_HOST.into());
        let port = env::var("BO_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for BO_PORT. {e} Using the default, {DEFAULT_BO_PORT}, instead."
                    );
                    DEFAULT_BO_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_BO_PORT);
        let database_url = env::var("BO_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ BO_DATABASE_URL is not set. Please set it to the URL for the box office database.");
            String::default()
        });
        let event_buffer = env::var("BO_EVENT_BUFFER")
            .map(|s| match s.parse::<usize>() {
                Ok(0) | Err(_) => {
                    warn!("🪛️ {s} is not a valid event buffer size. Using the default, {DEFAULT_EVENT_BUFFER}.");
                    DEFAULT_EVENT_BUFFER
                },
                Ok(n) => n,
            })
            .unwrap_or(DEFAULT_EVENT_BUFFER);
        let notifications = NotificationConfig::from_env_or_default();
        let stripe = StripeConfig::new_from_env_or_default();
        Self { host, port, database_url, event_buffer, notifications, stripe }
    }
}

impl NotificationConfig {
    pub fn from_env_or_default() -> Self {
        let sheet_sync_url = env::var("BO_SHEET_SYNC_URL").ok().filter(|s| !s.trim().is_empty());
        if sheet_sync_url.is_none() {
            info!("🪛️ BO_SHEET_SYNC_URL is not set. Valid orders will not be synced to the sales sheet.");
        }
        let receipt_from = env::var("BO_RECEIPT_FROM").ok().unwrap_or_else(|| {
            warn!("🪛️ BO_RECEIPT_FROM is not set. Receipts will be sent from an empty address.");
            String::default()
        });
        Self { sheet_sync_url, receipt_from }
    }
}
