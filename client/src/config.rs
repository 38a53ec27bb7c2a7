use std::time::Duration;

use clap::Args;

pub const DEFAULT_BASE_URL: &str = "http://trinity-developments.co.uk";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

// 🎮 Client-side connection configuration
#[derive(Clone, Debug, PartialEq)]
pub struct ClientConfig {
    pub base_url: String,                   // "http://trinity-developments.co.uk"
    pub poll_interval: Duration,            // lobby and game polling period
    pub request_timeout: Option<Duration>,  // none: wait as long as the OS allows
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            request_timeout: None,
        }
    }
}

/// Connection flags shared by every `fugitive` subcommand.
#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// Game server origin (e.g. http://trinity-developments.co.uk)
    #[arg(long, env = "FUGITIVE_BASE_URL", default_value = DEFAULT_BASE_URL, global = true)]
    pub base_url: String,

    /// Milliseconds between lobby/game polls
    #[arg(long, env = "FUGITIVE_POLL_INTERVAL_MS", default_value_t = 3000, global = true)]
    pub poll_interval_ms: u64,

    /// Per-request timeout in milliseconds
    #[arg(long, env = "FUGITIVE_TIMEOUT_MS", global = true)]
    pub timeout_ms: Option<u64>,
}

impl From<ConnectionArgs> for ClientConfig {
    fn from(args: ConnectionArgs) -> Self {
        Self {
            base_url: args.base_url.trim_end_matches('/').to_string(),
            // zero would spin the poll loop
            poll_interval: Duration::from_millis(args.poll_interval_ms.max(1)),
            request_timeout: args.timeout_ms.map(Duration::from_millis),
        }
    }
}
