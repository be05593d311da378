use std::env;

/// Server configuration, read from the environment with workable defaults for
/// local development. Secrets stay out of `Debug` output by convention: this
/// struct carries none of the per-user wallet credentials.
#[derive(Clone, Debug)]
pub struct Config {
    /// The hostname or IP address the API server binds to.
    pub server_host: String,
    /// The port the API server listens on.
    pub server_port: u16,
    /// Consecutive failed attempts before a subscription is deactivated.
    pub max_retries: u32,
    /// Base URL of the NWC payment bridge.
    pub nwc_bridge_url: String,
    /// Deadline for a single payment attempt, in seconds.
    pub payment_timeout_secs: u64,
    /// Base URL of the transactional mail API.
    pub mailer_url: String,
    /// Server token for the mail API.
    pub mailer_token: String,
    /// Sender address for notification mails.
    pub mailer_sender: String,
    /// Whether to initialize console/file logging.
    pub console_logging_enabled: bool,
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            server_host: env_or("HOST", "127.0.0.1"),
            server_port: parse_or("PORT", 8080),
            max_retries: parse_or("MAX_RETRIES", 3),
            nwc_bridge_url: env_or("NWC_BRIDGE_URL", "http://localhost:4080/"),
            payment_timeout_secs: parse_or("PAYMENT_TIMEOUT_SECS", 60),
            mailer_url: env_or("MAILER_URL", "https://api.postmarkapp.com/"),
            mailer_token: env_or("MAILER_TOKEN", ""),
            mailer_sender: env_or("MAILER_SENDER", "zaps@localhost"),
            console_logging_enabled: parse_or("CONSOLE_LOGGING", true),
        }
    }
}
