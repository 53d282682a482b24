//! Process configuration parsed from environment variables.
//!
//! `.env` is loaded by `main` before this runs, so every knob can live in
//! either place. Only `PORT` is validated strictly; tuning values fall back
//! to their defaults when unparseable.

use std::time::Duration;

use crate::backend::supabase::SupabaseConfig;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_HELLO_TOKEN: &str = "my-secret-token";
pub const DEFAULT_SESSION_IDLE_TTL_SECS: u64 = 3600;
pub const DEFAULT_SESSION_SIGNED_IN_TTL_SECS: u64 = 7 * 24 * 3600;
pub const DEFAULT_SESSION_SWEEP_INTERVAL_SECS: u64 = 300;
/// `tokio::time::interval` panics on a zero period.
pub const MIN_SESSION_SWEEP_INTERVAL_SECS: u64 = 1;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    /// Remote backend; `None` runs against the in-memory backend.
    pub supabase: Option<SupabaseConfig>,
    pub cookie_secure: bool,
    /// Bearer token accepted by `GET /api/hello`.
    pub hello_token: String,
    /// Signed-out, unobserved browser sessions idle longer than this are evicted.
    pub session_idle_ttl: Duration,
    /// Signed-in, unobserved browser sessions idle longer than this are evicted.
    pub session_signed_in_ttl: Duration,
    /// Never below `MIN_SESSION_SWEEP_INTERVAL_SECS`.
    pub sweep_interval: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            supabase: None,
            cookie_secure: false,
            hello_token: DEFAULT_HELLO_TOKEN.to_owned(),
            session_idle_ttl: Duration::from_secs(DEFAULT_SESSION_IDLE_TTL_SECS),
            session_signed_in_ttl: Duration::from_secs(DEFAULT_SESSION_SIGNED_IN_TTL_SECS),
            sweep_interval: Duration::from_secs(DEFAULT_SESSION_SWEEP_INTERVAL_SECS),
        }
    }
}

impl AppConfig {
    /// Build the typed config.
    ///
    /// - `PORT` (default 3000)
    /// - `SUPABASE_URL`, `SUPABASE_ANON_KEY` (both or neither)
    /// - `COOKIE_SECURE`; when unset, inferred from an `https://` `PUBLIC_URL`
    /// - `HELLO_TOKEN` (default `my-secret-token`)
    /// - `SESSION_IDLE_TTL_SECS`, `SESSION_SIGNED_IN_TTL_SECS`
    /// - `SESSION_SWEEP_INTERVAL_SECS` (clamped to at least 1)
    ///
    /// # Errors
    ///
    /// Returns an error if `PORT` is set but not a valid port number.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = match std::env::var("PORT") {
            Ok(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|_| ConfigError::Invalid { key: "PORT", value: raw })?,
            Err(_) => DEFAULT_PORT,
        };

        let cookie_secure = env_bool("COOKIE_SECURE").unwrap_or_else(|| {
            std::env::var("PUBLIC_URL")
                .map(|url| url.starts_with("https://"))
                .unwrap_or(false)
        });

        let hello_token = std::env::var("HELLO_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_HELLO_TOKEN.to_owned());

        Ok(Self {
            port,
            supabase: SupabaseConfig::from_env(),
            cookie_secure,
            hello_token,
            session_idle_ttl: Duration::from_secs(env_parse("SESSION_IDLE_TTL_SECS", DEFAULT_SESSION_IDLE_TTL_SECS)),
            session_signed_in_ttl: Duration::from_secs(env_parse(
                "SESSION_SIGNED_IN_TTL_SECS",
                DEFAULT_SESSION_SIGNED_IN_TTL_SECS,
            )),
            sweep_interval: sweep_interval(env_parse(
                "SESSION_SWEEP_INTERVAL_SECS",
                DEFAULT_SESSION_SWEEP_INTERVAL_SECS,
            )),
        })
    }
}

fn sweep_interval(secs: u64) -> Duration {
    Duration::from_secs(secs.max(MIN_SESSION_SWEEP_INTERVAL_SECS))
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

pub(crate) fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .and_then(|raw| match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
