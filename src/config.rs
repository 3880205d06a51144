use crate::{server::signature::SigningKey, stream::classifier::DEFAULT_PLAYLIST_HOST};
use std::{str::FromStr, time::Duration};

const DEFAULT_MAX_INSPECT_BYTES: u64 = 4 * 1024 * 1024;

/// Runtime configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub host: String,
    pub port: u16,
    /// The streaming host whose `.m3u8` requests are intercepted, with an
    /// optional `:port`.
    pub playlist_host: String,
    /// Also intercept plain `http` playlist URLs.
    pub allow_http: bool,
    pub upstream_timeout: Duration,
    /// Larger upstream bodies are streamed through without inspection.
    pub max_inspect_bytes: u64,
    pub signing_key: SigningKey,
    pub cors_origin: String,
}

impl ProxyConfig {
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: parse_var("PORT", 8080),
            playlist_host: std::env::var("CREST_PLAYLIST_HOST")
                .ok()
                .filter(|host| !host.is_empty())
                .unwrap_or_else(|| DEFAULT_PLAYLIST_HOST.to_string()),
            allow_http: parse_var("CREST_ALLOW_HTTP", false),
            upstream_timeout: Duration::from_secs(parse_var("CREST_UPSTREAM_TIMEOUT_SECS", 30)),
            max_inspect_bytes: parse_var("CREST_MAX_INSPECT_BYTES", DEFAULT_MAX_INSPECT_BYTES),
            signing_key: SigningKey::from_env(),
            cors_origin: std::env::var("CORS_ALLOWED_ORIGIN").unwrap_or_else(|_| "*".to_string()),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            playlist_host: DEFAULT_PLAYLIST_HOST.to_string(),
            allow_http: false,
            upstream_timeout: Duration::from_secs(30),
            max_inspect_bytes: DEFAULT_MAX_INSPECT_BYTES,
            signing_key: SigningKey::disabled(),
            cors_origin: "*".to_string(),
        }
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring invalid {}={:?}, using default", name, raw);
            default
        }),
        Err(_) => default,
    }
}
