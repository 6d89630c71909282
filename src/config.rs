//! Runtime configuration read from the environment.
//!
//! `HOST` (default `0.0.0.0`), `PORT` (default `8080`),
//! `BRACKET_LOCK_TIMEOUT_MS` (default `2000`).

use std::time::Duration;

/// Engine settings shared by every request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EngineConfig {
    /// How long a request waits for a match lock or tournament gate before `Contention`.
    pub lock_timeout: Duration,
    /// Default size of the "next matches" list.
    pub next_matches_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_millis(default_lock_timeout_ms()),
            next_matches_limit: 5,
        }
    }
}

/// Server settings for the `web` binary.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub engine: EngineConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_lock_timeout_ms() -> u64 {
    2000
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unparsable values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let host = lookup("HOST")
            .filter(|h| !h.trim().is_empty())
            .unwrap_or_else(default_host);
        let port = lookup("PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or_else(default_port);
        let lock_timeout_ms = lookup("BRACKET_LOCK_TIMEOUT_MS")
            .and_then(|ms| ms.parse().ok())
            .filter(|&ms| ms > 0)
            .unwrap_or_else(default_lock_timeout_ms);
        Self {
            host,
            port,
            engine: EngineConfig {
                lock_timeout: Duration::from_millis(lock_timeout_ms),
                ..EngineConfig::default()
            },
        }
    }
}
