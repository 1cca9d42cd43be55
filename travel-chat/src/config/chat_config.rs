//! Chat config: backend and flow runtime locations, flow id discovery policy, session, logging.
//! Loaded from env.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Result;
use flow_endpoint::{ResolverConfig, DEFAULT_FALLBACK_FLOW_ID};

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
pub const DEFAULT_FLOW_RUNTIME_URL: &str = "http://localhost:8080";
pub const DEFAULT_CHAT_SESSION_ID: &str = "travel-chat-session";

#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// BACKEND_URL or REACT_APP_API_URL
    pub backend_url: String,
    /// FLOW_RUNTIME_URL
    pub flow_runtime_url: String,
    /// FALLBACK_FLOW_ID; empty values fall back to the compiled-in id
    pub fallback_flow_id: String,
    /// FLOW_ID_MAX_ATTEMPTS
    pub flow_id_max_attempts: u32,
    /// FLOW_ID_RETRY_DELAY_MS
    pub flow_id_retry_delay_ms: u64,
    /// FLOW_ID_REFRESH_SECS
    pub flow_id_refresh_secs: u64,
    /// FLOW_ID_FETCH_TIMEOUT_SECS
    pub flow_id_fetch_timeout_secs: u64,
    /// CHAT_TIMEOUT_SECS; unset means sends are not bounded
    pub chat_timeout_secs: Option<u64>,
    /// CHAT_SESSION_ID
    pub session_id: String,
    /// LOG_FILE; unset logs to stdout only
    pub log_file: Option<String>,
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_var<T: FromStr>(key: &str) -> Option<T> {
    non_empty_var(key).and_then(|s| s.parse().ok())
}

impl ChatConfig {
    /// Load from environment variables. Unparsable numbers take their defaults.
    pub fn from_env() -> Result<Self> {
        let backend_url = non_empty_var("BACKEND_URL")
            .or_else(|| non_empty_var("REACT_APP_API_URL"))
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());
        let flow_runtime_url = non_empty_var("FLOW_RUNTIME_URL")
            .unwrap_or_else(|| DEFAULT_FLOW_RUNTIME_URL.to_string());
        let fallback_flow_id = non_empty_var("FALLBACK_FLOW_ID")
            .unwrap_or_else(|| DEFAULT_FALLBACK_FLOW_ID.to_string());
        let session_id = non_empty_var("CHAT_SESSION_ID")
            .unwrap_or_else(|| DEFAULT_CHAT_SESSION_ID.to_string());

        Ok(Self {
            backend_url,
            flow_runtime_url,
            fallback_flow_id,
            flow_id_max_attempts: parse_var("FLOW_ID_MAX_ATTEMPTS").unwrap_or(5),
            flow_id_retry_delay_ms: parse_var("FLOW_ID_RETRY_DELAY_MS").unwrap_or(2000),
            flow_id_refresh_secs: parse_var("FLOW_ID_REFRESH_SECS").unwrap_or(30),
            flow_id_fetch_timeout_secs: parse_var("FLOW_ID_FETCH_TIMEOUT_SECS").unwrap_or(5),
            chat_timeout_secs: parse_var("CHAT_TIMEOUT_SECS"),
            session_id,
            log_file: non_empty_var("LOG_FILE"),
        })
    }

    /// Validate URLs and the knobs where zero makes no sense.
    pub fn validate(&self) -> Result<()> {
        if reqwest::Url::parse(&self.backend_url).is_err() {
            anyhow::bail!(
                "BACKEND_URL (or REACT_APP_API_URL) is not a valid URL: {}",
                self.backend_url
            );
        }
        if reqwest::Url::parse(&self.flow_runtime_url).is_err() {
            anyhow::bail!("FLOW_RUNTIME_URL is not a valid URL: {}", self.flow_runtime_url);
        }
        if self.flow_id_max_attempts == 0 {
            anyhow::bail!("FLOW_ID_MAX_ATTEMPTS must be at least 1");
        }
        if self.flow_id_refresh_secs == 0 {
            anyhow::bail!("FLOW_ID_REFRESH_SECS must be at least 1");
        }
        if self.flow_id_fetch_timeout_secs == 0 {
            anyhow::bail!("FLOW_ID_FETCH_TIMEOUT_SECS must be at least 1");
        }
        Ok(())
    }

    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            max_attempts: self.flow_id_max_attempts,
            retry_delay: Duration::from_millis(self.flow_id_retry_delay_ms),
            refresh_interval: Duration::from_secs(self.flow_id_refresh_secs),
        }
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.flow_id_fetch_timeout_secs)
    }

    pub fn chat_timeout(&self) -> Option<Duration> {
        self.chat_timeout_secs.map(Duration::from_secs)
    }

    /// Config pointing at the given services, with every other knob at its default.
    pub fn for_urls(backend_url: &str, flow_runtime_url: &str) -> Self {
        Self {
            backend_url: backend_url.to_string(),
            flow_runtime_url: flow_runtime_url.to_string(),
            fallback_flow_id: DEFAULT_FALLBACK_FLOW_ID.to_string(),
            flow_id_max_attempts: 5,
            flow_id_retry_delay_ms: 2000,
            flow_id_refresh_secs: 30,
            flow_id_fetch_timeout_secs: 5,
            chat_timeout_secs: None,
            session_id: DEFAULT_CHAT_SESSION_ID.to_string(),
            log_file: None,
        }
    }
}
