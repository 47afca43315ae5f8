use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const MAX_PAYLOAD_BYTES: usize = 64 * 1024; // hard cap per inbound frame
pub const DEFAULT_TOP_K: usize = 3;

/// Top-level config (liveboard.toml + LIVEBOARD_* env overrides).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LiveboardConfig {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub ranking: RankingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Directory of overlay assets served on the same endpoint. Unset = no
    /// static serving.
    #[serde(default)]
    pub assets_dir: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
            assets_dir: None,
        }
    }
}

/// Which upstream implementation backs `configure`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    /// WebSocket relay that bridges the platform's live webcast feed.
    #[default]
    Relay,
    /// No platform connection; only synthetic test events flow.
    Offline,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default)]
    pub source: SourceKind,
    #[serde(default = "default_relay_url")]
    pub relay_url: String,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_keepalive_secs")]
    pub keepalive_secs: u64,
    /// Upstream silence longer than this declares the connection dead.
    #[serde(default = "default_silent_timeout_secs")]
    pub silent_timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            source: SourceKind::default(),
            relay_url: default_relay_url(),
            connect_timeout_ms: default_connect_timeout_ms(),
            keepalive_secs: default_keepalive_secs(),
            silent_timeout_secs: default_silent_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_secs: u64,
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    /// Per-subscriber outbound queue depth; a full queue drops events for
    /// that subscriber only.
    #[serde(default = "default_outbound_buffer")]
    pub outbound_buffer: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            heartbeat_secs: default_heartbeat_secs(),
            idle_timeout_secs: default_idle_timeout_secs(),
            outbound_buffer: default_outbound_buffer(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_relay_url() -> String {
    "ws://127.0.0.1:8765/webcast".to_string()
}
fn default_connect_timeout_ms() -> u64 {
    10_000
}
fn default_keepalive_secs() -> u64 {
    15
}
fn default_silent_timeout_secs() -> u64 {
    60
}
fn default_heartbeat_secs() -> u64 {
    20
}
fn default_idle_timeout_secs() -> u64 {
    60
}
fn default_outbound_buffer() -> usize {
    256
}
fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

impl LiveboardConfig {
    /// Load config with layered overrides.
    ///
    /// Precedence, lowest first:
    ///   1. Built-in defaults
    ///   2. TOML file (explicit path, else ~/.liveboard/liveboard.toml)
    ///   3. LIVEBOARD_* env vars, nested with `__` (LIVEBOARD_GATEWAY__PORT)
    ///   4. PORT env var
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: LiveboardConfig = Figment::from(Serialized::defaults(LiveboardConfig::default()))
            .merge(Toml::file(&path))
            .merge(Env::prefixed("LIVEBOARD_").split("__"))
            .merge(Env::raw().only(&["PORT"]).map(|_| "gateway.port".into()))
            .extract()
            .map_err(|e| crate::error::LiveboardError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would leave the gateway unable to serve.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::LiveboardError::Config;

        if self.ranking.top_k == 0 {
            return Err(Config("ranking.top_k must be at least 1".to_string()));
        }
        if self.session.outbound_buffer == 0 {
            return Err(Config("session.outbound_buffer must be at least 1".to_string()));
        }
        if self.session.heartbeat_secs == 0
            || self.session.heartbeat_secs >= self.session.idle_timeout_secs
        {
            return Err(Config(format!(
                "session.heartbeat_secs ({}) must be non-zero and below idle_timeout_secs ({})",
                self.session.heartbeat_secs, self.session.idle_timeout_secs
            )));
        }
        if self.upstream.source == SourceKind::Relay && self.upstream.relay_url.trim().is_empty() {
            return Err(Config("upstream.relay_url is required for the relay source".to_string()));
        }
        Ok(())
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.liveboard/liveboard.toml", home)
}
