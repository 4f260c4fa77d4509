//! Client configuration.

use serde::Deserialize;
use std::time::Duration;

/// Configuration for the offset client.
///
/// Loaded from an optional `offset-client.toml` and `OFFSET_CLIENT_*`
/// environment variables; every field has a default.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Marketplace API root; request paths are appended to it.
    #[serde(default = "defaults::api_root_url")]
    pub api_root_url: String,

    /// Explorer network name, passed through unvalidated.
    #[serde(default = "defaults::network")]
    pub network: String,

    #[serde(default = "defaults::explorer_base_url")]
    pub explorer_base_url: String,

    #[serde(default = "defaults::session_path")]
    pub session_path: String,

    #[serde(default = "defaults::request_timeout_ms")]
    pub request_timeout_ms: u64,

    #[serde(default = "defaults::connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Retries after the first attempt for transient HTTP failures.
    #[serde(default = "defaults::max_retries")]
    pub max_retries: u32,

    #[serde(default = "defaults::retry_base_ms")]
    pub retry_base_ms: u64,

    #[serde(default = "defaults::poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Ceiling for the poller's backoff after failed polls.
    #[serde(default = "defaults::poll_max_interval_ms")]
    pub poll_max_interval_ms: u64,

    #[serde(default = "defaults::offsets_limit")]
    pub offsets_limit: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_root_url: defaults::api_root_url(),
            network: defaults::network(),
            explorer_base_url: defaults::explorer_base_url(),
            session_path: defaults::session_path(),
            request_timeout_ms: defaults::request_timeout_ms(),
            connect_timeout_ms: defaults::connect_timeout_ms(),
            max_retries: defaults::max_retries(),
            retry_base_ms: defaults::retry_base_ms(),
            poll_interval_ms: defaults::poll_interval_ms(),
            poll_max_interval_ms: defaults::poll_max_interval_ms(),
            offsets_limit: defaults::offsets_limit(),
        }
    }
}

impl Config {
    /// Read `offset-client.toml` (optional) overlaid with `OFFSET_CLIENT_*` env vars.
    pub fn load() -> Result<Self, crate::Error> {
        Self::from_builder(
            config::Config::builder()
                .add_source(config::File::with_name("offset-client").required(false))
                .add_source(config::Environment::with_prefix("OFFSET_CLIENT")),
        )
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, crate::Error> {
        builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| crate::Error::Config(format!("Failed to load configuration: {e}")))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn poll_max_interval(&self) -> Duration {
        Duration::from_millis(self.poll_max_interval_ms.max(self.poll_interval_ms))
    }
}

mod defaults {
    pub fn api_root_url() -> String {
        "http://localhost:8080/api".into()
    }

    pub fn network() -> String {
        "testnet".into()
    }

    pub fn explorer_base_url() -> String {
        offset_types::HASHSCAN_BASE_URL.into()
    }

    pub fn session_path() -> String {
        "./.offset-session.json".into()
    }

    pub fn request_timeout_ms() -> u64 {
        10_000
    }

    pub fn connect_timeout_ms() -> u64 {
        5_000
    }

    pub fn max_retries() -> u32 {
        3
    }

    pub fn retry_base_ms() -> u64 {
        100
    }

    pub fn poll_interval_ms() -> u64 {
        2_000
    }

    pub fn poll_max_interval_ms() -> u64 {
        30_000
    }

    pub fn offsets_limit() -> u32 {
        100
    }
}
