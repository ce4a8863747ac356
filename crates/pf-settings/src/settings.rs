use std::path::PathBuf;
use std::time::Duration;

use pf_auth::{ClientConfig, HttpTimeouts};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

pub const ENV_API_BASE: &str = "PERFIL_API_BASE";
pub const ENV_OFFLINE_MODE: &str = "PERFIL_OFFLINE_MODE";
pub const ENV_PROXY_LISTEN: &str = "PERFIL_PROXY_LISTEN";
pub const ENV_LOG_LEVEL: &str = "PERFIL_LOG_LEVEL";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub offline_mode: bool,
    pub log_level: String,
    pub api: ApiSettings,
    pub storage: StorageSettings,
    pub proxy: ProxySettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            offline_mode: false,
            log_level: "info".to_string(),
            api: ApiSettings::default(),
            storage: StorageSettings::default(),
            proxy: ProxySettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub login_timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        let timeouts = HttpTimeouts::default();
        Self {
            base_url: pf_auth::config::DEFAULT_API_BASE.to_string(),
            connect_timeout_secs: timeouts.connect.as_secs(),
            request_timeout_secs: timeouts.request.as_secs(),
            login_timeout_secs: pf_auth::config::LOGIN_TIMEOUT.as_secs(),
        }
    }
}

/// Where tokens live. `dir = None` means the per-user config directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
    pub encrypt: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxySettings {
    pub listen: String,
    /// Upstream API base; falls back to `api.base_url`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream: Option<String>,
}

impl Default for ProxySettings {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:3000".to_string(),
            upstream: None,
        }
    }
}

impl Settings {
    /// Layer `PERFIL_*` variables from the process environment
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Layer overrides from any key lookup; unparsable values are ignored
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(base) = lookup(ENV_API_BASE) {
            debug!("API base overridden from {}", ENV_API_BASE);
            self.api.base_url = base;
        }
        if let Some(offline) = lookup(ENV_OFFLINE_MODE).as_deref().and_then(parse_bool) {
            self.offline_mode = offline;
        }
        if let Some(listen) = lookup(ENV_PROXY_LISTEN) {
            self.proxy.listen = listen;
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.log_level = level;
        }
    }

    /// Session client configuration described by these settings
    pub fn client_config(&self) -> pf_auth::Result<ClientConfig> {
        let mut config = ClientConfig::parse(&self.api.base_url)?;
        config.http_timeouts = HttpTimeouts {
            connect: Duration::from_secs(self.api.connect_timeout_secs),
            request: Duration::from_secs(self.api.request_timeout_secs),
        };
        config.login_timeout = Duration::from_secs(self.api.login_timeout_secs);
        config.offline_mode = self.offline_mode;
        Ok(config)
    }

    /// Base URL the proxy forwards to
    pub fn proxy_upstream(&self) -> Result<Url, url::ParseError> {
        let raw = self.proxy.upstream.as_deref().unwrap_or(&self.api.base_url);
        Url::parse(raw)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
