use std::time::Duration;
use url::Url;

use crate::errors::Result;

/// Remote profile API endpoints, relative to the API base
pub mod endpoints {
    pub const LOGIN: &str = "login/";
    pub const TOKEN_REFRESH: &str = "token/refresh/";
    pub const PROFILE: &str = "perfil/";
    pub const PROFILE_UPDATE: &str = "usuario/perfil/";
    pub const PROFILE_PHOTO: &str = "perfil/foto/";
}

/// Default remote API base
pub const DEFAULT_API_BASE: &str = "http://46.202.88.87:8010/usuarios/api/";

/// Login requests are abandoned after this long
pub const LOGIN_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub connect: Duration,
    pub request: Duration,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(15),
            request: Duration::from_secs(30),
        }
    }
}

/// Configuration for the session client and profile gateway
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the remote API, always ending with `/`
    pub api_base: Url,

    /// HTTP client timeouts
    pub http_timeouts: HttpTimeouts,

    /// Upper bound for a login round-trip
    pub login_timeout: Duration,

    /// Treat access tokens as expired this long before their `exp`
    pub expiry_skew: Duration,

    /// Custom user agent (optional)
    pub user_agent: Option<String>,

    /// Serve the fixed local profile instead of calling the API.
    /// Only ever enabled explicitly.
    pub offline_mode: bool,
}

impl ClientConfig {
    pub fn new(mut api_base: Url) -> Self {
        if !api_base.path().ends_with('/') {
            let path = format!("{}/", api_base.path());
            api_base.set_path(&path);
        }

        Self {
            api_base,
            http_timeouts: HttpTimeouts::default(),
            login_timeout: LOGIN_TIMEOUT,
            expiry_skew: Duration::ZERO,
            user_agent: Some("perfil".to_string()),
            offline_mode: false,
        }
    }

    pub fn parse(api_base: &str) -> Result<Self> {
        Ok(Self::new(Url::parse(api_base)?))
    }

    /// Resolve an endpoint path against the API base
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.api_base.join(path)?)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(Url::parse(DEFAULT_API_BASE).expect("valid default API base"))
    }
}
