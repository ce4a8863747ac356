use std::sync::Arc;

use reqwest::{Client, StatusCode};
use tracing::{debug, info, instrument, warn};

use crate::config::{ClientConfig, endpoints};
use crate::errors::{AuthError, Result, snippet};
use crate::models::{
    ApiErrorBody, Credentials, LoginResponse, RefreshRequest, RefreshResponse, TokenPair,
};
use crate::store::{StoreKey, TokenStore};
use crate::token;

/// Owns the token lifecycle: login, expiry checks, refresh, logout
#[derive(Clone)]
pub struct SessionClient {
    config: ClientConfig,
    http: Client,
    store: Arc<dyn TokenStore>,
}

impl SessionClient {
    /// Create a new session client over the given store
    pub fn new(config: ClientConfig, store: Arc<dyn TokenStore>) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(config.http_timeouts.connect)
            .timeout(config.http_timeouts.request)
            .user_agent(config.user_agent.as_deref().unwrap_or("perfil"))
            .build()?;

        Ok(Self {
            config,
            http,
            store,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Shared HTTP client, so gateway calls reuse the connection pool
    pub fn http(&self) -> &Client {
        &self.http
    }

    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.store
    }

    /// Whether the token should no longer be sent. Malformed tokens count as expired.
    pub fn is_expired(&self, token: &str) -> bool {
        let skew = chrono::Duration::from_std(self.config.expiry_skew)
            .unwrap_or(chrono::Duration::zero());
        token::is_expired_at(token, chrono::Utc::now(), skew)
    }

    /// Stored access token, refreshed once first if it has expired
    #[instrument(skip(self))]
    pub async fn get_valid_token(&self) -> Result<String> {
        let access = self
            .store
            .get(StoreKey::AccessToken)
            .await
            .ok_or(AuthError::NoToken)?;

        if !self.is_expired(&access) {
            return Ok(access);
        }

        debug!("Access token expired, refreshing");
        let pair = self.refresh_token().await?;
        Ok(pair.access)
    }

    /// Exchange the stored refresh token for a new access token.
    ///
    /// Single attempt, no retry. The new token (and a rotated refresh token,
    /// if the server sent one) are written in one store update.
    #[instrument(skip(self))]
    pub async fn refresh_token(&self) -> Result<TokenPair> {
        let refresh = self
            .store
            .get(StoreKey::RefreshToken)
            .await
            .ok_or(AuthError::MissingRefreshToken)?;

        let url = self.config.endpoint(endpoints::TOKEN_REFRESH)?;
        let response = self
            .http
            .post(url)
            .json(&RefreshRequest { refresh: &refresh })
            .send()
            .await
            .map_err(|e| AuthError::RefreshFailed {
                status: None,
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "Token refresh rejected");
            return Err(AuthError::RefreshFailed {
                status: Some(status),
                reason: format!("HTTP {status}: {}", snippet(&body)),
            });
        }

        let refreshed: RefreshResponse =
            response
                .json()
                .await
                .map_err(|e| AuthError::RefreshFailed {
                    status: Some(status),
                    reason: format!("Invalid refresh response: {e}"),
                })?;

        let pair = TokenPair {
            access: refreshed.access,
            refresh: refreshed.refresh.unwrap_or(refresh),
        };
        self.store.save_pair(&pair).await?;

        debug!("Access token refreshed");
        Ok(pair)
    }

    /// Log in and store the token pair.
    ///
    /// Bounded by the configured login timeout. Nothing is written on failure.
    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    pub async fn login(&self, credentials: &Credentials) -> Result<TokenPair> {
        let url = self.config.endpoint(endpoints::LOGIN)?;
        let request = self.http.post(url).json(credentials).send();

        let response = tokio::time::timeout(self.config.login_timeout, request)
            .await
            .map_err(|_| AuthError::Timeout(self.config.login_timeout))??;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::LoginRejected {
                status,
                message: login_error_message(status, &body),
            });
        }

        let pair = response.json::<LoginResponse>().await?.into_pair();
        self.store
            .apply(&[
                (StoreKey::AccessToken, Some(pair.access.as_str())),
                (StoreKey::RefreshToken, Some(pair.refresh.as_str())),
                (StoreKey::DemoMode, None),
            ])
            .await?;

        info!("Logged in");
        Ok(pair)
    }

    /// Forget both tokens. Never fails; store errors are only logged.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        if let Err(e) = self.store.clear_pair().await {
            warn!("Failed to clear stored tokens: {}", e);
        }
        info!("Logged out");
    }
}

impl std::fmt::Debug for SessionClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// The server's own error text if it sent one, a generic message otherwise
fn login_error_message(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ApiErrorBody>(body)
        && let Some(message) = parsed.message()
    {
        return message;
    }

    let body = body.trim();
    if body.is_empty() {
        format!("Login failed with status {status}")
    } else {
        snippet(body)
    }
}
