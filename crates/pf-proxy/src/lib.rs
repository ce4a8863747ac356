//! Same-origin forwarding for the profile API
//!
//! Exposes `GET /perfil` and `PATCH /perfil/foto` and relays both to the
//! upstream API unchanged, so a browser client can call them without
//! cross-origin requests. Transport failures answer
//! `500 {"error":"Internal server error"}`.

pub mod error;
mod forward;
mod routes;

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::info;
use url::Url;

pub use error::{ProxyError, Result};
pub use routes::{ProxyState, router};

#[derive(Debug, Clone)]
pub struct ProxyConfig {
    pub listen: SocketAddr,
    pub upstream: Url,
    pub connect_timeout: Duration,
}

impl ProxyConfig {
    pub fn new(listen: SocketAddr, upstream: Url) -> Self {
        Self {
            listen,
            upstream,
            connect_timeout: Duration::from_secs(15),
        }
    }

    pub fn state(&self) -> Result<ProxyState> {
        let client = reqwest::Client::builder()
            .connect_timeout(self.connect_timeout)
            .build()?;
        Ok(ProxyState::new(client, self.upstream.clone()))
    }
}

/// Bind `config.listen` and serve until the task is dropped
pub async fn serve(config: ProxyConfig) -> Result<()> {
    let state = config.state()?;
    let listener = TcpListener::bind(config.listen)
        .await
        .map_err(|source| ProxyError::Bind {
            addr: config.listen,
            source,
        })?;

    serve_on(listener, state).await
}

/// Serve on an already-bound listener
pub async fn serve_on(listener: TcpListener, state: ProxyState) -> Result<()> {
    let addr = listener.local_addr()?;
    info!(%addr, upstream = %state.upstream(), "Proxy listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}
