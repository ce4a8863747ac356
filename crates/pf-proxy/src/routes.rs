use axum::Router;
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::Response;
use axum::routing::{get, patch};
use pf_auth::config::endpoints;
use tower_http::trace::TraceLayer;
use url::Url;

use crate::error::Result;
use crate::forward::forward;

/// Shared by every handler
#[derive(Debug, Clone)]
pub struct ProxyState {
    pub(crate) client: reqwest::Client,
    pub(crate) upstream: Url,
}

impl ProxyState {
    /// `upstream` is the API base; a missing trailing slash is added
    pub fn new(client: reqwest::Client, mut upstream: Url) -> Self {
        if !upstream.path().ends_with('/') {
            let path = format!("{}/", upstream.path());
            upstream.set_path(&path);
        }
        Self { client, upstream }
    }

    pub fn upstream(&self) -> &Url {
        &self.upstream
    }
}

pub fn router(state: ProxyState) -> Router {
    Router::new()
        .route("/perfil", get(profile))
        .route("/perfil/", get(profile))
        .route("/perfil/foto", patch(profile_photo))
        .route("/perfil/foto/", patch(profile_photo))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn profile(State(state): State<ProxyState>, headers: HeaderMap) -> Result<Response> {
    forward(&state, Method::GET, endpoints::PROFILE, headers, None).await
}

async fn profile_photo(
    State(state): State<ProxyState>,
    headers: HeaderMap,
    body: Body,
) -> Result<Response> {
    forward(&state, Method::PATCH, endpoints::PROFILE_PHOTO, headers, Some(body)).await
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_gets_trailing_slash() {
        let state = ProxyState::new(
            reqwest::Client::new(),
            Url::parse("http://46.202.88.87:8010/usuarios/api").unwrap(),
        );
        assert_eq!(state.upstream().as_str(), "http://46.202.88.87:8010/usuarios/api/");
        assert_eq!(
            state.upstream().join(endpoints::PROFILE_PHOTO).unwrap().as_str(),
            "http://46.202.88.87:8010/usuarios/api/perfil/foto/"
        );
    }
}
