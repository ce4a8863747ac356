use axum::body::Body;
use axum::http::{HeaderMap, HeaderName, Method, header};
use axum::response::Response;
use tracing::{debug, instrument};

use crate::error::Result;
use crate::routes::ProxyState;

/// Dropped from the incoming request before it is sent upstream
const STRIPPED_REQUEST_HEADERS: [HeaderName; 4] = [
    header::HOST,
    header::CONTENT_LENGTH,
    header::CONNECTION,
    header::TRANSFER_ENCODING,
];

/// Framing headers the server layer writes itself
const STRIPPED_RESPONSE_HEADERS: [HeaderName; 2] = [header::CONNECTION, header::TRANSFER_ENCODING];

/// Relay one request to `upstream_path` under the configured base.
///
/// The body streams through in both directions. Status, headers and body of
/// the upstream answer come back as they are.
#[instrument(skip(state, headers, body))]
pub(crate) async fn forward(
    state: &ProxyState,
    method: Method,
    upstream_path: &str,
    headers: HeaderMap,
    body: Option<Body>,
) -> Result<Response> {
    let url = state.upstream.join(upstream_path)?;
    debug!(%url, "Forwarding request");

    let mut request = state
        .client
        .request(method, url)
        .headers(strip(headers, &STRIPPED_REQUEST_HEADERS));
    if let Some(body) = body {
        request = request.body(reqwest::Body::wrap_stream(body.into_data_stream()));
    }

    let upstream = request.send().await?;
    let status = upstream.status();
    debug!(%status, "Upstream answered");

    let headers = strip(upstream.headers().clone(), &STRIPPED_RESPONSE_HEADERS);
    let mut response = Response::new(Body::from_stream(upstream.bytes_stream()));
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    Ok(response)
}

fn strip(mut headers: HeaderMap, names: &[HeaderName]) -> HeaderMap {
    for name in names {
        headers.remove(name);
    }
    headers
}
