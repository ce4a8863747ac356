use std::net::SocketAddr;

use pf_proxy::{ProxyState, serve_on};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use url::Url;
use wiremock::matchers::{body_bytes, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn start_proxy(upstream: &str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state = ProxyState::new(reqwest::Client::new(), Url::parse(upstream).unwrap());

    tokio::spawn(async move {
        serve_on(listener, state).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn get_profile_is_relayed_verbatim() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/usuarios/api/perfil/"))
        .and(header("authorization", "Bearer abc"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("x-upstream", "yes")
                .set_body_json(json!({ "user": { "first_name": "Carlos", "last_name": "Moreno" } })),
        )
        .expect(1)
        .mount(&upstream)
        .await;

    let proxy = start_proxy(&format!("{}/usuarios/api", upstream.uri())).await;
    let response = reqwest::Client::new()
        .get(format!("http://{proxy}/perfil"))
        .bearer_auth("abc")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.headers()["x-upstream"], "yes");
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["user"]["first_name"], "Carlos");

    let received = upstream.received_requests().await.unwrap();
    let host = received[0].headers.get("host").unwrap().to_str().unwrap();
    assert_eq!(host, upstream.address().to_string());
}

#[tokio::test]
async fn upstream_errors_keep_their_status() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/usuarios/api/perfil/"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "detail": "Given token not valid for any token type"
        })))
        .mount(&upstream)
        .await;

    let proxy = start_proxy(&format!("{}/usuarios/api/", upstream.uri())).await;
    let response = reqwest::get(format!("http://{proxy}/perfil/")).await.unwrap();

    assert_eq!(response.status(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["detail"], "Given token not valid for any token type");
}

#[tokio::test]
async fn photo_body_streams_through_unchanged() {
    let payload = b"--b\r\nContent-Disposition: form-data; name=\"foto\"; filename=\"me.png\"\r\n\r\nPNG\r\n--b--\r\n".to_vec();

    let upstream = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/usuarios/api/perfil/foto/"))
        .and(header("content-type", "multipart/form-data; boundary=b"))
        .and(body_bytes(payload.clone()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "ok" })))
        .expect(1)
        .mount(&upstream)
        .await;

    let proxy = start_proxy(&format!("{}/usuarios/api", upstream.uri())).await;
    let response = reqwest::Client::new()
        .patch(format!("http://{proxy}/perfil/foto"))
        .header("content-type", "multipart/form-data; boundary=b")
        .body(payload)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "message": "ok" }));
}

#[tokio::test]
async fn unreachable_upstream_is_a_generic_500() {
    // Reserve a port, then free it so nothing answers there
    let dead = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead_addr = dead.local_addr().unwrap();
    drop(dead);

    let proxy = start_proxy(&format!("http://{dead_addr}/usuarios/api/")).await;
    let response = reqwest::get(format!("http://{proxy}/perfil")).await.unwrap();

    assert_eq!(response.status(), 500);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "error": "Internal server error" }));
}

#[tokio::test]
async fn healthz_and_unknown_routes() {
    let upstream = MockServer::start().await;
    let proxy = start_proxy(&upstream.uri()).await;
    let client = reqwest::Client::new();

    let health = client.get(format!("http://{proxy}/healthz")).send().await.unwrap();
    assert_eq!(health.status(), 200);

    let missing = client.get(format!("http://{proxy}/usuario/perfil/")).send().await.unwrap();
    assert_eq!(missing.status(), 404);

    let wrong_method = client.post(format!("http://{proxy}/perfil")).send().await.unwrap();
    assert_eq!(wrong_method.status(), 405);

    assert!(upstream.received_requests().await.unwrap().is_empty());
}
