use pf_auth::config::endpoints;
use pf_auth::{AuthError, SessionClient, TokenPair};
use reqwest::multipart::{Form, Part};
use reqwest::{Response, StatusCode, header};
use tracing::{debug, instrument, warn};

use crate::errors::Result;
use crate::models::{Ack, Profile, ProfilePayload};
use crate::photo::{PHOTO_FIELD, PhotoUpload};
use crate::update::ProfileUpdate;

/// Authenticated calls against the remote profile API.
///
/// Every call first asks the session client for a valid token; without one
/// it fails before touching the network.
#[derive(Debug, Clone)]
pub struct ProfileGateway {
    session: SessionClient,
}

impl ProfileGateway {
    pub fn new(session: SessionClient) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &SessionClient {
        &self.session
    }

    /// `GET perfil/`
    #[instrument(skip(self))]
    pub async fn fetch_profile(&self) -> Result<Profile> {
        let token = self.session.get_valid_token().await?;
        let url = self.session.config().endpoint(endpoints::PROFILE)?;

        debug!("Fetching profile");
        let response = self
            .session
            .http()
            .get(url)
            .bearer_auth(&token)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let body = check_status(response).await?.text().await?;
        let payload: ProfilePayload = serde_json::from_str(&body)?;
        Ok(payload.into())
    }

    /// `PUT usuario/perfil/` with the full document
    #[instrument(skip(self, update))]
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<Ack> {
        update.validate()?;
        let token = self.session.get_valid_token().await?;
        let url = self.session.config().endpoint(endpoints::PROFILE_UPDATE)?;

        debug!("Updating profile");
        let response = self
            .session
            .http()
            .put(url)
            .bearer_auth(&token)
            .json(update)
            .send()
            .await?;

        read_ack(check_status(response).await?).await
    }

    /// `PATCH perfil/foto/` as multipart; reqwest writes the boundary header
    #[instrument(skip(self, photo), fields(file = %photo.file_name, size = photo.size()))]
    pub async fn upload_photo(&self, photo: &PhotoUpload) -> Result<Ack> {
        photo.validate()?;
        let token = self.session.get_valid_token().await?;
        let url = self.session.config().endpoint(endpoints::PROFILE_PHOTO)?;

        let part = Part::bytes(photo.bytes.clone())
            .file_name(photo.file_name.clone())
            .mime_str(&photo.content_type)?;
        let form = Form::new().part(PHOTO_FIELD, part);

        debug!("Uploading profile photo");
        let response = self
            .session
            .http()
            .patch(url)
            .bearer_auth(&token)
            .multipart(form)
            .send()
            .await?;

        read_ack(check_status(response).await?).await
    }

    /// Single-attempt refresh, same policy as the session client
    pub async fn refresh_token(&self) -> Result<TokenPair> {
        Ok(self.session.refresh_token().await?)
    }
}

/// 401 is kept apart from other failures: it ends the session
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();

    if status == StatusCode::UNAUTHORIZED {
        warn!("Token expired or invalid");
        return Err(AuthError::Unauthorized.into());
    }

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!(%status, "Profile API call failed");
        return Err(AuthError::http(status, &body).into());
    }

    Ok(response)
}

async fn read_ack(response: Response) -> Result<Ack> {
    let body = response.text().await?;
    if body.trim().is_empty() {
        return Ok(Ack::default());
    }

    Ok(serde_json::from_str(&body).unwrap_or_else(|_| Ack {
        message: Some(body.chars().take(200).collect()),
        ..Default::default()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
    use pf_auth::store::{StoreKey, TokenStore};
    use pf_auth::{ClientConfig, MemoryTokenStore};
    use serde_json::json;
    use wiremock::matchers::{header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::errors::{ProfileError, ValidationError};
    use crate::photo::MAX_PHOTO_BYTES;
    use crate::update::ProfileEdit;

    fn jwt(exp: i64) -> String {
        let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"exp":{exp}}}"#));
        format!("eyJhbGciOiJIUzI1NiJ9.{payload}.sig")
    }

    async fn gateway_for(server: &MockServer) -> (ProfileGateway, Arc<MemoryTokenStore>, String) {
        let store = Arc::new(MemoryTokenStore::new());
        let token = jwt(chrono::Utc::now().timestamp() + 3600);
        store
            .save_pair(&TokenPair::new(token.clone(), "refresh"))
            .await
            .unwrap();

        let config = ClientConfig::parse(&format!("{}/usuarios/api", server.uri())).unwrap();
        let session = SessionClient::new(config, store.clone()).unwrap();
        (ProfileGateway::new(session), store, token)
    }

    #[tokio::test]
    async fn test_fetch_sends_bearer_token() {
        let server = MockServer::start().await;
        let (gateway, _store, token) = gateway_for(&server).await;

        Mock::given(method("GET"))
            .and(path("/usuarios/api/perfil/"))
            .and(header("authorization", format!("Bearer {token}").as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "user": { "first_name": "Carlos", "last_name": "Moreno" },
                "telefono": "123456789",
                "esta_verificado": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let profile = gateway.fetch_profile().await.unwrap();
        assert_eq!(profile.full_name(), "Carlos Moreno");
        assert_eq!(profile.basic_info.phone, "123456789");
        assert!(profile.verified);
    }

    #[tokio::test]
    async fn test_fetch_401_is_unauthorized() {
        let server = MockServer::start().await;
        let (gateway, _store, _token) = gateway_for(&server).await;

        Mock::given(method("GET"))
            .and(path("/usuarios/api/perfil/"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "detail": "Given token not valid for any token type"
            })))
            .mount(&server)
            .await;

        let err = gateway.fetch_profile().await.unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn test_fetch_server_error_keeps_status() {
        let server = MockServer::start().await;
        let (gateway, _store, _token) = gateway_for(&server).await;

        Mock::given(method("GET"))
            .and(path("/usuarios/api/perfil/"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        match gateway.fetch_profile().await.unwrap_err() {
            ProfileError::Auth(AuthError::Http { status, body_snippet }) => {
                assert_eq!(status, StatusCode::BAD_GATEWAY);
                assert_eq!(body_snippet, "bad gateway");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_profile_is_not_a_network_error() {
        let server = MockServer::start().await;
        let (gateway, _store, _token) = gateway_for(&server).await;

        Mock::given(method("GET"))
            .and(path("/usuarios/api/perfil/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let err = gateway.fetch_profile().await.unwrap_err();
        assert!(matches!(err, ProfileError::Auth(AuthError::Serde(_))));
        assert!(!err.is_unauthorized());
    }

    #[tokio::test]
    async fn test_no_token_skips_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let config = ClientConfig::parse(&format!("{}/usuarios/api", server.uri())).unwrap();
        let session = SessionClient::new(config, Arc::new(MemoryTokenStore::new())).unwrap();
        let gateway = ProfileGateway::new(session);

        let err = gateway.fetch_profile().await.unwrap_err();
        assert!(matches!(err, ProfileError::Auth(AuthError::NoToken)));
    }

    #[tokio::test]
    async fn test_update_puts_full_document() {
        let server = MockServer::start().await;
        let (gateway, _store, _token) = gateway_for(&server).await;

        let base = Profile {
            basic_info: crate::models::BasicInfo {
                first_name: "Carlos".to_string(),
                last_name: "Moreno".to_string(),
                phone: "123".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        let edit = ProfileEdit {
            biography: Some("Hola".to_string()),
            ..Default::default()
        };
        let update = ProfileUpdate::merge(&base, &edit);

        Mock::given(method("PUT"))
            .and(path("/usuarios/api/usuario/perfil/"))
            .and(wiremock::matchers::body_json(json!({
                "user": { "first_name": "Carlos", "last_name": "Moreno" },
                "telefono": "123",
                "tipo_usuario": "",
                "tipo_naturaleza": "",
                "biografia": "Hola",
                "documento": "",
                "linkedin": "",
                "twitter": "",
                "github": "",
                "sitio_web": "",
                "esta_verificado": false
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": "Perfil actualizado"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let ack = gateway.update_profile(&update).await.unwrap();
        assert_eq!(ack.message.as_deref(), Some("Perfil actualizado"));
    }

    #[tokio::test]
    async fn test_invalid_update_never_sent() {
        let server = MockServer::start().await;
        let (gateway, _store, _token) = gateway_for(&server).await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let edit = ProfileEdit {
            first_name: Some(String::new()),
            ..Default::default()
        };
        let update = ProfileUpdate::merge(&Profile::default(), &edit);

        let err = gateway.update_profile(&update).await.unwrap_err();
        assert!(matches!(
            err,
            ProfileError::Validation(ValidationError::BlankField("first_name"))
        ));
    }

    #[tokio::test]
    async fn test_photo_is_multipart() {
        let server = MockServer::start().await;
        let (gateway, _store, _token) = gateway_for(&server).await;

        Mock::given(method("PATCH"))
            .and(path("/usuarios/api/perfil/foto/"))
            .and(header_exists("authorization"))
            .and(wiremock::matchers::header_regex(
                "content-type",
                "^multipart/form-data; boundary=",
            ))
            .and(wiremock::matchers::body_string_contains(r#"name="foto""#))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let photo = PhotoUpload::new("me.png", "image/png", vec![0x89, b'P', b'N', b'G']);
        let ack = gateway.upload_photo(&photo).await.unwrap();
        assert_eq!(ack, Ack::default());
    }

    #[tokio::test]
    async fn test_bad_photo_never_sent() {
        let server = MockServer::start().await;
        let (gateway, _store, _token) = gateway_for(&server).await;
        Mock::given(method("PATCH"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let too_big = PhotoUpload::new("big.png", "image/png", vec![0; MAX_PHOTO_BYTES + 1]);
        assert!(matches!(
            gateway.upload_photo(&too_big).await.unwrap_err(),
            ProfileError::Validation(ValidationError::PhotoTooLarge { .. })
        ));

        let not_image = PhotoUpload::new("cv.pdf", "application/pdf", vec![1, 2, 3]);
        assert!(matches!(
            gateway.upload_photo(&not_image).await.unwrap_err(),
            ProfileError::Validation(ValidationError::UnsupportedPhotoType(_))
        ));
    }

    #[tokio::test]
    async fn test_plain_text_ack() {
        let server = MockServer::start().await;
        let (gateway, store, _token) = gateway_for(&server).await;

        Mock::given(method("PATCH"))
            .and(path("/usuarios/api/perfil/foto/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let photo = PhotoUpload::new("me.png", "image/png", vec![1]);
        let ack = gateway.upload_photo(&photo).await.unwrap();
        assert_eq!(ack.message.as_deref(), Some("ok"));
        assert!(store.get(StoreKey::AccessToken).await.is_some());
    }
}
