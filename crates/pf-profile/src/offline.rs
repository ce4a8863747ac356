use std::sync::Arc;

use pf_auth::store::{StoreKey, TokenStore};
use pf_auth::{Credentials, TokenPair};
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use crate::errors::{ProfileError, Result};
use crate::models::{Ack, BasicInfo, Profile, SocialLinks};
use crate::photo::PhotoUpload;
use crate::update::ProfileUpdate;

pub const DEMO_USERNAME: &str = "carlosandresmoreno";
pub const DEMO_PASSWORD: &str = "90122856_Hanz";
pub const DEMO_ACCESS_TOKEN: &str = "demo_token_123";
pub const DEMO_REFRESH_TOKEN: &str = "demo_refresh_123";

/// The fixed profile served while offline
pub fn demo_profile() -> Profile {
    Profile {
        basic_info: BasicInfo {
            first_name: "Carlos".to_string(),
            last_name: "Moreno".to_string(),
            email: Some("carlos@example.com".to_string()),
            phone: "123456789".to_string(),
            user_type: "instructor".to_string(),
            nature_type: "natural".to_string(),
            biography: "Instructor de tecnología con experiencia en desarrollo web".to_string(),
            document: "12345678".to_string(),
        },
        social_links: SocialLinks {
            linkedin: "https://www.linkedin.com/in/carlos-moreno".to_string(),
            twitter: "https://twitter.com/carlosmoreno".to_string(),
            github: "https://github.com/carlosmoreno".to_string(),
            website: "https://carlosmoreno.dev".to_string(),
        },
        verified: true,
        ..Default::default()
    }
}

/// Whether `token` is one of the offline sentinels
pub fn is_sentinel(token: &str) -> bool {
    token == DEMO_ACCESS_TOKEN || token == DEMO_REFRESH_TOKEN
}

/// Local stand-in for the remote profile API.
///
/// Only built when offline mode is switched on. Edits live in memory for the
/// lifetime of the backend.
pub struct OfflineBackend {
    store: Arc<dyn TokenStore>,
    profile: Mutex<Profile>,
}

impl OfflineBackend {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self {
            store,
            profile: Mutex::new(demo_profile()),
        }
    }

    /// Accepts only the demo credentials and writes the sentinel pair
    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    pub async fn login(&self, credentials: &Credentials) -> Result<TokenPair> {
        if credentials.username != DEMO_USERNAME || credentials.password != DEMO_PASSWORD {
            warn!("Offline login rejected");
            return Err(ProfileError::InvalidCredentials);
        }

        self.store
            .apply(&[
                (StoreKey::AccessToken, Some(DEMO_ACCESS_TOKEN)),
                (StoreKey::RefreshToken, Some(DEMO_REFRESH_TOKEN)),
                (StoreKey::DemoMode, Some("true")),
            ])
            .await?;

        info!("Logged in offline");
        Ok(TokenPair::new(DEMO_ACCESS_TOKEN, DEMO_REFRESH_TOKEN))
    }

    /// A stored sentinel token means an offline session is open
    pub async fn has_session(&self) -> bool {
        self.store
            .get(StoreKey::AccessToken)
            .await
            .is_some_and(|token| token == DEMO_ACCESS_TOKEN)
    }

    pub async fn fetch_profile(&self) -> Result<Profile> {
        if !self.has_session().await {
            return Err(pf_auth::AuthError::NoToken.into());
        }
        Ok(self.profile.lock().await.clone())
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<Ack> {
        update.validate()?;
        if !self.has_session().await {
            return Err(pf_auth::AuthError::NoToken.into());
        }

        let mut profile = self.profile.lock().await;
        *profile = update.apply_to(&profile);
        Ok(local_ack("Profile updated locally"))
    }

    /// Stores the photo inline as a `data:` URL
    pub async fn upload_photo(&self, photo: &PhotoUpload) -> Result<Ack> {
        photo.validate()?;
        if !self.has_session().await {
            return Err(pf_auth::AuthError::NoToken.into());
        }

        self.profile.lock().await.photo = Some(photo.data_url());
        Ok(local_ack("Photo updated locally"))
    }

    pub async fn logout(&self) {
        let cleared = self
            .store
            .apply(&[
                (StoreKey::AccessToken, None),
                (StoreKey::RefreshToken, None),
                (StoreKey::DemoMode, None),
            ])
            .await;
        if let Err(e) = cleared {
            warn!("Failed to clear offline session: {}", e);
        }
        info!("Logged out of offline session");
    }
}

impl std::fmt::Debug for OfflineBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OfflineBackend").finish_non_exhaustive()
    }
}

fn local_ack(message: &str) -> Ack {
    Ack {
        message: Some(message.to_string()),
        success: Some(true),
        detail: None,
    }
}
