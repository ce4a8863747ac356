use std::sync::atomic::{AtomicUsize, Ordering};

use pf_auth::store::StoreKey;
use pf_auth::{Credentials, SessionClient};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::errors::{ProfileError, Result};
use crate::gateway::ProfileGateway;
use crate::models::{Ack, Profile};
use crate::offline::{self, OfflineBackend};
use crate::photo::PhotoUpload;
use crate::update::{ProfileEdit, ProfileUpdate};

/// What views are allowed to see of the session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub is_authenticated: bool,
    pub is_loading: bool,
    pub user: Option<Profile>,
}

impl SessionSnapshot {
    pub fn state(&self) -> SessionState {
        match (&self.user, self.is_loading) {
            (Some(profile), _) if self.is_authenticated => SessionState::Authenticated(profile.clone()),
            (_, true) => SessionState::Loading,
            _ => SessionState::Unauthenticated,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Loading,
    Authenticated(Profile),
}

/// Owner of the client-side session.
///
/// The only writer of session state. Everything else reads a
/// [`SessionSnapshot`] or subscribes to its changes.
pub struct AuthSession {
    gateway: ProfileGateway,
    offline: Option<OfflineBackend>,
    state: watch::Sender<SessionSnapshot>,
    pending: AtomicUsize,
}

impl AuthSession {
    /// Builds an offline session when the client config asks for one
    pub fn new(client: SessionClient) -> Self {
        let offline = client
            .config()
            .offline_mode
            .then(|| OfflineBackend::new(client.store().clone()));
        let (state, _) = watch::channel(SessionSnapshot::default());

        Self {
            gateway: ProfileGateway::new(client),
            offline,
            state,
            pending: AtomicUsize::new(0),
        }
    }

    pub fn gateway(&self) -> &ProfileGateway {
        &self.gateway
    }

    pub fn is_offline(&self) -> bool {
        self.offline.is_some()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    pub fn state(&self) -> SessionState {
        self.state.borrow().state()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    /// Resume a stored session, if there is one
    #[instrument(skip(self))]
    pub async fn check_auth_status(&self) -> Result<()> {
        let store = self.gateway.session().store();
        let Some(token) = store.get(StoreKey::AccessToken).await else {
            debug!("No stored session");
            return Ok(());
        };

        match (self.offline.is_some(), offline::is_sentinel(&token)) {
            (true, false) => {
                debug!("Stored session is not an offline one");
                return Ok(());
            }
            (false, true) => {
                warn!("Discarding offline session token outside offline mode");
                store
                    .apply(&[
                        (StoreKey::AccessToken, None),
                        (StoreKey::RefreshToken, None),
                        (StoreKey::DemoMode, None),
                    ])
                    .await?;
                return Ok(());
            }
            _ => {}
        }

        self.load_profile().await.map(|_| ())
    }

    /// Log in, then load the profile. Authenticated only once both succeed.
    #[instrument(skip(self, credentials), fields(username = %credentials.username))]
    pub async fn login(&self, credentials: &Credentials) -> Result<Profile> {
        // The previous account's profile must not survive into this session
        self.set_unauthenticated();
        let _loading = self.begin_loading();

        let outcome = match &self.offline {
            Some(backend) => backend.login(credentials).await.map(|_| ()),
            None => self
                .gateway
                .session()
                .login(credentials)
                .await
                .map(|_| ())
                .map_err(ProfileError::from),
        };

        if let Err(e) = outcome {
            warn!("Login failed: {}", e);
            self.set_unauthenticated();
            return Err(e);
        }

        self.load_profile().await
    }

    #[instrument(skip(self))]
    pub async fn logout(&self) {
        match &self.offline {
            Some(backend) => backend.logout().await,
            None => self.gateway.session().logout().await,
        }
        self.set_unauthenticated();
    }

    /// Fetch the profile and publish it
    #[instrument(skip(self))]
    pub async fn load_profile(&self) -> Result<Profile> {
        let _loading = self.begin_loading();

        let fetched = match &self.offline {
            Some(backend) => backend.fetch_profile().await,
            None => self.gateway.fetch_profile().await,
        };
        let profile = self.settle(fetched).await?;

        self.state.send_modify(|snapshot| {
            snapshot.is_authenticated = true;
            snapshot.user = Some(profile.clone());
        });
        info!("Profile loaded");
        Ok(profile)
    }

    /// Merge `edit` onto the last-loaded profile, send it, then re-fetch
    #[instrument(skip(self, edit))]
    pub async fn update_profile(&self, edit: &ProfileEdit) -> Result<Ack> {
        let current = self.snapshot().user.ok_or(ProfileError::ProfileNotLoaded)?;
        let update = ProfileUpdate::merge(&current, edit);
        update.validate()?;

        let _loading = self.begin_loading();
        let sent = match &self.offline {
            Some(backend) => backend.update_profile(&update).await,
            None => self.gateway.update_profile(&update).await,
        };
        let ack = self.settle(sent).await?;

        self.load_profile().await?;
        Ok(ack)
    }

    #[instrument(skip(self, photo))]
    pub async fn upload_photo(&self, photo: &PhotoUpload) -> Result<Ack> {
        photo.validate()?;

        let _loading = self.begin_loading();
        let sent = match &self.offline {
            Some(backend) => backend.upload_photo(photo).await,
            None => self.gateway.upload_photo(photo).await,
        };
        let ack = self.settle(sent).await?;

        self.load_profile().await?;
        Ok(ack)
    }

    /// A 401-class failure ends the session; anything else leaves it alone
    async fn settle<T>(&self, result: Result<T>) -> Result<T> {
        if result.as_ref().is_err_and(ProfileError::is_unauthorized) {
            warn!("Session rejected by the server, logging out");
            self.logout().await;
        }
        result
    }

    fn set_unauthenticated(&self) {
        self.state.send_modify(|snapshot| {
            snapshot.is_authenticated = false;
            snapshot.user = None;
        });
    }

    fn begin_loading(&self) -> LoadingGuard<'_> {
        self.state.send_modify(|snapshot| {
            self.pending.fetch_add(1, Ordering::SeqCst);
            snapshot.is_loading = true;
        });
        LoadingGuard { session: self }
    }
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("offline", &self.is_offline())
            .field("snapshot", &*self.state.borrow())
            .finish()
    }
}

/// Holds `is_loading` up until dropped, so a cancelled call still releases it
struct LoadingGuard<'a> {
    session: &'a AuthSession,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        let pending = &self.session.pending;
        self.session.state.send_modify(|snapshot| {
            let left = pending.fetch_sub(1, Ordering::SeqCst) - 1;
            snapshot.is_loading = left > 0;
        });
    }
}
