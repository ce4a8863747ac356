use std::io::{self, Write};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use pf_auth::{Credentials, EnvSecretProvider, FileTokenStore, SessionClient, TokenStore};
use pf_profile::{AuthSession, Envelope, PhotoUpload, ProfileEdit};
use pf_proxy::ProxyConfig;
use pf_settings::{Settings, StorageSettings};
use serde::Serialize;
use tracing::{info, warn};
use url::Url;

use crate::components::profile::{ProfileView, SessionStatus};

/// One CLI invocation: resolved settings plus the output mode
pub struct App {
    settings: Settings,
    json: bool,
}

impl App {
    pub fn new(settings: Settings, json: bool) -> Self {
        Self { settings, json }
    }

    pub async fn login(&self, username: Option<String>, password: Option<String>) -> anyhow::Result<()> {
        let username = match username {
            Some(username) => username,
            None => prompt("Username: ")?,
        };
        let password = match password {
            Some(password) => password,
            None => rpassword::prompt_password("Password: ")?,
        };
        if username.trim().is_empty() || password.is_empty() {
            bail!("Username and password are required");
        }

        let session = self.session().await?;
        let profile = session
            .login(&Credentials::new(username.trim(), password))
            .await?;

        self.emit(&profile, || format!("Logged in as {}", profile.full_name()))
    }

    pub async fn logout(&self) -> anyhow::Result<()> {
        let session = self.session().await?;
        session.logout().await;
        self.emit(&(), || "Logged out".to_string())
    }

    /// Never fails because of the remote side; a rejected session just reads as signed out
    pub async fn status(&self) -> anyhow::Result<()> {
        let session = self.session().await?;
        if let Err(e) = session.check_auth_status().await {
            warn!("Could not resume session: {}", e);
        }

        let snapshot = session.snapshot();
        let status = SessionStatus::from_snapshot(&snapshot, session.is_offline());
        self.emit(&snapshot, || match &snapshot.user {
            Some(profile) => format!("{} as {}", status.painted(), profile.full_name()),
            None => status.painted(),
        })
    }

    pub async fn show(&self) -> anyhow::Result<()> {
        let session = self.resumed().await?;
        let profile = session.snapshot().user.context("No profile loaded")?;
        self.emit(&profile, || ProfileView::new(&profile).to_string())
    }

    pub async fn edit(&self, edit: ProfileEdit) -> anyhow::Result<()> {
        if edit.is_empty() {
            bail!("Nothing to change; pass at least one field, e.g. --phone");
        }

        let session = self.resumed().await?;
        let ack = session.update_profile(&edit).await?;
        let profile = session.snapshot().user.context("No profile loaded")?;

        self.emit(&profile, || {
            let message = ack.message.clone().unwrap_or_else(|| "Profile updated".to_string());
            format!("{message}\n\n{}", ProfileView::new(&profile))
        })
    }

    pub async fn photo(&self, path: &Path) -> anyhow::Result<()> {
        let photo = PhotoUpload::from_path(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        photo.validate()?;

        let session = self.resumed().await?;
        let ack = session.upload_photo(&photo).await?;

        self.emit(&ack, || {
            ack.message
                .clone()
                .unwrap_or_else(|| "Photo updated".to_string())
        })
    }

    pub async fn serve(&self, listen: Option<SocketAddr>, upstream: Option<String>) -> anyhow::Result<()> {
        let listen = match listen {
            Some(listen) => listen,
            None => self
                .settings
                .proxy
                .listen
                .parse()
                .with_context(|| format!("Invalid listen address {:?}", self.settings.proxy.listen))?,
        };
        let upstream = match upstream {
            Some(upstream) => Url::parse(&upstream),
            None => self.settings.proxy_upstream(),
        }
        .context("Invalid upstream URL")?;

        let mut config = ProxyConfig::new(listen, upstream);
        config.connect_timeout = Duration::from_secs(self.settings.api.connect_timeout_secs);

        info!("Starting proxy on {}", listen);
        pf_proxy::serve(config).await?;
        Ok(())
    }

    pub fn report_error(&self, error: &anyhow::Error) {
        if self.json {
            let envelope = Envelope::<()>::failure(format!("{error:#}"));
            match serde_json::to_string_pretty(&envelope) {
                Ok(json) => println!("{json}"),
                Err(_) => eprintln!("Error: {error:#}"),
            }
        } else {
            eprintln!("Error: {error:#}");
        }
    }

    async fn session(&self) -> anyhow::Result<AuthSession> {
        let store = open_store(&self.settings.storage).await?;
        let client = SessionClient::new(self.settings.client_config()?, store)?;
        Ok(AuthSession::new(client))
    }

    /// A session with the stored profile already loaded
    async fn resumed(&self) -> anyhow::Result<AuthSession> {
        let session = self.session().await?;
        session.check_auth_status().await?;
        if session.snapshot().user.is_none() {
            bail!("Not logged in; run `perfil login` first");
        }
        Ok(session)
    }

    fn emit<T: Serialize>(&self, data: &T, text: impl FnOnce() -> String) -> anyhow::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(&Envelope::success(data))?);
        } else {
            println!("{}", text());
        }
        Ok(())
    }
}

async fn open_store(storage: &StorageSettings) -> anyhow::Result<Arc<dyn TokenStore>> {
    let dir = match &storage.dir {
        Some(dir) => dir.clone(),
        None => FileTokenStore::default_storage_dir()?,
    };

    let store = if storage.encrypt {
        FileTokenStore::open_encrypted(&dir, Arc::new(EnvSecretProvider::default())).await
    } else {
        FileTokenStore::open(&dir).await
    }
    .with_context(|| format!("Failed to open token store in {}", dir.display()))?;

    Ok(Arc::new(store))
}

fn prompt(label: &str) -> io::Result<String> {
    print!("{label}");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pf_auth::StoreKey;
    use pf_profile::offline::{DEMO_ACCESS_TOKEN, DEMO_PASSWORD, DEMO_USERNAME};
    use tempfile::tempdir;

    fn offline_settings(dir: &Path) -> Settings {
        let mut settings = Settings::default();
        settings.offline_mode = true;
        settings.storage.dir = Some(dir.to_path_buf());
        settings
    }

    #[tokio::test]
    async fn test_offline_login_persists_session() {
        let temp_dir = tempdir().unwrap();
        let app = App::new(offline_settings(temp_dir.path()), true);

        app.login(Some(DEMO_USERNAME.to_string()), Some(DEMO_PASSWORD.to_string()))
            .await
            .unwrap();

        let store = FileTokenStore::open(temp_dir.path()).await.unwrap();
        assert_eq!(
            store.get(StoreKey::AccessToken).await.as_deref(),
            Some(DEMO_ACCESS_TOKEN)
        );

        let resumed = app.resumed().await.unwrap();
        assert!(resumed.snapshot().is_authenticated);
    }

    #[tokio::test]
    async fn test_show_requires_login() {
        let temp_dir = tempdir().unwrap();
        let app = App::new(offline_settings(temp_dir.path()), false);

        let err = app.show().await.unwrap_err();
        assert!(err.to_string().contains("Not logged in"));
    }

    #[tokio::test]
    async fn test_empty_edit_is_refused() {
        let temp_dir = tempdir().unwrap();
        let app = App::new(offline_settings(temp_dir.path()), false);

        let err = app.edit(ProfileEdit::default()).await.unwrap_err();
        assert!(err.to_string().contains("Nothing to change"));
    }

    #[tokio::test]
    async fn test_blank_credentials_are_refused() {
        let temp_dir = tempdir().unwrap();
        let app = App::new(offline_settings(temp_dir.path()), false);

        let err = app
            .login(Some("  ".to_string()), Some("secret".to_string()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("required"));
    }

    #[tokio::test]
    async fn test_logout_clears_store() {
        let temp_dir = tempdir().unwrap();
        let app = App::new(offline_settings(temp_dir.path()), true);
        app.login(Some(DEMO_USERNAME.to_string()), Some(DEMO_PASSWORD.to_string()))
            .await
            .unwrap();

        app.logout().await.unwrap();

        let store = FileTokenStore::open(temp_dir.path()).await.unwrap();
        for key in StoreKey::ALL {
            assert_eq!(store.get(key).await, None);
        }
    }
}
