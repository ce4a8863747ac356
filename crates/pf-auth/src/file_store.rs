use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::RwLock;
use zeroize::Zeroizing;

use crate::crypto::{self, EncryptedBlob, EncryptionKey};
use crate::errors::{AuthError, Result};
use crate::secret::SecretProvider;
use crate::store::{StoreChange, StoreKey, TokenStore};

const STORE_FILE: &str = "tokens.json";
const LOCK_FILE: &str = "lock";
const FORMAT_VERSION: u32 = 1;
const SEAL_CONTEXT: &str = "tokens";

type Entries = BTreeMap<StoreKey, String>;

/// On-disk layout. Exactly one of `entries` / `sealed` is present.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    entries: Option<Entries>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    salt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sealed: Option<EncryptedBlob>,
}

struct Sealing {
    key: EncryptionKey,
    salt: Vec<u8>,
}

/// File-backed token store, durable across restarts
///
/// # Directory Structure
/// ```text
/// ~/.config/perfil/
/// ├── tokens.json   # Entries, plain or AES-256-GCM sealed
/// └── lock          # Advisory lock file
/// ```
pub struct FileTokenStore {
    path: PathBuf,
    lock_file: PathBuf,
    sealing: Option<Sealing>,
    /// Entries as last read from or written to disk
    cache: RwLock<Entries>,
}

impl FileTokenStore {
    /// Open (or create) a plaintext store in `storage_dir`
    pub async fn open(storage_dir: impl AsRef<Path>) -> Result<Self> {
        let storage_dir = storage_dir.as_ref();
        prepare_dir(storage_dir).await?;
        let path = storage_dir.join(STORE_FILE);

        let entries = match read_store_file(&path).await? {
            None => Entries::new(),
            Some(file) if file.sealed.is_some() => return Err(AuthError::PassphraseUnavailable),
            Some(file) => file.entries.unwrap_or_default(),
        };

        Ok(Self {
            path,
            lock_file: storage_dir.join(LOCK_FILE),
            sealing: None,
            cache: RwLock::new(entries),
        })
    }

    /// Open (or create) a store whose entries are encrypted at rest.
    ///
    /// The key is derived from the provider's passphrase; an existing
    /// plaintext store is sealed on open.
    pub async fn open_encrypted(
        storage_dir: impl AsRef<Path>,
        secret_provider: Arc<dyn SecretProvider>,
    ) -> Result<Self> {
        let storage_dir = storage_dir.as_ref();
        prepare_dir(storage_dir).await?;
        let path = storage_dir.join(STORE_FILE);
        let existing = read_store_file(&path).await?;

        let salt = match existing.as_ref().and_then(|f| f.salt.as_deref()) {
            Some(salt) => URL_SAFE_NO_PAD
                .decode(salt)
                .map_err(|_| AuthError::CorruptedStore)?,
            None => crypto::generate_salt()?.to_vec(),
        };

        let passphrase = secret_provider
            .get_passphrase("Enter passphrase for the token store")
            .await
            .ok_or(AuthError::PassphraseUnavailable)?;
        let key = EncryptionKey::derive(passphrase.as_bytes(), &salt)?;

        let (entries, needs_seal) = match existing {
            None => (Entries::new(), false),
            Some(StoreFile {
                sealed: Some(blob), ..
            }) => {
                let plaintext = Zeroizing::new(crypto::decrypt(&key, &blob, SEAL_CONTEXT)?);
                let entries = serde_json::from_slice(&plaintext)
                    .map_err(|_| AuthError::CorruptedStore)?;
                (entries, false)
            }
            Some(file) => (file.entries.unwrap_or_default(), true),
        };

        let store = Self {
            path,
            lock_file: storage_dir.join(LOCK_FILE),
            sealing: Some(Sealing { key, salt }),
            cache: RwLock::new(entries),
        };

        if needs_seal {
            tracing::info!("Sealing existing plaintext token store");
            let _lock = store.acquire_lock()?;
            let entries = store.cache.read().await.clone();
            store.persist(&entries).await?;
        }

        Ok(store)
    }

    /// Default storage directory for the current platform
    pub fn default_storage_dir() -> Result<PathBuf> {
        let project_dirs = directories::ProjectDirs::from("", "", "perfil").ok_or_else(|| {
            AuthError::InvalidResponse("Could not determine config directory".to_string())
        })?;

        Ok(project_dirs.config_dir().to_path_buf())
    }

    pub fn is_encrypted(&self) -> bool {
        self.sealing.is_some()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Acquire an exclusive lock on the storage
    fn acquire_lock(&self) -> Result<std::fs::File> {
        let lock_file = std::fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.lock_file)?;

        lock_file
            .try_lock_exclusive()
            .map_err(|_| AuthError::LockTimeout)?;

        Ok(lock_file)
    }

    /// Serialize, optionally seal, and atomically replace the store file
    async fn persist(&self, entries: &Entries) -> Result<()> {
        let file = match &self.sealing {
            None => StoreFile {
                version: FORMAT_VERSION,
                entries: Some(entries.clone()),
                ..Default::default()
            },
            Some(sealing) => {
                let plaintext = Zeroizing::new(serde_json::to_vec(entries)?);
                StoreFile {
                    version: FORMAT_VERSION,
                    salt: Some(URL_SAFE_NO_PAD.encode(&sealing.salt)),
                    sealed: Some(crypto::encrypt(&sealing.key, &plaintext, SEAL_CONTEXT)?),
                    ..Default::default()
                }
            }
        };
        let json = Zeroizing::new(serde_json::to_string_pretty(&file)?);

        // Atomic write: write to temp file, then rename
        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, json.as_bytes()).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&temp_path, std::fs::Permissions::from_mode(0o600))?;
        }

        std::fs::File::open(&temp_path)?.sync_all()?;
        fs::rename(&temp_path, &self.path).await?;

        Ok(())
    }
}

impl std::fmt::Debug for FileTokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileTokenStore")
            .field("path", &self.path)
            .field("encrypted", &self.is_encrypted())
            .finish_non_exhaustive()
    }
}

async fn prepare_dir(storage_dir: &Path) -> Result<()> {
    fs::create_dir_all(storage_dir).await?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(storage_dir, std::fs::Permissions::from_mode(0o700))?;
    }

    Ok(())
}

async fn read_store_file(path: &Path) -> Result<Option<StoreFile>> {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let file: StoreFile = serde_json::from_str(&content).map_err(|e| {
        tracing::error!("Unreadable token store {}: {}", path.display(), e);
        AuthError::CorruptedStore
    })?;

    if file.version > FORMAT_VERSION {
        return Err(AuthError::InvalidResponse(format!(
            "Token store version {} is newer than supported version {}",
            file.version, FORMAT_VERSION
        )));
    }

    Ok(Some(file))
}

#[async_trait::async_trait]
impl TokenStore for FileTokenStore {
    async fn get(&self, key: StoreKey) -> Option<String> {
        self.cache.read().await.get(&key).cloned()
    }

    async fn apply(&self, changes: &[StoreChange<'_>]) -> Result<()> {
        let _lock = self.acquire_lock()?;
        let mut cache = self.cache.write().await;

        let mut next = cache.clone();
        for (key, value) in changes {
            match value {
                Some(value) => next.insert(*key, (*value).to_string()),
                None => next.remove(key),
            };
        }

        if next == *cache {
            return Ok(());
        }

        self.persist(&next).await?;
        *cache = next;
        tracing::debug!(changes = changes.len(), "Token store updated");

        Ok(())
    }
}
