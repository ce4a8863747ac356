use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::errors::{AuthError, Result};
use crate::models::TokenPair;

/// The fixed set of persisted client-side entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKey {
    AccessToken,
    RefreshToken,
    DemoMode,
}

impl StoreKey {
    pub const ALL: [StoreKey; 3] = [Self::AccessToken, Self::RefreshToken, Self::DemoMode];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::AccessToken => "access_token",
            Self::RefreshToken => "refresh_token",
            Self::DemoMode => "demo_mode",
        }
    }
}

impl std::fmt::Display for StoreKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single pending write: `Some` sets the entry, `None` removes it
pub type StoreChange<'a> = (StoreKey, Option<&'a str>);

/// Key-value storage for tokens and the offline-mode flag.
///
/// Plain pass-through: no validation happens here. Everything above this
/// trait reads and writes tokens through it.
#[async_trait::async_trait]
pub trait TokenStore: Send + Sync {
    async fn get(&self, key: StoreKey) -> Option<String>;

    /// Apply every change in one write
    async fn apply(&self, changes: &[StoreChange<'_>]) -> Result<()>;

    async fn set(&self, key: StoreKey, value: &str) -> Result<()> {
        self.apply(&[(key, Some(value))]).await
    }

    async fn remove(&self, key: StoreKey) -> Result<()> {
        self.apply(&[(key, None)]).await
    }

    /// Both tokens, or `None` if either is missing
    async fn token_pair(&self) -> Option<TokenPair> {
        let access = self.get(StoreKey::AccessToken).await?;
        let refresh = self.get(StoreKey::RefreshToken).await?;
        Some(TokenPair { access, refresh })
    }

    async fn save_pair(&self, pair: &TokenPair) -> Result<()> {
        self.apply(&[
            (StoreKey::AccessToken, Some(pair.access.as_str())),
            (StoreKey::RefreshToken, Some(pair.refresh.as_str())),
        ])
        .await
    }

    async fn clear_pair(&self) -> Result<()> {
        self.apply(&[(StoreKey::AccessToken, None), (StoreKey::RefreshToken, None)])
            .await
    }
}

/// In-memory token store for testing and ephemeral sessions
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    entries: Arc<RwLock<HashMap<StoreKey, String>>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl TokenStore for MemoryTokenStore {
    async fn get(&self, key: StoreKey) -> Option<String> {
        self.entries.read().ok()?.get(&key).cloned()
    }

    async fn apply(&self, changes: &[StoreChange<'_>]) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| AuthError::InvalidResponse("Lock poisoned".to_string()))?;

        for (key, value) in changes {
            match value {
                Some(value) => entries.insert(*key, (*value).to_string()),
                None => entries.remove(key),
            };
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_remove() {
        let store = MemoryTokenStore::new();
        assert!(store.get(StoreKey::DemoMode).await.is_none());

        store.set(StoreKey::DemoMode, "true").await.unwrap();
        assert_eq!(store.get(StoreKey::DemoMode).await.as_deref(), Some("true"));

        store.remove(StoreKey::DemoMode).await.unwrap();
        assert!(store.get(StoreKey::DemoMode).await.is_none());
    }

    #[tokio::test]
    async fn test_pair_is_written_and_cleared_together() {
        let store = MemoryTokenStore::new();
        store.save_pair(&TokenPair::new("a", "b")).await.unwrap();
        store.set(StoreKey::DemoMode, "true").await.unwrap();

        assert_eq!(store.token_pair().await, Some(TokenPair::new("a", "b")));

        store.clear_pair().await.unwrap();
        assert!(store.get(StoreKey::AccessToken).await.is_none());
        assert!(store.get(StoreKey::RefreshToken).await.is_none());
        assert!(store.token_pair().await.is_none());
        // The flag is not part of the pair
        assert_eq!(store.get(StoreKey::DemoMode).await.as_deref(), Some("true"));
    }

    #[tokio::test]
    async fn test_half_pair_reads_as_none() {
        let store = MemoryTokenStore::new();
        store.set(StoreKey::AccessToken, "a").await.unwrap();
        assert!(store.token_pair().await.is_none());
    }

    #[test]
    fn test_key_names() {
        let names: Vec<_> = StoreKey::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(names, ["access_token", "refresh_token", "demo_mode"]);
    }
}
