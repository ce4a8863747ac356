//! Session and token lifecycle for the profile API client
//!
//! This crate owns everything the client knows about credentials: where
//! tokens live, when an access token is no longer worth sending, and how a
//! session is opened, refreshed and closed.
//!
//! # Session Flow
//!
//! 1. `login` posts credentials and stores the access/refresh pair
//! 2. `get_valid_token` returns the access token, refreshing it once if its
//!    `exp` claim has passed
//! 3. `logout` removes both tokens
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use pf_auth::{ClientConfig, Credentials, FileTokenStore, SessionClient};
//!
//! # async fn example() -> pf_auth::Result<()> {
//! let store = FileTokenStore::open(FileTokenStore::default_storage_dir()?).await?;
//! let client = SessionClient::new(ClientConfig::default(), Arc::new(store))?;
//!
//! client.login(&Credentials::new("carlos", "secret")).await?;
//! let token = client.get_valid_token().await?;
//! println!("Bearer {token}");
//!
//! client.logout().await;
//! # Ok(())
//! # }
//! ```
//!
//! # Token Storage
//!
//! All reads and writes go through the `TokenStore` trait, keyed by
//! `StoreKey`. The access/refresh pair is always written and cleared in a
//! single `apply` call, so a store never holds half a pair because of us.
//!
//! - `MemoryTokenStore` for tests and throwaway sessions
//! - `FileTokenStore` for a durable store, optionally sealed with AES-256-GCM
//!   under an Argon2id key derived from a passphrase
//!
//! Tokens are never logged.

pub mod client;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod file_store;
pub mod models;
pub mod secret;
pub mod store;
pub mod token;

// Re-export main types
pub use client::SessionClient;
pub use config::{ClientConfig, HttpTimeouts};
pub use errors::{AuthError, Result};
pub use file_store::FileTokenStore;
pub use models::{Credentials, TokenPair};
pub use secret::{EnvSecretProvider, NoSecretProvider, SecretProvider, StaticSecretProvider};
pub use store::{MemoryTokenStore, StoreKey, TokenStore};
