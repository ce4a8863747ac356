//! Profile operations and client-side session state
//!
//! Builds on `pf-auth` for tokens. Every remote call goes through
//! [`ProfileGateway`], which asks the session client for a valid token
//! first; [`AuthSession`] sits on top and is the single writer of the
//! session snapshot that views read.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use pf_auth::{ClientConfig, Credentials, MemoryTokenStore, SessionClient};
//! use pf_profile::{AuthSession, ProfileEdit};
//!
//! # async fn example() -> pf_profile::Result<()> {
//! let client = SessionClient::new(ClientConfig::default(), Arc::new(MemoryTokenStore::new()))?;
//! let session = AuthSession::new(client);
//!
//! let profile = session.login(&Credentials::new("carlos", "secret")).await?;
//! println!("Hello, {}", profile.full_name());
//!
//! let edit = ProfileEdit {
//!     biography: Some("Rust developer".to_string()),
//!     ..Default::default()
//! };
//! session.update_profile(&edit).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Offline Mode
//!
//! When `ClientConfig::offline_mode` is set, the session never talks to the
//! network: only the demo credentials log in and edits stay in memory.

pub mod envelope;
pub mod errors;
pub mod gateway;
pub mod models;
pub mod offline;
pub mod photo;
pub mod state;
pub mod update;

pub use envelope::Envelope;
pub use errors::{ProfileError, Result, ValidationError};
pub use gateway::ProfileGateway;
pub use models::{Ack, BasicInfo, Profile, SocialLinks};
pub use offline::OfflineBackend;
pub use photo::{MAX_PHOTO_BYTES, PhotoUpload};
pub use state::{AuthSession, SessionSnapshot, SessionState};
pub use update::{ProfileEdit, ProfileUpdate};
