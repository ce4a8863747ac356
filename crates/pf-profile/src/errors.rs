use pf_auth::AuthError;
use thiserror::Error;

/// Client-side checks that block a submission before any network call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    BlankField(&'static str),

    #[error("{field} must be a valid URL (got {value:?})")]
    InvalidUrl { field: &'static str, value: String },

    #[error("Photo is {size} bytes; the limit is {limit} bytes")]
    PhotoTooLarge { size: usize, limit: usize },

    #[error("Photo must be an image, got {0:?}")]
    UnsupportedPhotoType(String),

    #[error("Photo file is empty")]
    EmptyPhoto,
}

/// Every failure a profile operation can report
#[derive(Error, Debug)]
pub enum ProfileError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("No profile loaded yet")]
    ProfileNotLoaded,

    #[error("Invalid username or password")]
    InvalidCredentials,
}

impl ProfileError {
    /// 401-class failures end the session
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Auth(e) if e.is_unauthorized())
    }
}

impl From<reqwest::Error> for ProfileError {
    fn from(e: reqwest::Error) -> Self {
        Self::Auth(AuthError::Network(e))
    }
}

impl From<serde_json::Error> for ProfileError {
    fn from(e: serde_json::Error) -> Self {
        Self::Auth(AuthError::Serde(e))
    }
}

pub type Result<T> = std::result::Result<T, ProfileError>;
