use std::path::Path;

use base64::{Engine, engine::general_purpose::STANDARD};

use crate::errors::{Result, ValidationError};

/// Largest photo the API accepts
pub const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

/// Multipart field name the API reads the photo from
pub const PHOTO_FIELD: &str = "foto";

/// A profile photo ready to upload
#[derive(Clone, PartialEq, Eq)]
pub struct PhotoUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl PhotoUpload {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Read a file, guessing its type from the extension
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(pf_auth::AuthError::Io)?;
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("photo")
            .to_string();

        Ok(Self {
            content_type: content_type_for(path).to_string(),
            file_name,
            bytes,
        })
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Images only, non-empty, at most [`MAX_PHOTO_BYTES`]
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        if !self.content_type.starts_with("image/") {
            return Err(ValidationError::UnsupportedPhotoType(self.content_type.clone()));
        }
        if self.bytes.is_empty() {
            return Err(ValidationError::EmptyPhoto);
        }
        if self.bytes.len() > MAX_PHOTO_BYTES {
            return Err(ValidationError::PhotoTooLarge {
                size: self.bytes.len(),
                limit: MAX_PHOTO_BYTES,
            });
        }
        Ok(())
    }

    /// Inline `data:` URL, used when the photo never leaves the machine
    pub fn data_url(&self) -> String {
        format!("data:{};base64,{}", self.content_type, STANDARD.encode(&self.bytes))
    }
}

impl std::fmt::Debug for PhotoUpload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhotoUpload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        Some("svg") => "image/svg+xml",
        Some("avif") => "image/avif",
        _ => "application/octet-stream",
    }
}
