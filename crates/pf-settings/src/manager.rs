use std::path::{Path, PathBuf};

use anyhow::Context;
use directories::ProjectDirs;
use thiserror::Error;
use tracing::{debug, error, info, instrument};

use crate::settings::Settings;

pub const SETTINGS_FILE: &str = "config.toml";

/// Reads and writes `config.toml`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettingsManager {
    path: PathBuf,
}

impl SettingsManager {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `config.toml` in the per-user config directory
    #[instrument(level = "debug")]
    pub fn default_location() -> Result<Self, SettingsError> {
        let proj_dirs = ProjectDirs::from("", "", "perfil").ok_or_else(|| {
            error!("Failed to determine project directories - this usually indicates an unsupported OS or missing home directory");
            SettingsError::ProjectDirectoriesUnavailable
        })?;

        Ok(Self::at(proj_dirs.config_dir().join(SETTINGS_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Settings from disk; a missing file yields the defaults
    #[instrument(skip(self), fields(path = %self.path.display()), level = "debug")]
    pub async fn load(&self) -> Result<Settings, SettingsError> {
        if tokio::fs::metadata(&self.path).await.is_err() {
            debug!("No settings file at {}, using defaults", self.path.display());
            return Ok(Settings::default());
        }

        let content = tokio::fs::read_to_string(&self.path)
            .await
            .context("Failed to read settings file")
            .map_err(|e| {
                error!("Failed to read settings file {}: {}", self.path.display(), e);
                SettingsError::FileReadFailed {
                    path: self.path.clone(),
                    source: e,
                }
            })?;

        let settings: Settings = toml::from_str(&content)
            .context("Failed to parse settings file")
            .map_err(|e| {
                error!("Failed to parse settings file {}: {}", self.path.display(), e);
                SettingsError::ParsingFailed {
                    path: self.path.clone(),
                    source: e,
                }
            })?;

        debug!("Loaded settings from {}", self.path.display());
        Ok(settings)
    }

    #[instrument(skip(self, settings), fields(path = %self.path.display()), level = "debug")]
    pub async fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        if let Some(dir) = self.path.parent()
            && tokio::fs::metadata(dir).await.is_err()
        {
            info!("Settings directory doesn't exist, creating: {}", dir.display());
            tokio::fs::create_dir_all(dir)
                .await
                .context("Failed to create settings directory")
                .map_err(|e| {
                    error!("Failed to create settings directory {}: {}", dir.display(), e);
                    SettingsError::DirectoryCreationFailed {
                        path: dir.to_path_buf(),
                        source: e,
                    }
                })?;
        }

        let toml = toml::to_string_pretty(settings)
            .context("Failed to serialize settings to TOML")
            .map_err(|e| {
                error!("Failed to serialize settings: {}", e);
                SettingsError::SerializationFailed { source: e }
            })?;

        tokio::fs::write(&self.path, toml)
            .await
            .context("Failed to write settings file")
            .map_err(|e| {
                error!("Failed to write settings file {}: {}", self.path.display(), e);
                SettingsError::FileWriteFailed {
                    path: self.path.clone(),
                    source: e,
                }
            })?;

        info!("Saved settings to {}", self.path.display());
        Ok(())
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error(
        "Project directories are unavailable - this usually indicates an unsupported OS or missing home directory"
    )]
    ProjectDirectoriesUnavailable,

    #[error("Failed to create directory '{path}': {source}")]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to read settings file '{path}': {source}")]
    FileReadFailed {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to write settings file '{path}': {source}")]
    FileWriteFailed {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to parse settings file '{path}': {source}")]
    ParsingFailed {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to serialize settings: {source}")]
    SerializationFailed {
        #[source]
        source: anyhow::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_missing_file_gives_defaults() {
        let temp_dir = tempdir().unwrap();
        let manager = SettingsManager::at(temp_dir.path().join(SETTINGS_FILE));

        let settings = manager.load().await.unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let temp_dir = tempdir().unwrap();
        let manager = SettingsManager::at(temp_dir.path().join("nested/dir").join(SETTINGS_FILE));

        let mut settings = Settings::default();
        settings.offline_mode = true;
        settings.storage.dir = Some(temp_dir.path().join("tokens"));
        settings.proxy.upstream = Some("http://localhost:8010/usuarios/api/".to_string());

        manager.save(&settings).await.unwrap();
        assert!(manager.path().exists());

        let loaded = manager.load().await.unwrap();
        assert_eq!(loaded, settings);
    }

    #[tokio::test]
    async fn test_invalid_toml() {
        let temp_dir = tempdir().unwrap();
        let settings_file = temp_dir.path().join(SETTINGS_FILE);
        fs::write(&settings_file, "invalid toml content {{{").unwrap();

        let manager = SettingsManager::at(&settings_file);
        let result = manager.load().await;

        if let Err(SettingsError::ParsingFailed { path, .. }) = result {
            assert_eq!(path, settings_file);
        } else {
            panic!("Expected ParsingFailed error");
        }
    }
}
