mod manager;
pub mod settings;

pub use manager::{SettingsError, SettingsManager};
pub use settings::{ApiSettings, ProxySettings, Settings, StorageSettings};
