use std::path::{Path, PathBuf};

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use crate::fs::json_file::{read_json, remove_json, write_json};

use super::{RawSettings, Settings};

pub const SETTINGS_FILE: &str = "settings.json";

/// Persistent key-value settings.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get(&self) -> Result<RawSettings>;

    async fn set(&self, settings: &RawSettings) -> Result<()>;

    async fn clear(&self) -> Result<()>;

    /// Loads and validates in one go.
    async fn load(&self) -> Result<Settings> {
        Ok(Settings::try_from(self.get().await?)?)
    }
}

/// The main realization of [SettingsStore], a JSON document in the application directory.
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    pub fn new(app_dir: &Path) -> Self {
        Self {
            path: app_dir.join(SETTINGS_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SettingsStore for FileSettingsStore {
    async fn get(&self) -> Result<RawSettings> {
        read_json(&self.path).await
    }

    async fn set(&self, settings: &RawSettings) -> Result<()> {
        write_json(&self.path, settings).await?;
        info!("Saved settings to {:?}", self.path);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        remove_json(&self.path).await?;
        info!("Cleared settings at {:?}", self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use tempfile::tempdir;

    use crate::settings::AutoDistribution;

    use super::*;

    #[tokio::test]
    async fn test_settings_survive_reload() -> Result<()> {
        let dir = tempdir()?;
        let store = FileSettingsStore::new(dir.path());

        let mut raw = store.get().await?;
        raw.set("projectKey", "WL")?;
        raw.set("autoDistribution", "activeWork")?;
        store.set(&raw).await?;

        let content = tokio::fs::read_to_string(store.path()).await?;
        assert!(content.contains("\"projectKey\": \"WL\""));

        let settings = FileSettingsStore::new(dir.path()).load().await?;
        assert_eq!(settings.filter()?.project_key, "WL");
        assert_eq!(settings.auto_distribution, AutoDistribution::ActiveWork);

        store.clear().await?;
        assert_eq!(store.get().await?, RawSettings::default());
        Ok(())
    }
}
