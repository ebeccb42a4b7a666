use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf, sync::RwLock};

use crate::{blog::DEFAULT_STORAGE_KEY, scramble::ScrambleConfig, storage::StoreKind};

pub const DEFAULT_BLOG_ENDPOINT: &str = "https://dev.to/api/articles?username=krivanek06";

pub const DATA_DIR_ENV: &str = "FOLIO_DATA_DIR";
pub const BLOG_ENDPOINT_ENV: &str = "FOLIO_BLOG_ENDPOINT";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct SiteSettings {
    pub blog_endpoint: String,
    pub storage_key: String,
    pub store: StoreKind,
    pub scramble: ScrambleConfig,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            blog_endpoint: DEFAULT_BLOG_ENDPOINT.into(),
            storage_key: DEFAULT_STORAGE_KEY.into(),
            store: StoreKind::default(),
            scramble: ScrambleConfig::default(),
        }
    }
}

impl SiteSettings {
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(endpoint) = env::var(BLOG_ENDPOINT_ENV) {
            if !endpoint.trim().is_empty() {
                self.blog_endpoint = endpoint;
            }
        }
        self
    }
}

/// Directory for settings and storage files, `./data` unless overridden.
pub fn data_dir() -> PathBuf {
    env::var(DATA_DIR_ENV)
        .ok()
        .filter(|dir| !dir.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("./data"))
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<SiteSettings>,
}

impl SettingsStore {
    /// A missing or unreadable-as-JSON file yields defaults; it is only
    /// written back on [`SettingsStore::update`].
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_default()
        } else {
            SiteSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn site(&self) -> SiteSettings {
        self.data
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn update(&self, settings: SiteSettings) -> Result<()> {
        let mut guard = self
            .data
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        self.persist(&settings)?;
        *guard = settings;
        Ok(())
    }

    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read settings from {}", self.path.display()))?;
        let data: SiteSettings = serde_json::from_str(&contents)
            .with_context(|| format!("Invalid settings in {}", self.path.display()))?;
        let mut guard = self
            .data
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = data;
        Ok(())
    }

    fn persist(&self, data: &SiteSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
