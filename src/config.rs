use anyhow::{Context, Result};
use log::{warn, LevelFilter};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::RwLock,
};

/// The single collar this service knows about.
pub const DEVICE_ID: &str = "collar-001";

/// Result cap for range queries when the caller does not pick one.
pub const DEFAULT_QUERY_LIMIT: usize = 100;

/// Store path the collar publishes its latest sample to.
pub fn default_feed_path() -> String {
    format!("devices/{DEVICE_ID}/live")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HistorialConfig {
    pub database_path: PathBuf,
    pub feed_path: String,
    pub default_query_limit: usize,
    pub log_level: String,
}

impl Default for HistorialConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("pet_historial.sqlite3"),
            feed_path: default_feed_path(),
            default_query_limit: DEFAULT_QUERY_LIMIT,
            log_level: "info".into(),
        }
    }
}

impl HistorialConfig {
    /// `PET_HISTORIAL_DEBUG=1` (or `true`) forces debug output; otherwise
    /// `log_level` is used, falling back to info when it does not parse.
    pub fn log_filter(&self) -> LevelFilter {
        let debug_mode = std::env::var("PET_HISTORIAL_DEBUG")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        if debug_mode {
            return LevelFilter::Debug;
        }
        self.log_level.parse().unwrap_or(LevelFilter::Info)
    }
}

/// JSON-file backed configuration.
pub struct ConfigStore {
    path: PathBuf,
    data: RwLock<HistorialConfig>,
}

impl ConfigStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!(
                    "Ignoring unreadable config at {}: {err}; using defaults",
                    path.display()
                );
                HistorialConfig::default()
            })
        } else {
            HistorialConfig::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self) -> HistorialConfig {
        match self.data.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn update(&self, config: HistorialConfig) -> Result<()> {
        let mut guard = match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = config;
        self.persist(&guard)
    }

    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read config from {}", self.path.display()))?;
        let data: HistorialConfig = serde_json::from_str(&contents)
            .with_context(|| format!("Invalid config in {}", self.path.display()))?;
        let mut guard = match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = data;
        Ok(())
    }

    fn persist(&self, data: &HistorialConfig) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write config to {}", self.path.display()))
    }
}
