use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::errors::Result;

const DEFAULT_DIR_NAME: &str = ".expense_core";
const CONFIG_FILE: &str = "config.json";
const SQLITE_FILE: &str = "expenses.db";
const JSON_FILE: &str = "expenses.json";

/// Persistence backend selected at configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    #[default]
    Sqlite,
    Json,
}

/// Runtime configuration for the server process, persisted as JSON in the
/// app data directory. Missing fields fall back to defaults so a partial
/// file keeps working across upgrades.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backend: StorageKind,
    #[serde(default = "Config::default_listen_addr")]
    pub listen_addr: String,
    /// The desktop shell heartbeats while its window is open; servers run
    /// standalone unless this is turned on.
    #[serde(default)]
    pub watchdog_enabled: bool,
    #[serde(default = "Config::default_grace_secs")]
    pub watchdog_grace_secs: u64,
    #[serde(default = "Config::default_idle_secs")]
    pub watchdog_idle_secs: u64,
    /// Coroutine worker threads for the HTTP runtime.
    #[serde(default = "Config::default_http_workers")]
    pub http_workers: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: StorageKind::default(),
            listen_addr: Self::default_listen_addr(),
            watchdog_enabled: false,
            watchdog_grace_secs: Self::default_grace_secs(),
            watchdog_idle_secs: Self::default_idle_secs(),
            http_workers: Self::default_http_workers(),
        }
    }
}

impl Config {
    fn default_listen_addr() -> String {
        "127.0.0.1:8000".to_string()
    }

    fn default_grace_secs() -> u64 {
        10
    }

    fn default_idle_secs() -> u64 {
        5
    }

    fn default_http_workers() -> usize {
        2
    }

    /// Loads the config file under `base`, defaulting when absent.
    pub fn load_or_default(base: &Path) -> Result<Self> {
        let path = base.join(CONFIG_FILE);
        if path.exists() {
            let data = fs::read_to_string(&path)?;
            Ok(serde_json::from_str(&data)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, base: &Path) -> Result<()> {
        ensure_dir(base)?;
        let json = serde_json::to_string_pretty(self)?;
        fs::write(base.join(CONFIG_FILE), json)?;
        Ok(())
    }

    pub fn watchdog_grace(&self) -> Duration {
        Duration::from_secs(self.watchdog_grace_secs)
    }

    pub fn watchdog_idle(&self) -> Duration {
        Duration::from_secs(self.watchdog_idle_secs)
    }
}

/// Application data directory, `~/.expense_core` unless overridden through
/// `EXPENSE_CORE_HOME`.
pub fn app_data_dir() -> PathBuf {
    if let Some(custom) = env::var_os("EXPENSE_CORE_HOME") {
        return PathBuf::from(custom);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_DIR_NAME)
}

pub fn sqlite_path_in(base: &Path) -> PathBuf {
    base.join(SQLITE_FILE)
}

pub fn json_path_in(base: &Path) -> PathBuf {
    base.join(JSON_FILE)
}

pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)?;
    Ok(())
}
