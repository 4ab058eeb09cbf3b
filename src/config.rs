// Application configuration stored as YAML

use crate::store::DEFAULT_COST_FACTOR;
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const APP_DIR: &str = "adledger";
const CONFIG_FILENAME: &str = "config.yml";
const LEDGER_FILENAME: &str = "ledger.csv";

/// Configuration for adledger, stored in `<config_dir>/adledger/config.yml`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    /// Ledger file used when no `--file` is given
    #[serde(default)]
    pub ledger_path: Option<PathBuf>,

    /// Multiplier applied by a cost raise
    #[serde(default = "default_cost_factor")]
    pub cost_factor: f64,
}

fn default_cost_factor() -> f64 {
    DEFAULT_COST_FACTOR
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ledger_path: None,
            cost_factor: DEFAULT_COST_FACTOR,
        }
    }
}

impl AppConfig {
    /// Platform location of the config file, if the platform has a config dir
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILENAME))
    }

    /// Load config from `path`, or return defaults if the file does not exist
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            debug!(file = ?path, "No config file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: AppConfig =
            serde_yaml::from_str(&content).with_context(|| format!("Failed to parse config {}", path.display()))?;
        debug!(file = ?path, ?config, "Loaded config");
        Ok(config)
    }

    /// Load from `explicit` if given, else from the platform default location
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => match Self::default_path() {
                Some(path) => Self::load(path),
                None => Ok(Self::default()),
            },
        }
    }

    /// Ledger path to use: the explicit one, then the configured one, then
    /// `<data_dir>/adledger/ledger.csv`, then `./ledger.csv`
    pub fn resolve_ledger_path(&self, explicit: Option<&Path>) -> PathBuf {
        if let Some(path) = explicit {
            return path.to_path_buf();
        }
        if let Some(path) = &self.ledger_path {
            return path.clone();
        }
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR).join(LEDGER_FILENAME))
            .unwrap_or_else(|| PathBuf::from(LEDGER_FILENAME))
    }
}
