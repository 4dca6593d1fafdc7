//! Startup configuration.
//!
//! Read once, then handed by reference to each controller. Every field has a
//! default so a partial (or missing) file still yields a usable config.

use crate::error::ConfigError;
use crate::host::PhraseHash;
use crate::keys::{Key, DEFAULT_TOGGLE_KEY};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

const DEFAULT_TRIGGER_PHRASE: &str = "fixphonehud";
const DEFAULT_PERIODIC_INTERVAL_MS: u64 = 60_000;

/// Host conditions that must hold before a periodic repair may start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeriodicGuard {
    /// No cutscene active or playing.
    NoCutscene,
    /// Simulation not paused.
    NotPaused,
    /// Pause menu not shown.
    NoPauseMenu,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepairConfig {
    pub trigger_phrase: String,
    pub periodic_enabled: bool,
    pub periodic_interval_ms: u64,
    pub periodic_only_when_closed: bool,
    pub periodic_guards: Vec<PeriodicGuard>,
}

impl Default for RepairConfig {
    fn default() -> Self {
        Self {
            trigger_phrase: DEFAULT_TRIGGER_PHRASE.to_string(),
            periodic_enabled: true,
            periodic_interval_ms: DEFAULT_PERIODIC_INTERVAL_MS,
            periodic_only_when_closed: true,
            periodic_guards: vec![PeriodicGuard::NoCutscene, PeriodicGuard::NotPaused],
        }
    }
}

impl RepairConfig {
    pub fn trigger_hash(&self) -> PhraseHash {
        PhraseHash::of(&self.trigger_phrase)
    }

    /// Effective interval; zero would fire every frame, so it maps to the default.
    pub fn interval_ms(&self) -> u64 {
        if self.periodic_interval_ms == 0 {
            DEFAULT_PERIODIC_INTERVAL_MS
        } else {
            self.periodic_interval_ms
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub enabled: bool,
    pub animations: bool,
    pub toggle_key: Key,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            animations: true,
            toggle_key: DEFAULT_TOGGLE_KEY,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub repair: RepairConfig,
    pub engine: EngineConfig,
}

impl Config {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Loads the file, or returns defaults if it is missing or malformed.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "using default config");
                Self::default()
            }
        }
    }
}
