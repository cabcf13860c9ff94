//! Configuration primitives for the onboarding wizard.
//!
//! Stored in a machine-readable TOML file located at:
//!   $ONBOARDBASE_HOME/config/config.toml when the variable is set
//!   <OS data dir>/Onboardbase/config/config.toml otherwise
//!
//! The config carries timing windows for the cooperative parts of the wizard
//! (completion re-derivation, autocomplete, progress staging) and the storage
//! key prefix shared by every tab of one installation.

use anyhow::{bail, Context, Result};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Standard relative path to the config file (resolved per OS at runtime).
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Environment variable overriding the workspace root.
pub const HOME_ENV_VAR: &str = "ONBOARDBASE_HOME";

/// Root configuration persisted per installation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WizardConfig {
    /// Prefix applied to every storage key written by the persistence layer.
    #[serde(default = "default_storage_key_prefix")]
    pub storage_key_prefix: String,
    /// Idle window (ms) before completed steps are re-derived after an edit.
    #[serde(default = "default_rederive_debounce_ms")]
    pub rederive_debounce_ms: u64,
    /// Idle window (ms) before a partial-word autocomplete query fires.
    #[serde(default = "default_autocomplete_idle_ms")]
    pub autocomplete_idle_ms: u64,
    /// Queries shorter than this clear predictions instead of searching.
    #[serde(default = "default_autocomplete_min_chars")]
    pub autocomplete_min_chars: usize,
    /// Interval (ms) between simulated smart-search progress messages.
    #[serde(default = "default_progress_interval_ms")]
    pub progress_interval_ms: u64,
    #[serde(default)]
    pub age: AgeBounds,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            storage_key_prefix: default_storage_key_prefix(),
            rederive_debounce_ms: default_rederive_debounce_ms(),
            autocomplete_idle_ms: default_autocomplete_idle_ms(),
            autocomplete_min_chars: default_autocomplete_min_chars(),
            progress_interval_ms: default_progress_interval_ms(),
            age: AgeBounds::default(),
        }
    }
}

impl WizardConfig {
    pub fn rederive_debounce(&self) -> Duration {
        Duration::from_millis(self.rederive_debounce_ms)
    }

    pub fn autocomplete_idle(&self) -> Duration {
        Duration::from_millis(self.autocomplete_idle_ms)
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }

    /// Rejects values the wizard cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.age.floor > self.age.ceiling {
            bail!(
                "age floor {} is above age ceiling {}",
                self.age.floor,
                self.age.ceiling
            );
        }
        if self.age.floor < 0 {
            bail!("age floor {} must not be negative", self.age.floor);
        }
        if self.progress_interval_ms == 0 {
            bail!("progress_interval_ms must be greater than zero");
        }
        Ok(())
    }
}

/// Inclusive audience age window accepted by validation and enrichment.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgeBounds {
    #[serde(default = "default_age_floor")]
    pub floor: i64,
    #[serde(default = "default_age_ceiling")]
    pub ceiling: i64,
}

impl Default for AgeBounds {
    fn default() -> Self {
        Self {
            floor: default_age_floor(),
            ceiling: default_age_ceiling(),
        }
    }
}

impl AgeBounds {
    /// Never panics, even for inverted bounds built by hand.
    pub fn clamp(&self, value: i64) -> i64 {
        value.max(self.floor).min(self.ceiling)
    }

    pub fn contains(&self, value: i64) -> bool {
        (self.floor..=self.ceiling).contains(&value)
    }
}

fn default_storage_key_prefix() -> String {
    "onboarding".into()
}

const fn default_rederive_debounce_ms() -> u64 {
    300
}

const fn default_autocomplete_idle_ms() -> u64 {
    600
}

const fn default_autocomplete_min_chars() -> usize {
    3
}

const fn default_progress_interval_ms() -> u64 {
    1_500
}

pub const fn default_age_floor() -> i64 {
    16
}

pub const fn default_age_ceiling() -> i64 {
    90
}

/// Returns the root directory where the wizard stores data.
///
/// Order of precedence:
/// 1. `ONBOARDBASE_HOME` environment variable.
/// 2. OS-specific data directory via `directories::BaseDirs`.
pub fn workspace_root() -> Result<PathBuf> {
    if let Ok(path) = env::var(HOME_ENV_VAR) {
        return Ok(PathBuf::from(path));
    }
    let base_dirs = BaseDirs::new().context("Unable to determine OS data directory")?;
    Ok(base_dirs.data_dir().join("Onboardbase"))
}

/// Path to the config file.
pub fn config_file_path() -> Result<PathBuf> {
    Ok(workspace_root()?.join("config").join(CONFIG_FILE_NAME))
}

/// Directory holding the file-backed durable storage tier.
pub fn durable_storage_dir() -> Result<PathBuf> {
    Ok(workspace_root()?.join("storage").join("durable"))
}

/// Loads the config from the default location, falling back to defaults when absent.
pub fn load_config() -> Result<WizardConfig> {
    load_config_from(config_file_path()?)
}

pub fn load_config_from<P: AsRef<Path>>(path: P) -> Result<WizardConfig> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(WizardConfig::default());
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed reading wizard config {:?}", path))?;
    let config: WizardConfig =
        toml::from_str(&raw).with_context(|| format!("Failed parsing wizard config {:?}", path))?;
    config
        .validate()
        .with_context(|| format!("Invalid wizard config {:?}", path))?;
    Ok(config)
}

pub fn save_config_to<P: AsRef<Path>>(path: P, config: &WizardConfig) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed creating config directory {:?}", parent))?;
    }
    let raw = toml::to_string_pretty(config).context("Failed serializing wizard config")?;
    fs::write(path, raw).with_context(|| format!("Failed writing wizard config {:?}", path))?;
    Ok(())
}
