//! Vaultkeeper configuration management

use crate::error::{Error, Result};
use crate::vault::classifier::DEFAULT_ALTERNATE_MARGIN;
use crate::vault::Confidence;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Default storage root, relative to the working directory.
pub const DEFAULT_STORAGE_DIR: &str = ".vaultkeeper/memory";

/// Default per-vault live entry limit.
pub const DEFAULT_MAX_ENTRIES_PER_VAULT: usize = 10_000;

/// Main Vaultkeeper configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Vault policy configuration
    #[serde(default)]
    pub vaults: VaultsConfig,

    /// Classifier configuration
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

impl VaultConfig {
    /// Config rooted at the given storage directory, defaults elsewhere
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            storage: StorageConfig { root: root.into() },
            ..Default::default()
        }
    }

    /// Parse a TOML document
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Default config file location (<config dir>/vaultkeeper/config.toml)
    pub fn default_path() -> Option<PathBuf> {
        dirs_next::config_dir().map(|dir| dir.join("vaultkeeper").join("config.toml"))
    }

    /// Reject settings the manager cannot honor
    pub fn validate(&self) -> Result<()> {
        if self.vaults.max_entries_per_vault == 0 {
            return Err(Error::Config(
                "vaults.max_entries_per_vault must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.classifier.alternate_margin) {
            return Err(Error::Config(format!(
                "classifier.alternate_margin must be within [0, 1], got {}",
                self.classifier.alternate_margin
            )));
        }
        if self.vaults.horizon_author.trim().is_empty() {
            return Err(Error::Config(
                "vaults.horizon_author must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Storage configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root directory holding `vaults/` and `horizon/`
    pub root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_STORAGE_DIR),
        }
    }
}

/// Vault policy configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultsConfig {
    /// Confidence assigned when the caller supplies none
    pub default_confidence: Confidence,

    /// Classify content when no vault is given; otherwise use operational
    pub enable_auto_classification: bool,

    /// Maximum live entries per vault
    pub max_entries_per_vault: usize,

    /// Ledger author recorded when no guardian is given
    pub horizon_author: String,
}

impl Default for VaultsConfig {
    fn default() -> Self {
        Self {
            default_confidence: Confidence::Medium,
            enable_auto_classification: true,
            max_entries_per_vault: DEFAULT_MAX_ENTRIES_PER_VAULT,
            horizon_author: "vaultkeeper".to_string(),
        }
    }
}

/// Classifier configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Fraction of the winning score a runner-up needs to be reported
    pub alternate_margin: f64,

    /// Additional keywords keyed by vault name
    pub extra_keywords: HashMap<String, Vec<String>>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            alternate_margin: DEFAULT_ALTERNATE_MARGIN,
            extra_keywords: HashMap::new(),
        }
    }
}
