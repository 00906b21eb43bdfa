//! Storage configuration, presets and the TOML config file.

use crate::{CodecError, Result};
use serde::{Deserialize, Serialize};
use sheetcell_image::CompressionPolicy;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Characters a single spreadsheet cell may hold.
pub const DEFAULT_CELL_CAPACITY: usize = 50_000;

/// Cells reserved per image.
pub const DEFAULT_CELL_SLOTS: usize = 2;

/// Largest output side in pixels.
pub const DEFAULT_MAX_DIMENSION: u32 = 2560;

/// Environment variable overriding [`StorageConfig::single_cell_capacity`].
pub const CAPACITY_ENV: &str = "SHEETCELL_CELL_CAPACITY";

const CONFIG_CANDIDATES: [&str; 3] = [".sheetcell.toml", "sheetcell.toml", ".config/sheetcell.toml"];

/// Where and how an asset is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Characters per cell
    #[serde(default = "default_cell_capacity")]
    pub single_cell_capacity: usize,

    /// Cells per asset
    #[serde(default = "default_cell_slots")]
    pub cell_slots: usize,

    /// Initial envelope width
    #[serde(default = "default_max_dimension")]
    pub max_width: u32,

    /// Initial envelope height
    #[serde(default = "default_max_dimension")]
    pub max_height: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            single_cell_capacity: default_cell_capacity(),
            cell_slots: default_cell_slots(),
            max_width: default_max_dimension(),
            max_height: default_max_dimension(),
        }
    }
}

fn default_cell_capacity() -> usize {
    DEFAULT_CELL_CAPACITY
}

fn default_cell_slots() -> usize {
    DEFAULT_CELL_SLOTS
}

fn default_max_dimension() -> u32 {
    DEFAULT_MAX_DIMENSION
}

impl StorageConfig {
    /// Total characters available across every slot.
    pub fn ceiling(&self) -> usize {
        self.single_cell_capacity.saturating_mul(self.cell_slots)
    }

    /// Builder-style method to set the per-cell capacity
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.single_cell_capacity = capacity;
        self
    }

    /// Builder-style method to set the dimension envelope
    #[must_use]
    pub fn with_envelope(mut self, max_width: u32, max_height: u32) -> Self {
        self.max_width = max_width;
        self.max_height = max_height;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.single_cell_capacity == 0 {
            return Err(CodecError::Config("single_cell_capacity must be at least 1".into()));
        }
        if self.cell_slots == 0 {
            return Err(CodecError::Config("cell_slots must be at least 1".into()));
        }
        if self.max_width == 0 || self.max_height == 0 {
            return Err(CodecError::Config(format!(
                "dimension envelope must be non-zero, got {}x{}",
                self.max_width, self.max_height
            )));
        }
        Ok(())
    }
}

/// Named call sites with their own compression defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// Product photos
    #[default]
    Product,
    /// Portfolio main and detail images
    Portfolio,
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Preset::Product => f.write_str("product"),
            Preset::Portfolio => f.write_str("portfolio"),
        }
    }
}

impl FromStr for Preset {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "product" | "products" => Ok(Preset::Product),
            "portfolio" => Ok(Preset::Portfolio),
            other => Err(CodecError::Config(format!("unknown preset: {other}"))),
        }
    }
}

/// Root configuration schema
///
/// Policy tables may be partial; missing keys take the product defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigSchema {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default = "CompressionPolicy::product")]
    pub product: CompressionPolicy,

    #[serde(default = "CompressionPolicy::portfolio")]
    pub portfolio: CompressionPolicy,
}

impl Default for ConfigSchema {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            product: CompressionPolicy::product(),
            portfolio: CompressionPolicy::portfolio(),
        }
    }
}

impl ConfigSchema {
    /// Compression policy for a preset.
    pub fn policy(&self, preset: Preset) -> &CompressionPolicy {
        match preset {
            Preset::Product => &self.product,
            Preset::Portfolio => &self.portfolio,
        }
    }

    /// Validate storage settings and every policy.
    pub fn validate(&self) -> Result<()> {
        self.storage.validate()?;
        for preset in [Preset::Product, Preset::Portfolio] {
            self.policy(preset)
                .validate()
                .map_err(|e| CodecError::Config(format!("[{preset}] {e}")))?;
        }
        Ok(())
    }
}

/// Configuration wrapper
#[derive(Debug, Clone)]
pub struct Config {
    pub schema: ConfigSchema,
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a file path or use defaults
    ///
    /// Without an explicit path the standard locations are searched. The
    /// capacity environment override is applied last, then everything is
    /// validated.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = path.map(Path::to_path_buf).or_else(find_config_file);

        let schema = match config_path {
            Some(ref p) => load_config_file(p)?,
            None => ConfigSchema::default(),
        };

        let mut config = Self {
            schema,
            path: config_path,
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.schema.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment-like lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(CAPACITY_ENV) {
            let capacity = raw.trim().parse::<usize>().map_err(|e| {
                CodecError::Config(format!("{CAPACITY_ENV}={raw} is not a valid capacity: {e}"))
            })?;
            self.schema.storage.single_cell_capacity = capacity;
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema: ConfigSchema::default(),
            path: None,
        }
    }
}

/// Find configuration file in standard locations
fn find_config_file() -> Option<PathBuf> {
    CONFIG_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|candidate| candidate.exists())
}

/// Load and parse a TOML configuration file
fn load_config_file(path: &Path) -> Result<ConfigSchema> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        CodecError::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;

    toml::from_str(&content).map_err(|e| {
        CodecError::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })
}
