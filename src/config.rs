//! Configuration for CaskKV
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{CaskError, Result};
use crate::segment::HEADER_SIZE;

/// Main configuration for a CaskKV instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all segment files
    /// Internal structure:
    ///   {dir}/
    ///     ├── 0.data.str, 1.data.str, ...   (one run per data type)
    ///     └── merged/                       (compaction scratch space)
    pub dir: PathBuf,

    /// Fixed capacity of every segment file (in bytes)
    pub max_file_size: u64,

    /// Flush the active segment after every write
    pub write_sync: bool,

    // -------------------------------------------------------------------------
    // Limits
    // -------------------------------------------------------------------------
    /// Largest accepted key (in bytes)
    pub max_key_size: u32,

    /// Largest accepted value (in bytes)
    pub max_value_size: u32,

    // -------------------------------------------------------------------------
    // Compaction Configuration
    // -------------------------------------------------------------------------
    /// Interval of the background merge timer, `None` disables it
    pub merge_interval: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./caskkv_data"),
            max_file_size: 1024 * 1024, // 1 MB
            write_sync: false,
            max_key_size: 1024,       // 1 KB
            max_value_size: 8 * 1024, // 8 KB
            merge_interval: Some(Duration::from_secs(24 * 60 * 60)),
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check that the limits describe a usable engine
    pub fn validate(&self) -> Result<()> {
        if self.max_file_size <= HEADER_SIZE as u64 {
            return Err(CaskError::Config(format!(
                "max_file_size must exceed the {} byte entry header, got {}",
                HEADER_SIZE, self.max_file_size
            )));
        }
        if self.max_key_size == 0 {
            return Err(CaskError::Config("max_key_size must be positive".to_string()));
        }
        if let Some(interval) = self.merge_interval {
            if interval.is_zero() {
                return Err(CaskError::Config(
                    "merge_interval must be positive, use None to disable".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for all segments)
    pub fn dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.dir = path.into();
        self
    }

    /// Set the segment capacity (in bytes)
    pub fn max_file_size(mut self, size: u64) -> Self {
        self.config.max_file_size = size;
        self
    }

    /// Flush after every write
    pub fn write_sync(mut self, sync: bool) -> Self {
        self.config.write_sync = sync;
        self
    }

    /// Set the maximum key size (in bytes)
    pub fn max_key_size(mut self, size: u32) -> Self {
        self.config.max_key_size = size;
        self
    }

    /// Set the maximum value size (in bytes)
    pub fn max_value_size(mut self, size: u32) -> Self {
        self.config.max_value_size = size;
        self
    }

    /// Set the background merge interval
    pub fn merge_interval(mut self, interval: Duration) -> Self {
        self.config.merge_interval = Some(interval);
        self
    }

    /// Turn the background merge timer off
    pub fn disable_auto_merge(mut self) -> Self {
        self.config.merge_interval = None;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
