//! Runtime configuration
//!
//! Everything has a built-in default, so an empty file (or no file) is a
//! valid configuration.
//!
//! ```toml
//! vendor_id = 0x1532
//! log_level = "info"
//! identity_pairs = [[0x007A, 0x007B]]
//!
//! [timing]
//! write_read_delay_ms = 5
//! busy_retry_delay_ms = 100
//! transfer_timeout_ms = 1000
//! query_timeout_ms = 5000
//! ```

use crate::catalogue::RAZER_VENDOR_ID;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid log filter: {0}")]
    LogFilter(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// USB vendor id to scan for
    pub vendor_id: u16,
    /// Default tracing filter when RUST_LOG is unset
    pub log_level: String,
    /// Extra wired/wireless product id pairs, on top of the built-in ones
    pub identity_pairs: Vec<[u16; 2]>,
    pub timing: Timing,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            vendor_id: RAZER_VENDOR_ID,
            log_level: "info".to_string(),
            identity_pairs: Vec::new(),
            timing: Timing::default(),
        }
    }
}

impl Config {
    /// Load a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }
}

/// Firmware timing knobs. Tuned empirically; they carry no protocol meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timing {
    /// Pause between SET_REPORT and GET_REPORT
    pub write_read_delay_ms: u64,
    /// Pause before repeating a request answered with BUSY
    pub busy_retry_delay_ms: u64,
    /// Per control transfer
    pub transfer_timeout_ms: u64,
    /// Whole query: open, exchange, close
    pub query_timeout_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            write_read_delay_ms: 5,
            busy_retry_delay_ms: 100,
            transfer_timeout_ms: 1000,
            query_timeout_ms: 5000,
        }
    }
}

impl Timing {
    pub fn write_read_delay(&self) -> Duration {
        Duration::from_millis(self.write_read_delay_ms)
    }

    pub fn busy_retry_delay(&self) -> Duration {
        Duration::from_millis(self.busy_retry_delay_ms)
    }

    pub fn transfer_timeout(&self) -> Duration {
        Duration::from_millis(self.transfer_timeout_ms)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }
}
