//! Daemon configuration.
//!
//! Loaded from a TOML file. Every field has a default, so a missing file or a partial file is
//! fine.

use crate::factom::Bytes32;
use crate::pegnet::ChainTracking;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("IO error reading {path:?}: {source}")]
	IoError {
		path: PathBuf,
		source: std::io::Error,
	},

	#[error("Config parse error: {0}")]
	ParseError(#[from] toml::de::Error),

	#[error("Invalid config: {0}")]
	Invalid(String),
}

/// Complete daemon configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
	pub factomd: FactomdConfig,
	pub sync: SyncSettings,
	/// Chain name to hex chain id. Replaces or adds to the default pegnet chains.
	pub tracking: BTreeMap<String, Bytes32>,
	pub grading: GradingConfig,
	pub logging: LoggingConfig,
}

/// factomd connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FactomdConfig {
	/// v2 API endpoint
	pub url: String,
	/// Timeout of a single HTTP request in seconds
	pub request_timeout_secs: u64,
	/// How long a request is retried on transport errors, in seconds
	pub max_retry_elapsed_secs: u64,
}

impl Default for FactomdConfig {
	fn default() -> Self {
		Self {
			url: "http://localhost:8088/v2".to_string(),
			request_timeout_secs: 30,
			max_retry_elapsed_secs: 10,
		}
	}
}

/// Synchronizer settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
	/// Wait between passes when caught up or after a failure, in seconds
	pub retry_period_secs: u64,
	/// Where graded blocks and the sync cursor are stored
	pub data_dir: PathBuf,
}

impl Default for SyncSettings {
	fn default() -> Self {
		Self {
			retry_period_secs: 5,
			data_dir: PathBuf::from("./data"),
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GradingConfig {
	/// Number of winning records per graded block
	pub winners: usize,
	/// Oracle price record version accepted by the grader
	pub opr_version: u8,
}

impl Default for GradingConfig {
	fn default() -> Self {
		Self {
			winners: 25,
			opr_version: 2,
		}
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
	/// Default filter directive, overridden by `RUST_LOG`
	pub level: String,
}

impl Default for LoggingConfig {
	fn default() -> Self {
		Self {
			level: "info".to_string(),
		}
	}
}

impl Config {
	/// Load configuration from `path`, falling back to defaults when the file does not exist.
	pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
		if !path.exists() {
			return Ok(Self::default());
		}
		Self::load_from_file(path)
	}

	pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
		let content = std::fs::read_to_string(path).map_err(|source| ConfigError::IoError {
			path: path.to_path_buf(),
			source,
		})?;
		let config: Config = toml::from_str(&content)?;
		config.validate()?;
		Ok(config)
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.factomd.url.trim().is_empty() {
			return Err(ConfigError::Invalid("factomd.url must not be empty".to_string()));
		}
		if self.sync.retry_period_secs == 0 {
			return Err(ConfigError::Invalid(
				"sync.retry_period_secs must be greater than 0".to_string(),
			));
		}
		if self.grading.winners == 0 {
			return Err(ConfigError::Invalid(
				"grading.winners must be greater than 0".to_string(),
			));
		}
		Ok(())
	}

	pub fn retry_period(&self) -> Duration {
		Duration::from_secs(self.sync.retry_period_secs)
	}

	pub fn request_timeout(&self) -> Duration {
		Duration::from_secs(self.factomd.request_timeout_secs)
	}

	pub fn max_retry_elapsed(&self) -> Duration {
		Duration::from_secs(self.factomd.max_retry_elapsed_secs)
	}

	/// Default pegnet chains with the configured overrides applied.
	pub fn chain_tracking(&self) -> ChainTracking {
		self.tracking
			.iter()
			.fold(ChainTracking::default(), |tracking, (name, chain_id)| {
				tracking.with_chain(name.clone(), *chain_id)
			})
	}
}
