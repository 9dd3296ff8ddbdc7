//! Runtime configuration for the asset storage.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	/// The configuration file could not be read.
	#[error("failed to read {}: {source}", path.display())]
	Io {
		/// File that failed to load.
		path: PathBuf,
		/// Underlying I/O error.
		#[source]
		source: std::io::Error,
	},
	/// The configuration is not valid TOML for [`RemoteConfig`].
	#[error("invalid configuration: {0}")]
	Parse(#[from] toml::de::Error),
}

/// Top-level configuration, usually read from `cohost.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RemoteConfig {
	/// Pooled scratch collections.
	pub pool: PoolConfig,
	/// Asset search behavior.
	pub search: SearchConfig,
	/// Logging.
	pub log: LogConfig,
}

impl RemoteConfig {
	/// Parses configuration from TOML text. Missing fields take defaults.
	pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
		Ok(toml::from_str(text)?)
	}

	/// Loads configuration from a TOML file.
	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
			path: path.to_path_buf(),
			source,
		})?;
		Self::from_toml_str(&text)
	}
}

/// Limits for the scratch collection pools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PoolConfig {
	/// Maximum idle collections kept per pool.
	#[serde(default = "default_pool_capacity")]
	pub capacity: usize,
	/// Collections whose capacity grew past this are dropped instead of reused.
	#[serde(default = "default_max_retained_len")]
	pub max_retained_len: usize,
}

fn default_pool_capacity() -> usize {
	32
}

fn default_max_retained_len() -> usize {
	4096
}

impl Default for PoolConfig {
	fn default() -> Self {
		Self {
			capacity: default_pool_capacity(),
			max_retained_len: default_max_retained_len(),
		}
	}
}

/// Asset search behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchConfig {
	/// Yield to the runtime after each project visited.
	#[serde(default = "default_yield_between_subtrees")]
	pub yield_between_subtrees: bool,
}

fn default_yield_between_subtrees() -> bool {
	true
}

impl Default for SearchConfig {
	fn default() -> Self {
		Self {
			yield_between_subtrees: default_yield_between_subtrees(),
		}
	}
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
	/// `tracing` filter directive used when `RUST_LOG` is unset.
	#[serde(default = "default_log_filter")]
	pub filter: String,
}

fn default_log_filter() -> String {
	"info".into()
}

impl Default for LogConfig {
	fn default() -> Self {
		Self {
			filter: default_log_filter(),
		}
	}
}
