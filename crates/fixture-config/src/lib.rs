//! Configuration loading for the protocol fixture.
//!
//! Configuration is a TOML file. `${VAR}` references anywhere in the file are
//! replaced with environment variables before parsing, and a handful of
//! prefixed variables (`FIXTURE_RPC_URL`, `FIXTURE_CHAIN_ID`,
//! `FIXTURE_PRIVATE_KEY`, `FIXTURE_LOG_LEVEL`) override parsed values.

use fixture_linker::LibraryName;
use regex::Regex;
use std::collections::HashSet;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

mod types;

pub use types::*;

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("File not found: {0}")]
	FileNotFound(String),

	#[error("Parse error: {0}")]
	ParseError(String),

	#[error("Validation error: {0}")]
	ValidationError(String),

	#[error("Environment variable not found: {0}")]
	EnvVarNotFound(String),

	#[error("IO error: {0}")]
	IoError(#[from] std::io::Error),
}

/// Configuration loader with environment variable substitution
#[derive(Debug)]
pub struct ConfigLoader {
	file_path: Option<String>,
	env_prefix: String,
}

impl Default for ConfigLoader {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigLoader {
	pub fn new() -> Self {
		Self {
			file_path: None,
			env_prefix: "FIXTURE_".to_string(),
		}
	}

	pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
		self.file_path = Some(path.as_ref().to_string_lossy().to_string());
		self
	}

	pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.env_prefix = prefix.into();
		self
	}

	pub async fn load(&self) -> Result<FixtureConfig, ConfigError> {
		let file_path = self.file_path.as_ref().ok_or_else(|| {
			ConfigError::FileNotFound("No configuration file specified".to_string())
		})?;

		if !Path::new(file_path).exists() {
			return Err(ConfigError::FileNotFound(file_path.clone()));
		}

		let content = tokio::fs::read_to_string(file_path).await?;
		self.load_from_str(&content)
	}

	/// Parses, overrides and validates configuration from TOML text.
	pub fn load_from_str(&self, content: &str) -> Result<FixtureConfig, ConfigError> {
		let substituted = substitute_env_vars(content)?;

		let mut config: FixtureConfig =
			toml::from_str(&substituted).map_err(|e| ConfigError::ParseError(e.to_string()))?;

		self.apply_env_overrides(&mut config)?;
		validate_config(&config)?;

		Ok(config)
	}

	fn apply_env_overrides(&self, config: &mut FixtureConfig) -> Result<(), ConfigError> {
		if let Ok(rpc_url) = env::var(format!("{}RPC_URL", self.env_prefix)) {
			debug!("Overriding RPC URL from environment");
			config.network.rpc_url = rpc_url;
		}

		if let Ok(chain_id) = env::var(format!("{}CHAIN_ID", self.env_prefix)) {
			config.network.chain_id = chain_id
				.parse()
				.map_err(|e| ConfigError::ValidationError(format!("Invalid chain id: {}", e)))?;
		}

		if let Ok(private_key) = env::var(format!("{}PRIVATE_KEY", self.env_prefix)) {
			debug!("Overriding private key from environment");
			config.network.private_key = private_key;
		}

		if let Ok(log_level) = env::var(format!("{}LOG_LEVEL", self.env_prefix)) {
			config.fixture.log_level = log_level;
		}

		Ok(())
	}
}

/// Replaces `${VAR_NAME}` patterns with environment values.
fn substitute_env_vars(content: &str) -> Result<String, ConfigError> {
	let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ConfigError::ParseError(e.to_string()))?;
	let mut result = content.to_string();

	for cap in re.captures_iter(content) {
		let full_match = &cap[0];
		let var_name = &cap[1];

		let env_value =
			env::var(var_name).map_err(|_| ConfigError::EnvVarNotFound(var_name.to_string()))?;

		result = result.replace(full_match, &env_value);
	}

	Ok(result)
}

fn validate_config(config: &FixtureConfig) -> Result<(), ConfigError> {
	let url = &config.network.rpc_url;
	if !(url.starts_with("http://") || url.starts_with("https://")) {
		return Err(ConfigError::ValidationError(
			"RPC URL must start with http:// or https://".to_string(),
		));
	}

	if config.network.chain_id == 0 {
		return Err(ConfigError::ValidationError(
			"Chain id must be positive".to_string(),
		));
	}

	// The first token is the price oracle's quote asset
	if config.fixture.tokens.is_empty() {
		return Err(ConfigError::ValidationError(
			"At least one mock token must be configured".to_string(),
		));
	}

	let mut symbols = HashSet::new();
	for token in &config.fixture.tokens {
		if !symbols.insert(token.symbol.as_str()) {
			return Err(ConfigError::ValidationError(format!(
				"Duplicate mock token symbol: {}",
				token.symbol
			)));
		}
	}

	fixture_account::validate_private_key(&config.network.private_key)
		.map_err(|e| ConfigError::ValidationError(format!("Owner key: {}", e)))?;

	for name in [&config.libraries.data_utils, &config.libraries.internal_utils] {
		LibraryName::parse(name).map_err(|_| {
			ConfigError::ValidationError(format!(
				"Library name {} must be fully qualified (path/File.sol:Name)",
				name
			))
		})?;
	}

	Ok(())
}
