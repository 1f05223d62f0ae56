//! Configuration types for the protocol fixture.

use fixture_types::{Address, Library, U256};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Complete fixture configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FixtureConfig {
	/// Node connection and owner credentials
	pub network: NetworkConfig,
	/// Where compiled program artifacts are read from
	pub artifacts: ArtifactsConfig,
	/// Fully qualified names of the shared libraries
	#[serde(default)]
	pub libraries: LibrariesConfig,
	/// Fixture contents
	#[serde(default)]
	pub fixture: FixtureSettings,
}

/// Node connection and owner credentials
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
	/// HTTP RPC endpoint URL
	pub rpc_url: String,
	/// Chain id used for replay protection
	pub chain_id: u64,
	/// Owner private key; usually given as ${ENV_VAR}
	pub private_key: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArtifactsConfig {
	/// Hardhat `artifacts/` or Foundry `out/` directory
	pub directory: PathBuf,
}

/// Fully qualified library names, as they appear in compiler output
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LibrariesConfig {
	#[serde(default = "default_data_utils")]
	pub data_utils: String,
	#[serde(default = "default_internal_utils")]
	pub internal_utils: String,
}

impl Default for LibrariesConfig {
	fn default() -> Self {
		Self {
			data_utils: default_data_utils(),
			internal_utils: default_internal_utils(),
		}
	}
}

fn default_data_utils() -> String {
	Library::DataUtils.default_name().to_string()
}

fn default_internal_utils() -> String {
	Library::InternalUtils.default_name().to_string()
}

/// What the fixture deploys besides the protocol programs
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FixtureSettings {
	/// Protocol fee recipient; falls back to the node's fourth account
	pub fee_recipient: Option<Address>,
	/// Log level (trace, debug, info, warn, error)
	#[serde(default = "default_log_level")]
	pub log_level: String,
	/// Mock tokens, each with its own price feed. The first one is the
	/// price oracle's master quote asset.
	#[serde(default = "default_tokens")]
	pub tokens: Vec<MockTokenConfig>,
}

impl Default for FixtureSettings {
	fn default() -> Self {
		Self {
			fee_recipient: None,
			log_level: default_log_level(),
			tokens: default_tokens(),
		}
	}
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_tokens() -> Vec<MockTokenConfig> {
	vec![
		MockTokenConfig::new("USDC", 6, 10_000, 1),
		MockTokenConfig::new("WBTC", 8, 10_000, 9_000),
		MockTokenConfig::new("DAI", 18, 1_000_000, 1),
	]
}

/// A mock fungible token and the price of its feed
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct MockTokenConfig {
	pub symbol: String,
	pub decimals: u8,
	/// Balance minted to the owner, in whole ether units (x 10^18)
	pub initial_balance: u64,
	/// Feed price in whole ether units (x 10^18)
	pub price: u64,
}

impl MockTokenConfig {
	pub fn new(symbol: &str, decimals: u8, initial_balance: u64, price: u64) -> Self {
		Self {
			symbol: symbol.to_string(),
			decimals,
			initial_balance,
			price,
		}
	}

	pub fn initial_balance_wei(&self) -> U256 {
		ether(self.initial_balance)
	}

	pub fn price_wei(&self) -> U256 {
		ether(self.price)
	}
}

/// Scales a whole amount by 10^18.
pub fn ether(amount: u64) -> U256 {
	U256::from(amount) * U256::from(10u64).pow(U256::from(18u64))
}
