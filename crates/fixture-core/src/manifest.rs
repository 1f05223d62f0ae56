//! Serializable record of a deployed system.

use fixture_types::Address;
use serde::{Deserialize, Serialize};

/// Every address of a deployed fixture, enough to attach to it again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemManifest {
	pub owner: Address,
	pub fee_recipient: Address,
	pub registry: Address,
	pub data_utils: Address,
	pub internal_utils: Address,
	pub issuance_module: Address,
	pub fee_module: Address,
	pub integration_registry: Address,
	pub token_factory: Address,
	pub price_oracle: Address,
	pub valuer: Address,
	pub mocks: Vec<MockManifest>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MockManifest {
	pub symbol: String,
	pub token: Address,
	pub feed: Address,
}

impl SystemManifest {
	pub fn to_json(&self) -> Result<String, serde_json::Error> {
		serde_json::to_string_pretty(self)
	}

	pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str(json)
	}
}
