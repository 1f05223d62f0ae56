//! Account management for the fixture owner.
//!
//! The owner account signs every deployment and call. Only local private-key
//! wallets are supported, which is what development nodes hand out.

use alloy::signers::local::PrivateKeySigner;
use fixture_types::Address;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AccountError {
	#[error("Invalid key: {0}")]
	InvalidKey(String),
}

/// Local wallet implementation using Alloy's signer.
///
/// This implementation manages a private key locally. It's suitable for
/// development and testing environments where key management simplicity is
/// preferred.
#[derive(Clone)]
pub struct LocalWallet {
	/// The underlying Alloy signer that handles cryptographic operations.
	signer: PrivateKeySigner,
}

impl LocalWallet {
	/// Creates a new LocalWallet from a hex-encoded private key.
	///
	/// The private key may be given with or without the 0x prefix.
	pub fn new(private_key_hex: &str) -> Result<Self, AccountError> {
		validate_private_key(private_key_hex)?;

		let signer = private_key_hex
			.parse::<PrivateKeySigner>()
			.map_err(|e| AccountError::InvalidKey(format!("Invalid private key: {}", e)))?;

		Ok(Self { signer })
	}

	pub fn address(&self) -> Address {
		self.signer.address()
	}

	/// Signer to hand to a delivery provider.
	pub fn signer(&self) -> PrivateKeySigner {
		self.signer.clone()
	}
}

/// Checks that a private key is 32 bytes of hex, with an optional 0x prefix.
pub fn validate_private_key(key: &str) -> Result<(), AccountError> {
	let key_without_prefix = key.strip_prefix("0x").unwrap_or(key);

	if key_without_prefix.len() != 64 {
		return Err(AccountError::InvalidKey(
			"Private key must be 64 hex characters (32 bytes)".to_string(),
		));
	}

	if hex::decode(key_without_prefix).is_err() {
		return Err(AccountError::InvalidKey(
			"Private key must be valid hexadecimal".to_string(),
		));
	}

	Ok(())
}
