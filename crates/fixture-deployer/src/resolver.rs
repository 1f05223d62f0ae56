//! Recovers the address of a factory-created token from its receipt.

use crate::DeployError;
use alloy::sol_types::SolEvent;
use fixture_types::{bindings::ITokenFactory::TokenCreated, Address, Receipt};
use tracing::debug;

/// Extracts the created token address from a factory `create` receipt.
///
/// Exactly one `TokenCreated` event must be present. Unrelated logs are
/// ignored; no match, or more than one, is an error rather than a guess.
pub fn extract_created_address(receipt: &Receipt) -> Result<Address, DeployError> {
	let matches: Vec<_> = receipt
		.logs_with_signature(TokenCreated::SIGNATURE_HASH)
		.collect();

	let [log] = matches.as_slice() else {
		return Err(DeployError::CreationEventNotFound {
			matches: matches.len(),
		});
	};

	let event = TokenCreated::decode_log_data(&log.data)
		.map_err(|e| DeployError::Decode(format!("Malformed TokenCreated event: {}", e)))?;

	debug!(token = %event.token, manager = %event.manager, "Resolved created token");
	Ok(event.token)
}
