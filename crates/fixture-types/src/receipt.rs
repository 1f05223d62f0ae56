//! Transaction receipt types.
//!
//! A [`Receipt`] is what every round trip to the execution environment hands
//! back once the transaction is confirmed. Its log list keeps the emission
//! order of the transaction.

use alloy::primitives::{Address, Log, B256};

/// Confirmed transaction result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
	/// The hash of the transaction.
	pub transaction_hash: B256,
	/// The block number where the transaction was included.
	pub block_number: Option<u64>,
	/// Whether the transaction executed successfully.
	pub success: bool,
	/// Address of the created program, present for direct creations only.
	pub contract_address: Option<Address>,
	/// Emitted events in emission order.
	pub logs: Vec<Log>,
}

impl Receipt {
	/// Logs whose first topic equals the given event signature hash.
	pub fn logs_with_signature(&self, signature: B256) -> impl Iterator<Item = &Log> {
		self.logs
			.iter()
			.filter(move |log| log.topics().first() == Some(&signature))
	}
}

/// Utility function to truncate a transaction hash for display.
pub fn truncate_hash(hash: &B256) -> String {
	let hash_str = hex::encode(hash.0);
	format!("{}..", &hash_str[..8])
}
