//! Execution environment boundary for the protocol fixture.
//!
//! Every interaction with the chain goes through a [`DeliveryInterface`]:
//! creating a program, calling a state-changing operation, or reading state.
//! Each is a single blocking round trip; nothing at this layer retries.

use async_trait::async_trait;
use fixture_types::{truncate_hash, Address, Bytes, Receipt, B256};
use thiserror::Error;
use tracing::{debug, info};

/// Re-export implementations
pub mod implementations {
	pub mod evm {
		pub mod alloy;
	}
}

/// Errors that can occur while talking to the execution environment.
#[derive(Debug, Error)]
pub enum DeliveryError {
	/// Transport, RPC or confirmation failure.
	#[error("Network error: {0}")]
	Network(String),
	/// The transaction was mined but reverted.
	#[error("Transaction {0} reverted")]
	Reverted(B256),
	/// A creation transaction succeeded without reporting a program address.
	#[error("Creation transaction {0} did not report a contract address")]
	MissingContractAddress(B256),
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Trait defining the operations consumed from the execution environment.
///
/// Implementations submit transactions from a single sender account and
/// block until they are confirmed.
#[async_trait]
pub trait DeliveryInterface: Send + Sync {
	/// Account every transaction is sent from.
	fn sender(&self) -> Address;

	/// Accounts the environment manages, in its own order.
	async fn accounts(&self) -> Result<Vec<Address>, DeliveryError>;

	/// Submits a creation transaction and waits for its receipt.
	async fn submit_create(
		&self,
		code: Bytes,
		constructor_args: Bytes,
	) -> Result<Receipt, DeliveryError>;

	/// Submits a state-changing call and waits for its receipt.
	async fn submit_call(&self, to: Address, calldata: Bytes) -> Result<Receipt, DeliveryError>;

	/// Executes a call without changing state.
	async fn read_state(&self, to: Address, calldata: Bytes) -> Result<Bytes, DeliveryError>;
}

/// High-level delivery service that checks receipts.
///
/// Failed receipts are turned into [`DeliveryError::Reverted`] so callers only
/// ever see successful results.
pub struct DeliveryService {
	/// The underlying environment implementation.
	provider: Box<dyn DeliveryInterface>,
}

impl DeliveryService {
	pub fn new(provider: Box<dyn DeliveryInterface>) -> Self {
		Self { provider }
	}

	pub fn sender(&self) -> Address {
		self.provider.sender()
	}

	pub async fn accounts(&self) -> Result<Vec<Address>, DeliveryError> {
		self.provider.accounts().await
	}

	/// Creates a program and returns its address together with the receipt.
	pub async fn create(
		&self,
		code: Bytes,
		constructor_args: Bytes,
	) -> Result<(Address, Receipt), DeliveryError> {
		let receipt = self.provider.submit_create(code, constructor_args).await?;
		if !receipt.success {
			return Err(DeliveryError::Reverted(receipt.transaction_hash));
		}

		let address = receipt
			.contract_address
			.ok_or(DeliveryError::MissingContractAddress(receipt.transaction_hash))?;

		info!(
			tx_hash = %truncate_hash(&receipt.transaction_hash),
			%address,
			"Program created"
		);
		Ok((address, receipt))
	}

	/// Submits a call and returns its receipt.
	pub async fn call(&self, to: Address, calldata: Bytes) -> Result<Receipt, DeliveryError> {
		let receipt = self.provider.submit_call(to, calldata).await?;
		if !receipt.success {
			return Err(DeliveryError::Reverted(receipt.transaction_hash));
		}

		debug!(
			tx_hash = %truncate_hash(&receipt.transaction_hash),
			%to,
			logs = receipt.logs.len(),
			"Call confirmed"
		);
		Ok(receipt)
	}

	pub async fn read(&self, to: Address, calldata: Bytes) -> Result<Bytes, DeliveryError> {
		self.provider.read_state(to, calldata).await
	}
}
