//! JSON-RPC execution environment built on the Alloy library.
//!
//! Transactions are signed locally by the configured wallet and submitted to
//! an EVM node; each call waits for its receipt before returning.

use crate::{DeliveryError, DeliveryInterface};
use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer;
use alloy::transports::http::reqwest::Url;
use async_trait::async_trait;
use fixture_types::{truncate_hash, Address, Bytes, Receipt};

/// Alloy-based EVM delivery implementation.
pub struct AlloyDelivery {
	/// The Alloy provider for blockchain interaction.
	provider: DynProvider,
	/// Address of the signing wallet.
	sender: Address,
}

impl AlloyDelivery {
	/// Creates a new AlloyDelivery instance.
	///
	/// Configures an Alloy provider with the specified RPC URL and signer
	/// for transaction submission on the given chain.
	pub fn new(
		rpc_url: &str,
		chain_id: u64,
		signer: PrivateKeySigner,
	) -> Result<Self, DeliveryError> {
		let url: Url = rpc_url
			.parse()
			.map_err(|e| DeliveryError::Configuration(format!("Invalid RPC URL: {}", e)))?;

		// Set the chain ID on the signer
		let signer = signer.with_chain_id(Some(chain_id));
		let sender = signer.address();
		let wallet = EthereumWallet::from(signer);

		let provider = ProviderBuilder::new()
			.wallet(wallet)
			.connect_http(url)
			.erased();

		Ok(Self { provider, sender })
	}

	async fn send(&self, request: TransactionRequest) -> Result<Receipt, DeliveryError> {
		let pending = self.provider.send_transaction(request).await.map_err(|e| {
			DeliveryError::Network(format!("Failed to send transaction: {}", e))
		})?;

		let tx_hash = *pending.tx_hash();
		tracing::info!(tx_hash = %truncate_hash(&tx_hash), "Submitted transaction");

		let receipt = pending
			.get_receipt()
			.await
			.map_err(|e| DeliveryError::Network(format!("Failed to get receipt: {}", e)))?;

		Ok(convert_receipt(&receipt))
	}
}

fn convert_receipt(receipt: &TransactionReceipt) -> Receipt {
	Receipt {
		transaction_hash: receipt.transaction_hash,
		block_number: receipt.block_number,
		success: receipt.status(),
		contract_address: receipt.contract_address,
		logs: receipt
			.inner
			.logs()
			.iter()
			.map(|log| log.inner.clone())
			.collect(),
	}
}

#[async_trait]
impl DeliveryInterface for AlloyDelivery {
	fn sender(&self) -> Address {
		self.sender
	}

	async fn accounts(&self) -> Result<Vec<Address>, DeliveryError> {
		self.provider
			.get_accounts()
			.await
			.map_err(|e| DeliveryError::Network(format!("Failed to list accounts: {}", e)))
	}

	async fn submit_create(
		&self,
		code: Bytes,
		constructor_args: Bytes,
	) -> Result<Receipt, DeliveryError> {
		let mut input = code.to_vec();
		input.extend_from_slice(&constructor_args);

		let request = TransactionRequest::default()
			.with_from(self.sender)
			.with_deploy_code(Bytes::from(input));

		self.send(request).await
	}

	async fn submit_call(&self, to: Address, calldata: Bytes) -> Result<Receipt, DeliveryError> {
		let request = TransactionRequest::default()
			.with_from(self.sender)
			.with_to(to)
			.with_input(calldata);

		self.send(request).await
	}

	async fn read_state(&self, to: Address, calldata: Bytes) -> Result<Bytes, DeliveryError> {
		let request = TransactionRequest::default()
			.with_from(self.sender)
			.with_to(to)
			.with_input(calldata);

		self.provider
			.call(request)
			.await
			.map_err(|e| DeliveryError::Network(format!("Failed to read state: {}", e)))
	}
}
