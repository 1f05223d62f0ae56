//! Typed handles to deployed programs.
//!
//! An [`Instance<C>`] is an address plus the operations of component `C`.
//! Handles are cheap to clone and share the delivery service they were
//! created with.

use crate::DeployError;
use alloy::sol_types::SolCall;
use fixture_delivery::DeliveryService;
use fixture_linker::LinkTable;
use fixture_types::bindings::{
	ICompositeToken, IIssuanceModule, IOracleMock, IPriceOracle, IRegistry, ITokenFactory,
	ITokenMock,
};
use fixture_types::{
	Address, Bytes, ComponentKind, Position, Receipt, RegistryInitArgs, ResourceId, I256, U256,
};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::info;

/// Marker for a deployable program kind.
pub trait Component: Send + Sync + 'static {
	const KIND: ComponentKind;
}

macro_rules! component {
	($($(#[$meta:meta])* $name:ident),* $(,)?) => {
		$(
			$(#[$meta])*
			#[derive(Debug, Clone, Copy, PartialEq, Eq)]
			pub struct $name;

			impl Component for $name {
				const KIND: ComponentKind = ComponentKind::$name;
			}
		)*
	};
}

component!(
	/// Central registry of factories, modules and resources.
	Registry,
	DataUtils,
	InternalUtils,
	IssuanceModule,
	FeeModule,
	IntegrationRegistry,
	TokenFactory,
	CompositeToken,
	PriceOracle,
	Valuer,
	/// Mock fungible token.
	TokenMock,
	/// Mock fixed-price feed.
	OracleMock,
);

/// Handle to a deployed or attached program of kind `C`.
pub struct Instance<C: Component> {
	address: Address,
	link_table: Option<LinkTable>,
	delivery: Arc<DeliveryService>,
	_kind: PhantomData<C>,
}

impl<C: Component> Clone for Instance<C> {
	fn clone(&self) -> Self {
		Self {
			address: self.address,
			link_table: self.link_table.clone(),
			delivery: self.delivery.clone(),
			_kind: PhantomData,
		}
	}
}

impl<C: Component> fmt::Debug for Instance<C> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Instance")
			.field("kind", &C::KIND)
			.field("address", &self.address)
			.field("linked", &self.link_table.is_some())
			.finish()
	}
}

impl<C: Component> Instance<C> {
	pub(crate) fn new(
		address: Address,
		link_table: Option<LinkTable>,
		delivery: Arc<DeliveryService>,
	) -> Self {
		Self {
			address,
			link_table,
			delivery,
			_kind: PhantomData,
		}
	}

	pub fn address(&self) -> Address {
		self.address
	}

	pub fn kind(&self) -> ComponentKind {
		C::KIND
	}

	/// Link table the instance was created or attached with.
	pub fn link_table(&self) -> Option<&LinkTable> {
		self.link_table.as_ref()
	}

	async fn send<T: SolCall>(&self, call: T) -> Result<Receipt, DeployError> {
		let receipt = self
			.delivery
			.call(self.address, Bytes::from(call.abi_encode()))
			.await?;
		Ok(receipt)
	}

	async fn read<T: SolCall>(&self, call: T) -> Result<T::Return, DeployError> {
		let data = self
			.delivery
			.read(self.address, Bytes::from(call.abi_encode()))
			.await?;

		T::abi_decode_returns(&data).map_err(|e| {
			DeployError::Decode(format!("{} returned malformed data: {}", C::KIND, e))
		})
	}
}

impl Instance<Registry> {
	/// Performs the one-time registration.
	///
	/// Arguments are validated and the registry's own flag is checked before
	/// anything is submitted, so a rejected call leaves no trace on chain.
	pub async fn initialize(&self, args: &RegistryInitArgs) -> Result<Receipt, DeployError> {
		args.validate()?;

		if self.is_initialized().await? {
			return Err(DeployError::RegistryReinitialization {
				registry: self.address,
			});
		}

		let receipt = self.send(args.to_call()).await?;
		info!(
			registry = %self.address,
			factories = args.factories.len(),
			modules = args.modules.len(),
			resources = args.resources.len(),
			"Registry initialized"
		);
		Ok(receipt)
	}

	pub async fn is_initialized(&self) -> Result<bool, DeployError> {
		self.read(IRegistry::isInitializedCall {}).await
	}

	pub async fn factories(&self) -> Result<Vec<Address>, DeployError> {
		self.read(IRegistry::getFactoriesCall {}).await
	}

	pub async fn modules(&self) -> Result<Vec<Address>, DeployError> {
		self.read(IRegistry::getModulesCall {}).await
	}

	pub async fn resource(&self, id: ResourceId) -> Result<Address, DeployError> {
		self.read(IRegistry::resourceIdCall { id: id.id() }).await
	}

	pub async fn is_token(&self, token: Address) -> Result<bool, DeployError> {
		self.read(IRegistry::isTokenCall { token }).await
	}

	pub async fn fee_recipient(&self) -> Result<Address, DeployError> {
		self.read(IRegistry::feeRecipientCall {}).await
	}
}

impl Instance<TokenFactory> {
	/// Submits a token creation. The created address is only available from
	/// the receipt's `TokenCreated` event.
	pub async fn create(
		&self,
		components: Vec<Address>,
		units: Vec<I256>,
		modules: Vec<Address>,
		manager: Address,
		name: String,
		symbol: String,
	) -> Result<Receipt, DeployError> {
		self.send(ITokenFactory::createCall {
			components,
			units,
			modules,
			manager,
			name,
			symbol,
		})
		.await
	}
}

impl Instance<CompositeToken> {
	pub async fn positions(&self) -> Result<Vec<Position>, DeployError> {
		let positions = self.read(ICompositeToken::getPositionsCall {}).await?;
		Ok(positions.into_iter().map(Position::from).collect())
	}

	pub async fn components(&self) -> Result<Vec<Address>, DeployError> {
		self.read(ICompositeToken::getComponentsCall {}).await
	}

	pub async fn balance_of(&self, account: Address) -> Result<U256, DeployError> {
		self.read(ICompositeToken::balanceOfCall { account }).await
	}

	pub async fn total_supply(&self) -> Result<U256, DeployError> {
		self.read(ICompositeToken::totalSupplyCall {}).await
	}

	pub async fn manager(&self) -> Result<Address, DeployError> {
		self.read(ICompositeToken::managerCall {}).await
	}
}

impl Instance<IssuanceModule> {
	/// Enables issuance for a token. Must be sent by the token's manager.
	pub async fn initialize_token(
		&self,
		token: Address,
		pre_issue_hook: Address,
	) -> Result<Receipt, DeployError> {
		self.send(IIssuanceModule::initializeCall {
			token,
			preIssueHook: pre_issue_hook,
		})
		.await
	}

	pub async fn issue(
		&self,
		token: Address,
		quantity: U256,
		to: Address,
	) -> Result<Receipt, DeployError> {
		self.send(IIssuanceModule::issueCall {
			token,
			quantity,
			to,
		})
		.await
	}
}

impl Instance<TokenMock> {
	pub async fn approve(&self, spender: Address, amount: U256) -> Result<Receipt, DeployError> {
		self.send(ITokenMock::approveCall { spender, amount }).await
	}

	pub async fn transfer(&self, to: Address, amount: U256) -> Result<Receipt, DeployError> {
		self.send(ITokenMock::transferCall { to, amount }).await
	}

	pub async fn allowance(&self, owner: Address, spender: Address) -> Result<U256, DeployError> {
		self.read(ITokenMock::allowanceCall { owner, spender }).await
	}

	pub async fn balance_of(&self, account: Address) -> Result<U256, DeployError> {
		self.read(ITokenMock::balanceOfCall { account }).await
	}

	pub async fn decimals(&self) -> Result<u8, DeployError> {
		self.read(ITokenMock::decimalsCall {}).await
	}
}

impl Instance<OracleMock> {
	pub async fn price(&self) -> Result<U256, DeployError> {
		self.read(IOracleMock::readCall {}).await
	}
}

impl Instance<PriceOracle> {
	pub async fn price(&self, asset_one: Address, asset_two: Address) -> Result<U256, DeployError> {
		self.read(IPriceOracle::getPriceCall {
			assetOne: asset_one,
			assetTwo: asset_two,
		})
		.await
	}

	pub async fn master_quote_asset(&self) -> Result<Address, DeployError> {
		self.read(IPriceOracle::masterQuoteAssetCall {}).await
	}
}
