//! In-process execution environment for end-to-end tests.
//!
//! Artifacts are synthetic: each bytecode is `0x60`, a one-byte index into
//! [`ComponentKind::ALL`] and one placeholder per required library. The
//! simulator reads the index back from the linked code, checks the linked
//! library addresses, decodes the constructor arguments and then answers
//! calls with just enough behavior for the fixture flows.

#![allow(dead_code)]

use alloy::primitives::keccak256;
use alloy::sol_types::{SolCall, SolEvent, SolInterface, SolValue};
use async_trait::async_trait;
use fixture_config::FixtureSettings;
use fixture_core::SystemOrchestrator;
use fixture_delivery::{DeliveryError, DeliveryInterface, DeliveryService};
use fixture_deployer::{ArtifactStore, EntityDeployer};
use fixture_linker::{resolve_link_id, LibraryNames};
use fixture_types::bindings::{
	ICompositeToken, IIssuanceModule, IOracleMock, IPriceOracle, IRegistry, ITokenFactory,
	ITokenMock,
};
use fixture_types::{Address, Bytes, ComponentKind, Log, LogData, Receipt, B256, I256, U256};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

pub const SENDER: Address = Address::repeat_byte(0x0a);

/// Accounts the simulated node manages; the sender is the first.
pub fn node_accounts() -> Vec<Address> {
	vec![
		SENDER,
		Address::repeat_byte(0x0b),
		Address::repeat_byte(0x0c),
		Address::repeat_byte(0x0d),
		Address::repeat_byte(0x0e),
	]
}

fn one_ether() -> U256 {
	U256::from(10u64).pow(U256::from(18u64))
}

fn ret<T: SolValue>(value: T) -> Bytes {
	Bytes::from((value,).abi_encode_params())
}

#[derive(Debug, Clone)]
struct RegistryState {
	fee_recipient: Address,
	initialized: bool,
	factories: Vec<Address>,
	modules: Vec<Address>,
	resources: HashMap<U256, Address>,
	tokens: HashSet<Address>,
}

#[derive(Debug, Clone)]
struct CompositeState {
	registry: Address,
	components: Vec<Address>,
	units: Vec<I256>,
	modules: Vec<Address>,
	manager: Address,
	balances: HashMap<Address, U256>,
	total_supply: U256,
}

#[derive(Debug, Clone)]
struct Erc20State {
	decimals: u8,
	balances: HashMap<Address, U256>,
	allowances: HashMap<(Address, Address), U256>,
}

#[derive(Debug, Clone)]
enum Contract {
	Registry(RegistryState),
	Library,
	Module { registry: Address },
	Issuance { registry: Address },
	Factory { registry: Address },
	Composite(CompositeState),
	PriceOracle {
		quote: Address,
		pairs: Vec<(Address, Address, Address)>,
	},
	Erc20(Erc20State),
	Oracle { price: U256 },
}

#[derive(Debug, Clone)]
struct World {
	counter: u64,
	contracts: HashMap<Address, (ComponentKind, Contract)>,
	transactions: usize,
	fail_creation_of: HashSet<ComponentKind>,
	rejected_approvals: HashSet<Address>,
	creation_events: usize,
	issue_calls: usize,
}

impl Default for World {
	fn default() -> Self {
		Self {
			counter: 0,
			contracts: HashMap::new(),
			transactions: 0,
			fail_creation_of: HashSet::new(),
			rejected_approvals: HashSet::new(),
			creation_events: 1,
			issue_calls: 0,
		}
	}
}

type Revert = String;

impl World {
	fn next_address(&mut self) -> Address {
		self.counter += 1;
		let mut bytes = [0u8; 20];
		bytes[0] = 0xc0;
		bytes[12..].copy_from_slice(&self.counter.to_be_bytes());
		Address::from(bytes)
	}

	fn next_hash(&mut self) -> B256 {
		self.counter += 1;
		B256::left_padding_from(&self.counter.to_be_bytes())
	}

	fn kind_of(&self, address: Address) -> Option<ComponentKind> {
		self.contracts.get(&address).map(|(kind, _)| *kind)
	}

	fn create(&mut self, code: &[u8], args: &[u8]) -> Result<Address, Revert> {
		if code.len() < 2 || code[0] != 0x60 {
			return Err("unknown bytecode".to_string());
		}
		let kind = *ComponentKind::ALL
			.get(code[1] as usize)
			.ok_or("unknown component index")?;

		let libraries = kind.required_libraries();
		let linked = &code[2..];
		if linked.len() != libraries.len() * 20 {
			return Err(format!("{} has unlinked or extra code", kind));
		}
		for (library, chunk) in libraries.iter().zip(linked.chunks(20)) {
			let address = Address::from_slice(chunk);
			if self.kind_of(address) != Some(library.kind()) {
				return Err(format!("{} linked against {} which is not {}", kind, address, library));
			}
		}

		if self.fail_creation_of.contains(&kind) {
			return Err(format!("{} constructor reverted", kind));
		}

		let decode = |e: alloy::sol_types::Error| format!("{} constructor args: {}", kind, e);
		let contract = match kind {
			ComponentKind::Registry => {
				let (fee_recipient,) = <(Address,)>::abi_decode_params(args).map_err(decode)?;
				Contract::Registry(RegistryState {
					fee_recipient,
					initialized: false,
					factories: vec![],
					modules: vec![],
					resources: HashMap::new(),
					tokens: HashSet::new(),
				})
			}
			ComponentKind::DataUtils | ComponentKind::InternalUtils => Contract::Library,
			ComponentKind::FeeModule
			| ComponentKind::IntegrationRegistry
			| ComponentKind::Valuer => {
				let (registry,) = <(Address,)>::abi_decode_params(args).map_err(decode)?;
				Contract::Module { registry }
			}
			ComponentKind::IssuanceModule => {
				let (registry,) = <(Address,)>::abi_decode_params(args).map_err(decode)?;
				Contract::Issuance { registry }
			}
			ComponentKind::TokenFactory => {
				let (registry,) = <(Address,)>::abi_decode_params(args).map_err(decode)?;
				Contract::Factory { registry }
			}
			ComponentKind::CompositeToken => {
				let (components, units, modules, registry, manager, _name, _symbol) =
					<(
						Vec<Address>,
						Vec<I256>,
						Vec<Address>,
						Address,
						Address,
						String,
						String,
					)>::abi_decode_params(args)
					.map_err(decode)?;
				composite(registry, components, units, modules, manager)?
			}
			ComponentKind::PriceOracle => {
				let (_registry, quote, _adapters, ones, twos, oracles) = <(
					Address,
					Address,
					Vec<Address>,
					Vec<Address>,
					Vec<Address>,
					Vec<Address>,
				)>::abi_decode_params(args)
				.map_err(decode)?;
				if ones.len() != twos.len() || ones.len() != oracles.len() {
					return Err("price oracle pair arrays differ in length".to_string());
				}
				let pairs = ones
					.into_iter()
					.zip(twos)
					.zip(oracles)
					.map(|((one, two), oracle)| (one, two, oracle))
					.collect();
				Contract::PriceOracle { quote, pairs }
			}
			ComponentKind::TokenMock => {
				let (holder, balance, _name, _symbol, decimals) =
					<(Address, U256, String, String, U256)>::abi_decode_params(args)
						.map_err(decode)?;
				Contract::Erc20(Erc20State {
					decimals: decimals.to::<u8>(),
					balances: HashMap::from([(holder, balance)]),
					allowances: HashMap::new(),
				})
			}
			ComponentKind::OracleMock => {
				let (price,) = <(U256,)>::abi_decode_params(args).map_err(decode)?;
				Contract::Oracle { price }
			}
		};

		let address = self.next_address();
		self.contracts.insert(address, (kind, contract));
		Ok(address)
	}

	fn call(&mut self, from: Address, to: Address, data: &[u8]) -> Result<Vec<Log>, Revert> {
		let kind = self.kind_of(to).ok_or("call to empty account")?;
		match kind {
			ComponentKind::Registry => self.registry_call(to, data),
			ComponentKind::TokenFactory => self.factory_call(to, data),
			ComponentKind::IssuanceModule => self.issuance_call(from, to, data),
			ComponentKind::TokenMock => self.erc20_call(from, to, data),
			ComponentKind::CompositeToken => Err("only modules may mint".to_string()),
			other => Err(format!("{} has no state-changing operations", other)),
		}
	}

	fn registry_mut(&mut self, address: Address) -> Result<&mut RegistryState, Revert> {
		match self.contracts.get_mut(&address) {
			Some((_, Contract::Registry(state))) => Ok(state),
			_ => Err(format!("{} is not a registry", address)),
		}
	}

	fn registry(&self, address: Address) -> Result<&RegistryState, Revert> {
		match self.contracts.get(&address) {
			Some((_, Contract::Registry(state))) => Ok(state),
			_ => Err(format!("{} is not a registry", address)),
		}
	}

	fn registry_call(&mut self, to: Address, data: &[u8]) -> Result<Vec<Log>, Revert> {
		let call = IRegistry::IRegistryCalls::abi_decode(data).map_err(|e| e.to_string())?;
		let registry = self.registry_mut(to)?;

		match call {
			IRegistry::IRegistryCalls::initialize(call) => {
				if registry.initialized {
					return Err("Registry: already initialized".to_string());
				}
				if call.resources.len() != call.resourceIds.len() {
					return Err("Registry: array lengths mismatch".to_string());
				}
				registry.factories = call.factories;
				registry.modules = call.modules;
				registry.resources = call.resourceIds.into_iter().zip(call.resources).collect();
				registry.initialized = true;
				Ok(vec![])
			}
			_ => Err("Registry: only factories may add tokens".to_string()),
		}
	}

	fn factory_call(&mut self, to: Address, data: &[u8]) -> Result<Vec<Log>, Revert> {
		let ITokenFactory::ITokenFactoryCalls::create(call) =
			ITokenFactory::ITokenFactoryCalls::abi_decode(data).map_err(|e| e.to_string())?;

		let registry_address = match self.contracts.get(&to) {
			Some((_, Contract::Factory { registry })) => *registry,
			_ => return Err("not a factory".to_string()),
		};
		if !self.registry(registry_address)?.factories.contains(&to) {
			return Err("Registry: factory not enabled".to_string());
		}

		let contract = composite(
			registry_address,
			call.components,
			call.units,
			call.modules,
			call.manager,
		)?;
		let token = self.next_address();
		self.contracts
			.insert(token, (ComponentKind::CompositeToken, contract));
		self.registry_mut(registry_address)?.tokens.insert(token);

		let mut logs = vec![Log {
			address: registry_address,
			data: LogData::new_unchecked(
				vec![keccak256("TokenAdded(address)"), token.into_word()],
				Bytes::new(),
			),
		}];
		for _ in 0..self.creation_events {
			let event = ITokenFactory::TokenCreated {
				token,
				manager: call.manager,
				name: call.name.clone(),
				symbol: call.symbol.clone(),
			};
			logs.push(Log {
				address: to,
				data: event.encode_log_data(),
			});
		}
		Ok(logs)
	}

	fn issuance_call(
		&mut self,
		from: Address,
		to: Address,
		data: &[u8],
	) -> Result<Vec<Log>, Revert> {
		let registry_address = match self.contracts.get(&to) {
			Some((_, Contract::Issuance { registry })) => *registry,
			_ => return Err("not an issuance module".to_string()),
		};

		match IIssuanceModule::IIssuanceModuleCalls::abi_decode(data).map_err(|e| e.to_string())? {
			IIssuanceModule::IIssuanceModuleCalls::initialize(call) => {
				let manager = match self.contracts.get(&call.token) {
					Some((_, Contract::Composite(token))) => token.manager,
					_ => return Err("not a composite token".to_string()),
				};
				if manager != from {
					return Err("Issuance: caller is not the manager".to_string());
				}
				Ok(vec![])
			}
			IIssuanceModule::IIssuanceModuleCalls::issue(call) => {
				if !self.registry(registry_address)?.tokens.contains(&call.token) {
					return Err("Issuance: token not registered".to_string());
				}
				let (components, units) = match self.contracts.get(&call.token) {
					Some((_, Contract::Composite(token))) => {
						(token.components.clone(), token.units.clone())
					}
					_ => return Err("not a composite token".to_string()),
				};

				let mut logs = vec![];
				for (component, unit) in components.into_iter().zip(units) {
					let required = required_units(unit, call.quantity)?;
					logs.push(self.transfer_from(component, to, from, call.token, required)?);
				}

				match self.contracts.get_mut(&call.token) {
					Some((_, Contract::Composite(token))) => {
						*token.balances.entry(call.to).or_default() += call.quantity;
						token.total_supply += call.quantity;
					}
					_ => return Err("not a composite token".to_string()),
				}
				self.issue_calls += 1;
				Ok(logs)
			}
		}
	}

	fn erc20_mut(&mut self, token: Address) -> Result<&mut Erc20State, Revert> {
		match self.contracts.get_mut(&token) {
			Some((_, Contract::Erc20(state))) => Ok(state),
			_ => Err(format!("{} is not a token", token)),
		}
	}

	fn transfer_from(
		&mut self,
		token: Address,
		spender: Address,
		from: Address,
		to: Address,
		amount: U256,
	) -> Result<Log, Revert> {
		let state = self.erc20_mut(token)?;
		let allowance = state
			.allowances
			.get(&(from, spender))
			.copied()
			.unwrap_or_default();
		if allowance < amount {
			return Err("ERC20: insufficient allowance".to_string());
		}
		if allowance != U256::MAX {
			state.allowances.insert((from, spender), allowance - amount);
		}
		move_balance(state, from, to, amount)?;

		Ok(Log {
			address: token,
			data: ITokenMock::Transfer {
				from,
				to,
				value: amount,
			}
			.encode_log_data(),
		})
	}

	fn erc20_call(&mut self, from: Address, to: Address, data: &[u8]) -> Result<Vec<Log>, Revert> {
		match ITokenMock::ITokenMockCalls::abi_decode(data).map_err(|e| e.to_string())? {
			ITokenMock::ITokenMockCalls::approve(call) => {
				if self.rejected_approvals.contains(&to) {
					return Err("ERC20: approvals paused".to_string());
				}
				let state = self.erc20_mut(to)?;
				state.allowances.insert((from, call.spender), call.amount);
				Ok(vec![Log {
					address: to,
					data: ITokenMock::Approval {
						owner: from,
						spender: call.spender,
						value: call.amount,
					}
					.encode_log_data(),
				}])
			}
			ITokenMock::ITokenMockCalls::transfer(call) => {
				let state = self.erc20_mut(to)?;
				move_balance(state, from, call.to, call.amount)?;
				Ok(vec![])
			}
			ITokenMock::ITokenMockCalls::transferFrom(call) => {
				let log = self.transfer_from(to, from, call.from, call.to, call.amount)?;
				Ok(vec![log])
			}
			_ => Err("not a state-changing function".to_string()),
		}
	}

	fn view(&self, to: Address, data: &[u8]) -> Result<Bytes, Revert> {
		let (_, contract) = self.contracts.get(&to).ok_or("call to empty account")?;
		let malformed = |e: alloy::sol_types::Error| e.to_string();

		match contract {
			Contract::Registry(registry) => {
				use IRegistry::IRegistryCalls as Calls;
				match Calls::abi_decode(data).map_err(malformed)? {
					Calls::isInitialized(_) => Ok(ret(registry.initialized)),
					Calls::getFactories(_) => Ok(ret(registry.factories.clone())),
					Calls::getModules(_) => Ok(ret(registry.modules.clone())),
					Calls::resourceId(call) => Ok(ret(registry
						.resources
						.get(&call.id)
						.copied()
						.unwrap_or_default())),
					Calls::isToken(call) => Ok(ret(registry.tokens.contains(&call.token))),
					Calls::feeRecipient(_) => Ok(ret(registry.fee_recipient)),
					_ => Err("not a view function".to_string()),
				}
			}
			Contract::Composite(token) => {
				use ICompositeToken::ICompositeTokenCalls as Calls;
				match Calls::abi_decode(data).map_err(malformed)? {
					Calls::getPositions(_) => {
						let positions: Vec<ICompositeToken::Position> = token
							.components
							.iter()
							.zip(&token.units)
							.map(|(component, unit)| ICompositeToken::Position {
								component: *component,
								module: Address::ZERO,
								unit: *unit,
								positionState: 0,
								data: Bytes::new(),
							})
							.collect();
						Ok(ret(positions))
					}
					Calls::getComponents(_) => Ok(ret(token.components.clone())),
					Calls::balanceOf(call) => Ok(ret(token
						.balances
						.get(&call.account)
						.copied()
						.unwrap_or_default())),
					Calls::totalSupply(_) => Ok(ret(token.total_supply)),
					Calls::manager(_) => Ok(ret(token.manager)),
					Calls::mint(_) => Err("not a view function".to_string()),
				}
			}
			Contract::Erc20(state) => {
				use ITokenMock::ITokenMockCalls as Calls;
				match Calls::abi_decode(data).map_err(malformed)? {
					Calls::allowance(call) => Ok(ret(state
						.allowances
						.get(&(call.owner, call.spender))
						.copied()
						.unwrap_or_default())),
					Calls::balanceOf(call) => Ok(ret(state
						.balances
						.get(&call.account)
						.copied()
						.unwrap_or_default())),
					Calls::decimals(_) => Ok(ret(U256::from(state.decimals))),
					_ => Err("not a view function".to_string()),
				}
			}
			Contract::Oracle { price } => {
				IOracleMock::readCall::abi_decode(data).map_err(malformed)?;
				Ok(ret(*price))
			}
			Contract::PriceOracle { quote, pairs } => {
				use IPriceOracle::IPriceOracleCalls as Calls;
				match Calls::abi_decode(data).map_err(malformed)? {
					Calls::masterQuoteAsset(_) => Ok(ret(*quote)),
					Calls::getPrice(call) => {
						for (one, two, feed) in pairs {
							let price = match self.contracts.get(feed) {
								Some((_, Contract::Oracle { price })) => *price,
								_ => return Err("feed is not an oracle".to_string()),
							};
							if *one == call.assetOne && *two == call.assetTwo {
								return Ok(ret(price));
							}
							if *one == call.assetTwo && *two == call.assetOne {
								return Ok(ret(one_ether() * one_ether() / price));
							}
						}
						Err("PriceOracle: price not found".to_string())
					}
				}
			}
			Contract::Library
			| Contract::Module { .. }
			| Contract::Issuance { .. }
			| Contract::Factory { .. } => Err("no view functions".to_string()),
		}
	}
}

fn composite(
	registry: Address,
	components: Vec<Address>,
	units: Vec<I256>,
	modules: Vec<Address>,
	manager: Address,
) -> Result<Contract, Revert> {
	if components.len() != units.len() {
		return Err("CompositeToken: components and units differ in length".to_string());
	}
	Ok(Contract::Composite(CompositeState {
		registry,
		components,
		units,
		modules,
		manager,
		balances: HashMap::new(),
		total_supply: U256::ZERO,
	}))
}

/// Component amount needed for `quantity` tokens, rounded up.
pub fn required_units(unit: I256, quantity: U256) -> Result<U256, Revert> {
	if unit.is_negative() {
		return Err("Issuance: negative unit".to_string());
	}
	let unit = unit.into_raw();
	let one = one_ether();
	Ok((unit * quantity + one - U256::from(1u64)) / one)
}

fn move_balance(
	state: &mut Erc20State,
	from: Address,
	to: Address,
	amount: U256,
) -> Result<(), Revert> {
	let balance = state.balances.get(&from).copied().unwrap_or_default();
	if balance < amount {
		return Err("ERC20: transfer amount exceeds balance".to_string());
	}
	state.balances.insert(from, balance - amount);
	*state.balances.entry(to).or_default() += amount;
	Ok(())
}

/// Shared handle to a simulated chain.
#[derive(Clone, Default)]
pub struct Simulator {
	world: Arc<Mutex<World>>,
}

impl Simulator {
	pub fn new() -> Self {
		Self::default()
	}

	/// Synthetic artifacts for every component kind.
	pub fn artifacts(names: &LibraryNames) -> ArtifactStore {
		let mut store = ArtifactStore::new();
		for (index, kind) in ComponentKind::ALL.iter().enumerate() {
			let mut code = format!("0x60{:02x}", index);
			for library in kind.required_libraries() {
				code.push_str(resolve_link_id(names.name(*library)).as_str());
			}
			store.insert(kind.contract_name(), code);
		}
		store
	}

	pub fn fail_creation_of(&self, kind: ComponentKind) {
		self.world.lock().unwrap().fail_creation_of.insert(kind);
	}

	pub fn set_creation_events(&self, count: usize) {
		self.world.lock().unwrap().creation_events = count;
	}

	pub fn reject_approvals_on(&self, token: Address) {
		self.world.lock().unwrap().rejected_approvals.insert(token);
	}

	pub fn transaction_count(&self) -> usize {
		self.world.lock().unwrap().transactions
	}

	pub fn issue_calls(&self) -> usize {
		self.world.lock().unwrap().issue_calls
	}

	pub fn kind_of(&self, address: Address) -> Option<ComponentKind> {
		self.world.lock().unwrap().kind_of(address)
	}

	fn receipt(
		world: &mut World,
		success: bool,
		contract_address: Option<Address>,
		logs: Vec<Log>,
	) -> Receipt {
		Receipt {
			transaction_hash: world.next_hash(),
			block_number: Some(world.transactions as u64),
			success,
			contract_address,
			logs,
		}
	}
}

#[async_trait]
impl DeliveryInterface for Simulator {
	fn sender(&self) -> Address {
		SENDER
	}

	async fn accounts(&self) -> Result<Vec<Address>, DeliveryError> {
		Ok(node_accounts())
	}

	async fn submit_create(
		&self,
		code: Bytes,
		constructor_args: Bytes,
	) -> Result<Receipt, DeliveryError> {
		let mut world = self.world.lock().unwrap();
		world.transactions += 1;

		match world.create(&code, &constructor_args) {
			Ok(address) => Ok(Self::receipt(&mut world, true, Some(address), vec![])),
			Err(_) => Ok(Self::receipt(&mut world, false, None, vec![])),
		}
	}

	async fn submit_call(&self, to: Address, calldata: Bytes) -> Result<Receipt, DeliveryError> {
		let mut world = self.world.lock().unwrap();
		world.transactions += 1;

		// Reverts roll back every change the call made
		let snapshot = world.clone();
		match world.call(SENDER, to, &calldata) {
			Ok(logs) => Ok(Self::receipt(&mut world, true, None, logs)),
			Err(_) => {
				*world = snapshot;
				Ok(Self::receipt(&mut world, false, None, vec![]))
			}
		}
	}

	async fn read_state(&self, to: Address, calldata: Bytes) -> Result<Bytes, DeliveryError> {
		let world = self.world.lock().unwrap();
		world
			.view(to, &calldata)
			.map_err(|reason| DeliveryError::Network(format!("execution reverted: {}", reason)))
	}
}

/// An orchestrator wired to a fresh simulator with default settings.
pub fn orchestrator() -> (Simulator, SystemOrchestrator) {
	orchestrator_with(FixtureSettings::default())
}

pub fn orchestrator_with(settings: FixtureSettings) -> (Simulator, SystemOrchestrator) {
	let simulator = Simulator::new();
	let names = LibraryNames::default();
	let deployer = EntityDeployer::new(
		Arc::new(DeliveryService::new(Box::new(simulator.clone()))),
		Arc::new(Simulator::artifacts(&names)),
		names,
	);
	(simulator, SystemOrchestrator::new(deployer, settings))
}
