use crate::{DeploymentPlan, MockManifest, OrchestratorError, Stage, SystemManifest};
use alloy::sol_types::SolValue;
use fixture_config::{FixtureSettings, MockTokenConfig};
use fixture_deployer::{
	extract_created_address, CompositeToken, DataUtils, EntityDeployer, FeeModule, Instance,
	IntegrationRegistry, InternalUtils, IssuanceModule, OracleMock, PriceOracle, Registry,
	TokenFactory, TokenMock, Valuer,
};
use fixture_linker::LinkTable;
use fixture_types::{Address, Bytes, Library, Receipt, RegistryInitArgs, ResourceId, I256, U256};
use tracing::{debug, info, instrument};

/// Index of the node account used as fee recipient when none is configured.
const FEE_RECIPIENT_ACCOUNT: usize = 3;

/// A mock token together with its price feed.
#[derive(Debug, Clone)]
pub struct MockAsset {
	pub symbol: String,
	pub token: Instance<TokenMock>,
	pub feed: Instance<OracleMock>,
}

/// A fully wired protocol fixture.
#[derive(Debug, Clone)]
pub struct System {
	pub owner: Address,
	pub fee_recipient: Address,
	pub registry: Instance<Registry>,
	pub data_utils: Instance<DataUtils>,
	pub internal_utils: Instance<InternalUtils>,
	pub issuance: Instance<IssuanceModule>,
	pub fee_module: Instance<FeeModule>,
	pub integration_registry: Instance<IntegrationRegistry>,
	pub factory: Instance<TokenFactory>,
	pub price_oracle: Instance<PriceOracle>,
	pub valuer: Instance<Valuer>,
	/// In configuration order; the first one is the oracle's quote asset.
	pub mocks: Vec<MockAsset>,
}

impl System {
	pub fn mock(&self, symbol: &str) -> Option<&MockAsset> {
		self.mocks.iter().find(|mock| mock.symbol == symbol)
	}

	pub fn manifest(&self) -> SystemManifest {
		SystemManifest {
			owner: self.owner,
			fee_recipient: self.fee_recipient,
			registry: self.registry.address(),
			data_utils: self.data_utils.address(),
			internal_utils: self.internal_utils.address(),
			issuance_module: self.issuance.address(),
			fee_module: self.fee_module.address(),
			integration_registry: self.integration_registry.address(),
			token_factory: self.factory.address(),
			price_oracle: self.price_oracle.address(),
			valuer: self.valuer.address(),
			mocks: self
				.mocks
				.iter()
				.map(|mock| MockManifest {
					symbol: mock.symbol.clone(),
					token: mock.token.address(),
					feed: mock.feed.address(),
				})
				.collect(),
		}
	}
}

/// Outputs of the stages run so far.
#[derive(Default)]
struct DeploymentContext {
	owner: Address,
	fee_recipient: Address,
	registry: Option<Instance<Registry>>,
	data_utils: Option<Instance<DataUtils>>,
	internal_utils: Option<Instance<InternalUtils>>,
	issuance: Option<Instance<IssuanceModule>>,
	mocks: Option<Vec<MockAsset>>,
	fee_module: Option<Instance<FeeModule>>,
	integration_registry: Option<Instance<IntegrationRegistry>>,
	factory: Option<Instance<TokenFactory>>,
	price_oracle: Option<Instance<PriceOracle>>,
	valuer: Option<Instance<Valuer>>,
	initialized: bool,
}

fn require<'a, T>(
	value: &'a Option<T>,
	stage: Stage,
	dependency: &'static str,
) -> Result<&'a T, OrchestratorError> {
	value
		.as_ref()
		.ok_or(OrchestratorError::MissingDependency { stage, dependency })
}

fn produced<T>(value: Option<T>, dependency: &str) -> Result<T, OrchestratorError> {
	value.ok_or_else(|| {
		OrchestratorError::InvalidPlan(format!("no stage produced {}", dependency))
	})
}

impl DeploymentContext {
	fn into_system(self) -> Result<System, OrchestratorError> {
		if !self.initialized {
			return Err(OrchestratorError::InvalidPlan(
				"registry was never initialized".to_string(),
			));
		}

		Ok(System {
			owner: self.owner,
			fee_recipient: self.fee_recipient,
			registry: produced(self.registry, "registry")?,
			data_utils: produced(self.data_utils, "data utils library")?,
			internal_utils: produced(self.internal_utils, "internal utils library")?,
			issuance: produced(self.issuance, "issuance module")?,
			fee_module: produced(self.fee_module, "fee module")?,
			integration_registry: produced(self.integration_registry, "integration registry")?,
			factory: produced(self.factory, "token factory")?,
			price_oracle: produced(self.price_oracle, "price oracle")?,
			valuer: produced(self.valuer, "valuer")?,
			mocks: produced(self.mocks, "mock tokens")?,
		})
	}
}

fn single_address(address: Address) -> Bytes {
	Bytes::from((address,).abi_encode_params())
}

/// Constructor arguments of a token mock: holder, balance, name, symbol, decimals.
///
/// The `uint8` decimals travel as a full ABI word.
fn token_mock_args(owner: Address, config: &MockTokenConfig) -> Bytes {
	let args = (
		owner,
		config.initial_balance_wei(),
		config.symbol.clone(),
		config.symbol.clone(),
		U256::from(config.decimals),
	)
		.abi_encode_params();
	Bytes::from(args)
}

/// Deploys the fixture and drives the flows that span several components.
pub struct SystemOrchestrator {
	deployer: EntityDeployer,
	settings: FixtureSettings,
	plan: DeploymentPlan,
	system: Option<System>,
}

impl SystemOrchestrator {
	pub fn new(deployer: EntityDeployer, settings: FixtureSettings) -> Self {
		Self {
			deployer,
			settings,
			plan: DeploymentPlan::standard(),
			system: None,
		}
	}

	pub fn with_plan(mut self, plan: DeploymentPlan) -> Self {
		self.plan = plan;
		self
	}

	pub fn deployer(&self) -> &EntityDeployer {
		&self.deployer
	}

	/// The wired system, once initialized or attached.
	pub fn system(&self) -> Option<&System> {
		self.system.as_ref()
	}

	fn require_system(&self) -> Result<&System, OrchestratorError> {
		self.system.as_ref().ok_or(OrchestratorError::NotInitialized)
	}

	/// Runs every deployment stage and initializes the registry.
	///
	/// Stages run in plan order and the first failure stops the run. A
	/// second call fails without submitting anything.
	pub async fn initialize(&mut self) -> Result<&System, OrchestratorError> {
		if let Some(system) = &self.system {
			return Err(OrchestratorError::RegistryReinitialization {
				registry: system.registry.address(),
			});
		}

		let order = self.plan.complete_order()?;
		let mut context = DeploymentContext {
			owner: self.deployer.delivery().sender(),
			..Default::default()
		};

		for stage in order {
			info!(%stage, "Running stage");
			self.run_stage(stage, &mut context)
				.await
				.map_err(|source| OrchestratorError::Stage {
					stage,
					source: Box::new(source),
				})?;
			debug!(%stage, "Stage complete");
		}

		let system = context.into_system()?;
		info!(
			registry = %system.registry.address(),
			factory = %system.factory.address(),
			mocks = system.mocks.len(),
			"System initialized"
		);
		Ok(&*self.system.insert(system))
	}

	async fn run_stage(
		&self,
		stage: Stage,
		context: &mut DeploymentContext,
	) -> Result<(), OrchestratorError> {
		match stage {
			Stage::Registry => self.deploy_registry(context).await,
			Stage::Libraries => self.deploy_libraries(context).await,
			Stage::IssuanceAndMocks => self.deploy_issuance_and_mocks(context).await,
			Stage::Components => self.deploy_components(context).await,
			Stage::RegistryInitialization => self.initialize_registry(context).await,
		}
	}

	async fn resolve_fee_recipient(&self, owner: Address) -> Result<Address, OrchestratorError> {
		if let Some(recipient) = self.settings.fee_recipient {
			return Ok(recipient);
		}

		let accounts = self
			.deployer
			.delivery()
			.accounts()
			.await
			.map_err(fixture_deployer::DeployError::Call)?;
		Ok(accounts
			.get(FEE_RECIPIENT_ACCOUNT)
			.copied()
			.unwrap_or(owner))
	}

	async fn deploy_registry(
		&self,
		context: &mut DeploymentContext,
	) -> Result<(), OrchestratorError> {
		let fee_recipient = self.resolve_fee_recipient(context.owner).await?;
		let registry = self
			.deployer
			.deploy::<Registry>(single_address(fee_recipient), None)
			.await?;

		context.fee_recipient = fee_recipient;
		context.registry = Some(registry);
		Ok(())
	}

	async fn deploy_libraries(
		&self,
		context: &mut DeploymentContext,
	) -> Result<(), OrchestratorError> {
		context.data_utils = Some(self.deployer.deploy::<DataUtils>(Bytes::new(), None).await?);
		context.internal_utils = Some(
			self.deployer
				.deploy::<InternalUtils>(Bytes::new(), None)
				.await?,
		);
		Ok(())
	}

	fn library_table(
		&self,
		context: &DeploymentContext,
		stage: Stage,
		library: Library,
	) -> Result<LinkTable, OrchestratorError> {
		let address = match library {
			Library::DataUtils => {
				require(&context.data_utils, stage, "data utils library")?.address()
			}
			Library::InternalUtils => {
				require(&context.internal_utils, stage, "internal utils library")?.address()
			}
		};
		Ok(self.deployer.link_table([(library, address)])?)
	}

	async fn deploy_issuance_and_mocks(
		&self,
		context: &mut DeploymentContext,
	) -> Result<(), OrchestratorError> {
		let stage = Stage::IssuanceAndMocks;
		let registry = require(&context.registry, stage, "registry")?.address();
		let data_utils = self.library_table(context, stage, Library::DataUtils)?;

		let issuance = self
			.deployer
			.deploy::<IssuanceModule>(single_address(registry), Some(data_utils))
			.await?;

		let mut mocks = Vec::with_capacity(self.settings.tokens.len());
		for config in &self.settings.tokens {
			let mock = self.deploy_mock(config, context.owner).await?;
			mock.token.approve(issuance.address(), U256::MAX).await?;
			mocks.push(mock);
		}

		context.issuance = Some(issuance);
		context.mocks = Some(mocks);
		Ok(())
	}

	async fn deploy_mock(
		&self,
		config: &MockTokenConfig,
		owner: Address,
	) -> Result<MockAsset, OrchestratorError> {
		let token = self
			.deployer
			.deploy::<TokenMock>(token_mock_args(owner, config), None)
			.await?;

		let feed_args = (config.price_wei(),).abi_encode_params();
		let feed = self
			.deployer
			.deploy::<OracleMock>(Bytes::from(feed_args), None)
			.await?;

		debug!(
			symbol = %config.symbol,
			token = %token.address(),
			feed = %feed.address(),
			"Mock deployed"
		);
		Ok(MockAsset {
			symbol: config.symbol.clone(),
			token,
			feed,
		})
	}

	async fn deploy_components(
		&self,
		context: &mut DeploymentContext,
	) -> Result<(), OrchestratorError> {
		let stage = Stage::Components;
		let registry = require(&context.registry, stage, "registry")?.address();
		let mocks = require(&context.mocks, stage, "mock tokens")?;
		let quote = mocks
			.first()
			.ok_or(OrchestratorError::MissingDependency {
				stage,
				dependency: "a quote asset",
			})?
			.token
			.address();

		let integration_registry = self
			.deployer
			.deploy::<IntegrationRegistry>(single_address(registry), None)
			.await?;

		let internal_utils = self.library_table(context, stage, Library::InternalUtils)?;
		let factory = self
			.deployer
			.deploy::<TokenFactory>(single_address(registry), Some(internal_utils))
			.await?;

		let asset_ones: Vec<Address> = mocks.iter().map(|mock| mock.token.address()).collect();
		let asset_twos: Vec<Address> = vec![quote; mocks.len()];
		let oracles: Vec<Address> = mocks.iter().map(|mock| mock.feed.address()).collect();
		let oracle_args = (
			registry,
			quote,
			Vec::<Address>::new(),
			asset_ones,
			asset_twos,
			oracles,
		)
			.abi_encode_params();
		let price_oracle = self
			.deployer
			.deploy::<PriceOracle>(Bytes::from(oracle_args), None)
			.await?;

		let data_utils = self.library_table(context, stage, Library::DataUtils)?;
		let valuer = self
			.deployer
			.deploy::<Valuer>(single_address(registry), Some(data_utils.clone()))
			.await?;
		let fee_module = self
			.deployer
			.deploy::<FeeModule>(single_address(registry), Some(data_utils))
			.await?;

		context.integration_registry = Some(integration_registry);
		context.factory = Some(factory);
		context.price_oracle = Some(price_oracle);
		context.valuer = Some(valuer);
		context.fee_module = Some(fee_module);
		Ok(())
	}

	async fn initialize_registry(
		&self,
		context: &mut DeploymentContext,
	) -> Result<(), OrchestratorError> {
		let stage = Stage::RegistryInitialization;
		let registry = require(&context.registry, stage, "registry")?;

		let args = RegistryInitArgs::new(
			vec![require(&context.factory, stage, "token factory")?.address()],
			vec![
				require(&context.issuance, stage, "issuance module")?.address(),
				require(&context.fee_module, stage, "fee module")?.address(),
			],
		)
		.with_resource(
			ResourceId::IntegrationRegistry,
			require(&context.integration_registry, stage, "integration registry")?.address(),
		)
		.with_resource(
			ResourceId::PriceOracle,
			require(&context.price_oracle, stage, "price oracle")?.address(),
		)
		.with_resource(
			ResourceId::Valuer,
			require(&context.valuer, stage, "valuer")?.address(),
		);

		registry.initialize(&args).await?;
		context.initialized = true;
		Ok(())
	}

	fn internal_utils_table(&self, system: &System) -> Result<LinkTable, OrchestratorError> {
		Ok(self
			.deployer
			.link_table([(Library::InternalUtils, system.internal_utils.address())])?)
	}

	/// Creates a registered composite token through the factory.
	///
	/// The token's address is recovered from the creation event, then a
	/// handle linked against the internal utils library is attached to it.
	#[instrument(skip_all, fields(symbol = %symbol))]
	pub async fn create_token(
		&self,
		components: Vec<Address>,
		units: Vec<I256>,
		modules: Vec<Address>,
		manager: Address,
		name: &str,
		symbol: &str,
	) -> Result<Instance<CompositeToken>, OrchestratorError> {
		check_positions(&components, &units)?;
		let system = self.require_system()?;

		let receipt = system
			.factory
			.create(
				components,
				units,
				modules,
				manager,
				name.to_string(),
				symbol.to_string(),
			)
			.await?;
		let address = extract_created_address(&receipt)?;

		let table = self.internal_utils_table(system)?;
		let token = self.deployer.attach::<CompositeToken>(address, Some(table))?;
		info!(token = %address, "Composite token created");
		Ok(token)
	}

	/// Deploys a composite token directly, bypassing the factory.
	///
	/// The token points at the registry but is never registered with it.
	pub async fn create_unregistered_token(
		&self,
		components: Vec<Address>,
		units: Vec<I256>,
		modules: Vec<Address>,
		manager: Address,
		name: &str,
		symbol: &str,
	) -> Result<Instance<CompositeToken>, OrchestratorError> {
		check_positions(&components, &units)?;
		let system = self.require_system()?;

		let args = (
			components,
			units,
			modules,
			system.registry.address(),
			manager,
			name.to_string(),
			symbol.to_string(),
		)
			.abi_encode_params();
		let table = self.internal_utils_table(system)?;

		Ok(self
			.deployer
			.deploy::<CompositeToken>(Bytes::from(args), Some(table))
			.await?)
	}

	/// Issues `quantity` of `token` to `recipient` from the owner's
	/// components.
	///
	/// Every component is approved for the issuance module first; a failed
	/// approval aborts before anything is issued.
	pub async fn issue(
		&self,
		token: &Instance<CompositeToken>,
		quantity: U256,
		recipient: Address,
	) -> Result<Receipt, OrchestratorError> {
		let system = self.require_system()?;
		let spender = system.issuance.address();

		for position in token.positions().await? {
			let component = self
				.deployer
				.attach::<TokenMock>(position.component, None)?;
			component
				.approve(spender, U256::MAX)
				.await
				.map_err(|source| OrchestratorError::Allowance {
					component: position.component,
					source,
				})?;
		}

		let receipt = system
			.issuance
			.issue(token.address(), quantity, recipient)
			.await?;
		info!(token = %token.address(), %quantity, %recipient, "Issued");
		Ok(receipt)
	}

	/// Rebuilds the system from a manifest without deploying anything.
	pub fn attach(&mut self, manifest: &SystemManifest) -> Result<&System, OrchestratorError> {
		if let Some(system) = &self.system {
			return Err(OrchestratorError::RegistryReinitialization {
				registry: system.registry.address(),
			});
		}

		let deployer = &self.deployer;
		let data_utils = deployer.link_table([(Library::DataUtils, manifest.data_utils)])?;
		let internal_utils =
			deployer.link_table([(Library::InternalUtils, manifest.internal_utils)])?;

		let mocks = manifest
			.mocks
			.iter()
			.map(|mock| -> Result<MockAsset, OrchestratorError> {
				Ok(MockAsset {
					symbol: mock.symbol.clone(),
					token: deployer.attach(mock.token, None)?,
					feed: deployer.attach(mock.feed, None)?,
				})
			})
			.collect::<Result<Vec<_>, _>>()?;

		let system = System {
			owner: manifest.owner,
			fee_recipient: manifest.fee_recipient,
			registry: deployer.attach(manifest.registry, None)?,
			data_utils: deployer.attach(manifest.data_utils, None)?,
			internal_utils: deployer.attach(manifest.internal_utils, None)?,
			issuance: deployer.attach(manifest.issuance_module, Some(data_utils.clone()))?,
			fee_module: deployer.attach(manifest.fee_module, Some(data_utils.clone()))?,
			integration_registry: deployer.attach(manifest.integration_registry, None)?,
			factory: deployer.attach(manifest.token_factory, Some(internal_utils))?,
			price_oracle: deployer.attach(manifest.price_oracle, None)?,
			valuer: deployer.attach(manifest.valuer, Some(data_utils))?,
			mocks,
		};

		info!(registry = %system.registry.address(), "Attached to existing system");
		Ok(&*self.system.insert(system))
	}
}

fn check_positions(components: &[Address], units: &[I256]) -> Result<(), OrchestratorError> {
	if components.len() != units.len() {
		return Err(OrchestratorError::MismatchedPositions {
			components: components.len(),
			units: units.len(),
		});
	}
	Ok(())
}
