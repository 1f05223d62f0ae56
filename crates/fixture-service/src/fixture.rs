//! Builds the orchestrator stack from configuration.

use anyhow::{Context, Result};
use fixture_account::LocalWallet;
use fixture_config::FixtureConfig;
use fixture_core::SystemOrchestrator;
use fixture_delivery::implementations::evm::alloy::AlloyDelivery;
use fixture_delivery::DeliveryService;
use fixture_deployer::{ArtifactStore, EntityDeployer};
use fixture_linker::{LibraryName, LibraryNames};
use fixture_types::ComponentKind;
use std::sync::Arc;
use tracing::info;

pub fn library_names(config: &FixtureConfig) -> Result<LibraryNames> {
	let data_utils = LibraryName::parse(&config.libraries.data_utils)
		.context("Invalid data utils library name")?;
	let internal_utils = LibraryName::parse(&config.libraries.internal_utils)
		.context("Invalid internal utils library name")?;
	Ok(LibraryNames::new(data_utils, internal_utils))
}

/// Loads artifacts and fails if any component kind has none.
pub async fn load_artifacts(config: &FixtureConfig) -> Result<ArtifactStore> {
	let store = ArtifactStore::load_dir(&config.artifacts.directory)
		.await
		.context("Failed to load artifacts")?;

	let missing: Vec<&str> = ComponentKind::ALL
		.iter()
		.filter(|kind| !store.contains(**kind))
		.map(|kind| kind.contract_name())
		.collect();
	if !missing.is_empty() {
		anyhow::bail!("Missing artifacts: {}", missing.join(", "));
	}

	Ok(store)
}

pub async fn build_orchestrator(config: &FixtureConfig) -> Result<SystemOrchestrator> {
	let libraries = library_names(config)?;
	let artifacts = load_artifacts(config).await?;

	let wallet =
		LocalWallet::new(&config.network.private_key).context("Failed to load owner key")?;
	let delivery = AlloyDelivery::new(
		&config.network.rpc_url,
		config.network.chain_id,
		wallet.signer(),
	)
	.context("Failed to create delivery provider")?;

	info!(
		owner = %wallet.address(),
		chain_id = config.network.chain_id,
		artifacts = artifacts.len(),
		"Fixture stack ready"
	);

	let deployer = EntityDeployer::new(
		Arc::new(DeliveryService::new(Box::new(delivery))),
		Arc::new(artifacts),
		libraries,
	);
	Ok(SystemOrchestrator::new(deployer, config.fixture.clone()))
}
