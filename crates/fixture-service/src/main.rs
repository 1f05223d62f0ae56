use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fixture_config::{ConfigLoader, FixtureConfig};
use fixture_core::{System, SystemManifest};
use fixture_types::ResourceId;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod fixture;

#[derive(Parser)]
#[command(name = "protocol-fixture")]
#[command(about = "Deploys and wires a protocol test fixture", long_about = None)]
struct Cli {
	#[command(subcommand)]
	command: Option<Commands>,

	#[arg(short, long, value_name = "FILE", default_value = "config/local.toml")]
	config: PathBuf,

	/// Overrides the configured log level
	#[arg(long, env = "FIXTURE_CLI_LOG_LEVEL")]
	log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
	/// Deploy the full fixture and initialize its registry
	Deploy {
		/// Write the deployment manifest to this file
		#[arg(short, long, value_name = "FILE")]
		output: Option<PathBuf>,
	},
	/// Validate the configuration file and artifacts
	Validate,
	/// Attach to a deployed fixture and print its registry state
	Inspect {
		#[arg(short, long, value_name = "FILE")]
		manifest: PathBuf,
	},
}

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();

	let config = ConfigLoader::new()
		.with_file(&cli.config)
		.load()
		.await
		.context("Failed to load configuration")?;

	// Initialize tracing
	let log_level = cli
		.log_level
		.clone()
		.unwrap_or_else(|| config.fixture.log_level.clone());
	setup_tracing(&log_level)?;
	info!("Loaded configuration from: {:?}", cli.config);

	// Handle commands
	match cli.command {
		Some(Commands::Deploy { output }) => deploy(config, output).await,
		None => deploy(config, None).await,
		Some(Commands::Validate) => validate(config).await,
		Some(Commands::Inspect { manifest }) => inspect(config, manifest).await,
	}
}

async fn deploy(config: FixtureConfig, output: Option<PathBuf>) -> Result<()> {
	info!("Deploying fixture to {}", config.network.rpc_url);

	let mut orchestrator = fixture::build_orchestrator(&config).await?;
	let system = orchestrator
		.initialize()
		.await
		.context("Failed to deploy fixture")?;

	log_system(system);

	if let Some(path) = output {
		let json = system
			.manifest()
			.to_json()
			.context("Failed to serialize manifest")?;
		tokio::fs::write(&path, json)
			.await
			.with_context(|| format!("Failed to write manifest to {:?}", path))?;
		info!("Manifest written to {:?}", path);
	}

	Ok(())
}

async fn validate(config: FixtureConfig) -> Result<()> {
	info!("Configuration is valid");
	info!("RPC URL: {}", config.network.rpc_url);
	info!("Chain id: {}", config.network.chain_id);

	fixture::library_names(&config)?;
	let artifacts = fixture::load_artifacts(&config).await?;
	info!("Artifacts: {} contracts found", artifacts.len());

	info!("Mock tokens:");
	for token in &config.fixture.tokens {
		info!(
			"  {} ({} decimals, {} units, price {})",
			token.symbol, token.decimals, token.initial_balance, token.price
		);
	}

	Ok(())
}

async fn inspect(config: FixtureConfig, manifest: PathBuf) -> Result<()> {
	let json = tokio::fs::read_to_string(&manifest)
		.await
		.with_context(|| format!("Failed to read manifest {:?}", manifest))?;
	let manifest = SystemManifest::from_json(&json).context("Invalid manifest")?;

	let mut orchestrator = fixture::build_orchestrator(&config).await?;
	let system = orchestrator
		.attach(&manifest)
		.context("Failed to attach to fixture")?;
	log_system(system);

	let registry = &system.registry;
	info!(
		"Registry initialized: {}",
		registry.is_initialized().await?
	);
	info!("Registered factories: {:?}", registry.factories().await?);
	info!("Registered modules: {:?}", registry.modules().await?);
	for id in [
		ResourceId::IntegrationRegistry,
		ResourceId::PriceOracle,
		ResourceId::Valuer,
	] {
		info!("Resource {:?}: {}", id, registry.resource(id).await?);
	}

	Ok(())
}

fn log_system(system: &System) {
	info!("Registry: {}", system.registry.address());
	info!("Fee recipient: {}", system.fee_recipient);
	info!("Token factory: {}", system.factory.address());
	info!("Issuance module: {}", system.issuance.address());
	info!("Fee module: {}", system.fee_module.address());
	info!("Integration registry: {}", system.integration_registry.address());
	info!("Price oracle: {}", system.price_oracle.address());
	info!("Valuer: {}", system.valuer.address());
	for mock in &system.mocks {
		info!(
			"Mock {}: token {} feed {}",
			mock.symbol,
			mock.token.address(),
			mock.feed.address()
		);
	}
}

fn setup_tracing(log_level: &str) -> Result<()> {
	let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

	tracing_subscriber::registry()
		.with(env_filter)
		.with(tracing_subscriber::fmt::layer())
		.init();

	Ok(())
}
