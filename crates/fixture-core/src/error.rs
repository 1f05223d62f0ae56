use crate::Stage;
use fixture_deployer::DeployError;
use fixture_types::Address;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestratorError {
	#[error("Stage {stage} failed: {source}")]
	Stage {
		stage: Stage,
		source: Box<OrchestratorError>,
	},
	#[error("Invalid deployment plan: {0}")]
	InvalidPlan(String),
	#[error("Stage {stage} requires {dependency}, which no earlier stage produced")]
	MissingDependency {
		stage: Stage,
		dependency: &'static str,
	},
	#[error("System is not initialized")]
	NotInitialized,
	#[error("Registry {registry} is already initialized")]
	RegistryReinitialization { registry: Address },
	#[error("{components} components but {units} units")]
	MismatchedPositions { components: usize, units: usize },
	#[error("Failed to approve issuance on component {component}: {source}")]
	Allowance {
		component: Address,
		#[source]
		source: DeployError,
	},
	#[error("Deploy error: {0}")]
	Deploy(#[from] DeployError),
}

impl OrchestratorError {
	/// Stage a failure happened in, if it happened during deployment.
	pub fn stage(&self) -> Option<Stage> {
		match self {
			OrchestratorError::Stage { stage, .. } => Some(*stage),
			_ => None,
		}
	}
}
