use fixture_delivery::DeliveryError;
use fixture_linker::LinkError;
use fixture_types::{Address, ComponentKind, RegistryArgsError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeployError {
	/// Creation round trip failed: network, confirmation or revert.
	#[error("Deployment of {kind} failed: {source}")]
	Deployment {
		kind: ComponentKind,
		#[source]
		source: DeliveryError,
	},
	/// A call or read against a deployed instance failed.
	#[error("Call error: {0}")]
	Call(#[from] DeliveryError),
	#[error("Link error: {0}")]
	LinkMismatch(#[from] LinkError),
	#[error("Artifact error: {0}")]
	Artifact(String),
	#[error("Expected exactly one creation event, found {matches}")]
	CreationEventNotFound { matches: usize },
	#[error("Registry {registry} is already initialized")]
	RegistryReinitialization { registry: Address },
	#[error("Invalid registry arguments: {0}")]
	InvalidRegistryArgs(#[from] RegistryArgsError),
	#[error("Decode error: {0}")]
	Decode(String),
}
