//! Registry initialization arguments.

use crate::bindings::IRegistry;
use alloy::primitives::{Address, U256};
use std::collections::HashSet;
use thiserror::Error;

/// Stable identifiers under which resources are registered.
///
/// Other components look resources up by these ids, so the numbers must
/// never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceId {
	IntegrationRegistry = 0,
	PriceOracle = 1,
	Valuer = 2,
}

impl ResourceId {
	pub fn id(&self) -> U256 {
		U256::from(*self as u64)
	}
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryArgsError {
	#[error("{resources} resources but {resource_ids} resource ids")]
	LengthMismatch {
		resources: usize,
		resource_ids: usize,
	},
	#[error("Resource id {0} appears more than once")]
	DuplicateResourceId(U256),
}

/// The one-time registration submitted to a registry.
///
/// `resources` and `resource_ids` are parallel arrays: the resource at index
/// `i` is registered under the id at index `i`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryInitArgs {
	pub factories: Vec<Address>,
	pub modules: Vec<Address>,
	pub resources: Vec<Address>,
	pub resource_ids: Vec<U256>,
}

impl RegistryInitArgs {
	pub fn new(factories: Vec<Address>, modules: Vec<Address>) -> Self {
		Self {
			factories,
			modules,
			..Default::default()
		}
	}

	/// Appends a resource under the given id, keeping both arrays aligned.
	pub fn with_resource(mut self, id: ResourceId, resource: Address) -> Self {
		self.resources.push(resource);
		self.resource_ids.push(id.id());
		self
	}

	/// Checks the parallel-array and uniqueness preconditions.
	pub fn validate(&self) -> Result<(), RegistryArgsError> {
		if self.resources.len() != self.resource_ids.len() {
			return Err(RegistryArgsError::LengthMismatch {
				resources: self.resources.len(),
				resource_ids: self.resource_ids.len(),
			});
		}

		let mut seen = HashSet::with_capacity(self.resource_ids.len());
		for id in &self.resource_ids {
			if !seen.insert(*id) {
				return Err(RegistryArgsError::DuplicateResourceId(*id));
			}
		}

		Ok(())
	}

	pub fn to_call(&self) -> IRegistry::initializeCall {
		IRegistry::initializeCall {
			factories: self.factories.clone(),
			modules: self.modules.clone(),
			resources: self.resources.clone(),
			resourceIds: self.resource_ids.clone(),
		}
	}
}
