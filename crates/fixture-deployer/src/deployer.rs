use crate::{ArtifactStore, Component, DeployError, Instance};
use fixture_delivery::DeliveryService;
use fixture_linker::{check_link_shape, LibraryNames, LinkTable};
use fixture_types::{Address, Bytes, Library};
use std::sync::Arc;
use tracing::{debug, info};

/// Creates program instances from artifacts and binds handles to existing
/// ones.
///
/// The deployer checks a link table against the component's link shape
/// before any network activity, for both deploy and attach.
#[derive(Clone)]
pub struct EntityDeployer {
	delivery: Arc<DeliveryService>,
	artifacts: Arc<ArtifactStore>,
	libraries: LibraryNames,
}

impl EntityDeployer {
	pub fn new(
		delivery: Arc<DeliveryService>,
		artifacts: Arc<ArtifactStore>,
		libraries: LibraryNames,
	) -> Self {
		Self {
			delivery,
			artifacts,
			libraries,
		}
	}

	pub fn delivery(&self) -> &Arc<DeliveryService> {
		&self.delivery
	}

	pub fn libraries(&self) -> &LibraryNames {
		&self.libraries
	}

	/// Link table for deployed libraries, keyed by their configured names.
	pub fn link_table<I>(&self, entries: I) -> Result<LinkTable, DeployError>
	where
		I: IntoIterator<Item = (Library, Address)>,
	{
		Ok(self.libraries.link_table(entries)?)
	}

	/// Deploys a new instance of `C`.
	///
	/// `constructor_args` must already be ABI encoded. The creation is a
	/// single round trip; failures are reported as
	/// [`DeployError::Deployment`] and never retried.
	pub async fn deploy<C: Component>(
		&self,
		constructor_args: Bytes,
		link_table: Option<LinkTable>,
	) -> Result<Instance<C>, DeployError> {
		check_link_shape(C::KIND, link_table.as_ref(), &self.libraries)?;

		let bytecode = self.artifacts.get(C::KIND)?;
		let code = match &link_table {
			Some(table) => table.link(bytecode)?,
			None => LinkTable::new().link(bytecode)?,
		};

		debug!(
			kind = %C::KIND,
			code_len = code.len(),
			args_len = constructor_args.len(),
			"Deploying component"
		);

		let (address, _receipt) = self
			.delivery
			.create(code, constructor_args)
			.await
			.map_err(|source| DeployError::Deployment {
				kind: C::KIND,
				source,
			})?;

		info!(kind = %C::KIND, %address, "Component deployed");
		Ok(Instance::new(address, link_table, self.delivery.clone()))
	}

	/// Binds a handle of kind `C` to an existing address.
	pub fn attach<C: Component>(
		&self,
		address: Address,
		link_table: Option<LinkTable>,
	) -> Result<Instance<C>, DeployError> {
		check_link_shape(C::KIND, link_table.as_ref(), &self.libraries)?;
		Ok(Instance::new(address, link_table, self.delivery.clone()))
	}
}
