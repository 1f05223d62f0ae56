use crate::{resolve_link_id, LibraryName, LinkError, LinkId, LINK_ID_LEN, PLACEHOLDER_PREFIX};
use alloy::primitives::{Address, Bytes};
use std::collections::BTreeMap;
use tracing::debug;

/// A library and the address it is deployed at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEntry {
	pub library: LibraryName,
	pub address: Address,
}

/// Mapping from placeholder to the deployed library that satisfies it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkTable {
	entries: BTreeMap<LinkId, LinkEntry>,
}

impl LinkTable {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds a library. Re-adding the same library at the same address is a
	/// no-op; any other reuse of a link id is a [`LinkError::DuplicateLink`].
	pub fn insert(&mut self, library: LibraryName, address: Address) -> Result<(), LinkError> {
		let id = resolve_link_id(&library);
		self.insert_with_id(id, library, address)
	}

	fn insert_with_id(
		&mut self,
		id: LinkId,
		library: LibraryName,
		address: Address,
	) -> Result<(), LinkError> {
		if let Some(existing) = self.entries.get(&id) {
			if existing.library == library && existing.address == address {
				return Ok(());
			}
			return Err(LinkError::DuplicateLink {
				id,
				existing: format!("{} at {}", existing.library, existing.address),
				incoming: format!("{} at {}", library, address),
			});
		}

		self.entries.insert(id, LinkEntry { library, address });
		Ok(())
	}

	pub fn get(&self, id: &LinkId) -> Option<&LinkEntry> {
		self.entries.get(id)
	}

	pub fn address_of(&self, library: &LibraryName) -> Option<Address> {
		self.get(&resolve_link_id(library)).map(|entry| entry.address)
	}

	pub fn contains(&self, library: &LibraryName) -> bool {
		self.get(&resolve_link_id(library))
			.is_some_and(|entry| &entry.library == library)
	}

	pub fn iter(&self) -> impl Iterator<Item = &LinkEntry> {
		self.entries.values()
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Substitutes every known placeholder in hex-encoded bytecode.
	///
	/// Fails if any placeholder is left over afterwards, so the returned
	/// bytes never contain a dangling library reference.
	pub fn link(&self, bytecode: &str) -> Result<Bytes, LinkError> {
		let mut linked = bytecode
			.strip_prefix("0x")
			.unwrap_or(bytecode)
			.to_string();

		for (id, entry) in &self.entries {
			if linked.contains(id.as_str()) {
				debug!(library = %entry.library, address = %entry.address, "Linking library");
				linked = linked.replace(id.as_str(), &hex::encode(entry.address));
			}
		}

		if let Some(start) = linked.find(PLACEHOLDER_PREFIX) {
			let placeholder = linked
				.get(start..start + LINK_ID_LEN)
				.unwrap_or(&linked[start..]);
			return Err(LinkError::UnresolvedPlaceholder(placeholder.to_string()));
		}

		hex::decode(&linked)
			.map(Bytes::from)
			.map_err(|e| LinkError::InvalidBytecode(e.to_string()))
	}
}

/// Builds a table from (library, address) pairs.
pub fn build_link_table<I>(entries: I) -> Result<LinkTable, LinkError>
where
	I: IntoIterator<Item = (LibraryName, Address)>,
{
	let mut table = LinkTable::new();
	for (library, address) in entries {
		table.insert(library, address)?;
	}
	Ok(table)
}
