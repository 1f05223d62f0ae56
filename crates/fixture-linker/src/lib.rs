//! Shared-library linking for unlinked program bytecode.
//!
//! Compilers leave a placeholder in the bytecode of every program that calls
//! an external library. The placeholder is derived from the library's fully
//! qualified name, so linking is a content-addressed substitution: resolve
//! the name to its [`LinkId`], look the id up in a [`LinkTable`], and splice
//! the deployed library address in its place.

use fixture_types::{ComponentKind, Library};
use std::fmt;
use thiserror::Error;

mod table;

pub use table::{build_link_table, LinkEntry, LinkTable};

/// Length of a placeholder, identical to the hex width of an address.
pub const LINK_ID_LEN: usize = 40;

const PLACEHOLDER_PREFIX: &str = "__$";
const PLACEHOLDER_SUFFIX: &str = "$__";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LinkError {
	#[error(
		"Invalid library name {0}: expected a fully qualified name such as contracts/Lib.sol:Lib"
	)]
	InvalidLibraryName(String),
	#[error("Link id {id} is claimed by both {existing} and {incoming}")]
	DuplicateLink {
		id: LinkId,
		existing: String,
		incoming: String,
	},
	#[error("Link table does not match {kind}: missing {missing:?}, unexpected {unexpected:?}")]
	Mismatch {
		kind: ComponentKind,
		missing: Vec<String>,
		unexpected: Vec<String>,
	},
	#[error("Bytecode still references unresolved library placeholder {0}")]
	UnresolvedPlaceholder(String),
	#[error("Invalid bytecode: {0}")]
	InvalidBytecode(String),
}

/// Fully qualified library name, e.g. `contracts/lib/Math.sol:Math`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LibraryName(String);

impl LibraryName {
	pub fn parse(name: &str) -> Result<Self, LinkError> {
		let (path, contract) = name
			.rsplit_once(':')
			.ok_or_else(|| LinkError::InvalidLibraryName(name.to_string()))?;

		if !path.contains('/') || path.is_empty() || contract.is_empty() {
			return Err(LinkError::InvalidLibraryName(name.to_string()));
		}

		Ok(Self(name.to_string()))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for LibraryName {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Placeholder key a library occupies inside unlinked bytecode.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkId(String);

impl LinkId {
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for LinkId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// Resolves a library name to its placeholder.
///
/// The id is `__$` followed by the first 34 hex characters of the keccak256
/// hash of the name, followed by `$__`.
pub fn resolve_link_id(library: &LibraryName) -> LinkId {
	let hash = alloy::primitives::keccak256(library.as_str().as_bytes());
	let hex = hex::encode(hash);
	LinkId(format!(
		"{}{}{}",
		PLACEHOLDER_PREFIX,
		&hex[..LINK_ID_LEN - PLACEHOLDER_PREFIX.len() - PLACEHOLDER_SUFFIX.len()],
		PLACEHOLDER_SUFFIX
	))
}

/// Fully qualified names for each shared library role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryNames {
	data_utils: LibraryName,
	internal_utils: LibraryName,
}

impl Default for LibraryNames {
	fn default() -> Self {
		Self {
			data_utils: LibraryName(Library::DataUtils.default_name().to_string()),
			internal_utils: LibraryName(Library::InternalUtils.default_name().to_string()),
		}
	}
}

impl LibraryNames {
	pub fn new(data_utils: LibraryName, internal_utils: LibraryName) -> Self {
		Self {
			data_utils,
			internal_utils,
		}
	}

	pub fn name(&self, library: Library) -> &LibraryName {
		match library {
			Library::DataUtils => &self.data_utils,
			Library::InternalUtils => &self.internal_utils,
		}
	}

	/// Builds a link table from library roles and their deployed addresses.
	pub fn link_table<I>(&self, entries: I) -> Result<LinkTable, LinkError>
	where
		I: IntoIterator<Item = (Library, alloy::primitives::Address)>,
	{
		build_link_table(
			entries
				.into_iter()
				.map(|(library, address)| (self.name(library).clone(), address)),
		)
	}
}

/// Checks that a link table has exactly the shape a component kind needs.
///
/// Kinds without library references must be given no table (or an empty
/// one); kinds with references must be given a table covering each of them
/// and nothing else.
pub fn check_link_shape(
	kind: ComponentKind,
	table: Option<&LinkTable>,
	names: &LibraryNames,
) -> Result<(), LinkError> {
	let required: Vec<&LibraryName> = kind
		.required_libraries()
		.iter()
		.map(|library| names.name(*library))
		.collect();

	let missing: Vec<String> = required
		.iter()
		.filter(|name| !table.is_some_and(|table| table.contains(name)))
		.map(|name| name.to_string())
		.collect();

	let unexpected: Vec<String> = table
		.map(|table| {
			table
				.iter()
				.filter(|entry| !required.contains(&&entry.library))
				.map(|entry| entry.library.to_string())
				.collect()
		})
		.unwrap_or_default();

	if missing.is_empty() && unexpected.is_empty() {
		Ok(())
	} else {
		Err(LinkError::Mismatch {
			kind,
			missing,
			unexpected,
		})
	}
}
