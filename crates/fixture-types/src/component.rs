//! Component kinds and the shared libraries they link against.
//!
//! Every deployable program is identified by a [`ComponentKind`]. A kind knows
//! the artifact it is built from and exactly which shared libraries its
//! bytecode references, so link requirements are checked before anything
//! touches the network.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Shared utility libraries that other components are linked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Library {
	/// Position and unit helpers used by modules and the valuer.
	DataUtils,
	/// Internal bookkeeping helpers used by the token and its factory.
	InternalUtils,
}

impl Library {
	pub const ALL: [Library; 2] = [Library::DataUtils, Library::InternalUtils];

	/// Fully qualified name of the library as emitted by the compiler.
	pub fn default_name(&self) -> &'static str {
		match self {
			Library::DataUtils => "contracts/protocol/lib/TokenDataUtils.sol:TokenDataUtils",
			Library::InternalUtils => {
				"contracts/protocol/lib/TokenInternalUtils.sol:TokenInternalUtils"
			}
		}
	}

	/// The component kind that deploys this library.
	pub fn kind(&self) -> ComponentKind {
		match self {
			Library::DataUtils => ComponentKind::DataUtils,
			Library::InternalUtils => ComponentKind::InternalUtils,
		}
	}
}

impl fmt::Display for Library {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Library::DataUtils => write!(f, "data_utils"),
			Library::InternalUtils => write!(f, "internal_utils"),
		}
	}
}

/// Every program kind the fixture can deploy or attach to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
	Registry,
	DataUtils,
	InternalUtils,
	IssuanceModule,
	FeeModule,
	IntegrationRegistry,
	TokenFactory,
	CompositeToken,
	PriceOracle,
	Valuer,
	TokenMock,
	OracleMock,
}

impl ComponentKind {
	pub const ALL: [ComponentKind; 12] = [
		ComponentKind::Registry,
		ComponentKind::DataUtils,
		ComponentKind::InternalUtils,
		ComponentKind::IssuanceModule,
		ComponentKind::FeeModule,
		ComponentKind::IntegrationRegistry,
		ComponentKind::TokenFactory,
		ComponentKind::CompositeToken,
		ComponentKind::PriceOracle,
		ComponentKind::Valuer,
		ComponentKind::TokenMock,
		ComponentKind::OracleMock,
	];

	/// Name of the compiled contract artifact for this kind.
	pub fn contract_name(&self) -> &'static str {
		match self {
			ComponentKind::Registry => "Registry",
			ComponentKind::DataUtils => "TokenDataUtils",
			ComponentKind::InternalUtils => "TokenInternalUtils",
			ComponentKind::IssuanceModule => "BasicIssuanceModule",
			ComponentKind::FeeModule => "StreamingFeeModule",
			ComponentKind::IntegrationRegistry => "IntegrationRegistry",
			ComponentKind::TokenFactory => "TokenFactory",
			ComponentKind::CompositeToken => "CompositeToken",
			ComponentKind::PriceOracle => "PriceOracle",
			ComponentKind::Valuer => "Valuer",
			ComponentKind::TokenMock => "StandardTokenMock",
			ComponentKind::OracleMock => "OracleMock",
		}
	}

	/// Libraries whose placeholders appear in this kind's bytecode.
	///
	/// This is the complete link shape of the kind: a link table passed to
	/// deploy or attach must cover exactly these libraries.
	pub fn required_libraries(&self) -> &'static [Library] {
		match self {
			ComponentKind::IssuanceModule | ComponentKind::FeeModule | ComponentKind::Valuer => {
				&[Library::DataUtils]
			}
			ComponentKind::TokenFactory | ComponentKind::CompositeToken => {
				&[Library::InternalUtils]
			}
			ComponentKind::Registry
			| ComponentKind::DataUtils
			| ComponentKind::InternalUtils
			| ComponentKind::IntegrationRegistry
			| ComponentKind::PriceOracle
			| ComponentKind::TokenMock
			| ComponentKind::OracleMock => &[],
		}
	}

	pub fn requires_linking(&self) -> bool {
		!self.required_libraries().is_empty()
	}
}

impl fmt::Display for ComponentKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.contract_name())
	}
}
