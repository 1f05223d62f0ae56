//! Composite token positions.

use crate::bindings::ICompositeToken;
use alloy::primitives::{Address, I256};

/// One constituent of a composite token: a component and its unit amount.
///
/// Positions are read from the token's state and only ever changed by the
/// token's own operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
	pub component: Address,
	/// Module managing the position; zero for default positions.
	pub module: Address,
	pub unit: I256,
}

impl From<ICompositeToken::Position> for Position {
	fn from(position: ICompositeToken::Position) -> Self {
		Self {
			component: position.component,
			module: position.module,
			unit: position.unit,
		}
	}
}
