//! Shared domain types for the protocol fixture.
//!
//! Everything that crosses a crate boundary lives here: component kinds and
//! their library requirements, transaction receipts, registry initialization
//! arguments, token positions, and the ABI bindings of the deployed programs.

pub mod bindings;
pub mod component;
pub mod position;
pub mod receipt;
pub mod registry;

pub use alloy::primitives::{Address, Bytes, Log, LogData, B256, I256, U256};
pub use component::*;
pub use position::*;
pub use receipt::*;
pub use registry::*;
