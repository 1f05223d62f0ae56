//! Program deployment and typed instance handles.
//!
//! [`EntityDeployer`] turns artifacts into live instances: it links library
//! placeholders, appends constructor arguments and submits the creation.
//! The [`resolver`] recovers addresses of instances created indirectly by a
//! factory.

mod artifacts;
mod deployer;
mod error;
mod instance;
pub mod resolver;

pub use artifacts::ArtifactStore;
pub use deployer::EntityDeployer;
pub use error::DeployError;
pub use instance::*;
pub use resolver::extract_created_address;
