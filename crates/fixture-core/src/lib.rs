//! Deployment orchestration for the protocol fixture.
//!
//! The [`SystemOrchestrator`] runs a fixed graph of deployment stages,
//! performs the one-time registry initialization and then exposes the wired
//! [`System`] together with the token creation and issuance flows.

mod error;
mod manifest;
mod orchestrator;
mod stages;

pub use error::OrchestratorError;
pub use manifest::{MockManifest, SystemManifest};
pub use orchestrator::{MockAsset, System, SystemOrchestrator};
pub use stages::{DeploymentPlan, Stage, StageSpec};
