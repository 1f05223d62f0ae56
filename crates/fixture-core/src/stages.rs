//! Deployment stages and their dependency graph.

use crate::OrchestratorError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;

/// A group of deployments that runs as one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
	/// The uninitialized registry.
	Registry,
	/// Both shared utility libraries.
	Libraries,
	/// The issuance module, mock tokens, their feeds and approvals.
	IssuanceAndMocks,
	/// Integration registry, factory, price oracle, valuer and fee module.
	Components,
	/// The one-time registry initialization.
	RegistryInitialization,
}

impl Stage {
	pub const ALL: [Stage; 5] = [
		Stage::Registry,
		Stage::Libraries,
		Stage::IssuanceAndMocks,
		Stage::Components,
		Stage::RegistryInitialization,
	];
}

impl fmt::Display for Stage {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			Stage::Registry => "registry",
			Stage::Libraries => "libraries",
			Stage::IssuanceAndMocks => "issuance_and_mocks",
			Stage::Components => "components",
			Stage::RegistryInitialization => "registry_initialization",
		};
		write!(f, "{}", name)
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSpec {
	pub stage: Stage,
	pub depends_on: Vec<Stage>,
}

impl StageSpec {
	pub fn new(stage: Stage, depends_on: impl IntoIterator<Item = Stage>) -> Self {
		Self {
			stage,
			depends_on: depends_on.into_iter().collect(),
		}
	}
}

/// Statically described stage graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentPlan {
	stages: Vec<StageSpec>,
}

impl DeploymentPlan {
	pub fn new(stages: Vec<StageSpec>) -> Self {
		Self { stages }
	}

	/// The fixture's stage graph.
	pub fn standard() -> Self {
		Self::new(vec![
			StageSpec::new(Stage::Registry, []),
			StageSpec::new(Stage::Libraries, []),
			StageSpec::new(
				Stage::IssuanceAndMocks,
				[Stage::Registry, Stage::Libraries],
			),
			StageSpec::new(
				Stage::Components,
				[Stage::Registry, Stage::Libraries, Stage::IssuanceAndMocks],
			),
			StageSpec::new(
				Stage::RegistryInitialization,
				[Stage::IssuanceAndMocks, Stage::Components],
			),
		])
	}

	pub fn stages(&self) -> &[StageSpec] {
		&self.stages
	}

	/// Topological order of the plan.
	///
	/// Ties are broken by declaration order. A stage may appear at most once
	/// and may only depend on stages in the plan; cycles are rejected.
	pub fn execution_order(&self) -> Result<Vec<Stage>, OrchestratorError> {
		let declared: HashSet<Stage> = self.stages.iter().map(|spec| spec.stage).collect();
		if declared.len() != self.stages.len() {
			return Err(OrchestratorError::InvalidPlan(
				"a stage is declared more than once".to_string(),
			));
		}

		let mut remaining: HashMap<Stage, usize> = HashMap::new();
		for spec in &self.stages {
			for dependency in &spec.depends_on {
				if !declared.contains(dependency) {
					return Err(OrchestratorError::InvalidPlan(format!(
						"stage {} depends on unknown stage {}",
						spec.stage, dependency
					)));
				}
			}
			let unique: HashSet<&Stage> = spec.depends_on.iter().collect();
			remaining.insert(spec.stage, unique.len());
		}

		let mut ready: VecDeque<Stage> = self
			.stages
			.iter()
			.filter(|spec| spec.depends_on.is_empty())
			.map(|spec| spec.stage)
			.collect();
		let mut order = Vec::with_capacity(self.stages.len());

		while let Some(stage) = ready.pop_front() {
			order.push(stage);
			for spec in &self.stages {
				if !spec.depends_on.contains(&stage) {
					continue;
				}
				if let Some(count) = remaining.get_mut(&spec.stage) {
					*count -= 1;
					if *count == 0 {
						ready.push_back(spec.stage);
					}
				}
			}
		}

		if order.len() != self.stages.len() {
			let stuck: Vec<String> = self
				.stages
				.iter()
				.filter(|spec| !order.contains(&spec.stage))
				.map(|spec| spec.stage.to_string())
				.collect();
			return Err(OrchestratorError::InvalidPlan(format!(
				"dependency cycle between {}",
				stuck.join(", ")
			)));
		}

		Ok(order)
	}

	/// Execution order of a plan that runs every stage exactly once.
	pub fn complete_order(&self) -> Result<Vec<Stage>, OrchestratorError> {
		let order = self.execution_order()?;
		for stage in Stage::ALL {
			if !order.contains(&stage) {
				return Err(OrchestratorError::InvalidPlan(format!(
					"stage {} is missing",
					stage
				)));
			}
		}
		Ok(order)
	}
}

impl Default for DeploymentPlan {
	fn default() -> Self {
		Self::standard()
	}
}
