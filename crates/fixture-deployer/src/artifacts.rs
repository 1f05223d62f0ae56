//! Compiled program artifacts.
//!
//! Both Hardhat (`artifacts/**/Name.json`, bytecode as a hex string) and
//! Foundry (`out/**/Name.json`, bytecode under `object`) layouts are read.
//! Artifacts are looked up by contract name; bytecode is kept unlinked so
//! placeholders can be substituted per deployment.

use crate::DeployError;
use fixture_types::ComponentKind;
use serde::Deserialize;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BytecodeField {
	Hex(String),
	Object { object: String },
}

impl BytecodeField {
	fn into_hex(self) -> String {
		match self {
			BytecodeField::Hex(hex) => hex,
			BytecodeField::Object { object } => object,
		}
	}
}

#[derive(Debug, Deserialize)]
struct ArtifactFile {
	#[serde(rename = "contractName")]
	contract_name: Option<String>,
	bytecode: Option<BytecodeField>,
}

/// Unlinked creation bytecode indexed by contract name.
#[derive(Debug, Default, Clone)]
pub struct ArtifactStore {
	bytecode: HashMap<String, String>,
}

impl ArtifactStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Loads every artifact found under `dir`, recursively.
	///
	/// Files that are not artifacts (debug files, build info, interfaces
	/// without bytecode) are skipped. Directories are walked breadth first in
	/// path order, so when two artifacts share a contract name the shallower
	/// one wins, then the one whose path sorts first.
	pub async fn load_dir(dir: impl AsRef<Path>) -> Result<Self, DeployError> {
		let root = dir.as_ref();
		let mut store = Self::new();
		let mut pending = VecDeque::from([root.to_path_buf()]);

		while let Some(current) = pending.pop_front() {
			let mut entries = tokio::fs::read_dir(&current).await.map_err(|e| {
				DeployError::Artifact(format!("Failed to read {}: {}", current.display(), e))
			})?;

			let mut paths: Vec<PathBuf> = Vec::new();
			while let Some(entry) = entries
				.next_entry()
				.await
				.map_err(|e| DeployError::Artifact(e.to_string()))?
			{
				paths.push(entry.path());
			}
			paths.sort();

			for path in paths {
				if path.is_dir() {
					pending.push_back(path);
				} else if is_artifact_path(&path) {
					store.load_file(&path).await?;
				}
			}
		}

		info!(
			directory = %root.display(),
			artifacts = store.len(),
			"Loaded artifacts"
		);
		Ok(store)
	}

	async fn load_file(&mut self, path: &Path) -> Result<(), DeployError> {
		let content = tokio::fs::read_to_string(path)
			.await
			.map_err(|e| {
				DeployError::Artifact(format!("Failed to read {}: {}", path.display(), e))
			})?;

		let artifact: ArtifactFile = match serde_json::from_str(&content) {
			Ok(artifact) => artifact,
			Err(e) => {
				debug!(path = %path.display(), error = %e, "Skipping non-artifact file");
				return Ok(());
			}
		};

		let Some(bytecode) = artifact.bytecode.map(BytecodeField::into_hex) else {
			return Ok(());
		};

		let name = match artifact.contract_name {
			Some(name) => name,
			None => match path.file_stem().and_then(|stem| stem.to_str()) {
				Some(stem) => stem.to_string(),
				None => return Ok(()),
			},
		};

		if self.bytecode.contains_key(&name) {
			warn!(contract = %name, path = %path.display(), "Duplicate artifact ignored");
			return Ok(());
		}

		self.insert(name, bytecode);
		Ok(())
	}

	/// Adds bytecode under a contract name. Empty bytecode is ignored.
	pub fn insert(&mut self, contract_name: impl Into<String>, bytecode: impl Into<String>) {
		let bytecode = bytecode.into();
		if bytecode.is_empty() || bytecode == "0x" {
			return;
		}
		self.bytecode.insert(contract_name.into(), bytecode);
	}

	/// Unlinked bytecode for a component kind.
	pub fn get(&self, kind: ComponentKind) -> Result<&str, DeployError> {
		self.bytecode
			.get(kind.contract_name())
			.map(String::as_str)
			.ok_or_else(|| {
				DeployError::Artifact(format!("No artifact for contract {}", kind.contract_name()))
			})
	}

	pub fn contains(&self, kind: ComponentKind) -> bool {
		self.bytecode.contains_key(kind.contract_name())
	}

	pub fn len(&self) -> usize {
		self.bytecode.len()
	}

	pub fn is_empty(&self) -> bool {
		self.bytecode.is_empty()
	}
}

fn is_artifact_path(path: &Path) -> bool {
	let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
		return false;
	};
	name.ends_with(".json") && !name.ends_with(".dbg.json")
}
