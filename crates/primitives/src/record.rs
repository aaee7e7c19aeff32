use serde::{Deserialize, Serialize};

use crate::{Candidate, SearchMode, Topology};

/// One entry of a generator parameter file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
	pub layers: Topology,
	#[serde(rename = "branching factor")]
	pub branching_factor: u64,
	pub namespace: String,
}

impl From<&Candidate> for GeneratorConfig {
	fn from(candidate: &Candidate) -> Self {
		Self {
			layers: candidate.topology().clone(),
			branching_factor: candidate.branching_factor(),
			namespace: candidate.namespace(),
		}
	}
}

/// Metrics the generator reports for one built candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildMetrics {
	/// Artifact size in bytes when compiled with linear search.
	pub size_linear: u64,
	/// Artifact size in bytes when compiled with binary search.
	pub size_binary: u64,
	pub average_error: f64,
	pub max_error: f64,
	pub average_log2_error: f64,
}

/// A candidate together with its generator-reported metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildResult {
	pub candidate: Candidate,
	pub metrics: BuildMetrics,
}

impl BuildResult {
	/// Size under the candidate's own search mode.
	pub fn size(&self) -> u64 {
		match self.candidate.mode() {
			SearchMode::Linear => self.metrics.size_linear,
			SearchMode::Binary => self.metrics.size_binary,
		}
	}

	/// Same metrics under another search mode; the artifacts are shared.
	pub fn with_mode(&self, mode: SearchMode) -> Self {
		Self {
			candidate: self.candidate.clone().with_mode(mode),
			metrics: self.metrics,
		}
	}
}

/// JSON form of a [`BuildResult`]: a generator result entry and the cache's `results.json`.
///
/// Keys follow the generator's naming (`"branching factor"`, `"size linear search"`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildRecord {
	pub layers: Topology,
	#[serde(rename = "branching factor")]
	pub branching_factor: u64,
	pub namespace: String,
	#[serde(default)]
	pub binary: bool,
	#[serde(rename = "size linear search")]
	pub size_linear: u64,
	#[serde(rename = "size binary search")]
	pub size_binary: u64,
	#[serde(rename = "average error")]
	pub average_error: f64,
	#[serde(rename = "max error")]
	pub max_error: f64,
	#[serde(rename = "average log2 error")]
	pub average_log2_error: f64,
}

impl BuildRecord {
	/// Reconstructs the candidate this record describes, recomputing its identity.
	pub fn candidate(&self) -> Candidate {
		Candidate::new(self.layers.clone(), self.branching_factor).with_mode(SearchMode::from_binary(self.binary))
	}

	pub fn metrics(&self) -> BuildMetrics {
		BuildMetrics {
			size_linear: self.size_linear,
			size_binary: self.size_binary,
			average_error: self.average_error,
			max_error: self.max_error,
			average_log2_error: self.average_log2_error,
		}
	}

	/// Attaches the metrics to `candidate`, keeping the caller's search mode.
	pub fn into_result_for(self, candidate: &Candidate) -> BuildResult {
		BuildResult {
			candidate: candidate.clone(),
			metrics: self.metrics(),
		}
	}
}

impl From<&BuildResult> for BuildRecord {
	fn from(result: &BuildResult) -> Self {
		let candidate = &result.candidate;
		Self {
			layers: candidate.topology().clone(),
			branching_factor: candidate.branching_factor(),
			namespace: candidate.namespace(),
			binary: candidate.mode().is_binary(),
			size_linear: result.metrics.size_linear,
			size_binary: result.metrics.size_binary,
			average_error: result.metrics.average_error,
			max_error: result.metrics.max_error,
			average_log2_error: result.metrics.average_log2_error,
		}
	}
}

impl From<BuildRecord> for BuildResult {
	fn from(record: BuildRecord) -> Self {
		let candidate = record.candidate();
		record.into_result_for(&candidate)
	}
}
