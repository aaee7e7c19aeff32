use std::path::PathBuf;

use rmiopt_bench::DEFAULT_CHUNK;
use rmiopt_primitives::Topology;
use serde::{Deserialize, Serialize};

/// Tunables for one search run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
	/// Concurrent generator processes per build round.
	pub threads: usize,
	/// Most candidates compiled into one benchmark binary.
	pub measure_chunk: usize,
	/// Also probe the histogram and distribution-fitted top layers in the initial grid.
	pub specialty_layers: bool,
	/// Run the ±50% branching-factor refinement round before finalizing.
	pub refine: bool,
	/// Topologies always kept on the round frontiers.
	pub starred: Vec<Topology>,
	/// Where the final table is written.
	pub output: PathBuf,
}

impl SearchConfig {
	pub fn is_starred(&self, topology: &Topology) -> bool {
		self.starred.contains(topology)
	}
}

impl Default for SearchConfig {
	fn default() -> Self {
		Self {
			threads: 6,
			measure_chunk: DEFAULT_CHUNK,
			specialty_layers: false,
			refine: true,
			starred: Topology::pair("bradix", "linear").into_iter().collect(),
			output: PathBuf::from("out.csv"),
		}
	}
}
