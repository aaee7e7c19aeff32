//! Candidate grids: the initial sweep, frontier expansion, local refinement and
//! the fixed cache-warming grid.

use std::collections::{BTreeMap, BTreeSet};

use rmiopt_frontier::ResultRow;
use rmiopt_primitives::{BuildResult, Candidate, PrimitiveError, SearchMode, Topology};

use crate::SearchConfig;

/// Layers that only make sense at the root.
pub const TOP_ONLY_LAYERS: [&str; 2] = ["radix", "bradix"];
/// Layers usable at any level.
pub const ANYWHERE_LAYERS: [&str; 2] = ["linear", "cubic"];
/// Root layers probed only when specialty layers are enabled.
pub const SPECIALTY_TOP_LAYERS: [&str; 4] = ["histogram", "loglinear", "normal", "lognormal"];

/// Histogram roots are probed at these branching factors instead of the ladder.
pub const HISTOGRAM_PROBE_BF: [u64; 3] = [64, 128, 256];
/// Extra branching factors tried when a histogram root reaches the frontier.
pub const HISTOGRAM_EXPANSION_BF: [u64; 3] = [32, 300, 512];

/// Initial sweep stride over the ladder.
const INITIAL_STRIDE: usize = 3;
/// Ladder stride for non-histogram specialty roots.
const SPECIALTY_STRIDE: usize = 4;

pub const WARM_TOP_LAYERS: [&str; 8] = [
	"linear",
	"radix",
	"bradix",
	"linear_spline",
	"cubic",
	"loglinear",
	"normal",
	"lognormal",
];
pub const WARM_BOTTOM_LAYERS: [&str; 4] = ["linear", "linear_spline", "cubic", "loglinear"];
pub const WARM_BRANCHING_FACTORS: [u64; 7] = [1024, 4096, 16284, 65536, 262144, 1048576, 2097152];

/// Powers of two from 2^7 to 2^21.
pub fn branching_factors() -> Vec<u64> {
	(7..22).map(|exp| 1u64 << exp).collect()
}

/// The round-one grid, all with linear search.
pub fn initial_grid(config: &SearchConfig) -> Result<Vec<Candidate>, PrimitiveError> {
	let ladder = branching_factors();
	let mut grid = Vec::new();
	for top in TOP_ONLY_LAYERS.iter().chain(&ANYWHERE_LAYERS) {
		for bottom in ANYWHERE_LAYERS {
			let topology = Topology::pair(top, bottom)?;
			grid.extend(ladder.iter().step_by(INITIAL_STRIDE).map(|&bf| Candidate::new(topology.clone(), bf)));
		}
	}

	if config.specialty_layers {
		for top in SPECIALTY_TOP_LAYERS {
			for bottom in ANYWHERE_LAYERS {
				let topology = Topology::pair(top, bottom)?;
				let factors: Vec<u64> = if topology.is_histogram() {
					HISTOGRAM_PROBE_BF.to_vec()
				} else {
					ladder.iter().step_by(SPECIALTY_STRIDE).copied().collect()
				};
				grid.extend(factors.into_iter().map(|bf| Candidate::new(topology.clone(), bf)));
			}
		}
	}
	Ok(grid)
}

/// Follow-up candidates for every winning topology: the whole ladder minus the
/// branching factors already in `tried`, or the fixed extras for histogram roots.
pub fn expand(winners: &BTreeSet<Topology>, tried: &[BuildResult]) -> Vec<Candidate> {
	let mut known: BTreeMap<&Topology, BTreeSet<u64>> = BTreeMap::new();
	for result in tried {
		known
			.entry(result.candidate.topology())
			.or_default()
			.insert(result.candidate.branching_factor());
	}

	let ladder = branching_factors();
	let mut next = Vec::new();
	for topology in winners {
		if topology.is_histogram() {
			next.extend(HISTOGRAM_EXPANSION_BF.iter().map(|&bf| Candidate::new(topology.clone(), bf)));
			continue;
		}
		let seen = known.get(topology);
		next.extend(
			ladder
				.iter()
				.filter(|bf| seen.is_none_or(|seen| !seen.contains(bf)))
				.map(|&bf| Candidate::new(topology.clone(), bf)),
		);
	}
	next
}

/// Neighbours at 150% and 50% of each row's branching factor, keeping its search mode.
pub fn refine<'a>(front: impl IntoIterator<Item = &'a ResultRow>) -> Vec<Candidate> {
	let mut next = Vec::new();
	for row in front {
		let candidate = &row.result.candidate;
		let bf = candidate.branching_factor();
		for scaled in [bf + bf / 2, bf / 2] {
			if scaled > 0 {
				next.push(Candidate::new(candidate.topology().clone(), scaled).with_mode(candidate.mode()));
			}
		}
	}
	next
}

/// The fixed cache-warming grid under one search mode.
pub fn warm_grid(mode: SearchMode) -> Result<Vec<Candidate>, PrimitiveError> {
	let mut grid = Vec::with_capacity(WARM_TOP_LAYERS.len() * WARM_BOTTOM_LAYERS.len() * WARM_BRANCHING_FACTORS.len());
	for top in WARM_TOP_LAYERS {
		for bottom in WARM_BOTTOM_LAYERS {
			let topology = Topology::pair(top, bottom)?;
			grid.extend(
				WARM_BRANCHING_FACTORS
					.iter()
					.map(|&bf| Candidate::new(topology.clone(), bf).with_mode(mode)),
			);
		}
	}
	Ok(grid)
}
