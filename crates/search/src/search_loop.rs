//! The round-by-round search state machine.

use std::collections::{BTreeMap, BTreeSet};

use rmiopt_bench::{Harness, MeasurePipeline};
use rmiopt_cache::BuildCache;
use rmiopt_frontier::{Objective, ResultRow, ResultTable};
use rmiopt_primitives::{BuildResult, Candidate, SearchMode, Topology};
use rmiopt_worker::{Dispatcher, Generator};
use tracing::{debug, info, warn};

use crate::grid::{expand, initial_grid, refine, warm_grid};
use crate::{FINAL_OBJECTIVES, Report, Result, SearchConfig};

/// Objectives of the two build rounds.
pub const ROUND_OBJECTIVES: [Objective; 2] = [Objective::SizeBinary, Objective::AverageLog2Error];

/// Where a search run currently is, with the data the next step needs.
#[derive(Debug)]
pub enum Stage {
	InitialGrid,
	Round1Build(Vec<Candidate>),
	Round1Frontier(Vec<BuildResult>),
	Round2Expand {
		round1: Vec<BuildResult>,
		winners: BTreeSet<Topology>,
	},
	Round2Build {
		round1: Vec<BuildResult>,
		expansion: Vec<Candidate>,
	},
	Round2Frontier(Vec<BuildResult>),
	Measure(Vec<Candidate>),
	Refine(Vec<ResultRow>),
	RefineMeasure {
		measured: Vec<ResultRow>,
		refined: Vec<Candidate>,
	},
	Finalize(Vec<ResultRow>),
	Done(Report),
}

impl Stage {
	pub fn name(&self) -> &'static str {
		match self {
			Self::InitialGrid => "initial-grid",
			Self::Round1Build(_) => "round1-build",
			Self::Round1Frontier(_) => "round1-frontier",
			Self::Round2Expand { .. } => "round2-expand",
			Self::Round2Build { .. } => "round2-build",
			Self::Round2Frontier(_) => "round2-frontier",
			Self::Measure(_) => "measure",
			Self::Refine(_) => "refine",
			Self::RefineMeasure { .. } => "refine-measure",
			Self::Finalize(_) => "finalize",
			Self::Done(_) => "done",
		}
	}
}

/// Drives builds and measurements for one dataset.
pub struct SearchLoop<G, H> {
	cache: BuildCache,
	dispatcher: Dispatcher<G>,
	pipeline: MeasurePipeline<H>,
	config: SearchConfig,
}

impl<G: Generator, H: Harness> SearchLoop<G, H> {
	pub fn new(cache: BuildCache, generator: G, harness: H, config: SearchConfig) -> Self {
		Self {
			dispatcher: Dispatcher::new(generator, config.threads),
			pipeline: MeasurePipeline::new(harness, config.measure_chunk),
			cache,
			config,
		}
	}

	pub fn cache(&self) -> &BuildCache {
		&self.cache
	}

	pub fn dispatcher(&self) -> &Dispatcher<G> {
		&self.dispatcher
	}

	pub fn pipeline(&self) -> &MeasurePipeline<H> {
		&self.pipeline
	}

	pub fn config(&self) -> &SearchConfig {
		&self.config
	}

	/// Runs every round and writes the final table to the configured output.
	pub fn run(&self) -> Result<Report> {
		let mut stage = Stage::InitialGrid;
		loop {
			stage = match stage {
				Stage::Done(report) => {
					report.save(&self.config.output)?;
					info!(output = %self.config.output.display(), "Results saved");
					return Ok(report);
				}
				current => {
					debug!(stage = current.name(), "search stage");
					self.step(current)?
				}
			};
		}
	}

	/// Advances one stage.
	pub fn step(&self, stage: Stage) -> Result<Stage> {
		Ok(match stage {
			Stage::InitialGrid => {
				let grid = initial_grid(&self.config)?;
				info!(count = grid.len(), "Testing initial configurations");
				Stage::Round1Build(grid)
			}
			Stage::Round1Build(grid) => Stage::Round1Frontier(self.dispatcher.dispatch(&self.cache, &grid, "step1")?),
			Stage::Round1Frontier(round1) => {
				let table = self.starred_table(&round1);
				let winners: BTreeSet<Topology> = table
					.frontier_rows(&ROUND_OBJECTIVES, false)
					.into_iter()
					.map(|row| row.result.candidate.topology().clone())
					.collect();
				info!(
					tested = table.len(),
					front = table.frontier(&ROUND_OBJECTIVES, false).len(),
					layers = ?winners.iter().map(ToString::to_string).collect::<Vec<_>>(),
					"Round 1 front"
				);
				Stage::Round2Expand { round1, winners }
			}
			Stage::Round2Expand { round1, winners } => {
				let expansion = expand(&winners, &round1);
				info!(count = expansion.len(), "Testing additional configurations");
				Stage::Round2Build { round1, expansion }
			}
			Stage::Round2Build { round1, expansion } => {
				let round2 = self.dispatcher.dispatch(&self.cache, &expansion, "step2")?;
				let mut combined: BTreeMap<Candidate, BuildResult> = BTreeMap::new();
				for result in round1.into_iter().chain(round2) {
					let binary = result.with_mode(SearchMode::Binary);
					combined.entry(binary.candidate.clone()).or_insert(binary);
				}
				info!(count = combined.len(), "Rounds 1 and 2 combined");
				Stage::Round2Frontier(combined.into_values().collect())
			}
			Stage::Round2Frontier(combined) => {
				let front: Vec<Candidate> = self
					.starred_table(&combined)
					.frontier_rows(&ROUND_OBJECTIVES, false)
					.into_iter()
					.map(|row| row.result.candidate.clone())
					.collect();
				info!(count = front.len(), "Building front for measurement");
				Stage::Measure(front)
			}
			Stage::Measure(front) => {
				let measured = self.build_and_measure(&front, "step3")?;
				info!(count = measured.len(), "Measured front models");
				if self.config.refine {
					Stage::Refine(measured)
				} else {
					Stage::Finalize(measured)
				}
			}
			Stage::Refine(measured) => {
				let table = ResultTable::new(measured);
				let refined = refine(table.frontier_rows(&FINAL_OBJECTIVES, true));
				info!(count = refined.len(), "Expanding the front");
				Stage::RefineMeasure {
					measured: table.into_rows(),
					refined,
				}
			}
			Stage::RefineMeasure { mut measured, refined } => {
				let extra = self.build_and_measure(&refined, "step4")?;
				info!(count = extra.len(), "Measured refined models");
				measured.extend(extra);
				Stage::Finalize(measured)
			}
			Stage::Finalize(measured) => {
				let mut distinct: BTreeMap<Candidate, ResultRow> = BTreeMap::new();
				for row in measured {
					distinct.entry(row.result.candidate.clone()).or_insert(row);
				}
				let report = Report::new(distinct.into_values().collect());
				info!(models = report.rows().len(), front = report.front().count(), "Final frontier");
				Stage::Done(report)
			}
			Stage::Done(report) => Stage::Done(report),
		})
	}

	/// Builds (cache-aware) and measures an explicit candidate list.
	pub fn measure(&self, candidates: &[Candidate]) -> Result<ResultTable> {
		Ok(ResultTable::new(self.build_and_measure(candidates, "measure")?))
	}

	/// Fills the cache with the fixed warming grid under both search modes and
	/// measures the binary-search variants.
	pub fn warm(&self) -> Result<ResultTable> {
		let linear = warm_grid(SearchMode::Linear)?;
		info!(count = linear.len(), "Warming linear-search builds");
		self.dispatcher.dispatch(&self.cache, &linear, "warm")?;

		let binary = warm_grid(SearchMode::Binary)?;
		info!(count = binary.len(), "Warming binary-search builds");
		self.measure(&binary)
	}

	fn starred_table(&self, results: &[BuildResult]) -> ResultTable {
		results
			.iter()
			.map(|result| ResultRow::new(result.clone()).with_star(self.config.is_starred(result.candidate.topology())))
			.collect()
	}

	fn build_and_measure(&self, candidates: &[Candidate], phase: &str) -> Result<Vec<ResultRow>> {
		let results = self.dispatcher.dispatch(&self.cache, candidates, phase)?;
		let built: Vec<Candidate> = results.iter().map(|result| result.candidate.clone()).collect();
		let latencies = self.pipeline.measure(&self.cache, &built)?;

		let rows: Vec<ResultRow> = results
			.into_iter()
			.zip(latencies)
			.map(|(result, latency)| {
				let starred = self.config.is_starred(result.candidate.topology());
				ResultRow::new(result).with_latency(latency).with_star(starred)
			})
			.collect();
		for row in rows.iter().filter(|row| row.latency.is_some_and(|latency| latency.is_failed())) {
			let candidate = &row.result.candidate;
			warn!(
				layers = %candidate.topology(),
				branching_factor = candidate.branching_factor(),
				mode = candidate.mode().as_str(),
				"Index failed to run"
			);
		}
		Ok(rows)
	}
}
