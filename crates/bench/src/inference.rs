//! Inference-latency profile: model evaluation only, no last-mile search.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::Command;

use rmiopt_cache::MeasurementKind;
use rmiopt_primitives::Latency;
use tracing::debug;

use crate::harness::{HarnessEntry, absolute_project, clear_staged, run_benchmark, run_compiler, stage_artifacts, write_source};
use crate::{Harness, MeasureError, Result};

const TEMPLATE: &str = include_str!("../assets/inference.cpp.in");

/// Random keys looked up per candidate; reported totals are divided by this.
pub const INFERENCE_LOOKUPS: u32 = 100_000;

const STAGE_DIR: &str = "opt";
const SOURCE_FILE: &str = "to_build.cpp";
const BINARY: &str = "./a.out";

/// Times model inference through a `make`-driven project whose Makefile links
/// `to_build.cpp` with the sources in `opt/` into `a.out`.
#[derive(Debug, Clone)]
pub struct InferenceHarness {
	project: PathBuf,
	jobs: usize,
}

impl InferenceHarness {
	pub fn new(project: impl Into<PathBuf>) -> Self {
		Self {
			project: absolute_project(project.into()),
			jobs: 8,
		}
	}

	/// Parallelism passed to `make -j`.
	pub fn with_jobs(mut self, jobs: usize) -> Self {
		self.jobs = jobs.max(1);
		self
	}
}

impl Harness for InferenceHarness {
	fn kind(&self) -> MeasurementKind {
		MeasurementKind::Inference
	}

	fn run(&self, dataset: &Path, entries: &[HarnessEntry<'_>]) -> Result<String> {
		let stage = self.project.join(STAGE_DIR);
		clear_staged(&stage)?;
		stage_artifacts(&stage, entries)?;
		write_source(&self.project.join(SOURCE_FILE), &render_inference(dataset, entries))?;

		debug!(project = %self.project.display(), candidates = entries.len(), "building inference benchmark");
		let mut make = Command::new("make");
		make.arg("-j").arg(self.jobs.to_string()).current_dir(&self.project);
		run_compiler(make)?;

		let mut bench = Command::new(BINARY);
		bench.current_dir(&self.project);
		run_benchmark(bench)
	}

	fn parse(&self, output: &str) -> Result<Vec<Latency>> {
		parse_nanosecond_lines(output)
	}
}

/// Renders the inference program timing each entry in order.
pub fn render_inference(dataset: &Path, entries: &[HarnessEntry<'_>]) -> String {
	let mut includes = String::new();
	let mut timings = String::new();
	for entry in entries {
		let ns = entry.candidate.namespace();
		let _ = writeln!(includes, "#include \"{STAGE_DIR}/{ns}.h\"");
		let _ = write!(
			timings,
			"  {{\n    auto start = std::chrono::high_resolution_clock::now();\n    \
			 __attribute__((unused)) volatile uint64_t pos;\n    \
			 for (auto itm : random_keys) {{\n      pos = {ns}::lookup(itm);\n    }}\n    \
			 auto finish = std::chrono::high_resolution_clock::now();\n    \
			 std::cout << std::chrono::duration_cast<std::chrono::nanoseconds>(finish-start).count() << \"ns\\n\";\n  }}\n"
		);
	}
	TEMPLATE
		.replace("{{filename}}", &dataset.display().to_string())
		.replace("{{lookups}}", &INFERENCE_LOOKUPS.to_string())
		.replace("{{includes}}", &includes)
		.replace("{{timings}}", &timings)
}

/// Parses `<total>ns` lines into per-lookup nanoseconds.
pub fn parse_nanosecond_lines(output: &str) -> Result<Vec<Latency>> {
	output
		.lines()
		.map(str::trim)
		.filter(|line| !line.is_empty())
		.map(|line| {
			line.strip_suffix("ns")
				.and_then(|total| total.trim().parse::<f64>().ok())
				.map(|total| Latency::from_raw(total / f64::from(INFERENCE_LOOKUPS)))
				.ok_or_else(|| MeasureError::ParseLatency { line: line.to_owned() })
		})
		.collect()
}
