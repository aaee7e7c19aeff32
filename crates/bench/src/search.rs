//! Search-latency profile: full lookups through a SOSD checkout.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use rmiopt_cache::MeasurementKind;
use rmiopt_primitives::{Latency, SearchMode};
use tracing::debug;

use crate::harness::{
	HarnessEntry, absolute_project, clear_staged, lookups_path, run_benchmark, run_compiler, stage_artifacts, write_source,
};
use crate::{Harness, MeasureError, Result};

const DEFAULT_TEMPLATE: &str = include_str!("../assets/benchmark.cc.in");

/// Template override looked up in the project root.
const TEMPLATE_FILE: &str = "benchmark.cc.in";
const COMPETITOR_DIR: &str = "competitors/rmi";
const SOURCE_FILE: &str = "benchmark.cc";
const BUILD_DIR: &str = "build";
const PREPARE_SCRIPT: &str = "scripts/prepare.sh";
const BENCHMARK_BINARY: &str = "build/benchmark";

/// Measures end-to-end lookup latency of each candidate in its own search mode.
#[derive(Debug, Clone)]
pub struct SearchHarness {
	project: PathBuf,
}

impl SearchHarness {
	pub fn new(project: impl Into<PathBuf>) -> Self {
		Self {
			project: absolute_project(project.into()),
		}
	}

	pub fn project(&self) -> &Path {
		&self.project
	}

	fn template(&self) -> Result<String> {
		let path = self.project.join(TEMPLATE_FILE);
		if !path.is_file() {
			return Ok(DEFAULT_TEMPLATE.to_owned());
		}
		fs::read_to_string(&path).map_err(|source| MeasureError::Io { path, source })
	}
}

impl Harness for SearchHarness {
	fn kind(&self) -> MeasurementKind {
		MeasurementKind::Search
	}

	fn run(&self, dataset: &Path, entries: &[HarnessEntry<'_>]) -> Result<String> {
		let build_dir = self.project.join(BUILD_DIR);
		if build_dir.exists() {
			fs::remove_dir_all(&build_dir).map_err(|source| MeasureError::Io { path: build_dir, source })?;
		}
		let competitors = self.project.join(COMPETITOR_DIR);
		clear_staged(&competitors)?;
		stage_artifacts(&competitors, entries)?;
		write_source(&self.project.join(SOURCE_FILE), &render_benchmark(&self.template()?, entries))?;

		debug!(project = %self.project.display(), candidates = entries.len(), "building search benchmark");
		let mut prepare = Command::new("sh");
		prepare.arg(PREPARE_SCRIPT).current_dir(&self.project);
		run_compiler(prepare)?;

		let mut bench = Command::new(self.project.join(BENCHMARK_BINARY));
		bench.arg(dataset).arg(lookups_path(dataset)).current_dir(&self.project);
		run_benchmark(bench)
	}

	fn parse(&self, output: &str) -> Result<Vec<Latency>> {
		parse_result_lines(output)
	}
}

/// Fills the benchmark template with one include and one run per entry, in entry order.
pub fn render_benchmark(template: &str, entries: &[HarnessEntry<'_>]) -> String {
	let mut includes = String::new();
	let mut runs = String::new();
	for entry in entries {
		let ns = entry.candidate.namespace();
		let wrapper = match entry.candidate.mode() {
			SearchMode::Linear => "RMI_L",
			SearchMode::Binary => "RMI_B",
		};
		let _ = writeln!(includes, "#include \"{COMPETITOR_DIR}/{ns}.h\"");
		let _ = writeln!(runs, "      benchmark.Run<{wrapper}<uint64_t, 0, 0, {ns}::NAME, {ns}::lookup>>();");
	}
	template.replace("{{includes}}", &includes).replace("{{runs}}", &runs)
}

/// Reads the second field of every `RESULT,...` line; `-1` marks a failed candidate.
pub fn parse_result_lines(output: &str) -> Result<Vec<Latency>> {
	output
		.lines()
		.filter(|line| line.starts_with("RESULT"))
		.filter_map(|line| line.split(',').nth(1).map(|field| (line, field.trim())))
		.map(|(line, field)| {
			field
				.parse::<f64>()
				.map(Latency::from_raw)
				.map_err(|_| MeasureError::ParseLatency { line: line.to_owned() })
		})
		.collect()
}
