//! rmiopt binary.
//!
//! Builds learned-index candidates with an external generator, measures them
//! with an external benchmark, and searches for the size/latency frontier.

mod cli;
mod settings;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use cli::{Cli, Command, MeasureKind};
use rmiopt_bench::{Harness, InferenceHarness, SearchHarness};
use rmiopt_cache::{BuildCache, WorkArea};
use rmiopt_frontier::ResultTable;
use rmiopt_search::{SearchConfig, SearchLoop};
use rmiopt_worker::ProcessGenerator;
use settings::Settings;
use tracing::info;

fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();
	setup_tracing(cli.verbose);

	let mut settings = Settings::load(cli.config.as_deref())?;
	settings.apply(&cli);
	let work = Arc::new(
		WorkArea::new(&settings.work_dir)
			.with_context(|| format!("cannot use work directory {}", settings.work_dir.display()))?,
	);
	info!(
		generator = %settings.generator.display(),
		cache = %settings.cache_root.display(),
		work = %settings.work_dir.display(),
		"rmiopt starting"
	);

	match &cli.command {
		Command::Optimize {
			dataset,
			output,
			specialty_layers,
			no_refine,
		} => {
			let mut config = settings.search.clone();
			if let Some(output) = output {
				config.output = output.clone();
			}
			config.specialty_layers |= *specialty_layers;
			config.refine &= !*no_refine;

			let harness = SearchHarness::new(&settings.bench_dir);
			let search = search_loop(&settings, &work, dataset, harness, config);
			let report = search.run().with_context(|| format!("search on {} failed", dataset.display()))?;
			println!("{} models evaluated, {} on the front", report.rows().len(), report.front().count());
			println!("Results saved to {}", search.config().output.display());
		}
		Command::Warm { datasets } => {
			for dataset in datasets {
				info!(dataset = %dataset.display(), "warming cache");
				let harness = SearchHarness::new(&settings.bench_dir);
				let search = search_loop(&settings, &work, dataset, harness, settings.search.clone());
				let table = search
					.warm()
					.with_context(|| format!("warming {} failed", dataset.display()))?;
				print_table(&table);
			}
		}
		command @ Command::Measure { dataset, kind, .. } => {
			let candidates = command.candidates();
			let table = match kind {
				MeasureKind::Search => {
					let harness = SearchHarness::new(&settings.bench_dir);
					search_loop(&settings, &work, dataset, harness, settings.search.clone()).measure(&candidates)
				}
				MeasureKind::Inference => {
					let harness = InferenceHarness::new(&settings.inference_dir).with_jobs(settings.make_jobs);
					search_loop(&settings, &work, dataset, harness, settings.search.clone()).measure(&candidates)
				}
			}
			.with_context(|| format!("measuring on {} failed", dataset.display()))?;
			print_table(&table);
		}
	}

	Ok(())
}

fn search_loop<H: Harness>(
	settings: &Settings,
	work: &Arc<WorkArea>,
	dataset: &Path,
	harness: H,
	config: SearchConfig,
) -> SearchLoop<ProcessGenerator, H> {
	let dataset = absolute(dataset);
	let cache = BuildCache::new(&settings.cache_root, &dataset, Arc::clone(work));
	let generator = ProcessGenerator::new(&settings.generator).with_args(settings.generator_args.iter().cloned());
	SearchLoop::new(cache, generator, harness, config)
}

/// Generator and harness runs use other working directories, so relative dataset
/// paths are resolved up front.
fn absolute(path: &Path) -> PathBuf {
	std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

fn print_table(table: &ResultTable) {
	println!("layers\tbranching factor\tbinary\tsize\tmax error\tlatency");
	for row in table.rows() {
		let result = &row.result;
		let latency = row.latency.map_or_else(|| "-".to_owned(), |latency| latency.to_string());
		println!(
			"{}\t{}\t{}\t{}\t{}\t{}",
			result.candidate.topology(),
			result.candidate.branching_factor(),
			result.candidate.mode().is_binary(),
			result.size(),
			result.metrics.max_error,
			latency
		);
	}
}

fn setup_tracing(verbose: bool) {
	use std::fs::OpenOptions;

	use tracing_subscriber::EnvFilter;
	use tracing_subscriber::prelude::*;

	let filter = || {
		EnvFilter::try_from_default_env().unwrap_or_else(|_| {
			if verbose {
				EnvFilter::new("rmiopt=debug,info")
			} else {
				EnvFilter::new("rmiopt=info,warn")
			}
		})
	};

	// RMIOPT_LOG_DIR mirrors stderr logging into a per-process file.
	if let Some(log_dir) = std::env::var("RMIOPT_LOG_DIR").ok().map(PathBuf::from)
		&& std::fs::create_dir_all(&log_dir).is_ok()
	{
		let log_path = log_dir.join(format!("rmiopt.{}.log", std::process::id()));
		if let Ok(file) = OpenOptions::new().create(true).append(true).open(&log_path) {
			let file_layer = tracing_subscriber::fmt::layer()
				.with_writer(file)
				.with_ansi(false)
				.with_target(true);
			tracing_subscriber::registry()
				.with(filter())
				.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
				.with(file_layer)
				.init();
			tracing::info!(path = ?log_path, "tracing initialized");
			return;
		}
	}

	tracing_subscriber::registry()
		.with(filter())
		.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
		.init();
}
