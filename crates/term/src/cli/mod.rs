//! CLI schema for the rmiopt binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use rmiopt_primitives::{Candidate, SearchMode};

#[derive(Parser, Debug)]
#[command(name = "rmiopt")]
#[command(about = "Design-space search over learned index configurations")]
#[command(version)]
/// Command-line arguments.
pub struct Cli {
	/// Settings file (defaults to the user config directory)
	#[arg(short, long, value_name = "PATH", global = true)]
	pub config: Option<PathBuf>,

	/// Verbose logging
	#[arg(short, long, global = true)]
	pub verbose: bool,

	/// Generator executable
	#[arg(long, value_name = "PATH", global = true)]
	pub generator: Option<PathBuf>,

	/// Root of the build cache
	#[arg(long, value_name = "DIR", global = true)]
	pub cache_root: Option<PathBuf>,

	/// Shared working directory for generator runs
	#[arg(long, value_name = "DIR", global = true)]
	pub work_dir: Option<PathBuf>,

	/// Concurrent generator processes
	#[arg(short = 'j', long, global = true)]
	pub threads: Option<usize>,

	/// Subcommand to execute.
	#[command(subcommand)]
	pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
	/// Run the full multi-round search on a dataset
	Optimize {
		/// Sorted key file
		dataset: PathBuf,
		/// Where to write the ranked table
		#[arg(short, long, value_name = "PATH")]
		output: Option<PathBuf>,
		/// Also probe histogram and distribution-fitted root layers
		#[arg(long)]
		specialty_layers: bool,
		/// Skip the final ±50% branching factor refinement
		#[arg(long)]
		no_refine: bool,
	},
	/// Pre-populate the cache with a fixed grid for each dataset
	Warm {
		#[arg(required = true)]
		datasets: Vec<PathBuf>,
	},
	/// Build and measure explicit candidates
	Measure {
		/// Sorted key file
		dataset: PathBuf,
		/// Candidates as `layers:branching_factor`, e.g. `radix,linear:1024`
		#[arg(required = true)]
		candidates: Vec<Candidate>,
		/// Use binary search for the last mile
		#[arg(short, long)]
		binary: bool,
		/// Which latency to measure
		#[arg(long, value_enum, default_value_t = MeasureKind::Search)]
		kind: MeasureKind,
	},
}

/// Harness used by `measure`.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasureKind {
	/// Full lookups through the SOSD benchmark
	Search,
	/// Model evaluation only
	Inference,
}

impl Command {
	/// The explicit candidates of `measure`, in the requested search mode.
	pub fn candidates(&self) -> Vec<Candidate> {
		match self {
			Self::Measure { candidates, binary, .. } => candidates
				.iter()
				.map(|candidate| candidate.clone().with_mode(SearchMode::from_binary(*binary)))
				.collect(),
			_ => Vec::new(),
		}
	}
}

#[cfg(test)]
mod tests;
