//! Latency measurement of built candidates.
//!
//! A [`Harness`] embeds a set of generated indexes into one benchmark binary,
//! compiles it and runs it once. [`MeasurePipeline`] drives a harness over
//! arbitrarily many candidates in bounded chunks, skipping candidates whose
//! measurement is already cached and persisting the new ones.

mod harness;
mod inference;
mod pipeline;
mod search;

use std::path::PathBuf;
use std::process::ExitStatus;

pub use harness::{Harness, HarnessEntry, lookups_path};
pub use inference::{INFERENCE_LOOKUPS, InferenceHarness, parse_nanosecond_lines, render_inference};
pub use pipeline::{DEFAULT_CHUNK, MeasurePipeline};
use rmiopt_cache::CacheError;
pub use search::{SearchHarness, parse_result_lines, render_benchmark};
use thiserror::Error;

/// Errors that can occur while measuring candidates.
#[derive(Debug, Error)]
pub enum MeasureError {
	#[error(transparent)]
	Cache(#[from] CacheError),
	#[error("I/O error at {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("failed to launch {program}: {source}")]
	Launch {
		program: String,
		#[source]
		source: std::io::Error,
	},
	#[error("harness compilation failed: {stderr}")]
	Compile { stderr: String },
	#[error("harness run failed ({status}): {stderr}")]
	Run { status: ExitStatus, stderr: String },
	#[error("harness reported {found} latencies for {expected} candidates")]
	ResultCount { expected: usize, found: usize },
	#[error("unparseable harness output line {line:?}")]
	ParseLatency { line: String },
	#[error("{namespace} has no build artifacts for this dataset")]
	NotBuilt { namespace: String },
}

/// Result type for measurement operations.
pub type Result<T> = std::result::Result<T, MeasureError>;
