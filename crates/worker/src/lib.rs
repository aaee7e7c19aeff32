//! Parallel dispatch of candidates to the external index generator.
//!
//! A batch of candidates is split round-robin across worker processes that share
//! one working area. The batch is all-or-nothing: a single failing worker aborts
//! it before anything is committed to the cache.

mod dispatch;
mod generator;
mod merge;

use std::path::PathBuf;

pub use dispatch::{Dispatcher, partition};
pub use generator::{Generator, Job, JobStatus, ProcessGenerator};
pub use merge::{merge, read_partition};
use rmiopt_cache::CacheError;
use rmiopt_primitives::GeneratorConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Contents of one generator parameter file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamGrid {
	pub configs: Vec<GeneratorConfig>,
}

/// Errors that can occur while dispatching a batch.
#[derive(Debug, Error)]
pub enum DispatchError {
	#[error(transparent)]
	Cache(#[from] CacheError),
	#[error("I/O error at {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("malformed generator output in {path}: {source}")]
	Json {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},
	#[error("failed to launch generator for batch {index}: {source}")]
	Spawn {
		index: usize,
		#[source]
		source: std::io::Error,
	},
	#[error("generator failed for batch {index} ({status})")]
	WorkerFailed { index: usize, status: JobStatus },
	#[error("generator produced no result for {namespace} in {path}")]
	MissingResult { namespace: String, path: PathBuf },
	#[error("generator returned unrequested result {namespace} in {path}")]
	UnexpectedResult { namespace: String, path: PathBuf },
}

/// Result type for dispatch operations.
pub type Result<T> = std::result::Result<T, DispatchError>;
