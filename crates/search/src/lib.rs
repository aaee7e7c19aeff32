//! Multi-round design-space search.
//!
//! A [`SearchLoop`] builds an initial grid of candidates, keeps the Pareto
//! front of size against error, expands around the winning topologies, then
//! measures the surviving binary-search candidates with a real harness and
//! writes a latency-ranked [`Report`].

mod config;
pub mod grid;
mod report;
mod search_loop;

use std::path::PathBuf;

pub use config::SearchConfig;
pub use report::{FINAL_OBJECTIVES, Report, ReportRow};
use rmiopt_bench::MeasureError;
use rmiopt_primitives::PrimitiveError;
use rmiopt_worker::DispatchError;
pub use search_loop::{ROUND_OBJECTIVES, SearchLoop, Stage};
use thiserror::Error;

/// Errors that abort a search run.
#[derive(Debug, Error)]
pub enum SearchError {
	#[error(transparent)]
	Topology(#[from] PrimitiveError),
	#[error(transparent)]
	Dispatch(#[from] DispatchError),
	#[error(transparent)]
	Measure(#[from] MeasureError),
	#[error("failed to write report {path}: {source}")]
	Report {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
}

/// Result type for search operations.
pub type Result<T> = std::result::Result<T, SearchError>;
