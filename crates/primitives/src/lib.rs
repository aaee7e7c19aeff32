//! Core types for learned-index design-space exploration: topologies, candidates,
//! identities, build results and measured latencies.

/// Search-space points.
pub mod candidate;
/// Stable candidate identities.
pub mod identity;
/// Measured lookup latency.
pub mod latency;
/// Generator-reported metrics and their JSON record form.
pub mod record;
/// Layer topologies.
pub mod topology;

pub use candidate::{Candidate, SearchMode};
pub use identity::{IDENTITY_LEN, Identity, NAMESPACE_PREFIX};
pub use latency::Latency;
pub use record::{BuildMetrics, BuildRecord, BuildResult, GeneratorConfig};
use thiserror::Error;
pub use topology::Topology;

/// Errors raised while constructing or parsing primitive values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PrimitiveError {
	#[error("topology must contain at least one layer")]
	EmptyTopology,
	#[error("invalid layer token {0:?}")]
	InvalidLayer(String),
	#[error("invalid candidate {0:?}, expected <layers>:<branching factor>")]
	InvalidCandidate(String),
	#[error("invalid latency value {0:?}")]
	InvalidLatency(String),
}
