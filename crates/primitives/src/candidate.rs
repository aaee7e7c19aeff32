use std::fmt;
use std::str::FromStr;

use crate::{Identity, PrimitiveError, Topology};

/// Final lookup strategy compiled around a candidate's prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum SearchMode {
	#[default]
	Linear,
	Binary,
}

impl SearchMode {
	pub fn from_binary(binary: bool) -> Self {
		if binary { Self::Binary } else { Self::Linear }
	}

	pub fn is_binary(self) -> bool {
		self == Self::Binary
	}

	/// Suffix used in cache directory names.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Linear => "linear",
			Self::Binary => "binary",
		}
	}
}

impl fmt::Display for SearchMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// One point in the search space.
///
/// The identity is computed once at construction. Ordering is by identity and then
/// search mode, which is the canonical order of every result collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Candidate {
	identity: Identity,
	mode: SearchMode,
	topology: Topology,
	branching_factor: u64,
}

impl Candidate {
	/// Creates a linear-search candidate.
	pub fn new(topology: Topology, branching_factor: u64) -> Self {
		let identity = Identity::of(&topology, branching_factor);
		Self {
			identity,
			mode: SearchMode::Linear,
			topology,
			branching_factor,
		}
	}

	/// Returns the same candidate under another search mode. Identity is unchanged.
	pub fn with_mode(mut self, mode: SearchMode) -> Self {
		self.mode = mode;
		self
	}

	pub fn topology(&self) -> &Topology {
		&self.topology
	}

	pub fn branching_factor(&self) -> u64 {
		self.branching_factor
	}

	pub fn mode(&self) -> SearchMode {
		self.mode
	}

	pub fn identity(&self) -> &Identity {
		&self.identity
	}

	pub fn namespace(&self) -> String {
		self.identity.namespace()
	}
}

impl fmt::Display for Candidate {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}:{}", self.topology, self.branching_factor)
	}
}

/// Parses `<layers>:<branching factor>`, e.g. `radix,linear:1024`.
impl FromStr for Candidate {
	type Err = PrimitiveError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let (layers, bf) = s.rsplit_once(':').ok_or_else(|| PrimitiveError::InvalidCandidate(s.to_string()))?;
		let branching_factor = bf
			.trim()
			.parse::<u64>()
			.map_err(|_| PrimitiveError::InvalidCandidate(s.to_string()))?;
		Ok(Self::new(layers.parse()?, branching_factor))
	}
}
