use std::fmt;

use sha2::{Digest, Sha256};

use crate::Topology;

/// Number of trailing hex digits of the SHA-256 digest kept as the identity.
pub const IDENTITY_LEN: usize = 20;

/// Prefix that turns an identity into a valid C++ namespace.
pub const NAMESPACE_PREFIX: &str = "nm";

/// Stable hash of `(topology, branching factor)`.
///
/// Identical inputs yield identical identities across processes and runs, which is
/// what lets separate runs share a cache. The search mode does not participate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity(String);

impl Identity {
	/// Computes the identity of a topology and branching factor.
	pub fn of(topology: &Topology, branching_factor: u64) -> Self {
		let mut hasher = Sha256::new();
		hasher.update(format!("{topology} {branching_factor}").as_bytes());
		let digest = format!("{:x}", hasher.finalize());
		Self(digest[digest.len() - IDENTITY_LEN..].to_string())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Namespace the generator emits code under (`nm<identity>`).
	pub fn namespace(&self) -> String {
		format!("{NAMESPACE_PREFIX}{}", self.0)
	}
}

impl fmt::Display for Identity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}
