use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::PrimitiveError;

/// Ordered list of layer-kind tokens, top layer first.
///
/// Serialized as the comma-joined form (`radix,linear`), which is also the form
/// used in generator parameter files and cache directory names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Topology(Vec<String>);

impl Topology {
	/// Builds a topology from layer tokens.
	///
	/// Tokens must be non-empty and made of ASCII alphanumerics or `_`.
	pub fn new<I, S>(layers: I) -> Result<Self, PrimitiveError>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let layers: Vec<String> = layers.into_iter().map(Into::into).collect();
		if layers.is_empty() {
			return Err(PrimitiveError::EmptyTopology);
		}
		if let Some(bad) = layers.iter().find(|layer| !is_valid_layer(layer)) {
			return Err(PrimitiveError::InvalidLayer(bad.clone()));
		}
		Ok(Self(layers))
	}

	/// Two-layer convenience constructor.
	pub fn pair(top: &str, bottom: &str) -> Result<Self, PrimitiveError> {
		Self::new([top, bottom])
	}

	pub fn layers(&self) -> &[String] {
		&self.0
	}

	/// The first (root) layer.
	pub fn top(&self) -> &str {
		&self.0[0]
	}

	/// Histogram-rooted topologies are tuned over a separate, small branching-factor set.
	pub fn is_histogram(&self) -> bool {
		self.top() == "histogram"
	}
}

fn is_valid_layer(layer: &str) -> bool {
	!layer.is_empty() && layer.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

impl fmt::Display for Topology {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0.join(","))
	}
}

impl FromStr for Topology {
	type Err = PrimitiveError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if s.trim().is_empty() {
			return Err(PrimitiveError::EmptyTopology);
		}
		Self::new(s.split(',').map(str::trim))
	}
}

impl TryFrom<String> for Topology {
	type Error = PrimitiveError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		value.parse()
	}
}

impl From<Topology> for String {
	fn from(value: Topology) -> Self {
		value.to_string()
	}
}
