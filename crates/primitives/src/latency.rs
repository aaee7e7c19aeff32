use std::fmt;
use std::str::FromStr;

use crate::PrimitiveError;

/// Observed per-lookup latency of one candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Latency {
	/// Nanoseconds per lookup.
	Measured(f64),
	/// The candidate built but could not be exercised by the harness.
	Failed,
}

impl Latency {
	/// Maps a raw harness value, where negative values (`-1`) and NaN signal failure.
	pub fn from_raw(value: f64) -> Self {
		if value.is_nan() || value < 0.0 { Self::Failed } else { Self::Measured(value) }
	}

	/// Latency as a float, NaN when failed.
	pub fn as_f64(self) -> f64 {
		match self {
			Self::Measured(value) => value,
			Self::Failed => f64::NAN,
		}
	}

	pub fn is_failed(self) -> bool {
		matches!(self, Self::Failed)
	}
}

/// Formats as the cache record text: the float, or `nan`.
impl fmt::Display for Latency {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Measured(value) => write!(f, "{value}"),
			Self::Failed => f.write_str("nan"),
		}
	}
}

impl FromStr for Latency {
	type Err = PrimitiveError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let trimmed = s.trim();
		if trimmed.eq_ignore_ascii_case("nan") {
			return Ok(Self::Failed);
		}
		trimmed
			.parse::<f64>()
			.map(Self::from_raw)
			.map_err(|_| PrimitiveError::InvalidLatency(s.to_string()))
	}
}
