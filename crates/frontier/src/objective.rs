use std::fmt;
use std::str::FromStr;

use crate::ResultRow;

/// A minimized column of the result table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Objective {
	SizeLinear,
	SizeBinary,
	/// Size under the row's own search mode.
	Size,
	AverageError,
	MaxError,
	AverageLog2Error,
	/// Measured latency; NaN when unmeasured or failed.
	Latency,
}

impl Objective {
	pub const ALL: [Objective; 7] = [
		Self::SizeLinear,
		Self::SizeBinary,
		Self::Size,
		Self::AverageError,
		Self::MaxError,
		Self::AverageLog2Error,
		Self::Latency,
	];

	/// Column name, matching the generator's result keys where one exists.
	pub fn column(self) -> &'static str {
		match self {
			Self::SizeLinear => "size linear search",
			Self::SizeBinary => "size binary search",
			Self::Size => "size",
			Self::AverageError => "average error",
			Self::MaxError => "max error",
			Self::AverageLog2Error => "average log2 error",
			Self::Latency => "measured",
		}
	}

	pub fn value(self, row: &ResultRow) -> f64 {
		let metrics = &row.result.metrics;
		match self {
			Self::SizeLinear => metrics.size_linear as f64,
			Self::SizeBinary => metrics.size_binary as f64,
			Self::Size => row.result.size() as f64,
			Self::AverageError => metrics.average_error,
			Self::MaxError => metrics.max_error,
			Self::AverageLog2Error => metrics.average_log2_error,
			Self::Latency => row.latency.map_or(f64::NAN, |latency| latency.as_f64()),
		}
	}
}

impl fmt::Display for Objective {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.column())
	}
}

impl FromStr for Objective {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|objective| objective.column() == s)
			.ok_or_else(|| format!("unknown objective {s:?}"))
	}
}
