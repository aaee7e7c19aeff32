use std::collections::BTreeSet;

use rmiopt_primitives::{BuildResult, Latency};

use crate::Objective;

/// A build result, optionally joined with its measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
	pub result: BuildResult,
	pub latency: Option<Latency>,
	/// Forced onto the frontier unless stars are ignored.
	pub starred: bool,
}

impl ResultRow {
	pub fn new(result: BuildResult) -> Self {
		Self {
			result,
			latency: None,
			starred: false,
		}
	}

	pub fn with_latency(mut self, latency: Latency) -> Self {
		self.latency = Some(latency);
		self
	}

	pub fn with_star(mut self, starred: bool) -> Self {
		self.starred = starred;
		self
	}

	pub fn objectives(&self, objectives: &[Objective]) -> Vec<f64> {
		objectives.iter().map(|objective| objective.value(self)).collect()
	}
}

/// The rows of one round, kept in canonical candidate order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultTable {
	rows: Vec<ResultRow>,
}

impl ResultTable {
	pub fn new(mut rows: Vec<ResultRow>) -> Self {
		rows.sort_by(|a, b| a.result.candidate.cmp(&b.result.candidate));
		Self { rows }
	}

	pub fn rows(&self) -> &[ResultRow] {
		&self.rows
	}

	pub fn rows_mut(&mut self) -> &mut [ResultRow] {
		&mut self.rows
	}

	pub fn len(&self) -> usize {
		self.rows.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rows.is_empty()
	}

	pub fn into_rows(self) -> Vec<ResultRow> {
		self.rows
	}

	/// Indices of the frontier rows; see [`crate::frontier`].
	pub fn frontier(&self, objectives: &[Objective], ignore_star: bool) -> BTreeSet<usize> {
		crate::frontier(&self.rows, objectives, ignore_star)
	}

	/// The frontier rows themselves, in table order.
	pub fn frontier_rows(&self, objectives: &[Objective], ignore_star: bool) -> Vec<&ResultRow> {
		self.frontier(objectives, ignore_star)
			.into_iter()
			.map(|idx| &self.rows[idx])
			.collect()
	}
}

impl FromIterator<ResultRow> for ResultTable {
	fn from_iter<I: IntoIterator<Item = ResultRow>>(iter: I) -> Self {
		Self::new(iter.into_iter().collect())
	}
}
