//! The final ranked table.

use std::cmp::Ordering;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use rmiopt_frontier::{Objective, ResultRow, ResultTable};

use crate::{Result, SearchError};

/// Objectives of the final frontier.
pub const FINAL_OBJECTIVES: [Objective; 2] = [Objective::Size, Objective::Latency];

const HEADER: [&str; 8] = [
	"layers",
	"branching factor",
	"size",
	"average error",
	"max error",
	"binary",
	"front",
	"measured",
];

/// One output line.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
	pub row: ResultRow,
	pub front: bool,
}

impl ReportRow {
	/// Measured latency, NaN when missing or failed.
	pub fn measured(&self) -> f64 {
		Objective::Latency.value(&self.row)
	}
}

/// Measured rows annotated with final frontier membership, fastest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Report {
	rows: Vec<ReportRow>,
}

impl Report {
	/// Computes the `(size, latency)` frontier, ignoring stars, and ranks by latency.
	pub fn new(table: ResultTable) -> Self {
		let front = table.frontier(&FINAL_OBJECTIVES, true);
		let mut rows: Vec<ReportRow> = table
			.into_rows()
			.into_iter()
			.enumerate()
			.map(|(idx, row)| ReportRow {
				row,
				front: front.contains(&idx),
			})
			.collect();
		rows.sort_by(|a, b| by_latency(a.measured(), b.measured()));
		Self { rows }
	}

	pub fn rows(&self) -> &[ReportRow] {
		&self.rows
	}

	pub fn front(&self) -> impl Iterator<Item = &ReportRow> {
		self.rows.iter().filter(|row| row.front)
	}

	/// Writes the table as CSV. Unmeasured latencies are left empty.
	pub fn write_csv<W: Write>(&self, mut out: W) -> io::Result<()> {
		writeln!(out, "{}", HEADER.join(","))?;
		for ReportRow { row, front } in &self.rows {
			let result = &row.result;
			let measured = measured_field(row);
			writeln!(
				out,
				"{},{},{},{},{},{},{},{}",
				csv_field(&result.candidate.topology().to_string()),
				result.candidate.branching_factor(),
				result.size(),
				result.metrics.average_error,
				result.metrics.max_error,
				result.candidate.mode().is_binary(),
				front,
				measured,
			)?;
		}
		out.flush()
	}

	pub fn save(&self, path: &Path) -> Result<()> {
		let file = File::create(path).map_err(|source| SearchError::Report {
			path: path.to_path_buf(),
			source,
		})?;
		self.write_csv(BufWriter::new(file)).map_err(|source| SearchError::Report {
			path: path.to_path_buf(),
			source,
		})
	}
}

fn measured_field(row: &ResultRow) -> String {
	match row.latency {
		Some(latency) if !latency.is_failed() => latency.as_f64().to_string(),
		_ => String::new(),
	}
}

/// Ascending, NaN last.
fn by_latency(a: f64, b: f64) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(false, false) => a.total_cmp(&b),
		(a_nan, b_nan) => a_nan.cmp(&b_nan),
	}
}

/// Quotes a field containing a delimiter, quote or newline.
fn csv_field(value: &str) -> String {
	if value.contains([',', '"', '\n']) {
		format!("\"{}\"", value.replace('"', "\"\""))
	} else {
		value.to_owned()
	}
}
