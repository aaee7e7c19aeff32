//! Pareto frontier selection.
//!
//! All objectives are minimized. A row is on the frontier unless some other
//! row is no worse on every objective. Starred rows can be forced onto the
//! frontier. A row with a NaN objective (failed measurement) neither dominates
//! nor is dominated, so it always stays on the frontier.

mod objective;
mod table;

use std::collections::BTreeSet;

pub use objective::Objective;
pub use table::{ResultRow, ResultTable};

/// Returns whether `a` is no worse than `b` on every objective.
///
/// Comparisons involving NaN are false, so a point with a NaN component never
/// dominates anything.
pub fn dominates(a: &[f64], b: &[f64]) -> bool {
	a.iter().zip(b).all(|(x, y)| x <= y)
}

/// Indices of the non-dominated points.
pub fn pareto_indices(points: &[Vec<f64>]) -> BTreeSet<usize> {
	(0..points.len())
		.filter(|&i| !(0..points.len()).any(|j| j != i && dominates(&points[j], &points[i])))
		.collect()
}

/// Indices of the frontier rows of `rows` under `objectives`.
///
/// Unless `ignore_star` is set, starred rows are always included.
pub fn frontier(rows: &[ResultRow], objectives: &[Objective], ignore_star: bool) -> BTreeSet<usize> {
	let points: Vec<Vec<f64>> = rows.iter().map(|row| row.objectives(objectives)).collect();
	let mut front = pareto_indices(&points);
	if !ignore_star {
		front.extend(rows.iter().enumerate().filter(|(_, row)| row.starred).map(|(idx, _)| idx));
	}
	front
}

/// Same as [`frontier`], as one flag per row.
pub fn frontier_mask(rows: &[ResultRow], objectives: &[Objective], ignore_star: bool) -> Vec<bool> {
	let front = frontier(rows, objectives, ignore_star);
	(0..rows.len()).map(|idx| front.contains(&idx)).collect()
}

#[cfg(test)]
mod tests;
