use std::collections::BTreeSet;

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rmiopt_primitives::{BuildMetrics, BuildResult, Candidate, Latency, SearchMode};

use super::*;

fn row(layers: &str, bf: u64, size: u64, error: f64) -> ResultRow {
	ResultRow::new(BuildResult {
		candidate: Candidate::new(layers.parse().expect("valid topology"), bf),
		metrics: BuildMetrics {
			size_linear: size,
			size_binary: size + 8,
			average_error: error,
			max_error: error * 4.0,
			average_log2_error: error.log2(),
		},
	})
}

const SIZE_ERROR: [Objective; 2] = [Objective::SizeLinear, Objective::AverageError];

#[test]
fn incomparable_rows_are_both_on_the_frontier() {
	let rows = [row("radix,linear", 1024, 100, 0.5), row("radix,linear", 2048, 80, 0.6)];
	assert_eq!(frontier(&rows, &SIZE_ERROR, false), BTreeSet::from([0, 1]));
}

#[test]
fn weakly_better_row_excludes_the_other() {
	let rows = [row("radix,linear", 1024, 100, 0.5), row("radix,linear", 2048, 100, 0.4)];
	assert_eq!(frontier(&rows, &SIZE_ERROR, false), BTreeSet::from([1]));
}

#[test]
fn identical_rows_exclude_each_other() {
	let rows = [row("radix,linear", 1024, 100, 0.5), row("cubic,linear", 1024, 100, 0.5)];
	assert!(frontier(&rows, &SIZE_ERROR, false).is_empty());
}

#[test]
fn starred_rows_survive_unless_stars_are_ignored() {
	let d = row("radix,linear", 1024, 100, 0.5);
	let c = row("bradix,linear", 1024, 100, 0.5).with_star(true);
	let rows = [c, d];

	assert_eq!(frontier(&rows, &SIZE_ERROR, false), BTreeSet::from([0]));
	assert!(frontier(&rows, &SIZE_ERROR, true).is_empty());
}

#[test]
fn failed_latency_neither_dominates_nor_is_dominated() {
	let objectives = [Objective::Size, Objective::Latency];
	let fast = row("radix,linear", 1024, 100, 0.5).with_latency(Latency::Measured(120.0));
	let broken = row("radix,linear", 512, 10, 0.5).with_latency(Latency::Failed);
	let slow = row("cubic,linear", 4096, 400, 0.1).with_latency(Latency::Measured(300.0));
	let unmeasured = row("linear,linear", 4096, 1, 0.1);

	let rows = [fast, broken, slow, unmeasured];
	assert_eq!(frontier(&rows, &objectives, true), BTreeSet::from([0, 1, 3]));
	let points: Vec<Vec<f64>> = rows.iter().map(|row| row.objectives(&objectives)).collect();
	assert!(!dominates(&points[0], &points[1]));
	assert!(!dominates(&points[1], &points[2]));

	let pair = [rows[0].clone(), rows[1].clone()];
	assert_eq!(frontier(&pair, &objectives, true), BTreeSet::from([0, 1]));
}

#[test]
fn size_objective_follows_search_mode() {
	let linear = row("radix,linear", 1024, 100, 0.5);
	let mut binary = linear.clone();
	binary.result = binary.result.with_mode(SearchMode::Binary);
	assert_eq!(Objective::Size.value(&linear), 100.0);
	assert_eq!(Objective::Size.value(&binary), 108.0);
}

#[test]
fn mask_marks_frontier_rows() {
	let rows = [
		row("radix,linear", 1024, 100, 0.5),
		row("radix,linear", 2048, 120, 0.6),
		row("radix,linear", 4096, 80, 0.7),
	];
	assert_eq!(frontier_mask(&rows, &SIZE_ERROR, false), vec![true, false, true]);
}

#[test]
fn table_keeps_canonical_order() {
	let table: ResultTable = [row("radix,linear", 2048, 80, 0.6), row("radix,linear", 1024, 100, 0.5)]
		.into_iter()
		.collect();
	let namespaces: Vec<String> = table.rows().iter().map(|r| r.result.candidate.namespace()).collect();
	let mut sorted = namespaces.clone();
	sorted.sort();
	assert_eq!(namespaces, sorted);
	assert_eq!(table.frontier_rows(&SIZE_ERROR, false).len(), 2);
}

#[test]
fn objectives_parse_from_column_names() {
	for objective in Objective::ALL {
		assert_eq!(objective.column().parse::<Objective>(), Ok(objective));
	}
	assert!("speed".parse::<Objective>().is_err());
}

/// Small integer coordinates so ties are common, with the occasional failed (NaN) value.
fn coordinate() -> impl Strategy<Value = f64> {
	prop_oneof![9 => (0u8..8).prop_map(f64::from), 1 => Just(f64::NAN)]
}

fn points() -> impl Strategy<Value = Vec<Vec<f64>>> {
	prop::collection::vec(prop::collection::vec(coordinate(), 2), 0..24)
}

proptest! {
	#[test]
	fn frontier_rows_are_undominated_and_the_rest_are_dominated(pts in points()) {
		let front = pareto_indices(&pts);
		for i in 0..pts.len() {
			let dominated = (0..pts.len()).any(|j| j != i && dominates(&pts[j], &pts[i]));
			prop_assert_eq!(front.contains(&i), !dominated);
		}
	}

	#[test]
	fn adding_a_dominated_point_keeps_the_frontier(pts in points(), pick in any::<prop::sample::Index>(), bump in 1u8..4) {
		prop_assume!(!pts.is_empty());
		let base = &pts[pick.index(pts.len())];
		prop_assume!(base.iter().all(|v| !v.is_nan()));
		let worse: Vec<f64> = base.iter().map(|v| v + f64::from(bump)).collect();

		let before = pareto_indices(&pts);
		let mut extended = pts.clone();
		extended.push(worse);
		prop_assert_eq!(pareto_indices(&extended), before);
	}
}
