use clap::Parser;
use pretty_assertions::assert_eq;

use super::*;

#[test]
fn parse_optimize_with_overrides() {
	let cli = Cli::try_parse_from([
		"rmiopt",
		"optimize",
		"/data/books_200M_uint64",
		"--output",
		"books.csv",
		"--no-refine",
		"-j",
		"12",
	])
	.expect("parse");

	assert_eq!(cli.threads, Some(12));
	match cli.command {
		Command::Optimize {
			dataset,
			output,
			specialty_layers,
			no_refine,
		} => {
			assert_eq!(dataset, PathBuf::from("/data/books_200M_uint64"));
			assert_eq!(output, Some(PathBuf::from("books.csv")));
			assert!(!specialty_layers);
			assert!(no_refine);
		}
		other => panic!("unexpected command: {other:?}"),
	}
}

#[test]
fn parse_measure_candidates_in_binary_mode() {
	let cli = Cli::try_parse_from([
		"rmiopt",
		"--verbose",
		"measure",
		"/data/fb_200M_uint64",
		"radix,linear:1024",
		"bradix,cubic:4096",
		"--binary",
		"--kind",
		"inference",
	])
	.expect("parse");

	assert!(cli.verbose);
	let candidates = cli.command.candidates();
	assert_eq!(
		candidates.iter().map(ToString::to_string).collect::<Vec<_>>(),
		vec!["radix,linear:1024".to_owned(), "bradix,cubic:4096".to_owned()]
	);
	assert!(candidates.iter().all(|c| c.mode() == SearchMode::Binary));
	assert!(matches!(
		cli.command,
		Command::Measure {
			kind: MeasureKind::Inference,
			..
		}
	));
}

#[test]
fn measure_defaults_to_search_latency() {
	let cli = Cli::try_parse_from(["rmiopt", "measure", "/data/fb_200M_uint64", "linear,linear:128"]).expect("parse");
	assert!(matches!(
		cli.command,
		Command::Measure {
			kind: MeasureKind::Search,
			binary: false,
			..
		}
	));
	assert!(cli.command.candidates().iter().all(|c| c.mode() == SearchMode::Linear));
}

#[test]
fn malformed_candidates_are_rejected() {
	assert!(Cli::try_parse_from(["rmiopt", "measure", "/data/x", "radix,linear"]).is_err());
	assert!(Cli::try_parse_from(["rmiopt", "measure", "/data/x", "radix,:128"]).is_err());
	assert!(Cli::try_parse_from(["rmiopt", "measure", "/data/x"]).is_err());
}

#[test]
fn warm_requires_datasets() {
	assert!(Cli::try_parse_from(["rmiopt", "warm"]).is_err());
	let cli = Cli::try_parse_from(["rmiopt", "warm", "/data/a", "/data/b"]).expect("parse");
	assert!(matches!(cli.command, Command::Warm { ref datasets } if datasets.len() == 2));
}
