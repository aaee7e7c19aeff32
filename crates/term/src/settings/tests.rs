use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use pretty_assertions::assert_eq;

use super::*;

#[test]
fn empty_file_yields_defaults() {
	let settings = Settings::parse("").expect("parse");
	assert_eq!(settings, Settings::default());
	assert_eq!(settings.generator, PathBuf::from("rmi"));
	assert_eq!(settings.search.threads, 6);
	assert_eq!(settings.search.output, PathBuf::from("out.csv"));
}

#[test]
fn nested_search_table_is_read() {
	let settings = Settings::parse(
		r#"
generator = "/opt/rmi/target/release/rmi"
generator_args = ["--threads", "4"]
bench_dir = "/opt/SOSD"

[search]
threads = 8
refine = false
starred = ["bradix,linear", "radix,cubic"]
"#,
	)
	.expect("parse");

	assert_eq!(settings.generator, PathBuf::from("/opt/rmi/target/release/rmi"));
	assert_eq!(settings.generator_args, vec!["--threads".to_owned(), "4".to_owned()]);
	assert_eq!(settings.bench_dir, PathBuf::from("/opt/SOSD"));
	assert_eq!(settings.search.threads, 8);
	assert!(!settings.search.refine);
	assert_eq!(settings.search.starred.len(), 2);
	assert_eq!(settings.search.measure_chunk, 20);
}

#[test]
fn unknown_types_are_rejected() {
	assert!(Settings::parse("make_jobs = \"many\"").is_err());
	assert!(Settings::parse("[search]\nstarred = [\"\"]").is_err());
}

#[test]
fn explicit_path_must_exist() {
	let tmp = tempfile::tempdir().expect("create tempdir");
	assert!(Settings::load(Some(&tmp.path().join("missing.toml"))).is_err());

	let path = tmp.path().join("config.toml");
	fs::write(&path, "cache_root = \"/var/cache/rmi\"\n").expect("write settings");
	let settings = Settings::load(Some(&path)).expect("load");
	assert_eq!(settings.cache_root, Path::new("/var/cache/rmi"));
}

#[test]
fn command_line_overrides_file_values() {
	let mut settings = Settings::parse("generator = \"rmi\"\n[search]\nthreads = 3\n").expect("parse");
	let cli = Cli::try_parse_from([
		"rmiopt",
		"--generator",
		"./target/release/rmi",
		"--work-dir",
		"/tmp/rmi-work",
		"-j",
		"16",
		"warm",
		"/data/books_200M_uint64",
	])
	.expect("parse");

	settings.apply(&cli);
	assert_eq!(settings.generator, PathBuf::from("./target/release/rmi"));
	assert_eq!(settings.work_dir, PathBuf::from("/tmp/rmi-work"));
	assert_eq!(settings.search.threads, 16);
	assert_eq!(settings.bench_dir, PathBuf::from("SOSD"));
}
