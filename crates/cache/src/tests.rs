use std::fs;
use std::path::Path;
use std::sync::Arc;

use rmiopt_primitives::{BuildMetrics, BuildResult, Candidate, Latency, SearchMode};

use super::*;

fn candidate(layers: &str, bf: u64) -> Candidate {
	Candidate::new(layers.parse().expect("valid topology"), bf)
}

fn result_for(candidate: &Candidate) -> BuildResult {
	BuildResult {
		candidate: candidate.clone(),
		metrics: BuildMetrics {
			size_linear: 100,
			size_binary: 120,
			average_error: 2.5,
			max_error: 40.0,
			average_log2_error: 1.5,
		},
	}
}

fn write_artifacts(dir: &Path, candidate: &Candidate) {
	fs::create_dir_all(dir).expect("create artifact dir");
	for name in artifact_names(&candidate.namespace()) {
		fs::write(dir.join(&name), format!("// {name}")).expect("write artifact");
	}
}

struct Fixture {
	_tmp: tempfile::TempDir,
	cache: BuildCache,
}

fn fixture() -> Fixture {
	let tmp = tempfile::tempdir().expect("create tempdir");
	let work = Arc::new(WorkArea::new(tmp.path().join("work")).expect("create work area"));
	let cache = BuildCache::new(&tmp.path().join("cache"), Path::new("/data/books_200M_uint64"), work);
	Fixture { _tmp: tmp, cache }
}

#[test]
fn cache_path_follows_legacy_layout() {
	let c = candidate("radix,linear", 1024);
	let path = cache_path(Path::new("/cache"), Path::new("/data/books_200M_uint64"), &c);
	assert_eq!(path, Path::new("/cache/books_200M_uint64/radix,linear1024linear"));

	let binary = cache_path(Path::new("/cache"), Path::new("/data/books_200M_uint64"), &c.with_mode(SearchMode::Binary));
	assert_eq!(binary, Path::new("/cache/books_200M_uint64/radix,linear1024binary"));
}

#[test]
fn lookup_misses_on_empty_cache() {
	let fx = fixture();
	assert!(fx.cache.lookup(&candidate("radix,linear", 1024)).expect("lookup").is_none());
}

#[test]
fn commit_then_lookup_round_trips_and_stages_artifacts() {
	let fx = fixture();
	let c = candidate("radix,linear", 1024);
	write_artifacts(&fx.cache.work_area().holding_dir(), &c);

	let result = result_for(&c);
	fx.cache.commit(&result).expect("commit");

	let hit = fx.cache.lookup(&c).expect("lookup").expect("cache hit");
	assert_eq!(hit, result);
	for name in artifact_names(&c.namespace()) {
		assert!(fx.cache.work_area().root().join(name).is_file());
	}
}

#[test]
fn search_modes_are_separate_entries() {
	let fx = fixture();
	let c = candidate("radix,linear", 1024);
	write_artifacts(&fx.cache.work_area().holding_dir(), &c);
	fx.cache.commit(&result_for(&c)).expect("commit");

	assert!(fx.cache.lookup(&c.clone().with_mode(SearchMode::Binary)).expect("lookup").is_none());
}

#[test]
fn commit_requires_complete_artifact_set() {
	let fx = fixture();
	let c = candidate("radix,linear", 1024);
	let holding = fx.cache.work_area().holding_dir();
	fs::create_dir_all(&holding).expect("create holding dir");
	fs::write(holding.join(format!("{}.cpp", c.namespace())), "").expect("write source");

	let err = fx.cache.commit(&result_for(&c)).expect_err("incomplete artifact set");
	assert!(matches!(err, CacheError::MissingArtifact { .. }));
	assert!(fx.cache.lookup(&c).expect("lookup").is_none());
}

#[test]
fn identity_mismatch_is_fatal() {
	let fx = fixture();
	let c = candidate("radix,linear", 1024);
	let other = candidate("radix,linear", 2048);
	let dir = fx.cache.store().entry_dir(&c);
	write_artifacts(&dir, &c);

	let mut record = rmiopt_primitives::BuildRecord::from(&result_for(&other));
	record.branching_factor = 1024;
	fs::write(dir.join(RESULTS_FILE), serde_json::to_string(&record).expect("serialize")).expect("write record");

	let err = fx.cache.lookup(&c).expect_err("mismatch must not be a miss");
	match err {
		CacheError::IdentityMismatch { expected, found, .. } => {
			assert_eq!(expected, c.namespace());
			assert_eq!(found, other.namespace());
		}
		unexpected => panic!("unexpected error: {unexpected}"),
	}
}

#[test]
fn entry_without_source_or_record_is_a_miss() {
	let fx = fixture();
	let c = candidate("bradix,cubic", 4096);
	let dir = fx.cache.store().entry_dir(&c);
	fs::create_dir_all(&dir).expect("create entry dir");
	fs::write(dir.join(RESULTS_FILE), "{}").expect("write record");
	assert!(fx.cache.lookup(&c).expect("lookup").is_none());

	fs::remove_file(dir.join(RESULTS_FILE)).expect("remove record");
	write_artifacts(&dir, &c);
	assert!(fx.cache.lookup(&c).expect("lookup").is_none());
}

#[test]
fn measurements_persist_per_kind() {
	let fx = fixture();
	let c = candidate("radix,linear", 1024);
	let store = fx.cache.store();

	let err = store
		.put_measurement(&c, MeasurementKind::Search, Latency::Measured(1.0))
		.expect_err("no entry yet");
	assert!(matches!(err, CacheError::MissingArtifact { .. }));

	write_artifacts(&fx.cache.work_area().holding_dir(), &c);
	fx.cache.commit(&result_for(&c)).expect("commit");

	store
		.put_measurement(&c, MeasurementKind::Search, Latency::Measured(231.5))
		.expect("store search time");
	store
		.put_measurement(&c, MeasurementKind::Inference, Latency::Failed)
		.expect("store inference time");

	assert_eq!(
		store.get_measurement(&c, MeasurementKind::Search).expect("read"),
		Some(Latency::Measured(231.5))
	);
	assert_eq!(store.get_measurement(&c, MeasurementKind::Inference).expect("read"), Some(Latency::Failed));
}

#[test]
fn lock_is_reentrant_across_nested_operations() {
	let fx = fixture();
	let c = candidate("radix,linear", 1024);
	write_artifacts(&fx.cache.work_area().holding_dir(), &c);

	let _outer = fx.cache.work_area().lock();
	fx.cache.commit(&result_for(&c)).expect("commit under held lock");
	assert!(fx.cache.lookup(&c).expect("lookup under held lock").is_some());
	fx.cache.work_area().clear_batch_files().expect("clear under held lock");
}

#[test]
fn collect_artifacts_moves_generated_files_into_holding() {
	let tmp = tempfile::tempdir().expect("create tempdir");
	let work = WorkArea::new(tmp.path()).expect("create work area");
	let c = candidate("radix,linear", 1024);
	write_artifacts(work.root(), &c);
	fs::write(work.param_path("step1", 0), "{}").expect("write params");
	fs::write(WorkArea::results_path(&work.param_path("step1", 0)), "[]").expect("write results");

	assert_eq!(work.collect_artifacts().expect("collect"), 3);
	for name in artifact_names(&c.namespace()) {
		assert!(work.holding_dir().join(&name).is_file());
		assert!(!work.root().join(&name).exists());
	}

	work.clear_batch_files().expect("clear");
	assert!(!work.param_path("step1", 0).exists());
	assert!(!tmp.path().join("step10.json_results").exists());
}

#[test]
fn relative_root_is_made_absolute() {
	let tmp = tempfile::Builder::new()
		.prefix("work-")
		.tempdir_in(".")
		.expect("create tempdir");
	let relative = Path::new(".").join(tmp.path().file_name().expect("tempdir name")).join("work");

	let work = WorkArea::new(&relative).expect("create work area");
	assert!(work.root().is_absolute());
	assert!(work.root().is_dir());
	assert!(work.param_path("step1", 0).is_absolute());
}
