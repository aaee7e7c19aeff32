//! On-disk layout of cache entries.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use rmiopt_primitives::{BuildRecord, BuildResult, Candidate, Latency};

use crate::{CacheError, Result};

/// Name of the build result record inside an entry directory.
pub const RESULTS_FILE: &str = "results.json";

/// Kind of per-candidate measurement persisted next to the build result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeasurementKind {
	/// End-to-end lookup latency, model plus final search.
	Search,
	/// Model inference time only.
	Inference,
}

impl MeasurementKind {
	pub fn file_name(self) -> &'static str {
		match self {
			Self::Search => "search.txt",
			Self::Inference => "inference.txt",
		}
	}
}

/// File names of the artifact set the generator emits for `namespace`.
pub fn artifact_names(namespace: &str) -> [String; 3] {
	[format!("{namespace}.cpp"), format!("{namespace}.h"), format!("{namespace}_data.h")]
}

/// Directory name used for a dataset's entries: the dataset's file name.
pub fn dataset_name(dataset: &Path) -> String {
	dataset
		.file_name()
		.map(|name| name.to_string_lossy().into_owned())
		.unwrap_or_else(|| dataset.to_string_lossy().replace(['/', '\\'], "_"))
}

/// Entry directory of `candidate` for `dataset`. Pure; touches no files.
pub fn cache_path(cache_root: &Path, dataset: &Path, candidate: &Candidate) -> PathBuf {
	cache_root.join(dataset_name(dataset)).join(format!(
		"{}{}{}",
		candidate.topology(),
		candidate.branching_factor(),
		candidate.mode().as_str()
	))
}

/// Key-value view over one dataset's entry directories, keyed by candidate.
#[derive(Debug, Clone)]
pub struct EntryStore {
	cache_root: PathBuf,
	dataset: PathBuf,
}

impl EntryStore {
	pub fn new(cache_root: &Path, dataset: &Path) -> Self {
		Self {
			cache_root: cache_root.to_path_buf(),
			dataset: dataset.to_path_buf(),
		}
	}

	pub fn entry_dir(&self, candidate: &Candidate) -> PathBuf {
		cache_path(&self.cache_root, &self.dataset, candidate)
	}

	/// Reads the stored record of a complete entry.
	///
	/// An entry is complete once it holds a generated `.cpp` source and a
	/// `results.json`; anything less reads as absent.
	pub fn get(&self, candidate: &Candidate) -> Result<Option<BuildRecord>> {
		let dir = self.entry_dir(candidate);
		if !dir.is_dir() || !has_source_file(&dir)? {
			return Ok(None);
		}

		let path = dir.join(RESULTS_FILE);
		if !path.is_file() {
			return Ok(None);
		}

		let text = fs::read_to_string(&path).map_err(CacheError::io(&path))?;
		let record = serde_json::from_str(&text).map_err(|source| CacheError::Json { path, source })?;
		Ok(Some(record))
	}

	/// Stores a build result, copying its artifact set out of `artifact_dir`.
	///
	/// The record is written last and atomically, so readers never observe a
	/// half-written entry.
	pub fn put(&self, result: &BuildResult, artifact_dir: &Path) -> Result<()> {
		let dir = self.entry_dir(&result.candidate);
		fs::create_dir_all(&dir).map_err(CacheError::io(&dir))?;

		for name in artifact_names(&result.candidate.namespace()) {
			let from = artifact_dir.join(&name);
			if !from.is_file() {
				return Err(CacheError::MissingArtifact { path: from });
			}
			let to = dir.join(&name);
			fs::copy(&from, &to).map_err(CacheError::io(&to))?;
		}

		let json = serde_json::to_string(&BuildRecord::from(result)).map_err(|source| CacheError::Json {
			path: dir.join(RESULTS_FILE),
			source,
		})?;
		write_atomic(&dir.join(RESULTS_FILE), json.as_bytes())
	}

	/// Paths of the artifact set stored for `candidate`.
	pub fn artifacts(&self, candidate: &Candidate) -> Result<Vec<PathBuf>> {
		let dir = self.entry_dir(candidate);
		artifact_names(&candidate.namespace())
			.into_iter()
			.map(|name| {
				let path = dir.join(name);
				if path.is_file() { Ok(path) } else { Err(CacheError::MissingArtifact { path }) }
			})
			.collect()
	}

	pub fn get_measurement(&self, candidate: &Candidate, kind: MeasurementKind) -> Result<Option<Latency>> {
		let path = self.entry_dir(candidate).join(kind.file_name());
		if !path.is_file() {
			return Ok(None);
		}
		let text = fs::read_to_string(&path).map_err(CacheError::io(&path))?;
		text.parse()
			.map(Some)
			.map_err(|source| CacheError::Measurement { path, source })
	}

	pub fn put_measurement(&self, candidate: &Candidate, kind: MeasurementKind, latency: Latency) -> Result<()> {
		let dir = self.entry_dir(candidate);
		if !dir.is_dir() {
			return Err(CacheError::MissingArtifact { path: dir });
		}
		write_atomic(&dir.join(kind.file_name()), latency.to_string().as_bytes())
	}
}

fn has_source_file(dir: &Path) -> Result<bool> {
	let entries = fs::read_dir(dir).map_err(CacheError::io(dir))?;
	for entry in entries {
		let entry = entry.map_err(CacheError::io(dir))?;
		if entry.path().extension().is_some_and(|ext| ext == "cpp") {
			return Ok(true);
		}
	}
	Ok(false)
}

fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
	let dir = path.parent().unwrap_or_else(|| Path::new("."));
	let mut file = tempfile::NamedTempFile::new_in(dir).map_err(CacheError::io(dir))?;
	file.write_all(contents).map_err(CacheError::io(file.path()))?;
	file.persist(path).map_err(|err| CacheError::Io {
		path: path.to_path_buf(),
		source: err.error,
	})?;
	Ok(())
}
