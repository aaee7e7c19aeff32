//! Content-addressed cache of generated artifacts and their measurements.
//!
//! Entries live on disk under `<cache-root>/<dataset-file-name>/<layers><bf><mode>/` and
//! are never invalidated automatically. [`EntryStore`] is the only code that knows this
//! layout; [`BuildCache`] layers the consistency checks and the staging of artifacts
//! through the shared [`WorkArea`] on top of it.

mod layout;
mod work_area;

use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use layout::{EntryStore, MeasurementKind, RESULTS_FILE, artifact_names, cache_path, dataset_name};
use rmiopt_primitives::{BuildResult, Candidate, PrimitiveError};
use thiserror::Error;
use tracing::{debug, error};
pub use work_area::{HOLDING_DIR, WorkArea, WorkAreaGuard};

/// Errors that can occur while reading or writing the cache.
#[derive(Debug, Error)]
pub enum CacheError {
	#[error("I/O error at {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},
	#[error("malformed JSON in {path}: {source}")]
	Json {
		path: PathBuf,
		#[source]
		source: serde_json::Error,
	},
	#[error("cache entry {path} belongs to {found}, expected {expected}")]
	IdentityMismatch { path: PathBuf, expected: String, found: String },
	#[error("generated artifact {path} is missing")]
	MissingArtifact { path: PathBuf },
	#[error("malformed measurement in {path}: {source}")]
	Measurement {
		path: PathBuf,
		#[source]
		source: PrimitiveError,
	},
}

impl CacheError {
	pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
		let path = path.into();
		move |source| Self::Io { path, source }
	}
}

/// Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

/// Per-dataset view of the cache bound to the shared working area.
#[derive(Debug, Clone)]
pub struct BuildCache {
	store: EntryStore,
	work: Arc<WorkArea>,
	dataset: PathBuf,
}

impl BuildCache {
	pub fn new(cache_root: &Path, dataset: &Path, work: Arc<WorkArea>) -> Self {
		Self {
			store: EntryStore::new(cache_root, dataset),
			work,
			dataset: dataset.to_path_buf(),
		}
	}

	/// Path of the dataset file the cache is scoped to.
	pub fn dataset(&self) -> &Path {
		&self.dataset
	}

	pub fn store(&self) -> &EntryStore {
		&self.store
	}

	pub fn work_area(&self) -> &WorkArea {
		&self.work
	}

	/// Returns the cached build result for `candidate`, if a complete entry exists.
	///
	/// On a hit the entry's artifacts are copied into the working area. A stored
	/// namespace that differs from the candidate's recomputed one is a fatal
	/// [`CacheError::IdentityMismatch`], never a miss.
	pub fn lookup(&self, candidate: &Candidate) -> Result<Option<BuildResult>> {
		let _guard = self.work.lock();
		let Some(record) = self.store.get(candidate)? else {
			return Ok(None);
		};

		let expected = candidate.namespace();
		if record.namespace != expected {
			let path = self.store.entry_dir(candidate);
			error!(path = %path.display(), expected = %expected, found = %record.namespace, "cache identity mismatch");
			return Err(CacheError::IdentityMismatch {
				path,
				expected,
				found: record.namespace,
			});
		}

		self.work.stage_in(&self.store.artifacts(candidate)?)?;
		debug!(namespace = %expected, mode = %candidate.mode(), "cache hit");
		Ok(Some(record.into_result_for(candidate)))
	}

	/// Moves a freshly built result into the cache.
	///
	/// Artifacts are read from the working area's holding directory, where the
	/// dispatcher collects generator output after a successful batch.
	pub fn commit(&self, result: &BuildResult) -> Result<()> {
		let _guard = self.work.lock();
		self.store.put(result, &self.work.holding_dir())?;
		debug!(namespace = %result.candidate.namespace(), mode = %result.candidate.mode(), "committed cache entry");
		Ok(())
	}
}

#[cfg(test)]
mod tests;
