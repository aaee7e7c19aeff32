//! Shared working directory of the external generator.
//!
//! Generator processes drop their artifact sets here, cache hits are staged here and
//! parameter files are written here. Every mutation runs under one re-entrant lock so
//! that a "lookup + stage" never interleaves with "clear for a new batch". Higher-level
//! operations take [`WorkArea::lock`] once for their whole duration and the nested
//! operations they call re-acquire it on the same thread without deadlocking.

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use rmiopt_primitives::NAMESPACE_PREFIX;
use tracing::debug;

use crate::{CacheError, Result};

/// Subdirectory that holds a finished batch's artifacts until they are committed.
pub const HOLDING_DIR: &str = "opt";

/// The generator's working directory plus the lock that serializes access to it.
#[derive(Debug)]
pub struct WorkArea {
	root: PathBuf,
	lock: ReentrantMutex<()>,
}

/// Scoped exclusive access to a [`WorkArea`]. Re-entrant on the owning thread.
#[must_use = "the work area is unlocked as soon as the guard is dropped"]
pub struct WorkAreaGuard<'a> {
	_inner: ReentrantMutexGuard<'a, ()>,
}

impl WorkArea {
	/// Opens (and creates if needed) a working area rooted at `root`.
	///
	/// The root is stored absolute: generator runs use it as their working
	/// directory and also receive paths below it.
	pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
		let root = root.into();
		fs::create_dir_all(&root).map_err(CacheError::io(&root))?;
		let root = std::path::absolute(&root).map_err(CacheError::io(&root))?;
		Ok(Self {
			root,
			lock: ReentrantMutex::new(()),
		})
	}

	/// Acquires the work-area lock for the lifetime of the returned guard.
	pub fn lock(&self) -> WorkAreaGuard<'_> {
		WorkAreaGuard { _inner: self.lock.lock() }
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	pub fn holding_dir(&self) -> PathBuf {
		self.root.join(HOLDING_DIR)
	}

	/// Parameter file for partition `index` of a batch tagged `phase`.
	pub fn param_path(&self, phase: &str, index: usize) -> PathBuf {
		self.root.join(format!("{phase}{index}.json"))
	}

	/// Result file the generator writes next to `param_path`.
	pub fn results_path(param_path: &Path) -> PathBuf {
		let mut name = param_path.as_os_str().to_owned();
		name.push("_results");
		PathBuf::from(name)
	}

	/// Removes parameter and result files left over from a previous batch.
	pub fn clear_batch_files(&self) -> Result<()> {
		let _guard = self.lock();
		for path in self.list_files(|name| name.ends_with(".json") || name.ends_with(".json_results"))? {
			fs::remove_file(&path).map_err(CacheError::io(&path))?;
		}
		Ok(())
	}

	/// Copies `files` into the working area root.
	pub fn stage_in(&self, files: &[PathBuf]) -> Result<()> {
		let _guard = self.lock();
		for file in files {
			let Some(name) = file.file_name() else {
				continue;
			};
			let to = self.root.join(name);
			fs::copy(file, &to).map_err(CacheError::io(&to))?;
		}
		Ok(())
	}

	/// Replaces the holding directory with every generated artifact currently in the root.
	///
	/// Returns the number of files moved.
	pub fn collect_artifacts(&self) -> Result<usize> {
		let _guard = self.lock();
		let holding = self.holding_dir();
		if holding.exists() {
			fs::remove_dir_all(&holding).map_err(CacheError::io(&holding))?;
		}
		fs::create_dir_all(&holding).map_err(CacheError::io(&holding))?;

		let files = self.list_files(|name| name.starts_with(NAMESPACE_PREFIX))?;
		for from in &files {
			if let Some(name) = from.file_name() {
				let to = holding.join(name);
				fs::rename(from, &to).map_err(CacheError::io(&to))?;
			}
		}
		debug!(count = files.len(), holding = %holding.display(), "collected generated artifacts");
		Ok(files.len())
	}

	fn list_files(&self, keep: impl Fn(&str) -> bool) -> Result<Vec<PathBuf>> {
		let entries = fs::read_dir(&self.root).map_err(CacheError::io(&self.root))?;
		let mut files = Vec::new();
		for entry in entries {
			let entry = entry.map_err(CacheError::io(&self.root))?;
			let path = entry.path();
			if path.is_file() && path.file_name().and_then(|n| n.to_str()).is_some_and(&keep) {
				files.push(path);
			}
		}
		files.sort();
		Ok(files)
	}
}
