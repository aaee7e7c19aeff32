//! The harness abstraction and process helpers shared by both profiles.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use rmiopt_cache::MeasurementKind;
use rmiopt_primitives::{Candidate, Latency};

use crate::{MeasureError, Result};

/// One candidate handed to a harness together with its stored artifact set.
#[derive(Debug, Clone)]
pub struct HarnessEntry<'a> {
	pub candidate: &'a Candidate,
	pub artifacts: Vec<PathBuf>,
}

/// A benchmark that measures many candidates with one compile and one run.
///
/// `parse` must yield exactly one latency per entry passed to `run`, in the
/// same order.
pub trait Harness {
	/// Cache file the measurements of this harness are stored under.
	fn kind(&self) -> MeasurementKind;

	/// Builds a binary embedding `entries`, runs it against `dataset` and returns its stdout.
	fn run(&self, dataset: &Path, entries: &[HarnessEntry<'_>]) -> Result<String>;

	fn parse(&self, output: &str) -> Result<Vec<Latency>>;
}

/// The lookup workload shipped next to a dataset.
pub fn lookups_path(dataset: &Path) -> PathBuf {
	let mut name = OsString::from(dataset.as_os_str());
	name.push("_equality_lookups_10M");
	PathBuf::from(name)
}

/// Harness projects are entered with `current_dir`, so program paths under
/// them must not stay relative to the caller's directory.
pub(crate) fn absolute_project(project: PathBuf) -> PathBuf {
	std::path::absolute(&project).unwrap_or(project)
}

/// Runs a build step; a non-zero exit is a compile failure carrying stderr.
pub(crate) fn run_compiler(mut cmd: Command) -> Result<()> {
	let output = cmd.output().map_err(|source| MeasureError::Launch {
		program: program_name(&cmd),
		source,
	})?;

	if output.status.success() {
		Ok(())
	} else {
		Err(MeasureError::Compile {
			stderr: String::from_utf8_lossy(&output.stderr).into(),
		})
	}
}

/// Runs the built benchmark and returns its stdout.
pub(crate) fn run_benchmark(mut cmd: Command) -> Result<String> {
	let output = cmd.output().map_err(|source| MeasureError::Launch {
		program: program_name(&cmd),
		source,
	})?;

	if output.status.success() {
		Ok(String::from_utf8_lossy(&output.stdout).into())
	} else {
		Err(MeasureError::Run {
			status: output.status,
			stderr: String::from_utf8_lossy(&output.stderr).into(),
		})
	}
}

fn program_name(cmd: &Command) -> String {
	cmd.get_program().to_string_lossy().into_owned()
}

/// Copies every entry's artifacts into `dir`.
pub(crate) fn stage_artifacts(dir: &Path, entries: &[HarnessEntry<'_>]) -> Result<()> {
	fs::create_dir_all(dir).map_err(|source| MeasureError::Io {
		path: dir.to_path_buf(),
		source,
	})?;
	for path in entries.iter().flat_map(|entry| &entry.artifacts) {
		let Some(name) = path.file_name() else {
			continue;
		};
		fs::copy(path, dir.join(name)).map_err(|source| MeasureError::Io {
			path: path.clone(),
			source,
		})?;
	}
	Ok(())
}

/// Removes generated artifact files (`nm*`) left in `dir` by a previous run.
pub(crate) fn clear_staged(dir: &Path) -> Result<()> {
	let entries = match fs::read_dir(dir) {
		Ok(entries) => entries,
		Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
		Err(source) => {
			return Err(MeasureError::Io {
				path: dir.to_path_buf(),
				source,
			});
		}
	};
	for entry in entries.flatten() {
		let path = entry.path();
		if path.is_file() && entry.file_name().to_string_lossy().starts_with(rmiopt_primitives::NAMESPACE_PREFIX) {
			fs::remove_file(&path).map_err(|source| MeasureError::Io { path, source })?;
		}
	}
	Ok(())
}

pub(crate) fn write_source(path: &Path, source: &str) -> Result<()> {
	fs::write(path, source).map_err(|err| MeasureError::Io {
		path: path.to_path_buf(),
		source: err,
	})
}
