//! Partitioning a batch across generator processes.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use rmiopt_cache::{BuildCache, WorkArea};
use rmiopt_primitives::{BuildResult, Candidate, GeneratorConfig};
use tracing::{error, info};

use crate::generator::{Generator, Job};
use crate::merge::merge;
use crate::{DispatchError, ParamGrid, Result};

/// Splits `candidates` round-robin into at most `threads` non-empty partitions.
pub fn partition(candidates: &[Candidate], threads: usize) -> Vec<Vec<Candidate>> {
	let threads = threads.clamp(1, candidates.len().max(1));
	let mut parts = vec![Vec::new(); threads];
	for (idx, candidate) in candidates.iter().enumerate() {
		parts[idx % threads].push(candidate.clone());
	}
	parts.retain(|part| !part.is_empty());
	parts
}

/// Builds batches of candidates with a bounded number of generator processes.
#[derive(Debug, Clone)]
pub struct Dispatcher<G> {
	generator: G,
	threads: usize,
}

impl<G: Generator> Dispatcher<G> {
	pub fn new(generator: G, threads: usize) -> Self {
		Self {
			generator,
			threads: threads.max(1),
		}
	}

	pub fn generator(&self) -> &G {
		&self.generator
	}

	/// Returns one build result per distinct candidate, sorted by identity.
	///
	/// Cached candidates are answered from `cache`; the rest are built by up to
	/// `threads` concurrent generator runs. If any run fails the whole batch fails
	/// and nothing is committed. `phase` tags the parameter file names.
	pub fn dispatch(&self, cache: &BuildCache, candidates: &[Candidate], phase: &str) -> Result<Vec<BuildResult>> {
		let work = cache.work_area();
		let _guard = work.lock();
		work.clear_batch_files()?;

		let distinct: BTreeSet<&Candidate> = candidates.iter().collect();
		let mut hits = Vec::new();
		let mut uncached = Vec::new();
		for candidate in distinct {
			match cache.lookup(candidate)? {
				Some(result) => hits.push(result),
				None => uncached.push(candidate.clone()),
			}
		}

		info!(phase, uncached = uncached.len(), total = hits.len() + uncached.len(), "Models to compute");
		if uncached.is_empty() {
			hits.sort_by(|a, b| a.candidate.cmp(&b.candidate));
			return Ok(hits);
		}

		// Both search modes of one identity share a single artifact set.
		let mut builds = uncached.clone();
		builds.dedup_by(|a, b| a.identity() == b.identity());
		let partitions = partition(&builds, self.threads);
		let mut batches = Vec::with_capacity(partitions.len());
		for (index, part) in partitions.into_iter().enumerate() {
			let params = work.param_path(phase, index);
			write_params(&params, &part)?;
			batches.push((params, part));
		}

		let jobs = self.launch_all(cache, &batches)?;
		info!(
			processes = jobs.len(),
			jobs = ?batches.iter().map(|(_, part)| part.len()).collect::<Vec<_>>(),
			"Spawned generator processes"
		);
		wait_all(jobs)?;

		work.collect_artifacts()?;
		let partitions: Vec<(PathBuf, Vec<Candidate>)> = batches
			.into_iter()
			.map(|(params, part)| (WorkArea::results_path(&params), part))
			.collect();
		merge(cache, &partitions, &uncached, hits)
	}

	/// Launches one run per batch. On a launch failure the runs already started
	/// are waited for before the error is returned.
	fn launch_all(&self, cache: &BuildCache, batches: &[(PathBuf, Vec<Candidate>)]) -> Result<Vec<Box<dyn Job>>> {
		let mut jobs = Vec::with_capacity(batches.len());
		for (index, (params, _)) in batches.iter().enumerate() {
			match self.generator.launch(cache.dataset(), params, cache.work_area().root()) {
				Ok(job) => jobs.push(job),
				Err(source) => {
					error!(batch = index, error = %source, "failed to launch generator");
					for mut job in jobs {
						let _ = job.wait();
					}
					return Err(DispatchError::Spawn { index, source });
				}
			}
		}
		Ok(jobs)
	}
}

fn write_params(path: &Path, part: &[Candidate]) -> Result<()> {
	let grid = ParamGrid {
		configs: part.iter().map(GeneratorConfig::from).collect(),
	};
	let json = serde_json::to_string(&grid).map_err(|source| DispatchError::Json {
		path: path.to_path_buf(),
		source,
	})?;
	fs::write(path, json).map_err(|source| DispatchError::Io {
		path: path.to_path_buf(),
		source,
	})
}

/// Joins every run, then fails with the first unsuccessful one.
fn wait_all(jobs: Vec<Box<dyn Job>>) -> Result<()> {
	let mut failure = None;
	for (index, mut job) in jobs.into_iter().enumerate() {
		let outcome = job.wait().map_err(|source| DispatchError::Spawn { index, source }).and_then(|status| {
			if status.success() {
				Ok(())
			} else {
				error!(batch = index, %status, "Failure in index construction");
				Err(DispatchError::WorkerFailed { index, status })
			}
		});
		if let Err(err) = outcome
			&& failure.is_none()
		{
			failure = Some(err);
		}
	}
	failure.map_or(Ok(()), Err)
}
