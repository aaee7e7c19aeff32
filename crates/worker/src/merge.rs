//! Combining per-worker result files with cache hits.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use rmiopt_cache::BuildCache;
use rmiopt_primitives::{BuildRecord, BuildResult, Candidate, Identity};
use tracing::debug;

use crate::{DispatchError, Result};

/// Reads one partition's result file and pairs every requested candidate with its record.
///
/// Every requested candidate must be answered and no unrequested namespace may appear.
pub fn read_partition(path: &Path, requested: &[Candidate]) -> Result<Vec<BuildResult>> {
	let text = fs::read_to_string(path).map_err(|source| DispatchError::Io {
		path: path.to_path_buf(),
		source,
	})?;
	let records: Vec<BuildRecord> = serde_json::from_str(&text).map_err(|source| DispatchError::Json {
		path: path.to_path_buf(),
		source,
	})?;

	let mut by_namespace: HashMap<String, BuildRecord> = HashMap::with_capacity(records.len());
	for record in records {
		if !requested.iter().any(|c| c.namespace() == record.namespace) {
			return Err(DispatchError::UnexpectedResult {
				namespace: record.namespace,
				path: path.to_path_buf(),
			});
		}
		by_namespace.insert(record.namespace.clone(), record);
	}

	requested
		.iter()
		.map(|candidate| {
			let namespace = candidate.namespace();
			match by_namespace.get(&namespace) {
				Some(record) => Ok(record.clone().into_result_for(candidate)),
				None => Err(DispatchError::MissingResult {
					namespace,
					path: path.to_path_buf(),
				}),
			}
		})
		.collect()
}

/// Reads every partition's results, commits one result per `requested` candidate,
/// and returns them together with `hits` in canonical order.
///
/// Partitions hold one candidate per identity; its metrics are attached to every
/// requested search mode of that identity. Only freshly built results are
/// committed; cache hits already have entries.
pub fn merge(
	cache: &BuildCache,
	partitions: &[(PathBuf, Vec<Candidate>)],
	requested: &[Candidate],
	hits: Vec<BuildResult>,
) -> Result<Vec<BuildResult>> {
	let _guard = cache.work_area().lock();
	let mut built: HashMap<Identity, BuildResult> = HashMap::new();
	for (path, part) in partitions {
		for result in read_partition(path, part)? {
			built.insert(result.candidate.identity().clone(), result);
		}
	}

	let fresh = requested
		.iter()
		.map(|candidate| match built.get(candidate.identity()) {
			Some(result) => Ok(result.with_mode(candidate.mode())),
			None => Err(DispatchError::MissingResult {
				namespace: candidate.namespace(),
				path: cache.work_area().root().to_path_buf(),
			}),
		})
		.collect::<Result<Vec<_>>>()?;

	for result in &fresh {
		cache.commit(result)?;
	}
	debug!(fresh = fresh.len(), built = built.len(), cached = hits.len(), "merged batch results");

	let mut data = hits;
	data.extend(fresh);
	data.sort_by(|a, b| a.candidate.cmp(&b.candidate));
	debug_assert!(
		data.windows(2).all(|pair| pair[0].candidate != pair[1].candidate),
		"a candidate was both cached and rebuilt"
	);
	Ok(data)
}
