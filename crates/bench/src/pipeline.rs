//! Chunked measurement with per-candidate caching.

use rmiopt_cache::{BuildCache, CacheError};
use rmiopt_primitives::{Candidate, Latency};
use tracing::{debug, info};

use crate::harness::HarnessEntry;
use crate::{Harness, MeasureError, Result};

/// Largest number of candidates compiled into one harness binary.
pub const DEFAULT_CHUNK: usize = 20;

/// Measures candidates with a harness, at most `chunk` per harness build.
#[derive(Debug, Clone)]
pub struct MeasurePipeline<H> {
	harness: H,
	chunk: usize,
}

impl<H: Harness> MeasurePipeline<H> {
	pub fn new(harness: H, chunk: usize) -> Self {
		Self {
			harness,
			chunk: chunk.max(1),
		}
	}

	pub fn harness(&self) -> &H {
		&self.harness
	}

	pub fn chunk(&self) -> usize {
		self.chunk
	}

	/// Returns one latency per candidate, in input order.
	///
	/// Every candidate must already have a build entry in `cache`. Measurements
	/// found in the cache are reused; the rest are measured and stored.
	pub fn measure(&self, cache: &BuildCache, candidates: &[Candidate]) -> Result<Vec<Latency>> {
		let mut latencies = Vec::with_capacity(candidates.len());
		for chunk in candidates.chunks(self.chunk) {
			latencies.extend(self.measure_chunk(cache, chunk)?);
		}
		Ok(latencies)
	}

	fn measure_chunk(&self, cache: &BuildCache, chunk: &[Candidate]) -> Result<Vec<Latency>> {
		let kind = self.harness.kind();
		let store = cache.store();
		let cached = chunk
			.iter()
			.map(|candidate| store.get_measurement(candidate, kind))
			.collect::<std::result::Result<Vec<_>, _>>()?;
		let pending: Vec<&Candidate> = chunk
			.iter()
			.zip(&cached)
			.filter(|(_, latency)| latency.is_none())
			.map(|(candidate, _)| candidate)
			.collect();

		info!(
			kind = kind.file_name(),
			total = chunk.len(),
			cached = chunk.len() - pending.len(),
			"Measurements to compute"
		);
		if pending.is_empty() {
			return Ok(cached.into_iter().flatten().collect());
		}

		let entries = pending
			.iter()
			.map(|&candidate| {
				let artifacts = store.artifacts(candidate).map_err(|err| match err {
					CacheError::MissingArtifact { .. } => MeasureError::NotBuilt {
						namespace: candidate.namespace(),
					},
					other => other.into(),
				})?;
				Ok(HarnessEntry { candidate, artifacts })
			})
			.collect::<Result<Vec<_>>>()?;

		let output = self.harness.run(cache.dataset(), &entries)?;
		let measured = self.harness.parse(&output)?;
		if measured.len() != pending.len() {
			return Err(MeasureError::ResultCount {
				expected: pending.len(),
				found: measured.len(),
			});
		}

		for (candidate, latency) in pending.iter().zip(&measured) {
			if latency.is_failed() {
				debug!(candidate = %candidate, "harness reported a failed measurement");
			}
			store.put_measurement(candidate, kind, *latency)?;
		}

		let mut fresh = measured.into_iter();
		Ok(cached.into_iter().filter_map(|slot| slot.or_else(|| fresh.next())).collect())
	}
}
