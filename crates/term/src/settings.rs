//! Settings file loading.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use rmiopt_search::SearchConfig;
use serde::Deserialize;

use crate::cli::Cli;

/// Everything the binary needs beyond the command line.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
	/// Generator executable.
	pub generator: PathBuf,
	/// Arguments placed before the dataset path.
	pub generator_args: Vec<String>,
	pub cache_root: PathBuf,
	/// Shared working directory where generator runs drop their artifacts.
	pub work_dir: PathBuf,
	/// SOSD checkout used for search latency.
	pub bench_dir: PathBuf,
	/// Project with the inference Makefile.
	pub inference_dir: PathBuf,
	/// `make -j` parallelism for the inference harness.
	pub make_jobs: usize,
	pub search: SearchConfig,
}

impl Default for Settings {
	fn default() -> Self {
		Self {
			generator: PathBuf::from("rmi"),
			generator_args: Vec::new(),
			cache_root: default_cache_root(),
			work_dir: PathBuf::from("."),
			bench_dir: PathBuf::from("SOSD"),
			inference_dir: PathBuf::from("."),
			make_jobs: 40,
			search: SearchConfig::default(),
		}
	}
}

fn default_cache_root() -> PathBuf {
	dirs::cache_dir()
		.map(|dir| dir.join("rmiopt"))
		.unwrap_or_else(|| PathBuf::from(".rmiopt-cache"))
}

/// `<config_dir>/rmiopt/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
	dirs::config_dir().map(|dir| dir.join("rmiopt").join("config.toml"))
}

impl Settings {
	/// Reads `path`, or the default settings file when `path` is `None`.
	///
	/// An explicit path must exist; a missing default file yields defaults.
	pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
		let path = match path {
			Some(path) => path.to_path_buf(),
			None => match default_config_path() {
				Some(path) if path.is_file() => path,
				_ => return Ok(Self::default()),
			},
		};
		let text = fs::read_to_string(&path).with_context(|| format!("failed to read settings {}", path.display()))?;
		Self::parse(&text).with_context(|| format!("invalid settings {}", path.display()))
	}

	pub fn parse(text: &str) -> anyhow::Result<Self> {
		Ok(toml::from_str(text)?)
	}

	/// Applies global command-line overrides.
	pub fn apply(&mut self, cli: &Cli) {
		if let Some(generator) = &cli.generator {
			self.generator = generator.clone();
		}
		if let Some(cache_root) = &cli.cache_root {
			self.cache_root = cache_root.clone();
		}
		if let Some(work_dir) = &cli.work_dir {
			self.work_dir = work_dir.clone();
		}
		if let Some(threads) = cli.threads {
			self.search.threads = threads;
		}
	}
}

#[cfg(test)]
mod tests;
