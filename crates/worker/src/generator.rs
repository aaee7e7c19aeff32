//! Launching the external generator.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

/// Exit status of one generator run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobStatus {
	code: Option<i32>,
}

impl JobStatus {
	pub fn from_code(code: i32) -> Self {
		Self { code: Some(code) }
	}

	/// A run terminated without an exit code, e.g. by a signal.
	pub fn killed() -> Self {
		Self { code: None }
	}

	pub fn code(self) -> Option<i32> {
		self.code
	}

	pub fn success(self) -> bool {
		self.code == Some(0)
	}
}

impl fmt::Display for JobStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.code {
			Some(code) => write!(f, "exit code {code}"),
			None => f.write_str("terminated by signal"),
		}
	}
}

/// A running generator invocation.
pub trait Job: Send {
	/// Blocks until the run exits.
	fn wait(&mut self) -> io::Result<JobStatus>;
}

impl Job for Child {
	fn wait(&mut self) -> io::Result<JobStatus> {
		let status = Child::wait(self)?;
		Ok(JobStatus { code: status.code() })
	}
}

/// Something that can build the candidates listed in a parameter file.
///
/// A run reads `params`, writes one artifact set per candidate into `work_dir`
/// (named by the candidate's namespace) and writes its results next to the
/// parameter file as `<params>_results`.
pub trait Generator: Send + Sync {
	fn launch(&self, dataset: &Path, params: &Path, work_dir: &Path) -> io::Result<Box<dyn Job>>;
}

/// Runs the generator binary as `<program> [args..] <dataset> --param-grid <params>`.
#[derive(Debug, Clone)]
pub struct ProcessGenerator {
	program: PathBuf,
	args: Vec<String>,
}

impl ProcessGenerator {
	/// A `program` containing a path separator is resolved against the current
	/// directory now, since the generator runs inside the work area. Bare names
	/// are left to `PATH` lookup.
	pub fn new(program: impl Into<PathBuf>) -> Self {
		let program = program.into();
		let program = if program.components().count() > 1 {
			std::path::absolute(&program).unwrap_or(program)
		} else {
			program
		};
		Self {
			program,
			args: Vec::new(),
		}
	}

	/// Arguments inserted before the dataset path.
	pub fn with_args<I, S>(mut self, args: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.args.extend(args.into_iter().map(Into::into));
		self
	}

	pub fn program(&self) -> &Path {
		&self.program
	}
}

impl Generator for ProcessGenerator {
	fn launch(&self, dataset: &Path, params: &Path, work_dir: &Path) -> io::Result<Box<dyn Job>> {
		let child = Command::new(&self.program)
			.args(&self.args)
			.arg(dataset)
			.arg("--param-grid")
			.arg(params)
			.current_dir(work_dir)
			.stdin(Stdio::null())
			.spawn()?;
		tracing::trace!(pid = child.id(), params = %params.display(), "generator.launch");
		Ok(Box::new(child))
	}
}
