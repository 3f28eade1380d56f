//! Running one pipeline step in isolation and capturing its outcome.
//!
//! [`TaskRunner`] is the seam between sequencing and isolation: the
//! orchestrator only ever sees a [`TaskOutput`]. [`ProcessRunner`] provides
//! isolation with one OS process per step.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::config::Config;
use crate::error::{PipelineError, Result};

/// A named stage invocation: `name` for diagnostics, `args` for the child.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Step {
    pub name: String,
    pub args: Vec<String>,
}

impl Step {
    pub fn new(name: impl Into<String>, args: &[&str]) -> Self {
        Self {
            name: name.into(),
            args: args.iter().map(|a| (*a).to_string()).collect(),
        }
    }
}

/// Everything a finished step reports back: both streams in full and its exit code.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TaskOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the task ended without an exit code (killed by a signal).
    pub code: Option<i32>,
}

impl TaskOutput {
    #[must_use]
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs one step to completion, synchronously.
///
/// Implementations must not return until the task has finished. An `Err` means
/// the task could not be started at all; a task that ran and failed is an
/// `Ok` with a non-zero [`TaskOutput::code`].
pub trait TaskRunner {
    fn run(&self, step: &Step) -> Result<TaskOutput>;
}

/// Runs each step as a child process of `program`, with `root` as working directory.
#[derive(Clone, Debug)]
pub struct ProcessRunner {
    program: PathBuf,
    root: PathBuf,
    env: Vec<(&'static str, String)>,
}

impl ProcessRunner {
    /// The child sees `config` through its environment, overriding anything inherited.
    pub fn new(program: impl Into<PathBuf>, root: impl Into<PathBuf>, config: &Config) -> Self {
        Self {
            program: program.into(),
            root: root.into(),
            env: config.child_env(),
        }
    }

    /// A runner that re-launches the currently running executable.
    ///
    /// # Errors
    /// Returns an I/O error if the current executable path cannot be resolved.
    pub fn current_exe(root: impl Into<PathBuf>, config: &Config) -> Result<Self> {
        Ok(Self::new(std::env::current_exe()?, root, config))
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl TaskRunner for ProcessRunner {
    fn run(&self, step: &Step) -> Result<TaskOutput> {
        debug!(step = %step.name, program = %self.program.display(), args = ?step.args, "spawning");
        let output = Command::new(&self.program)
            .args(&step.args)
            .current_dir(&self.root)
            .envs(self.env.iter().map(|(k, v)| (*k, v.as_str())))
            .output()
            .map_err(|source| PipelineError::Spawn {
                step: step.name.clone(),
                source,
            })?;

        Ok(TaskOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            code: output.status.code(),
        })
    }
}
