//! Fail-fast sequencing of the pipeline steps.
//!
//! Steps run strictly one after another through a [`TaskRunner`]. Each step
//! moves `Pending -> Running -> {Succeeded, Failed}`; the pipeline moves
//! `Running -> {Completed, Aborted}`, and the first failed step aborts it
//! before any later step is started. Earlier steps' side effects stay as
//! they are.

use std::fmt;
use std::io::Write;

use tracing::{error, info};

use crate::error::{PipelineError, Result};
use crate::runner::{Step, TaskOutput, TaskRunner};

/// Printed once after every step has succeeded.
pub const COMPLETION_MESSAGE: &str = "Pipeline complete: Bronze -> Silver -> Postgres";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepState {
    Pending,
    Running,
    Succeeded,
    Failed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    Running,
    Completed,
    Aborted,
}

impl fmt::Display for StepState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Running => "RUNNING",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// Per-step states plus the pipeline's own state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunReport {
    pub steps: Vec<(String, StepState)>,
    pub state: PipelineState,
}

impl RunReport {
    fn new(steps: &[Step]) -> Self {
        Self {
            steps: steps
                .iter()
                .map(|s| (s.name.clone(), StepState::Pending))
                .collect(),
            state: PipelineState::Running,
        }
    }

    fn transition(&mut self, idx: usize, to: StepState) {
        let (name, state) = &mut self.steps[idx];
        info!(step = %name, from = %state, to = %to, "step transition");
        *state = to;
    }
}

/// The three stages in their fixed order.
#[must_use]
pub fn default_steps() -> Vec<Step> {
    vec![
        Step::new("generate", &["generate"]),
        Step::new("convert", &["convert"]),
        Step::new("load", &["load"]),
    ]
}

pub struct Orchestrator<R> {
    runner: R,
}

impl<R: TaskRunner> Orchestrator<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Run `steps` in order, echoing each step's output to `out`.
    ///
    /// Both captured streams are echoed whether the step succeeded or not.
    ///
    /// # Errors
    /// [`PipelineError::StepFailed`] for the first step with a non-zero exit,
    /// or whatever the runner returns if a step cannot be launched. Either way
    /// no later step is started.
    pub fn run(&self, steps: &[Step], out: &mut impl Write) -> Result<RunReport> {
        let mut report = RunReport::new(steps);

        for (idx, step) in steps.iter().enumerate() {
            writeln!(out, "\n=== Running: {} ===", step.name)?;
            report.transition(idx, StepState::Running);

            let output = match self.runner.run(step) {
                Ok(output) => output,
                Err(e) => {
                    report.transition(idx, StepState::Failed);
                    report.state = PipelineState::Aborted;
                    error!(step = %step.name, state = ?report.state, error = %e, "pipeline aborted");
                    return Err(e);
                }
            };
            echo(out, &output)?;

            if !output.success() {
                report.transition(idx, StepState::Failed);
                report.state = PipelineState::Aborted;
                error!(step = %step.name, state = ?report.state, code = ?output.code, "pipeline aborted");
                return Err(PipelineError::StepFailed {
                    step: step.name.clone(),
                    code: output.code,
                });
            }
            report.transition(idx, StepState::Succeeded);
        }

        report.state = PipelineState::Completed;
        info!(steps = steps.len(), state = ?report.state, "pipeline completed");
        writeln!(out, "\n{COMPLETION_MESSAGE}")?;
        Ok(report)
    }
}

fn echo(out: &mut impl Write, output: &TaskOutput) -> std::io::Result<()> {
    for stream in [&output.stdout, &output.stderr] {
        if stream.is_empty() {
            continue;
        }
        out.write_all(stream.as_bytes())?;
        if !stream.ends_with('\n') {
            out.write_all(b"\n")?;
        }
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Scripted runner: each step name maps to a canned output.
    #[derive(Default)]
    struct ScriptedRunner {
        outputs: HashMap<String, TaskOutput>,
        calls: RefCell<Vec<String>>,
    }

    impl ScriptedRunner {
        fn with(mut self, step: &str, code: i32, stdout: &str, stderr: &str) -> Self {
            self.outputs.insert(
                step.to_string(),
                TaskOutput {
                    stdout: stdout.into(),
                    stderr: stderr.into(),
                    code: Some(code),
                },
            );
            self
        }
    }

    impl TaskRunner for ScriptedRunner {
        fn run(&self, step: &Step) -> Result<TaskOutput> {
            self.calls.borrow_mut().push(step.name.clone());
            Ok(self.outputs.get(&step.name).cloned().unwrap_or(TaskOutput {
                code: Some(0),
                ..TaskOutput::default()
            }))
        }
    }

    #[test]
    fn all_steps_succeed_in_order() {
        let runner = ScriptedRunner::default()
            .with("generate", 0, "[OK] Wrote Bronze CSV\n", "")
            .with("load", 0, "[OK] Loaded 20 rows", "warning: noisy\n");
        let orch = Orchestrator::new(runner);
        let mut out = Vec::new();

        let report = orch.run(&default_steps(), &mut out).unwrap();

        assert_eq!(report.state, PipelineState::Completed);
        assert!(report.steps.iter().all(|(_, s)| *s == StepState::Succeeded));
        assert_eq!(*orch.runner().calls.borrow(), ["generate", "convert", "load"]);

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches(COMPLETION_MESSAGE).count(), 1);
        assert!(text.trim_end().ends_with(COMPLETION_MESSAGE));
        assert!(text.contains("[OK] Loaded 20 rows\nwarning: noisy\n"));
        let gen_at = text.find("=== Running: generate ===").unwrap();
        let load_at = text.find("=== Running: load ===").unwrap();
        assert!(gen_at < load_at);
    }

    #[test]
    fn failing_step_stops_pipeline() {
        let runner = ScriptedRunner::default().with("convert", 3, "", "boom\n");
        let orch = Orchestrator::new(runner);
        let mut out = Vec::new();

        let err = orch.run(&default_steps(), &mut out).unwrap_err();

        assert!(matches!(
            err,
            PipelineError::StepFailed { ref step, code: Some(3) } if step == "convert"
        ));
        assert_eq!(err.to_string(), "Step failed: convert (exit code 3)");
        assert_eq!(*orch.runner().calls.borrow(), ["generate", "convert"]);

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("boom"), "stderr of failed step is echoed");
        assert!(!text.contains("=== Running: load ==="));
        assert!(!text.contains(COMPLETION_MESSAGE));
    }

    #[test]
    fn launch_failure_aborts() {
        struct NoLaunch;
        impl TaskRunner for NoLaunch {
            fn run(&self, step: &Step) -> Result<TaskOutput> {
                Err(PipelineError::Spawn {
                    step: step.name.clone(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
                })
            }
        }
        let mut out = Vec::new();
        let err = Orchestrator::new(NoLaunch)
            .run(&default_steps(), &mut out)
            .unwrap_err();
        assert!(matches!(err, PipelineError::Spawn { ref step, .. } if step == "generate"));
        assert!(!String::from_utf8(out).unwrap().contains("convert"));
    }

    #[test]
    fn empty_plan_completes() {
        let mut out = Vec::new();
        let report = Orchestrator::new(ScriptedRunner::default())
            .run(&[], &mut out)
            .unwrap();
        assert_eq!(report.state, PipelineState::Completed);
        assert!(report.steps.is_empty());
    }
}
