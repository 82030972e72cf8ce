//! Execution strategies bound to generated tests.
//!
//! The generator never interprets what a backend does with a fixture. It only stores a [`FixtureExecutor`] next to
//! each test and later calls `execute(fixture, backend)`: `Ok(())` is a pass, `Err` is a failure whose diagnostic is
//! passed through to the report unmodified.
//!
//! Any `Fn(&FixturePath, &BackendId) -> Outcome + Send + Sync` closure is an executor. [`CommandExecutor`] runs an
//! external command per fixture.

use std::fmt;
use std::path::PathBuf;
use std::process::Command;

use fixsuite_core::{BackendId, FixturePath};
use miette::Diagnostic;
use thiserror::Error;

/// Result of executing one fixture.
pub type Outcome = Result<(), ExecutionFailure>;

/// A failed execution, with an optional diagnostic payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionFailure {
    pub diagnostic: Option<String>,
}

impl ExecutionFailure {
    pub fn new(diagnostic: impl Into<String>) -> Self {
        Self {
            diagnostic: Some(diagnostic.into()),
        }
    }

    /// A failure without a diagnostic.
    pub fn silent() -> Self {
        Self::default()
    }
}

impl fmt::Display for ExecutionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.diagnostic {
            Some(diagnostic) => f.write_str(diagnostic),
            None => f.write_str("fixture execution failed"),
        }
    }
}

impl std::error::Error for ExecutionFailure {}

/// The execution callback of a suite: one strategy value per backend, never a subclass per backend.
pub trait FixtureExecutor: Send + Sync {
    fn execute(&self, fixture: &FixturePath, backend: &BackendId) -> Outcome;
}

impl<F> FixtureExecutor for F
where
    F: Fn(&FixturePath, &BackendId) -> Outcome + Send + Sync,
{
    fn execute(&self, fixture: &FixturePath, backend: &BackendId) -> Outcome {
        self(fixture, backend)
    }
}

/// Errors building a [`CommandExecutor`].
#[derive(Debug, Error, Diagnostic)]
pub enum ExecutorError {
    #[error("execution command is empty")]
    #[diagnostic(
        code(fixsuite::executor::empty),
        help("pass a command such as `kotlinc-check --backend {{backend}} {{fixture}}`")
    )]
    EmptyCommand,
}

/// Placeholder for the absolute fixture path.
pub const FIXTURE_PLACEHOLDER: &str = "{fixture}";
/// Placeholder for the root-relative fixture path.
pub const PATH_PLACEHOLDER: &str = "{path}";
/// Placeholder for the backend identity.
pub const BACKEND_PLACEHOLDER: &str = "{backend}";

/// Runs an external command once per fixture; exit status zero is a pass.
///
/// The template is split on whitespace. When it mentions neither `{fixture}` nor `{path}`, the absolute fixture path
/// is appended as the last argument.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    root: PathBuf,
    program: String,
    args: Vec<String>,
}

impl CommandExecutor {
    pub fn from_template(template: &str, root: impl Into<PathBuf>) -> Result<Self, ExecutorError> {
        let mut words = template.split_whitespace().map(str::to_string);
        let program = words.next().ok_or(ExecutorError::EmptyCommand)?;
        let mut args: Vec<String> = words.collect();
        let mentions_fixture = std::iter::once(&program)
            .chain(args.iter())
            .any(|w| w.contains(FIXTURE_PLACEHOLDER) || w.contains(PATH_PLACEHOLDER));
        if !mentions_fixture {
            args.push(FIXTURE_PLACEHOLDER.to_string());
        }
        Ok(Self {
            root: root.into(),
            program,
            args,
        })
    }

    /// The argument vector for one fixture, placeholders expanded.
    pub fn command_line(&self, fixture: &FixturePath, backend: &BackendId) -> Vec<String> {
        let absolute = fixture
            .segments()
            .fold(self.root.clone(), |acc, seg| acc.join(seg))
            .display()
            .to_string();
        std::iter::once(&self.program)
            .chain(self.args.iter())
            .map(|word| {
                word.replace(FIXTURE_PLACEHOLDER, &absolute)
                    .replace(PATH_PLACEHOLDER, fixture.as_str())
                    .replace(BACKEND_PLACEHOLDER, backend.as_str())
            })
            .collect()
    }
}

impl FixtureExecutor for CommandExecutor {
    fn execute(&self, fixture: &FixturePath, backend: &BackendId) -> Outcome {
        let argv = self.command_line(fixture, backend);
        let Some((program, args)) = argv.split_first() else {
            return Err(ExecutionFailure::new("execution command is empty"));
        };

        tracing::debug!(%fixture, %backend, command = %argv.join(" "), "executing fixture");
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|e| ExecutionFailure::new(format!("failed to run `{program}`: {e}")))?;

        if output.status.success() {
            return Ok(());
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let mut diagnostic = format!("`{}` exited with {}", argv.join(" "), output.status);
        for stream in [stdout.trim_end(), stderr.trim_end()] {
            if !stream.is_empty() {
                diagnostic.push('\n');
                diagnostic.push_str(stream);
            }
        }
        Err(ExecutionFailure::new(diagnostic))
    }
}
