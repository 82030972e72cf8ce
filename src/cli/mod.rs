//! CLI module for fixsuite
//!
//! This module provides the command-line interface for keeping fixture suites in sync.
//!
//! ## Commands
//!
//! - `scan` - Print the fixture tree of each configured suite
//! - `generate [--check]` - Write (or check) manifests and emitted Rust test modules
//! - `verify` - Compare persisted manifests with the fixture tree on disk
//! - `run --exec <CMD>` - Execute persisted suites in-process (pytest-style)
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod commands;

use std::fmt;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use crate::config::CONFIG_FILE_NAME;
use crate::version::FIXSUITE_VERSION;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    /// Create a new CLI error with a message and exit code.
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }

    /// Render a library diagnostic (code, help, cause chain) as a failure.
    pub fn diagnostic<E>(error: E) -> Self
    where
        E: miette::Diagnostic + Send + Sync + 'static,
    {
        Self::failure(format!("{:?}", miette::Report::new(error)))
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Keep fixture-driven test suites in sync with the fixture tree on disk
#[derive(Parser, Debug)]
#[command(name = "fixsuite")]
#[command(version = FIXSUITE_VERSION)]
#[command(about = "Keep fixture-driven test suites in sync with the fixture tree on disk", long_about = None)]
pub struct Cli {
    /// Path to the project configuration
    #[arg(short, long, global = true, value_name = "FILE", default_value = CONFIG_FILE_NAME)]
    pub config: PathBuf,

    /// Only operate on the named suite
    #[arg(short, long, global = true, value_name = "NAME")]
    pub suite: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the fixture tree each suite would be generated from
    Scan,

    /// Generate manifests and Rust test modules
    Generate {
        /// Fail instead of writing when any generated file would change
        #[arg(long)]
        check: bool,
    },

    /// Check persisted suites against the fixture tree on disk
    Verify,

    /// Execute persisted suites (pytest-style)
    Run {
        /// Command executed per fixture; `{fixture}`, `{path}` and `{backend}` are substituted
        #[arg(short = 'e', long = "exec", value_name = "CMD")]
        exec: String,
        /// Only run this backend
        #[arg(short, long, value_name = "BACKEND")]
        backend: Option<String>,
        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
        /// Stop on first failure
        #[arg(short = 'x', long = "exitfirst")]
        stop_on_fail: bool,
        /// Filter tests by keyword
        #[arg(short = 'k', value_name = "EXPR")]
        filter: Option<String>,
    },
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
pub fn execute(cli: Cli) -> CliResult<ExitCode> {
    let project = commands::load_project(&cli.config)?;
    let suite = cli.suite.as_deref();

    match cli.command {
        Command::Scan => commands::scan(&project, suite),
        Command::Generate { check } => commands::generate(&project, suite, check),
        Command::Verify => commands::verify(&project, suite),
        Command::Run {
            exec,
            backend,
            verbose,
            stop_on_fail,
            filter,
        } => commands::run_suites(
            &project,
            suite,
            &commands::RunArgs {
                exec,
                backend,
                verbose,
                stop_on_fail,
                filter,
            },
        ),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_generate_check() {
        let cli = Cli::try_parse_from(["fixsuite", "generate", "--check"]).unwrap();
        assert!(matches!(cli.command, Command::Generate { check: true }));
        assert_eq!(cli.config, PathBuf::from(CONFIG_FILE_NAME));
    }

    #[test]
    fn test_cli_parse_global_options_after_subcommand() {
        let cli = Cli::try_parse_from(["fixsuite", "verify", "--config", "x/fixsuite.toml", "-s", "box"]).unwrap();
        assert!(matches!(cli.command, Command::Verify));
        assert_eq!(cli.config, PathBuf::from("x/fixsuite.toml"));
        assert_eq!(cli.suite.as_deref(), Some("box"));
    }

    #[test]
    fn test_cli_parse_run() {
        let cli = Cli::try_parse_from(["fixsuite", "run", "--exec", "check {fixture}", "-v", "-x", "-k", "dynamic"])
            .unwrap();
        if let Command::Run {
            exec,
            verbose,
            stop_on_fail,
            filter,
            backend,
        } = cli.command
        {
            assert_eq!(exec, "check {fixture}");
            assert!(verbose);
            assert!(stop_on_fail);
            assert_eq!(filter.as_deref(), Some("dynamic"));
            assert!(backend.is_none());
        } else {
            panic!("Expected Run command");
        }
    }

    #[test]
    fn test_cli_run_requires_exec() {
        assert!(Cli::try_parse_from(["fixsuite", "run"]).is_err());
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(["fixsuite"]).is_err());
    }
}
