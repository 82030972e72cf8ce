//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.

use std::path::Path;
use std::sync::Arc;

use crate::config::ProjectConfig;
use crate::pipeline::{self, ArtifactStatus};
use crate::runner::{ConsoleReporter, RunOptions, SuiteRunner, TestSummary};
use crate::suite::CommandExecutor;

use super::{CliError, CliResult, ExitCode};

/// Arguments of the `run` subcommand.
#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    pub exec: String,
    pub backend: Option<String>,
    pub verbose: bool,
    pub stop_on_fail: bool,
    pub filter: Option<String>,
}

/// Load and validate the project configuration.
pub fn load_project(path: &Path) -> CliResult<ProjectConfig> {
    ProjectConfig::load(path).map_err(CliError::diagnostic)
}

/// Print the fixture tree of each selected suite.
pub fn scan(project: &ProjectConfig, suite: Option<&str>) -> CliResult<ExitCode> {
    for config in project.select(suite).map_err(CliError::diagnostic)? {
        let tree = pipeline::scan_suite(config, &project.base_dir).map_err(CliError::diagnostic)?;
        println!("{} ({} fixture(s))", config.name, tree.leaves().len());
        print!("{}", tree.render());
    }
    Ok(ExitCode::SUCCESS)
}

/// Generate (or, with `check`, compare) the artifacts of each selected suite.
pub fn generate(project: &ProjectConfig, suite: Option<&str>, check: bool) -> CliResult<ExitCode> {
    let mut changed = 0;
    let mut total = 0;

    for config in project.select(suite).map_err(CliError::diagnostic)? {
        for artifacts in pipeline::generate_artifacts(config, &project.base_dir).map_err(CliError::diagnostic)? {
            println!(
                "{} [{}]: {} test(s)",
                config.name,
                artifacts.backend,
                artifacts.manifest.recorded_paths().len()
            );
            for (path, status) in pipeline::write_artifacts(&artifacts, check).map_err(CliError::diagnostic)? {
                total += 1;
                match (status, check) {
                    (ArtifactStatus::Unchanged, _) => {}
                    (_, true) => println!("Would regenerate: {}", path.display()),
                    (ArtifactStatus::Created, false) => println!("Created: {}", path.display()),
                    (ArtifactStatus::Updated, false) => println!("Updated: {}", path.display()),
                }
                if status.is_change() {
                    changed += 1;
                }
            }
        }
    }

    if check && changed > 0 {
        return Err(CliError::failure(format!(
            "\n{} of {} generated file(s) are out of date; run `fixsuite generate`",
            changed, total
        )));
    }
    if check {
        println!("✓ {} generated file(s) up to date", total);
    } else {
        println!("\n✓ {} file(s) written, {} unchanged", changed, total - changed);
    }
    Ok(ExitCode::SUCCESS)
}

/// Compare each selected suite's persisted manifests with the disk.
pub fn verify(project: &ProjectConfig, suite: Option<&str>) -> CliResult<ExitCode> {
    let mut out_of_date = 0;

    for config in project.select(suite).map_err(CliError::diagnostic)? {
        for (backend, report) in pipeline::verify_suite(config, &project.base_dir).map_err(CliError::diagnostic)? {
            if report.is_empty() {
                println!("✓ {} [{}]: {}", config.name, backend, report);
            } else {
                out_of_date += 1;
                println!("✗ {} [{}]:", config.name, backend);
                print!("{}", report);
            }
        }
    }

    if out_of_date > 0 {
        return Err(CliError::failure(format!(
            "\n{} suite(s) out of date; run `fixsuite generate`",
            out_of_date
        )));
    }
    Ok(ExitCode::SUCCESS)
}

/// Execute each selected suite's persisted tests with an external command.
pub fn run_suites(project: &ProjectConfig, suite: Option<&str>, args: &RunArgs) -> CliResult<ExitCode> {
    let mut options = RunOptions::new().with_stop_on_fail(args.stop_on_fail);
    if let Some(filter) = &args.filter {
        options = options.with_filter(filter.clone());
    }
    let runner = SuiteRunner::new(options);
    let mut total = TestSummary::default();

    for config in project.select(suite).map_err(CliError::diagnostic)? {
        let root = config.resolved_root(&project.base_dir);
        let executor = CommandExecutor::from_template(&args.exec, root).map_err(CliError::diagnostic)?;
        let suites =
            pipeline::load_suites(config, &project.base_dir, Arc::new(executor)).map_err(CliError::diagnostic)?;

        for generated in suites {
            let selected = args
                .backend
                .as_deref()
                .is_none_or(|b| generated.backend().as_str().eq_ignore_ascii_case(b));
            if !selected {
                continue;
            }
            let mut reporter = ConsoleReporter::new(args.verbose);
            let summary = runner.run(&generated, &mut reporter);
            total.merge(&summary);
            if args.stop_on_fail && !summary.is_success() {
                break;
            }
        }
    }

    if total.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        // Tests failed - return error with empty message (summary already printed)
        Err(CliError::new("", ExitCode::FAILURE))
    }
}
