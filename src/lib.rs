// src/lib.rs

pub mod bazel;
pub mod cli;
pub mod coordinator;
pub mod errors;
pub mod exec;
pub mod logging;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use crate::bazel::{BazelClient, BuildClient};
use crate::cli::CliArgs;
use crate::coordinator::run_all;
use crate::errors::{MrunError, Result};
use crate::exec::runner::{ProcessRunner, TokioProcessRunner};
use crate::exec::task::RunTask;

/// High-level entry point used by `main.rs`.
///
/// Returns the aggregate exit code for the whole invocation; `main`
/// terminates the process with it.
pub async fn run(args: CliArgs) -> Result<i32> {
    let client = BazelClient::new();
    let runner = Arc::new(TokioProcessRunner);
    run_with(&client, runner, args).await
}

/// Same as [`run`], with the two external collaborators injected.
///
/// This wires together:
/// - the build tool facade (resolve executables, build)
/// - one run task per target
/// - the concurrent coordinator and its result reduction
pub async fn run_with(
    client: &dyn BuildClient,
    runner: Arc<dyn ProcessRunner>,
    args: CliArgs,
) -> Result<i32> {
    let aliases: HashMap<String, String> = args.alias.iter().cloned().collect();

    // Width is fixed once, before dispatch, so concurrent output stays
    // aligned no matter which task prints first.
    let width = match args.width {
        Some(w) => w,
        None => display_width(&args.targets, &aliases),
    };

    let info = client
        .info(vec!["execution_root".to_string(), "workspace".to_string()])
        .await?;
    let execution_root = info_path(&info, "execution_root")?;
    let workspace = info_path(&info, "workspace")?;
    debug!(
        execution_root = %execution_root.display(),
        workspace = %workspace.display(),
        "resolved build tool roots"
    );

    let executables = client
        .resolve_executable_paths(args.targets.clone(), args.build_args.clone())
        .await?;
    if executables.len() != args.targets.len() {
        return Err(MrunError::BuildTool(format!(
            "resolved {} executable paths for {} targets",
            executables.len(),
            args.targets.len()
        )));
    }

    client
        .build(args.targets.clone(), args.build_args.clone())
        .await?;

    let tasks: Vec<RunTask> = args
        .targets
        .iter()
        .zip(executables)
        .map(|(target, executable)| RunTask {
            alias: aliases.get(target).cloned().unwrap_or_else(|| target.clone()),
            executable,
            workspace: workspace.clone(),
            execution_root: execution_root.clone(),
            width,
        })
        .collect();

    let parallelism = args.parallelism.map(|p| p as usize).unwrap_or(tasks.len());
    info!(targets = tasks.len(), parallelism, width, "targets built; running");

    let code = run_all(runner, tasks, parallelism).await?;
    if code != 0 {
        // One pointer line; per-target detail is already visible in that
        // target's own prefixed output above.
        println!("One or more targets failed; search the output above for Exit and Fail");
    }
    Ok(code)
}

/// Default display width: the longest display name across all targets.
fn display_width(targets: &[String], aliases: &HashMap<String, String>) -> usize {
    targets
        .iter()
        .map(|t| aliases.get(t).map_or(t.len(), String::len))
        .max()
        .unwrap_or(0)
}

fn info_path(info: &HashMap<String, String>, key: &str) -> Result<PathBuf> {
    info.get(key)
        .map(PathBuf::from)
        .ok_or_else(|| MrunError::BuildTool(format!("build tool info is missing `{key}`")))
}
