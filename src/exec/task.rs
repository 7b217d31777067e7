// src/exec/task.rs

//! Per-target spawn/wait wrapper.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{info, warn};

use super::runner::{ProcessRunner, RunConfig, StdinMode};

/// One unit of work: run a single resolved executable to completion.
///
/// Tasks share nothing mutable; every field is owned.
#[derive(Debug, Clone)]
pub struct RunTask {
    /// Display name for this target's output.
    pub alias: String,
    /// Resolved path of the runnable artifact.
    pub executable: PathBuf,
    /// Workspace root the process runs in.
    pub workspace: PathBuf,
    /// Build-tool execution root.
    pub execution_root: PathBuf,
    /// Column width shared by every task of the invocation.
    pub width: usize,
}

/// Terminal outcome of one run task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The process ran and exited with this code (0 included).
    Exited(i32),
    /// The process could never be started.
    SpawnFailed,
}

/// Spawn the task's executable, wait for it, and classify the result.
///
/// Spawn errors are recovered into [`TaskOutcome::SpawnFailed`]; anything
/// that goes wrong after the process is up propagates as an error, so the
/// coordinator can tell "the target failed" from "the harness failed".
pub async fn run_one(runner: &dyn ProcessRunner, task: RunTask) -> Result<TaskOutcome> {
    let config = RunConfig {
        display_output_live: true,
        executable: task.executable.clone(),
        work_dir: task.workspace,
        display_name: task.alias.clone(),
        stdin: StdinMode::Null,
        width: task.width,
        exec_root: task.execution_root,
    };

    let mut handle = match runner.run_executable(config).await {
        Ok(handle) => handle,
        Err(err) => {
            warn!(
                alias = %task.alias,
                executable = %task.executable.display(),
                error = %err,
                "failed to spawn executable"
            );
            return Ok(TaskOutcome::SpawnFailed);
        }
    };

    let code = handle
        .wait()
        .await
        .with_context(|| format!("waiting for process of target '{}'", task.alias))?;

    info!(alias = %task.alias, exit_code = code, "task process exited");
    Ok(TaskOutcome::Exited(code))
}
