// src/bazel/client.rs

//! Thin client over the build tool's `info`, `cquery` and `build`
//! subcommands.

use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::errors::{MrunError, Result};

/// Starlark expression mapping a configured target to the path of its
/// runnable artifact.
const EXECUTABLE_PATH_EXPR: &str = "target.files_to_run.executable.path";

/// Interface to the build tool.
///
/// The coordinator depends only on these three operations; everything else
/// the tool can do is out of scope.
pub trait BuildClient: Send + Sync {
    /// Look up workspace-level keys (e.g. `execution_root`, `workspace`).
    fn info(
        &self,
        keys: Vec<String>,
    ) -> Pin<Box<dyn Future<Output = Result<HashMap<String, String>>> + Send + '_>>;

    /// Resolve each target to the on-disk path of its runnable artifact.
    ///
    /// The returned paths correspond 1:1, in order, with `targets`.
    fn resolve_executable_paths(
        &self,
        targets: Vec<String>,
        options: Vec<String>,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<PathBuf>>> + Send + '_>>;

    /// Build all targets; fails loudly on any build error.
    fn build(
        &self,
        targets: Vec<String>,
        options: Vec<String>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Real client that shells out to the `bazel` binary.
pub struct BazelClient {
    bazel_bin: String,
}

impl BazelClient {
    /// The binary defaults to `bazel` on `PATH`; `MRUN_BAZEL` overrides it.
    pub fn new() -> Self {
        let bazel_bin = std::env::var("MRUN_BAZEL").unwrap_or_else(|_| "bazel".to_string());
        Self { bazel_bin }
    }

    /// Run a subcommand and capture stdout; stderr is surfaced on failure.
    async fn capture(&self, args: Vec<String>) -> Result<String> {
        debug!(bazel = %self.bazel_bin, ?args, "invoking build tool");

        let output = Command::new(&self.bazel_bin)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await?;

        if !output.status.success() {
            return Err(MrunError::BuildTool(format!(
                "`{} {}` failed: {}",
                self.bazel_bin,
                args.join(" "),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl Default for BazelClient {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildClient for BazelClient {
    fn info(
        &self,
        keys: Vec<String>,
    ) -> Pin<Box<dyn Future<Output = Result<HashMap<String, String>>> + Send + '_>> {
        Box::pin(async move {
            let mut args = vec!["info".to_string()];
            args.extend(keys.iter().cloned());

            let stdout = self.capture(args).await?;
            Ok(parse_info_output(&keys, &stdout))
        })
    }

    fn resolve_executable_paths(
        &self,
        targets: Vec<String>,
        options: Vec<String>,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<PathBuf>>> + Send + '_>> {
        Box::pin(async move {
            let mut args = vec![
                "cquery".to_string(),
                targets.join(" + "),
                "--output=starlark".to_string(),
                format!("--starlark:expr={EXECUTABLE_PATH_EXPR}"),
            ];
            args.extend(options);

            let stdout = self.capture(args).await?;
            Ok(parse_cquery_paths(&stdout))
        })
    }

    fn build(
        &self,
        targets: Vec<String>,
        options: Vec<String>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            debug!(bazel = %self.bazel_bin, ?targets, "building targets");

            // Build output goes straight to the terminal; users expect to
            // see the build tool's own progress.
            let status = Command::new(&self.bazel_bin)
                .arg("build")
                .args(&targets)
                .args(&options)
                .stdin(Stdio::null())
                .status()
                .await?;

            if !status.success() {
                return Err(MrunError::BuildTool(format!(
                    "build failed for targets: {}",
                    targets.join(" ")
                )));
            }
            Ok(())
        })
    }
}

/// Parse `info` output into a key/value map.
///
/// With several keys the tool prints `key: value` lines; with a single key
/// it prints the bare value.
fn parse_info_output(keys: &[String], stdout: &str) -> HashMap<String, String> {
    let lines: Vec<&str> = stdout.lines().filter(|l| !l.trim().is_empty()).collect();

    if keys.len() == 1 && lines.len() == 1 && !lines[0].contains(": ") {
        return HashMap::from([(keys[0].clone(), lines[0].trim().to_string())]);
    }

    lines
        .iter()
        .filter_map(|line| {
            line.split_once(": ")
                .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        })
        .collect()
}

/// Parse starlark-formatted cquery output: one executable path per line.
fn parse_cquery_paths(stdout: &str) -> Vec<PathBuf> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .collect()
}
