// src/exec/runner.rs

//! The "run executable" collaborator.
//!
//! The coordinator never touches `tokio::process` directly; it goes through
//! the [`ProcessRunner`] trait so tests can substitute a fake that scripts
//! outcomes without spawning real processes.
//!
//! A spawn error is surfaced from [`ProcessRunner::run_executable`] itself
//! and is a different thing from a non-zero exit code: "the program could
//! not start" vs "the program ran and failed".

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::process::{ExitStatus, Stdio};

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, info};

/// How the child's standard input is wired up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdinMode {
    /// `/dev/null`; the child can never block waiting for interactive input.
    Null,
    /// Inherit the parent's stdin.
    Inherit,
}

/// Configuration for one executable run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Stream the child's output live, each line prefixed with the padded
    /// display name, and print an `Exit`/`Fail` marker on termination.
    pub display_output_live: bool,
    /// Path of the executable, absolute or relative to `exec_root`.
    pub executable: PathBuf,
    /// Directory the child runs in (the workspace root).
    pub work_dir: PathBuf,
    /// Name shown in the output prefix.
    pub display_name: String,
    pub stdin: StdinMode,
    /// Column width the display name is padded to.
    pub width: usize,
    /// Build-tool execution root; relative executable paths resolve here.
    pub exec_root: PathBuf,
}

/// A running child process. Dropping the handle reaps the child.
pub trait ProcessHandle: Send {
    /// Wait for the process to terminate and return its exit code.
    fn wait(&mut self) -> Pin<Box<dyn Future<Output = anyhow::Result<i32>> + Send + '_>>;
}

/// Trait abstracting how one executable is started.
///
/// Production code uses [`TokioProcessRunner`]; tests can provide their own
/// implementation that doesn't spawn real processes.
pub trait ProcessRunner: Send + Sync {
    /// Start the process described by `config`.
    ///
    /// An `Err` here means the process never started (missing file,
    /// permission error, exec-format error); it is NOT an exit code.
    fn run_executable(
        &self,
        config: RunConfig,
    ) -> Pin<Box<dyn Future<Output = std::io::Result<Box<dyn ProcessHandle>>> + Send + '_>>;
}

/// Real process runner used in production.
pub struct TokioProcessRunner;

impl ProcessRunner for TokioProcessRunner {
    fn run_executable(
        &self,
        config: RunConfig,
    ) -> Pin<Box<dyn Future<Output = std::io::Result<Box<dyn ProcessHandle>>> + Send + '_>> {
        Box::pin(async move {
            let program = if config.executable.is_absolute() {
                config.executable.clone()
            } else {
                config.exec_root.join(&config.executable)
            };

            let mut cmd = Command::new(&program);
            cmd.current_dir(&config.work_dir).kill_on_drop(true);

            cmd.stdin(match config.stdin {
                StdinMode::Null => Stdio::null(),
                StdinMode::Inherit => Stdio::inherit(),
            });

            if config.display_output_live {
                cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
            } else {
                cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
            }

            let mut child = cmd.spawn()?;

            info!(
                name = %config.display_name,
                program = %program.display(),
                "process started"
            );

            let mut printers = Vec::new();
            if config.display_output_live {
                if let Some(stdout) = child.stdout.take() {
                    printers.push(spawn_line_printer(
                        stdout,
                        config.display_name.clone(),
                        config.width,
                    ));
                }
                if let Some(stderr) = child.stderr.take() {
                    printers.push(spawn_line_printer(
                        stderr,
                        config.display_name.clone(),
                        config.width,
                    ));
                }
            }

            Ok(Box::new(ChildHandle {
                child,
                printers,
                display_name: config.display_name,
                width: config.width,
                display_code: config.display_output_live,
            }) as Box<dyn ProcessHandle>)
        })
    }
}

/// Handle around a spawned `tokio` child.
///
/// `kill_on_drop` is set on the command, so the child is reaped even when
/// the owning task bails out before `wait` completes.
struct ChildHandle {
    child: Child,
    printers: Vec<tokio::task::JoinHandle<()>>,
    display_name: String,
    width: usize,
    display_code: bool,
}

impl ProcessHandle for ChildHandle {
    fn wait(&mut self) -> Pin<Box<dyn Future<Output = anyhow::Result<i32>> + Send + '_>> {
        Box::pin(async move {
            let status = self
                .child
                .wait()
                .await
                .with_context(|| format!("waiting for process '{}'", self.display_name))?;

            // Let the printers drain the pipes before the exit marker.
            for printer in self.printers.drain(..) {
                let _ = printer.await;
            }

            let code = exit_code(status);
            if self.display_code {
                let marker = if code == 0 {
                    format!("Exit {code}")
                } else {
                    format!("Fail (Exit {code})")
                };
                println!("{:<width$} | {}", self.display_name, marker, width = self.width);
            }

            debug!(name = %self.display_name, exit_code = code, "process reaped");
            Ok(code)
        })
    }
}

/// Exit code for a terminated process; signal deaths map to `128 + signal`.
fn exit_code(status: ExitStatus) -> i32 {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(sig) = status.signal() {
            return 128 + sig;
        }
    }
    status.code().unwrap_or(-1)
}

fn spawn_line_printer<R>(reader: R, name: String, width: usize) -> tokio::task::JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            println!("{name:<width$} | {line}");
        }
    })
}
