// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`runner`] holds the [`ProcessRunner`] collaborator: the trait the
//!   coordinator spawns through, plus the real `tokio::process`-backed
//!   implementation that streams name-prefixed output.
//! - [`task`] is the per-target spawn/wait wrapper that classifies one run
//!   into a [`TaskOutcome`].

pub mod runner;
pub mod task;

pub use runner::{ProcessHandle, ProcessRunner, RunConfig, StdinMode, TokioProcessRunner};
pub use task::{RunTask, TaskOutcome, run_one};
