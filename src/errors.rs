// src/errors.rs

//! Crate-wide error type and Result alias.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MrunError {
    #[error("build tool error: {0}")]
    BuildTool(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, MrunError>;
