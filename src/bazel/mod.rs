// src/bazel/mod.rs

//! Resolver/Builder facade over the build tool.
//!
//! The rest of the crate only ever needs three operations from the build
//! tool: `info`, "resolve targets to executable paths" and `build`. They
//! are behind the [`BuildClient`] trait so tests can run the whole flow
//! without a build tool installed.

pub mod client;

pub use client::{BazelClient, BuildClient};
