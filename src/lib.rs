//! Javelin - cached builds for Java applications
//!
//! Fingerprints an application source tree, skips the build tool when
//! neither sources nor toolchain changed, and replaces the tree with the
//! expanded build artifact.

pub mod artifact;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod orchestration;

#[cfg(test)]
mod test_support;

pub use error::{JavelinError, JavelinResult};
