//! Built artifact discovery

pub mod manifest;
pub mod resolve;

pub use manifest::Manifest;
pub use resolve::ArtifactResolver;
