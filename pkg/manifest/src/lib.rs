//! Turns a [`WorkloadConfig`](pkg_types::config::WorkloadConfig) into the
//! ordered bundle of descriptors that deploys it, and renders that bundle
//! for an external apply step.

pub mod builder;
pub mod error;
pub mod render;

pub use builder::{build, validate};
pub use error::InvalidConfiguration;
