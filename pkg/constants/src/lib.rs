//! Centralized constants for the ksm-manifest project.
//!
//! All default values for the generated bundle live here.
//! Change a value in one place and it applies everywhere.

pub mod network;
pub mod paths;
pub mod workload;
