//! Typed model of the resources that make up a workload bundle.
//!
//! Every type here serializes to the shape the cluster API expects, so a
//! rendered descriptor can be handed straight to an apply step.

pub mod config;
pub mod deployment;
pub mod descriptor;
pub mod meta;
pub mod pod;
pub mod quantity;
pub mod rbac;
pub mod service;
pub mod service_account;
pub mod validate;
