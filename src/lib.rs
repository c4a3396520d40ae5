// file: src/lib.rs
// version: 3.0.0
// guid: d82472d1-7f0f-4eb4-b0a3-6e1547103eb4

//! # kmachine
//!
//! Bootstraps a single-node Kubernetes control plane onto an existing
//! machine over SSH: issues the control plane certificates from a local CA,
//! renders the static pod manifests, policy, kubeconfig and kubelet service,
//! transfers them with shell commands and starts the kubelet.
//!
//! It also prints per-shell environment directives that point Docker and
//! kubectl at a provisioned machine.

pub mod addons;
pub mod artifacts;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod machine;
pub mod network;
pub mod pki;
pub mod provision;
pub mod shellenv;
pub mod template;

pub use error::{KmachineError, Result};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
