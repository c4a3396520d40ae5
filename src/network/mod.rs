// file: src/network/mod.rs
// version: 2.0.0
// guid: s9t0u1v2-w3x4-5678-9012-345678stuvwx

//! Remote command channel

pub mod executor;
pub mod ssh;

pub use executor::CommandExecutor;
pub use ssh::SshClient;
