// file: src/provision/mod.rs
// version: 1.0.0
// guid: b2f4d6e8-0a1c-4e3f-8b5d-7f9a1c3e5b7d

//! Single-node control plane provisioning over the remote command channel

pub mod bootstrap;
pub mod context;
pub mod init_system;
pub mod transfer;
pub mod wait;

pub use bootstrap::Bootstrapper;
pub use context::{generate_token, ProvisioningContext, WaitPolicy};
pub use init_system::{InitSystemKind, ServiceAction, ServiceManager};
pub use wait::{wait_for_api_server, ListenerMatcher};
