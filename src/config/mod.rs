// file: src/config/mod.rs
// version: 2.0.0
// guid: a1b2c3d4-e5f6-7a8b-9c0d-1e2f3a4b5c6d

//! Configuration module for kmachine
//!
//! Handles loading and validation of machine files and the storage layout
//! they live in.

pub mod loader;
pub mod machine;
pub mod service_network;
pub mod token;

pub use loader::ConfigLoader;
pub use machine::{AuthConfig, KubernetesConfig, MachineConfig, SshConfig, WaitConfig};
pub use service_network::ServiceNetwork;
pub use token::{load_stored_token, store_token};

use std::path::{Path, PathBuf};

/// Kubernetes release deployed when a machine file does not pin one
pub const DEFAULT_KUBERNETES_VERSION: &str = "1.2.0";

/// Service network handed to the API server
pub const DEFAULT_SERVICE_CLUSTER_IP_RANGE: &str = "10.0.0.0/24";

/// Remote directory holding the control plane PKI material
pub const DEFAULT_REMOTE_CERT_DIR: &str = "/var/run/kubernetes";

/// Default storage root (`~/.kmachine`)
pub fn default_storage_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".kmachine")
}

/// Directory holding everything kmachine knows about one machine
pub fn machine_dir(storage: &Path, name: &str) -> PathBuf {
    storage.join("machines").join(name)
}

/// Where a generated API token is kept between runs
pub fn machine_token_path(storage: &Path, name: &str) -> PathBuf {
    machine_dir(storage, name).join("token")
}

/// Location of a machine's YAML description
pub fn machine_config_path(storage: &Path, name: &str) -> PathBuf {
    machine_dir(storage, name).join("config.yaml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_layout() {
        let storage = Path::new("/home/u/.kmachine");
        assert_eq!(
            machine_dir(storage, "node1"),
            PathBuf::from("/home/u/.kmachine/machines/node1")
        );
        assert_eq!(
            machine_config_path(storage, "node1"),
            PathBuf::from("/home/u/.kmachine/machines/node1/config.yaml")
        );
    }

    #[test]
    fn test_default_storage_path_ends_with_kmachine() {
        assert!(default_storage_path().ends_with(".kmachine"));
    }
}
