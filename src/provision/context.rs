// file: src/provision/context.rs
// version: 1.0.0
// guid: 0aa5d28a-22cb-4e6f-b158-249f3dbcf97d

//! Per-run provisioning parameters

use crate::config::MachineConfig;
use crate::machine::Machine;
use crate::Result;
use rand::distributions::{Alphanumeric, DistString};
use std::path::PathBuf;
use std::time::Duration;

/// Length of generated API access tokens
pub const TOKEN_LENGTH: usize = 32;

/// Bounded polling policy for the API server readiness wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub attempts: u32,
    pub interval: Duration,
}

/// Immutable record of everything one bootstrap run needs
#[derive(Debug, Clone)]
pub struct ProvisioningContext {
    pub machine_name: String,
    pub machine_ip: String,
    /// Remote certificate directory
    pub cert_dir: String,
    /// Kubernetes release, without the `v`
    pub version: String,
    pub user: String,
    pub token: String,
    pub ca_cert_path: PathBuf,
    pub ca_key_path: PathBuf,
    /// Local directory the issued pairs are written to before transfer
    pub local_cert_dir: PathBuf,
    pub service_cluster_ip_range: String,
    /// First host of the service network, carried in the API server certificate
    pub service_gateway: String,
    pub install_kubelet: bool,
    pub wait: WaitPolicy,
}

impl ProvisioningContext {
    /// Build the context for `machine`, asking it for its current address
    pub fn from_machine(
        machine: &dyn Machine,
        config: &MachineConfig,
        local_cert_dir: PathBuf,
    ) -> Result<Self> {
        let machine_ip = machine.ip()?;
        let k8s = &config.kubernetes;
        let service_network = k8s.service_network()?;

        Ok(Self {
            machine_name: machine.name().to_string(),
            machine_ip,
            cert_dir: k8s.cert_dir.trim_end_matches('/').to_string(),
            version: k8s.version.clone(),
            user: k8s.user.clone(),
            token: k8s.token.clone().unwrap_or_else(generate_token),
            ca_cert_path: config.auth.ca_cert_path.clone(),
            ca_key_path: config.auth.ca_key_path.clone(),
            local_cert_dir,
            service_cluster_ip_range: service_network.to_string(),
            service_gateway: service_network.gateway().to_string(),
            install_kubelet: k8s.install_kubelet,
            wait: WaitPolicy {
                attempts: k8s.wait.attempts,
                interval: Duration::from_secs(k8s.wait.interval_secs),
            },
        })
    }

    /// Contents of the API server token file: `token,user,uid`
    pub fn token_line(&self) -> String {
        format!("{},{},0", self.token, self.user)
    }
}

/// Random alphanumeric API access token
pub fn generate_token() -> String {
    Alphanumeric.sample_string(&mut rand::thread_rng(), TOKEN_LENGTH)
}
