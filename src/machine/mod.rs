// file: src/machine/mod.rs
// version: 1.0.0
// guid: 717f832c-1b7a-44a5-bd48-a099af81abd6

//! Machine lifecycle collaborator
//!
//! kmachine only reads from machines: their name, address and endpoint.
//! Creating, starting and stopping them belongs to the driver that made them.

use crate::config::MachineConfig;
use crate::error::KmachineError;
use crate::Result;
use std::net::{IpAddr, SocketAddr};
use url::Url;

/// API server secure port advertised to clients
pub const API_SERVER_PORT: u16 = 6443;

/// Read-only view of a provisionable machine
pub trait Machine {
    fn name(&self) -> &str;

    /// Address the machine is reachable on
    fn ip(&self) -> Result<String>;

    /// Docker endpoint URL, e.g. `tcp://10.0.0.5:2376`
    fn url(&self) -> Result<String>;
}

/// An existing host described by a machine file
#[derive(Debug, Clone)]
pub struct GenericMachine {
    config: MachineConfig,
}

impl GenericMachine {
    pub fn new(config: MachineConfig) -> Self {
        Self { config }
    }
}

impl Machine for GenericMachine {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn ip(&self) -> Result<String> {
        self.config
            .ip
            .parse::<IpAddr>()
            .map(|ip| ip.to_string())
            .map_err(|e| {
                KmachineError::machine(
                    "get IP",
                    format!("{} has no usable address ({}): {}", self.config.name, self.config.ip, e),
                )
            })
    }

    fn url(&self) -> Result<String> {
        self.config
            .ip
            .parse::<IpAddr>()
            .map(|ip| format!("tcp://{}", SocketAddr::new(ip, self.config.docker_port)))
            .map_err(|e| KmachineError::machine("get URL", format!("{}: {}", self.config.ip, e)))
    }
}

/// API server URL for a machine endpoint: same host, `https`, port 6443
pub fn api_server_url(endpoint: &str) -> Result<String> {
    let url = Url::parse(endpoint).map_err(|e| {
        KmachineError::invalid_argument(format!("Invalid machine URL '{}': {}", endpoint, e))
    })?;
    let host = url.host_str().ok_or_else(|| {
        KmachineError::invalid_argument(format!("Machine URL '{}' has no host", endpoint))
    })?;
    Ok(format!("https://{}:{}", host, API_SERVER_PORT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AuthConfig, KubernetesConfig, SshConfig};
    use std::path::PathBuf;

    fn config(ip: &str) -> MachineConfig {
        MachineConfig {
            name: "node1".to_string(),
            ip: ip.to_string(),
            docker_port: 2376,
            ssh: SshConfig::default(),
            auth: AuthConfig {
                ca_cert_path: PathBuf::from("/tmp/ca.pem"),
                ca_key_path: PathBuf::from("/tmp/ca-key.pem"),
            },
            kubernetes: KubernetesConfig::default(),
        }
    }

    #[test]
    fn test_generic_machine_reports_config() {
        let machine = GenericMachine::new(config("10.0.0.5"));
        assert_eq!(machine.name(), "node1");
        assert_eq!(machine.ip().unwrap(), "10.0.0.5");
        assert_eq!(machine.url().unwrap(), "tcp://10.0.0.5:2376");
    }

    #[test]
    fn test_bad_address_is_machine_error() {
        let machine = GenericMachine::new(config("nowhere"));
        let err = machine.ip().unwrap_err();
        assert!(matches!(err, KmachineError::Machine { ref operation, .. } if operation == "get IP"));
        assert!(machine.url().is_err());
    }

    #[test]
    fn test_ipv6_url_is_bracketed() {
        let machine = GenericMachine::new(config("fd00::5"));
        assert_eq!(machine.url().unwrap(), "tcp://[fd00::5]:2376");
    }

    #[test]
    fn test_api_server_url() {
        assert_eq!(
            api_server_url("tcp://10.0.0.5:2376").unwrap(),
            "https://10.0.0.5:6443"
        );
        assert_eq!(
            api_server_url("tcp://[fd00::5]:2376").unwrap(),
            "https://[fd00::5]:6443"
        );
        assert!(matches!(
            api_server_url("not a url"),
            Err(KmachineError::InvalidArgument(_))
        ));
    }
}
