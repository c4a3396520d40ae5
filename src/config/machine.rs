// file: src/config/machine.rs
// version: 1.0.0
// guid: 38ef9cc0-2e87-42c2-be4a-513ab10e904e

//! Machine description structures

use super::{
    ServiceNetwork, DEFAULT_KUBERNETES_VERSION, DEFAULT_REMOTE_CERT_DIR,
    DEFAULT_SERVICE_CLUSTER_IP_RANGE,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

/// Description of a machine that kmachine can provision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineConfig {
    /// Machine name, also used as the cluster name
    pub name: String,
    /// Address the machine is reachable on
    pub ip: String,
    /// Docker engine TLS port advertised in `DOCKER_HOST`
    #[serde(default = "default_docker_port")]
    pub docker_port: u16,
    /// SSH connection settings
    #[serde(default)]
    pub ssh: SshConfig,
    /// Local CA used to sign the control plane certificates
    pub auth: AuthConfig,
    /// Control plane settings
    #[serde(default)]
    pub kubernetes: KubernetesConfig,
}

/// SSH connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SshConfig {
    /// Remote login user
    #[serde(default = "default_ssh_user")]
    pub user: String,
    /// Remote SSH port
    #[serde(default = "default_ssh_port")]
    pub port: u16,
    /// Private key to authenticate with; the SSH agent is used when absent
    #[serde(default)]
    pub identity_file: Option<PathBuf>,
}

/// Local CA material
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub ca_cert_path: PathBuf,
    pub ca_key_path: PathBuf,
}

/// Control plane settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KubernetesConfig {
    /// Release of the hyperkube image and kubelet binary, without the `v`
    #[serde(default = "default_version")]
    pub version: String,
    /// Remote certificate directory
    #[serde(default = "default_cert_dir")]
    pub cert_dir: String,
    /// User granted full access in the policy file
    #[serde(default = "default_user")]
    pub user: String,
    /// API access token; generated per run when absent
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_service_range")]
    pub service_cluster_ip_range: String,
    /// Download the kubelet binary when the host lacks one
    #[serde(default = "default_true")]
    pub install_kubelet: bool,
    #[serde(default)]
    pub wait: WaitConfig,
}

/// How long to wait for the API server to start listening
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitConfig {
    #[serde(default = "default_wait_attempts")]
    pub attempts: u32,
    #[serde(default = "default_wait_interval")]
    pub interval_secs: u64,
}

fn default_docker_port() -> u16 {
    2376
}

fn default_ssh_user() -> String {
    "ubuntu".to_string()
}

fn default_ssh_port() -> u16 {
    22
}

fn default_version() -> String {
    DEFAULT_KUBERNETES_VERSION.to_string()
}

fn default_cert_dir() -> String {
    DEFAULT_REMOTE_CERT_DIR.to_string()
}

fn default_user() -> String {
    "admin".to_string()
}

fn default_service_range() -> String {
    DEFAULT_SERVICE_CLUSTER_IP_RANGE.to_string()
}

fn default_true() -> bool {
    true
}

fn default_wait_attempts() -> u32 {
    60
}

fn default_wait_interval() -> u64 {
    5
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            user: default_ssh_user(),
            port: default_ssh_port(),
            identity_file: None,
        }
    }
}

impl Default for KubernetesConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            cert_dir: default_cert_dir(),
            user: default_user(),
            token: None,
            service_cluster_ip_range: default_service_range(),
            install_kubelet: true,
            wait: WaitConfig::default(),
        }
    }
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            attempts: default_wait_attempts(),
            interval_secs: default_wait_interval(),
        }
    }
}

impl MachineConfig {
    /// Validate the machine description
    pub fn validate(&self) -> crate::Result<()> {
        if self.name.is_empty() {
            return Err(crate::error::KmachineError::config(
                "Machine name cannot be empty",
            ));
        }

        if self.ip.parse::<IpAddr>().is_err() {
            return Err(crate::error::KmachineError::config(format!(
                "Invalid machine IP address: {}",
                self.ip
            )));
        }

        if self.auth.ca_cert_path.as_os_str().is_empty()
            || self.auth.ca_key_path.as_os_str().is_empty()
        {
            return Err(crate::error::KmachineError::config(
                "CA certificate and key paths are required",
            ));
        }

        self.kubernetes.validate()?;

        Ok(())
    }
}

impl KubernetesConfig {
    /// Parsed `service_cluster_ip_range`
    pub fn service_network(&self) -> crate::Result<ServiceNetwork> {
        self.service_cluster_ip_range.parse()
    }

    /// Validate control plane settings
    pub fn validate(&self) -> crate::Result<()> {
        let version_re = Regex::new(r"^\d+\.\d+\.\d+$").map_err(|e| {
            crate::error::KmachineError::config(format!("Invalid regex pattern: {}", e))
        })?;
        if !version_re.is_match(&self.version) {
            return Err(crate::error::KmachineError::config(format!(
                "Kubernetes version must look like 1.2.0, got: {}",
                self.version
            )));
        }

        // Interpolated into remote shell commands, so only plain path characters.
        let cert_dir_re = Regex::new(r"^/[A-Za-z0-9._/-]*$").map_err(|e| {
            crate::error::KmachineError::config(format!("Invalid regex pattern: {}", e))
        })?;
        if !cert_dir_re.is_match(&self.cert_dir) {
            return Err(crate::error::KmachineError::config(format!(
                "Remote certificate directory must be an absolute path of [A-Za-z0-9._/-]: {}",
                self.cert_dir
            )));
        }

        if self.user.is_empty() {
            return Err(crate::error::KmachineError::config(
                "Kubernetes user cannot be empty",
            ));
        }

        self.service_network()?;

        if self.wait.attempts == 0 {
            return Err(crate::error::KmachineError::config(
                "Readiness wait needs at least one attempt",
            ));
        }

        Ok(())
    }
}
