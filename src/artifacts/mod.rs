// file: src/artifacts/mod.rs
// version: 1.0.0
// guid: 4e1f3c2a-8b7d-4f65-a0d9-1c2b3e4f5a60

//! Configuration artifacts rendered for the remote host
//!
//! Each generator pairs a static template body with an explicit parameter
//! struct and returns the text together with its fixed remote location.

pub mod kubeconfig;
pub mod manifests;
pub mod policy;
pub mod service;

pub use kubeconfig::render_kubelet_kubeconfig;
pub use manifests::{render_manifests, Component};
pub use policy::{render_policy, Grant, GRANTS};
pub use service::{kubelet_install_command, render_service_unit};

/// Static pod manifests picked up by the kubelet
pub const MANIFEST_DIR: &str = "/etc/kubernetes/manifests";
pub const POLICY_DIR: &str = "/etc/kubernetes/policies";
pub const POLICY_PATH: &str = "/etc/kubernetes/policies/policy.jsonl";
pub const KUBELET_KUBECONFIG_PATH: &str = "/etc/kubernetes/kubelet.kubeconfig";
pub const KUBELET_BINARY_PATH: &str = "/usr/local/bin/kubelet";
pub const SYSTEMD_UNIT_PATH: &str = "/lib/systemd/system/kubelet.service";
pub const SYSV_SCRIPT_PATH: &str = "/etc/init.d/kubelet";
pub const SYSV_SERVICE_NAME: &str = "kubelet";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    ManifestComponent,
    KubeletClientConfig,
    AccessPolicy,
    ServiceUnit,
}

/// A rendered file and where it belongs on the remote host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedArtifact {
    pub kind: ArtifactKind,
    pub content: String,
    pub remote_path: String,
}

impl RenderedArtifact {
    pub fn new(kind: ArtifactKind, content: String, remote_path: impl Into<String>) -> Self {
        Self {
            kind,
            content,
            remote_path: remote_path.into(),
        }
    }
}
