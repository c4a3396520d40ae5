// file: src/artifacts/service.rs
// version: 1.0.0
// guid: 3d8a5f1c-9e2b-4a67-b4c3-d2e1f0a9b8c7

//! Kubelet service supervisor definitions

use super::{
    ArtifactKind, RenderedArtifact, KUBELET_BINARY_PATH, KUBELET_KUBECONFIG_PATH, MANIFEST_DIR,
    SYSTEMD_UNIT_PATH, SYSV_SCRIPT_PATH,
};
use crate::provision::InitSystemKind;
use crate::template::TemplateRenderer;
use crate::Result;
use serde::Serialize;

const SYSTEMD_TEMPLATE: &str = include_str!("../../templates/kubelet.service");
const SYSV_TEMPLATE: &str = include_str!("../../templates/kubelet.sysv");

/// Release download location for the kubelet binary
pub const KUBELET_RELEASE_URL: &str = "https://storage.googleapis.com/kubernetes-release/release";

#[derive(Debug, Serialize)]
struct ServiceParams<'a> {
    kubelet_path: &'a str,
    manifest_dir: &'a str,
    kubeconfig_path: &'a str,
}

/// Render the unit file (systemd) or init script (SysV) for the kubelet
pub fn render_service_unit(
    renderer: &TemplateRenderer,
    kind: InitSystemKind,
) -> Result<RenderedArtifact> {
    let params = ServiceParams {
        kubelet_path: KUBELET_BINARY_PATH,
        manifest_dir: MANIFEST_DIR,
        kubeconfig_path: KUBELET_KUBECONFIG_PATH,
    };
    let (name, body, path) = match kind {
        InitSystemKind::Systemd => ("kubelet.service", SYSTEMD_TEMPLATE, SYSTEMD_UNIT_PATH),
        InitSystemKind::SysV => ("kubelet.sysv", SYSV_TEMPLATE, SYSV_SCRIPT_PATH),
    };
    let content = renderer.render(name, body, &params)?;
    Ok(RenderedArtifact::new(ArtifactKind::ServiceUnit, content, path))
}

/// Download the kubelet for `version` unless an executable is already in place
pub fn kubelet_install_command(version: &str) -> String {
    format!(
        "if ! [ -x {path} ]; then sudo curl -fsSL -o {path} {base}/v{version}/bin/linux/amd64/kubelet && sudo chmod +x {path}; fi",
        path = KUBELET_BINARY_PATH,
        base = KUBELET_RELEASE_URL,
        version = version
    )
}
