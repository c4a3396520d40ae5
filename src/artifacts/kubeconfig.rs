// file: src/artifacts/kubeconfig.rs
// version: 1.0.0
// guid: 1f6b8e3d-2c4a-4d79-9e05-b3a7c6d2e814

//! Kubelet client configuration

use super::{ArtifactKind, RenderedArtifact, KUBELET_KUBECONFIG_PATH};
use crate::provision::ProvisioningContext;
use crate::template::TemplateRenderer;
use crate::Result;
use serde::Serialize;

const KUBECONFIG_TEMPLATE: &str = include_str!("../../templates/kubelet.kubeconfig");

#[derive(Debug, Serialize)]
struct KubeconfigParams<'a> {
    cluster_name: &'a str,
    cert_dir: &'a str,
}

/// Kubeconfig the kubelet uses to reach the local API server with its client pair
pub fn render_kubelet_kubeconfig(
    renderer: &TemplateRenderer,
    ctx: &ProvisioningContext,
) -> Result<RenderedArtifact> {
    let params = KubeconfigParams {
        cluster_name: &ctx.machine_name,
        cert_dir: &ctx.cert_dir,
    };
    let content = renderer.render("kubelet.kubeconfig", KUBECONFIG_TEMPLATE, &params)?;
    Ok(RenderedArtifact::new(
        ArtifactKind::KubeletClientConfig,
        content,
        KUBELET_KUBECONFIG_PATH,
    ))
}
