// file: src/artifacts/manifests.rs
// version: 1.0.0
// guid: 7a9c2d41-5e3b-4c8f-b1a6-0f2e9d8c7b65

//! Static pod manifests for the control plane components

use super::{ArtifactKind, RenderedArtifact, MANIFEST_DIR, POLICY_DIR, POLICY_PATH};
use crate::provision::ProvisioningContext;
use crate::template::TemplateRenderer;
use crate::Result;
use serde::Serialize;

const ETCD_TEMPLATE: &str = include_str!("../../templates/manifests/etcd.yaml");
const APISERVER_TEMPLATE: &str = include_str!("../../templates/manifests/apiserver.yaml");
const CONTROLLER_MANAGER_TEMPLATE: &str =
    include_str!("../../templates/manifests/controller-manager.yaml");
const SCHEDULER_TEMPLATE: &str = include_str!("../../templates/manifests/scheduler.yaml");
const PROXY_TEMPLATE: &str = include_str!("../../templates/manifests/proxy.yaml");

/// Control plane component run as a static pod
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Etcd,
    ApiServer,
    ControllerManager,
    Scheduler,
    Proxy,
}

impl Component {
    /// Transfer order; etcd first so the API server has a store to reach
    pub const ALL: [Component; 5] = [
        Component::Etcd,
        Component::ApiServer,
        Component::ControllerManager,
        Component::Scheduler,
        Component::Proxy,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Component::Etcd => "etcd",
            Component::ApiServer => "apiserver",
            Component::ControllerManager => "controller-manager",
            Component::Scheduler => "scheduler",
            Component::Proxy => "proxy",
        }
    }

    fn template(&self) -> &'static str {
        match self {
            Component::Etcd => ETCD_TEMPLATE,
            Component::ApiServer => APISERVER_TEMPLATE,
            Component::ControllerManager => CONTROLLER_MANAGER_TEMPLATE,
            Component::Scheduler => SCHEDULER_TEMPLATE,
            Component::Proxy => PROXY_TEMPLATE,
        }
    }

    pub fn remote_path(&self) -> String {
        format!("{}/{}.yaml", MANIFEST_DIR, self.name())
    }
}

#[derive(Debug, Serialize)]
struct ManifestParams<'a> {
    cluster_name: &'a str,
    cert_dir: &'a str,
    version: &'a str,
    service_cluster_ip_range: &'a str,
    policy_dir: &'a str,
    policy_path: &'a str,
}

/// Render one component's manifest
pub fn render_manifest(
    renderer: &TemplateRenderer,
    ctx: &ProvisioningContext,
    component: Component,
) -> Result<RenderedArtifact> {
    let params = ManifestParams {
        cluster_name: &ctx.machine_name,
        cert_dir: &ctx.cert_dir,
        version: &ctx.version,
        service_cluster_ip_range: &ctx.service_cluster_ip_range,
        policy_dir: POLICY_DIR,
        policy_path: POLICY_PATH,
    };
    let content = renderer.render(component.name(), component.template(), &params)?;
    Ok(RenderedArtifact::new(
        ArtifactKind::ManifestComponent,
        content,
        component.remote_path(),
    ))
}

/// Render all five component manifests in transfer order
pub fn render_manifests(
    renderer: &TemplateRenderer,
    ctx: &ProvisioningContext,
) -> Result<Vec<RenderedArtifact>> {
    Component::ALL
        .iter()
        .map(|&component| render_manifest(renderer, ctx, component))
        .collect()
}
