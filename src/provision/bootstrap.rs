// file: src/provision/bootstrap.rs
// version: 1.0.0
// guid: e4b7c9d2-1a3f-4e58-9c6b-7d0e2f1a3b4c

//! Remote control plane bootstrap sequence

use super::context::ProvisioningContext;
use super::init_system::{InitSystemKind, ServiceAction, ServiceManager};
use super::transfer::{harden_key_command, make_executable_command, mkdir_command, write_file_command};
use super::wait::wait_for_api_server;
use crate::artifacts::{
    kubelet_install_command, render_kubelet_kubeconfig, render_manifests, render_policy,
    render_service_unit, RenderedArtifact, MANIFEST_DIR, POLICY_DIR,
};
use crate::error::KmachineError;
use crate::network::CommandExecutor;
use crate::pki::{CertRole, CertificateIssuer, CertificatePlan};
use crate::template::TemplateRenderer;
use crate::Result;
use std::path::Path;
use tracing::{error, info, warn};

/// Drives one bootstrap run over an exclusively borrowed command channel
pub struct Bootstrapper<'a, E: CommandExecutor + ?Sized> {
    executor: &'a mut E,
    issuer: &'a dyn CertificateIssuer,
    renderer: TemplateRenderer,
}

fn step_failed(step: &'static str) -> impl FnOnce(KmachineError) -> KmachineError {
    move |e| {
        error!("Bootstrap step '{}' failed: {}", step, e);
        e
    }
}

impl<'a, E: CommandExecutor + ?Sized> Bootstrapper<'a, E> {
    pub fn new(executor: &'a mut E, issuer: &'a dyn CertificateIssuer) -> Self {
        Self {
            executor,
            issuer,
            renderer: TemplateRenderer::new(),
        }
    }

    /// Bring up the single-node control plane described by `ctx`
    ///
    /// Steps run strictly in order and the first failure aborts the run.
    /// Only stopping a previously installed kubelet is allowed to fail.
    pub async fn bootstrap(&mut self, ctx: &ProvisioningContext) -> Result<()> {
        info!(
            "Bootstrapping control plane on {} ({}), version {}",
            ctx.machine_name, ctx.machine_ip, ctx.version
        );

        let init = InitSystemKind::detect(&mut *self.executor).await;
        let services = ServiceManager::new(init);

        if let Err(e) = services.run(&mut *self.executor, ServiceAction::Stop).await {
            warn!("Could not stop an existing kubelet, continuing: {}", e);
        }

        let plan = CertificatePlan::new(ctx);
        plan.issue_all(self.issuer, ctx)
            .map_err(step_failed("issue certificates"))?;

        self.create_directories(ctx)
            .await
            .map_err(step_failed("create remote directories"))?;
        self.transfer_certificates(&plan, ctx)
            .await
            .map_err(step_failed("transfer certificates"))?;
        self.transfer_ca(ctx)
            .await
            .map_err(step_failed("transfer CA certificate"))?;
        self.write_remote(&format!("{}/tokenfile.txt", ctx.cert_dir), &ctx.token_line())
            .await
            .map_err(step_failed("write token file"))?;

        let manifests = render_manifests(&self.renderer, ctx).map_err(step_failed("render manifests"))?;
        self.transfer_artifacts(&manifests)
            .await
            .map_err(step_failed("transfer manifests"))?;

        let config = vec![
            render_policy(&self.renderer, &ctx.user).map_err(step_failed("render policy"))?,
            render_kubelet_kubeconfig(&self.renderer, ctx)
                .map_err(step_failed("render kubelet kubeconfig"))?,
        ];
        self.transfer_artifacts(&config)
            .await
            .map_err(step_failed("transfer policy and kubeconfig"))?;

        if ctx.install_kubelet {
            self.log_and_execute("Installing kubelet", &kubelet_install_command(&ctx.version))
                .await
                .map_err(step_failed("install kubelet"))?;
        }

        self.install_service(&services)
            .await
            .map_err(step_failed("install kubelet service"))?;

        services
            .run(&mut *self.executor, ServiceAction::Start)
            .await
            .map_err(step_failed("start kubelet"))?;

        wait_for_api_server(&mut *self.executor, ctx.wait)
            .await
            .map_err(step_failed("wait for API server"))?;

        info!("Control plane on {} is up", ctx.machine_name);
        Ok(())
    }

    async fn create_directories(&mut self, ctx: &ProvisioningContext) -> Result<()> {
        let mut dirs = vec![ctx.cert_dir.clone()];
        dirs.extend(
            CertRole::ALL
                .iter()
                .map(|role| format!("{}/{}", ctx.cert_dir, role.remote_subdir())),
        );
        dirs.push(MANIFEST_DIR.to_string());
        dirs.push(POLICY_DIR.to_string());

        for dir in dirs {
            self.log_and_execute("Creating directory", &mkdir_command(&dir))
                .await?;
        }
        Ok(())
    }

    async fn transfer_certificates(
        &mut self,
        plan: &CertificatePlan,
        ctx: &ProvisioningContext,
    ) -> Result<()> {
        info!("Copying certificates to {}", ctx.machine_name);
        for spec in plan.specs() {
            let key_path = spec.remote_key_path(&ctx.cert_dir);
            let key = read_local(&spec.key_path).await?;
            self.write_remote(&key_path, &key).await?;
            self.log_and_execute("Restricting key permissions", &harden_key_command(&key_path))
                .await?;

            let cert = read_local(&spec.cert_path).await?;
            self.write_remote(&spec.remote_cert_path(&ctx.cert_dir), &cert)
                .await?;
        }
        Ok(())
    }

    async fn transfer_ca(&mut self, ctx: &ProvisioningContext) -> Result<()> {
        let ca = read_local(&ctx.ca_cert_path).await?;
        self.write_remote(&format!("{}/ca.pem", ctx.cert_dir), &ca)
            .await
    }

    async fn transfer_artifacts(&mut self, artifacts: &[RenderedArtifact]) -> Result<()> {
        for artifact in artifacts {
            self.write_remote(&artifact.remote_path, &artifact.content)
                .await?;
        }
        Ok(())
    }

    async fn install_service(&mut self, services: &ServiceManager) -> Result<()> {
        let unit = render_service_unit(&self.renderer, services.kind())?;
        self.write_remote(&unit.remote_path, &unit.content).await?;

        if services.kind() == InitSystemKind::SysV {
            self.log_and_execute(
                "Making init script executable",
                &make_executable_command(&unit.remote_path),
            )
            .await?;
        }

        services
            .run(&mut *self.executor, ServiceAction::Enable)
            .await
    }

    async fn log_and_execute(&mut self, description: &str, command: &str) -> Result<()> {
        info!("Executing: {} -> {}", description, command);
        self.executor.execute(command).await
    }

    /// Write `content` to `remote_path`; errors name the path, not the content
    async fn write_remote(&mut self, remote_path: &str, content: &str) -> Result<()> {
        info!("Writing {}", remote_path);
        self.executor
            .execute(&write_file_command(remote_path, content))
            .await
            .map_err(|e| match e {
                KmachineError::RemoteCommand {
                    exit_code, output, ..
                } => KmachineError::remote_command(
                    format!("sudo tee {}", remote_path),
                    exit_code,
                    output,
                ),
                other => other,
            })
    }
}

async fn read_local(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path).await.map_err(|e| {
        KmachineError::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", path.display(), e),
        ))
    })
}
