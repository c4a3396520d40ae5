// file: src/cli/commands.rs
// version: 2.0.0
// guid: a7b8c9d0-e1f2-4345-8678-9abcdef01234

//! Command implementations for the CLI

use crate::{
    addons::{AddonDeployer, AddonKind},
    config::{
        load_stored_token, machine_dir, machine_token_path, store_token, ConfigLoader,
        MachineConfig,
    },
    logging::with_async_operation_span,
    machine::{api_server_url, GenericMachine, Machine},
    network::SshClient,
    pki::RcgenIssuer,
    provision::{Bootstrapper, ProvisioningContext},
    shellenv::{generate_directives, DirectiveRequest, EnvMode, ShellDialect},
    template::TemplateRenderer,
    Result,
};
use std::path::Path;
use tracing::{info, warn};

/// API token from the machine file, else the one saved by an earlier provision
fn api_token(storage: &Path, name: &str, config: &MachineConfig) -> Result<Option<String>> {
    match &config.kubernetes.token {
        Some(token) => Ok(Some(token.clone())),
        None => load_stored_token(storage, name),
    }
}

/// Provision the control plane on a machine
pub async fn provision_command(storage: &Path, name: &str) -> Result<()> {
    let mut config = ConfigLoader::new().load_machine(storage, name)?;
    config.kubernetes.token = api_token(storage, name, &config)?;
    let generated = config.kubernetes.token.is_none();

    let machine = GenericMachine::new(config.clone());
    let ctx = ProvisioningContext::from_machine(&machine, &config, machine_dir(storage, name))?;

    if generated {
        store_token(storage, name, &ctx.token)?;
        warn!(
            "No kubernetes.token set for {}; generated one and saved it to {}",
            name,
            machine_token_path(storage, name).display()
        );
    }

    let mut ssh = SshClient::new()
        .with_port(config.ssh.port)
        .with_identity_file(config.ssh.identity_file.clone());
    ssh.connect(&ctx.machine_ip, &config.ssh.user).await?;

    let issuer = RcgenIssuer::new();
    let (executor, ctx_ref) = (&mut ssh, &ctx);
    let result = with_async_operation_span("provision", move || async move {
        Bootstrapper::new(executor, &issuer).bootstrap(ctx_ref).await
    })
    .await;

    ssh.disconnect();
    result?;

    info!("Machine {} provisioned", name);
    Ok(())
}

/// Print shell directives for a machine
pub async fn env_command(
    storage: &Path,
    name: &str,
    shell: Option<&str>,
    unset: bool,
    no_proxy: bool,
) -> Result<()> {
    let config = ConfigLoader::new().load_machine(storage, name)?;
    let machine = GenericMachine::new(config.clone());

    let dialect = match shell {
        Some(shell) => shell.parse::<ShellDialect>().unwrap_or_default(),
        None => ShellDialect::detect(|key| std::env::var(key).ok()),
    };
    let docker_host = machine.url()?;
    let machine_ip = machine.ip()?;
    let cert_path = machine_dir(storage, name);
    let command_line = std::env::args().collect::<Vec<_>>().join(" ");
    let token = api_token(storage, name, &config)?;

    let request = DirectiveRequest {
        machine_name: machine.name(),
        machine_ip: &machine_ip,
        docker_host: &docker_host,
        cert_path: &cert_path,
        token: token.as_deref(),
        dialect,
        mode: if unset { EnvMode::Unset } else { EnvMode::Set },
        no_proxy,
        command_line: &command_line,
    };

    let directives = generate_directives(&TemplateRenderer::new(), &request, |key| {
        std::env::var(key).ok()
    })?;
    print!("{}", directives);
    Ok(())
}

/// Create a bundled addon against the machine's API server
pub async fn deploy_command(storage: &Path, name: &str, kind: AddonKind) -> Result<()> {
    let config = ConfigLoader::new().load_machine(storage, name)?;
    let machine = GenericMachine::new(config.clone());
    let server = api_server_url(&machine.url()?)?;

    let token = api_token(storage, name, &config)?;

    AddonDeployer::new(server, token)?
        .deploy(kind)
        .await?;

    info!("Deployed {} addon to {}", kind, name);
    Ok(())
}
