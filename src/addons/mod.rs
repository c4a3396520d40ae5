// file: src/addons/mod.rs
// version: 1.0.0
// guid: c5d7e9f1-3a5b-4c7d-9e1f-2a4b6c8d0e2f

//! Bundled cluster addons created through a local kubectl

use crate::error::KmachineError;
use crate::Result;
use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, error, info};

const DNS_MANIFEST: &str = include_str!("../../templates/addons/dns.yaml");
const HELM_MANIFEST: &str = include_str!("../../templates/addons/helm.yaml");
const DASHBOARD_MANIFEST: &str = include_str!("../../templates/addons/dashboard.yaml");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddonKind {
    Dns,
    Helm,
    Dashboard,
}

impl AddonKind {
    pub fn name(&self) -> &'static str {
        match self {
            AddonKind::Dns => "dns",
            AddonKind::Helm => "helm",
            AddonKind::Dashboard => "dashboard",
        }
    }

    pub fn manifest(&self) -> &'static str {
        match self {
            AddonKind::Dns => DNS_MANIFEST,
            AddonKind::Helm => HELM_MANIFEST,
            AddonKind::Dashboard => DASHBOARD_MANIFEST,
        }
    }
}

impl fmt::Display for AddonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Creates addon objects against a machine's API server
#[derive(Debug, Clone)]
pub struct AddonDeployer {
    kubectl: PathBuf,
    server: String,
    token: Option<String>,
}

impl AddonDeployer {
    /// Use the `kubectl` found on `PATH`
    pub fn new(server: impl Into<String>, token: Option<String>) -> Result<Self> {
        let kubectl = which::which("kubectl")
            .map_err(|e| KmachineError::config(format!("kubectl not found on PATH: {}", e)))?;
        Ok(Self::with_kubectl(kubectl, server, token))
    }

    pub fn with_kubectl(kubectl: PathBuf, server: impl Into<String>, token: Option<String>) -> Self {
        Self {
            kubectl,
            server: server.into(),
            token,
        }
    }

    /// kubectl arguments for creating objects from stdin
    pub fn create_args(&self) -> Vec<String> {
        let mut args = vec![
            format!("--server={}", self.server),
            "--insecure-skip-tls-verify=true".to_string(),
        ];
        if let Some(token) = &self.token {
            args.push(format!("--token={}", token));
        }
        args.extend(["create", "-f", "-"].map(String::from));
        args
    }

    /// Pipe the addon's manifest to `kubectl create -f -`
    pub async fn deploy(&self, kind: AddonKind) -> Result<()> {
        info!("Deploying {} addon using host: {}", kind, self.server);
        debug!("Running {}", self.kubectl.display());

        let mut child = Command::new(&self.kubectl)
            .args(self.create_args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            let written = async {
                stdin.write_all(kind.manifest().as_bytes()).await?;
                stdin.shutdown().await
            }
            .await;
            // kubectl may exit before reading; its exit status tells the story
            if let Err(e) = written {
                if e.kind() != std::io::ErrorKind::BrokenPipe {
                    return Err(e.into());
                }
                debug!("kubectl closed stdin early: {}", e);
            }
        }

        let output = child.wait_with_output().await?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            error!("kubectl failed with exit code {:?}", output.status.code());
            return Err(KmachineError::remote_command(
                format!("kubectl create -f - ({})", kind),
                output.status.code(),
                if stderr.trim().is_empty() { stdout } else { stderr },
            ));
        }

        for line in stdout.lines().filter(|l| !l.trim().is_empty()) {
            info!("{}", line);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifests_parse() {
        for kind in [AddonKind::Dns, AddonKind::Helm, AddonKind::Dashboard] {
            let docs: Vec<serde_yaml::Value> = serde_yaml::Deserializer::from_str(kind.manifest())
                .map(|doc| serde::Deserialize::deserialize(doc).unwrap())
                .collect();
            assert_eq!(docs[0]["kind"].as_str(), Some("Namespace"));
        }

        let dashboard = AddonKind::Dashboard.manifest();
        assert!(dashboard.contains("kind: ReplicationController"));
        assert!(dashboard.contains("kind: Service"));
    }

    #[test]
    fn test_create_args() {
        let deployer = AddonDeployer::with_kubectl(
            PathBuf::from("/usr/bin/kubectl"),
            "https://10.0.0.5:6443",
            Some("s3cr3t".to_string()),
        );
        assert_eq!(
            deployer.create_args(),
            vec![
                "--server=https://10.0.0.5:6443",
                "--insecure-skip-tls-verify=true",
                "--token=s3cr3t",
                "create",
                "-f",
                "-",
            ]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_deploy_reports_kubectl_failure() {
        let deployer = AddonDeployer::with_kubectl(PathBuf::from("false"), "https://10.0.0.5:6443", None);
        let err = deployer.deploy(AddonKind::Dns).await.unwrap_err();
        assert!(matches!(err, KmachineError::RemoteCommand { exit_code: Some(1), .. }));
    }
}
