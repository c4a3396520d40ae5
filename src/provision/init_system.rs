// file: src/provision/init_system.rs
// version: 1.0.0
// guid: 9d3f4b65-6a0e-4f6c-8b8e-2a61f4e0c2d7

//! Remote init system detection and kubelet service control

use super::transfer::{mkdir_command, symlink_command};
use crate::artifacts::{SYSV_SCRIPT_PATH, SYSV_SERVICE_NAME};
use crate::network::CommandExecutor;
use crate::Result;
use std::fmt;
use tracing::{debug, info};

/// Probe command: `/sbin/init` is a symlink into systemd on systemd hosts
pub const PROBE_COMMAND: &str = "readlink /sbin/init";

/// The service supervisor running on the remote host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitSystemKind {
    Systemd,
    SysV,
}

impl fmt::Display for InitSystemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitSystemKind::Systemd => f.write_str("systemd"),
            InitSystemKind::SysV => f.write_str("sysv"),
        }
    }
}

impl InitSystemKind {
    /// Classify the result of [`PROBE_COMMAND`]
    ///
    /// A failed read means `/sbin/init` is not a symlink, which is the SysV case.
    pub fn from_probe(result: &Result<String>) -> Self {
        match result {
            Ok(output) if output.trim().ends_with("systemd") => InitSystemKind::Systemd,
            _ => InitSystemKind::SysV,
        }
    }

    /// Run the probe over `executor`
    pub async fn detect<E: CommandExecutor + ?Sized>(executor: &mut E) -> Self {
        let result = executor.execute_with_output(PROBE_COMMAND).await;
        if let Err(e) = &result {
            debug!("Init probe failed, assuming sysv: {}", e);
        }
        let kind = Self::from_probe(&result);
        info!("Detected init system: {}", kind);
        kind
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceAction {
    Enable,
    Start,
    Stop,
}

impl ServiceAction {
    fn verb(&self) -> &'static str {
        match self {
            ServiceAction::Enable => "enable",
            ServiceAction::Start => "start",
            ServiceAction::Stop => "stop",
        }
    }
}

impl fmt::Display for ServiceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// Run-level links installed for the SysV script
pub const SYSV_LINKS: [&str; 3] = [
    "/usr/local/etc/init.d/kubelet",
    "/etc/rc3.d/S04kubelet",
    "/etc/rc6.d/K01kubelet",
];

/// Maps service actions to init-system specific commands
#[derive(Debug, Clone, Copy)]
pub struct ServiceManager {
    kind: InitSystemKind,
    service: &'static str,
}

impl ServiceManager {
    pub fn new(kind: InitSystemKind) -> Self {
        Self {
            kind,
            service: SYSV_SERVICE_NAME,
        }
    }

    pub fn kind(&self) -> InitSystemKind {
        self.kind
    }

    /// Commands, in order, that perform `action`
    pub fn commands(&self, action: ServiceAction) -> Vec<String> {
        match (self.kind, action) {
            (InitSystemKind::Systemd, ServiceAction::Enable) => vec![format!(
                "sudo systemctl daemon-reload && sudo systemctl -f enable {}",
                self.service
            )],
            (InitSystemKind::Systemd, action) => {
                vec![format!("sudo systemctl -f {} {}", action.verb(), self.service)]
            }
            (InitSystemKind::SysV, ServiceAction::Enable) => {
                let mut cmds = vec![mkdir_command("/usr/local/etc/init.d")];
                cmds.extend(
                    SYSV_LINKS
                        .iter()
                        .map(|link| symlink_command(SYSV_SCRIPT_PATH, link)),
                );
                cmds
            }
            (InitSystemKind::SysV, action) => {
                vec![format!("sudo /bin/sh {} {}", SYSV_SCRIPT_PATH, action.verb())]
            }
        }
    }

    /// Perform `action`, stopping at the first failing command
    pub async fn run<E: CommandExecutor + ?Sized>(
        &self,
        executor: &mut E,
        action: ServiceAction,
    ) -> Result<()> {
        info!("Service {}: {} ({})", self.service, action, self.kind);
        for cmd in self.commands(action) {
            debug!("Executing: {}", cmd);
            executor.execute(&cmd).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KmachineError;

    #[test]
    fn test_probe_systemd() {
        let out = Ok("/lib/systemd/systemd\n".to_string());
        assert_eq!(InitSystemKind::from_probe(&out), InitSystemKind::Systemd);
    }

    #[test]
    fn test_probe_other_target_is_sysv() {
        let out = Ok("/sbin/upstart".to_string());
        assert_eq!(InitSystemKind::from_probe(&out), InitSystemKind::SysV);
    }

    #[test]
    fn test_probe_failure_is_sysv() {
        let out = Err(KmachineError::remote_command(PROBE_COMMAND, Some(1), ""));
        assert_eq!(InitSystemKind::from_probe(&out), InitSystemKind::SysV);
    }

    #[test]
    fn test_systemd_commands() {
        let mgr = ServiceManager::new(InitSystemKind::Systemd);
        assert_eq!(
            mgr.commands(ServiceAction::Enable),
            vec!["sudo systemctl daemon-reload && sudo systemctl -f enable kubelet"]
        );
        assert_eq!(
            mgr.commands(ServiceAction::Start),
            vec!["sudo systemctl -f start kubelet"]
        );
    }

    #[test]
    fn test_sysv_commands() {
        let mgr = ServiceManager::new(InitSystemKind::SysV);
        assert_eq!(
            mgr.commands(ServiceAction::Stop),
            vec!["sudo /bin/sh /etc/init.d/kubelet stop"]
        );

        let enable = mgr.commands(ServiceAction::Enable);
        assert_eq!(enable[0], "sudo mkdir -p /usr/local/etc/init.d");
        assert_eq!(enable.len(), 4);
        assert!(enable[1..].iter().all(|c| c.starts_with("sudo ln -sf /etc/init.d/kubelet ")));
        assert!(enable.iter().any(|c| c.ends_with("/etc/rc3.d/S04kubelet")));
        assert!(enable.iter().any(|c| c.ends_with("/etc/rc6.d/K01kubelet")));
    }
}
