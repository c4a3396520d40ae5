// file: src/network/ssh.rs
// version: 2.0.0
// guid: t0u1v2w3-x4y5-6789-0123-456789tuvwxy

//! SSH client implementing the remote command channel

use crate::error::KmachineError;
use crate::Result;
use ssh2::Session;
use std::io::Read;
use std::net::TcpStream;
use std::path::PathBuf;
use tracing::{debug, error, info};

/// SSH client for remote operations
pub struct SshClient {
    session: Option<Session>,
    host: String,
    port: u16,
    identity_file: Option<PathBuf>,
}

impl SshClient {
    /// Create a new SSH client for the default port, authenticating via the agent
    pub fn new() -> Self {
        Self {
            session: None,
            host: String::new(),
            port: 22,
            identity_file: None,
        }
    }

    /// Use a non-default SSH port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Authenticate with a private key file instead of the agent
    pub fn with_identity_file(mut self, identity_file: Option<PathBuf>) -> Self {
        self.identity_file = identity_file;
        self
    }

    /// Connect to remote host via SSH
    pub async fn connect(&mut self, host: &str, username: &str) -> Result<()> {
        info!("Connecting to {}:{} as {}", host, self.port, username);

        let tcp = TcpStream::connect(format!("{}:{}", host, self.port))
            .map_err(|e| KmachineError::ssh(format!("Failed to connect to {}: {}", host, e)))?;

        let mut session = Session::new()
            .map_err(|e| KmachineError::ssh(format!("Failed to create SSH session: {}", e)))?;

        session.set_tcp_stream(tcp);
        session
            .handshake()
            .map_err(|e| KmachineError::ssh(format!("SSH handshake failed: {}", e)))?;

        match &self.identity_file {
            Some(key) => {
                session
                    .userauth_pubkey_file(username, None, key, None)
                    .map_err(|e| {
                        KmachineError::ssh(format!(
                            "SSH key authentication with {} failed: {}",
                            key.display(),
                            e
                        ))
                    })?;
            }
            None => {
                if session.userauth_agent(username).is_err() {
                    return Err(KmachineError::ssh(
                        "SSH authentication failed - no valid key found in agent",
                    ));
                }
            }
        }

        if !session.authenticated() {
            return Err(KmachineError::ssh("SSH authentication failed"));
        }

        self.session = Some(session);
        self.host = host.to_string();

        info!("SSH connection established to {}", host);
        Ok(())
    }

    /// Run a command and collect exit status, stdout and stderr
    fn run(&mut self, command: &str) -> Result<(i32, String, String)> {
        let session = self
            .session
            .as_mut()
            .ok_or_else(|| KmachineError::ssh("No active SSH session"))?;

        let mut channel = session
            .channel_session()
            .map_err(|e| KmachineError::ssh(format!("Failed to create SSH channel: {}", e)))?;

        channel
            .exec(command)
            .map_err(|e| KmachineError::ssh(format!("Failed to execute command: {}", e)))?;

        let mut stdout = String::new();
        let mut stderr = String::new();

        channel
            .read_to_string(&mut stdout)
            .map_err(|e| KmachineError::ssh(format!("Failed to read stdout: {}", e)))?;
        channel
            .stderr()
            .read_to_string(&mut stderr)
            .map_err(|e| KmachineError::ssh(format!("Failed to read stderr: {}", e)))?;

        channel
            .wait_close()
            .map_err(|e| KmachineError::ssh(format!("Failed to close SSH channel: {}", e)))?;

        let exit_status = channel
            .exit_status()
            .map_err(|e| KmachineError::ssh(format!("Failed to get exit status: {}", e)))?;

        Ok((exit_status, stdout, stderr))
    }

    /// Execute command on remote host
    pub async fn execute(&mut self, command: &str) -> Result<()> {
        self.execute_with_output(command).await.map(|_| ())
    }

    /// Execute command and return output
    pub async fn execute_with_output(&mut self, command: &str) -> Result<String> {
        // Heredoc bodies carry key material; only the first line is logged
        debug!(
            "Executing command: {}",
            command.lines().next().unwrap_or_default()
        );

        let (exit_status, stdout, stderr) = self.run(command)?;

        if exit_status != 0 {
            error!("Command failed with exit code {}", exit_status);
            if !stdout.trim().is_empty() {
                error!("STDOUT: {}", stdout);
            }
            if !stderr.trim().is_empty() {
                error!("STDERR: {}", stderr);
            }
            return Err(KmachineError::remote_command(
                command,
                Some(exit_status),
                if stderr.is_empty() { stdout } else { stderr },
            ));
        }

        debug!("Command executed successfully: {} bytes of output", stdout.len());
        Ok(stdout)
    }

    /// Disconnect SSH session
    pub fn disconnect(&mut self) {
        if let Some(session) = self.session.take() {
            let _ = session.disconnect(None, "", None);
            info!("SSH session to {} disconnected", self.host);
        }
    }
}

impl Drop for SshClient {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl Default for SshClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_execute_without_session_fails() {
        let mut client = SshClient::new();
        let err = client.execute("true").await.unwrap_err();
        assert!(matches!(err, KmachineError::Ssh(_)));
    }

    #[test]
    fn test_builder_settings() {
        let client = SshClient::new()
            .with_port(2222)
            .with_identity_file(Some(PathBuf::from("/home/u/.ssh/id_ed25519")));
        assert_eq!(client.port, 2222);
        assert!(client.identity_file.is_some());
    }
}
