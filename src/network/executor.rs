// file: src/network/executor.rs
// version: 2.0.0
// guid: exec0001-2345-6789-abcd-ef0123456789

//! Command execution trait for the remote command channel

use crate::Result;

/// Trait for executing shell commands on the target machine
///
/// Implementations deliver a command string and report its output; a
/// nonzero exit status must come back as `KmachineError::RemoteCommand`
/// carrying the captured output. Commands are observed by the host in the
/// order they are issued.
#[async_trait::async_trait]
pub trait CommandExecutor: Send {
    /// Connect to target
    async fn connect(&mut self, host: &str, username: &str) -> Result<()>;

    /// Execute command
    async fn execute(&mut self, command: &str) -> Result<()>;

    /// Execute command and return output
    async fn execute_with_output(&mut self, command: &str) -> Result<String>;

    /// Disconnect
    fn disconnect(&mut self);
}

#[async_trait::async_trait]
impl CommandExecutor for crate::network::SshClient {
    async fn connect(&mut self, host: &str, username: &str) -> Result<()> {
        self.connect(host, username).await
    }

    async fn execute(&mut self, command: &str) -> Result<()> {
        self.execute(command).await
    }

    async fn execute_with_output(&mut self, command: &str) -> Result<String> {
        self.execute_with_output(command).await
    }

    fn disconnect(&mut self) {
        self.disconnect()
    }
}
