// file: src/error.rs
// version: 3.0.0
// guid: 57b83a63-07b6-4534-aa6c-51e8797254e0

use thiserror::Error;

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, KmachineError>;

/// Error types for kmachine
#[derive(Error, Debug)]
pub enum KmachineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Machine error during {operation}: {message}")]
    Machine { operation: String, message: String },

    #[error("Error generating {role} certificate: {message}")]
    Certificate { role: String, message: String },

    #[error("SSH error: {0}")]
    Ssh(String),

    #[error("Remote command failed (exit code {exit_code:?}): {command}\n{output}")]
    RemoteCommand {
        command: String,
        exit_code: Option<i32>,
        output: String,
    },

    #[error("Template error in {name}: {message}")]
    Template { name: String, message: String },

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl KmachineError {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a new machine collaborator error
    pub fn machine(operation: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Machine {
            operation: operation.into(),
            message: msg.into(),
        }
    }

    /// Create a new certificate error attributed to a role
    pub fn certificate(role: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Certificate {
            role: role.into(),
            message: msg.into(),
        }
    }

    /// Create a new SSH transport error
    pub fn ssh(msg: impl Into<String>) -> Self {
        Self::Ssh(msg.into())
    }

    /// Create a new remote command error
    pub fn remote_command(
        command: impl Into<String>,
        exit_code: Option<i32>,
        output: impl Into<String>,
    ) -> Self {
        Self::RemoteCommand {
            command: command.into(),
            exit_code,
            output: output.into(),
        }
    }

    /// Create a new template error
    pub fn template(name: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Template {
            name: name.into(),
            message: msg.into(),
        }
    }

    /// Create a new timeout error
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// True when the error is the readiness-wait timeout rather than a command failure
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_command_error_carries_output() {
        let err = KmachineError::remote_command("sudo mkdir -p /x", Some(1), "permission denied");
        let text = err.to_string();
        assert!(text.contains("sudo mkdir -p /x"));
        assert!(text.contains("permission denied"));
        assert!(text.contains("Some(1)"));
    }

    #[test]
    fn test_certificate_error_names_role() {
        let err = KmachineError::certificate("admin", "CA key unreadable");
        assert_eq!(
            err.to_string(),
            "Error generating admin certificate: CA key unreadable"
        );
    }

    #[test]
    fn test_timeout_is_distinct() {
        assert!(KmachineError::timeout("apiserver").is_timeout());
        assert!(!KmachineError::config("bad").is_timeout());
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "ca.pem");
        let err: KmachineError = io.into();
        assert!(matches!(err, KmachineError::Io(_)));
    }
}
