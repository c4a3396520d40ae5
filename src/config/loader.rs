// file: src/config/loader.rs
// version: 2.0.0
// guid: d4e5f6g7-h8i9-0123-4567-890123defghi

//! Machine file loading and environment variable substitution

use super::MachineConfig;
use crate::Result;
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Configuration loader with environment variable substitution
pub struct ConfigLoader {
    env_vars: HashMap<String, String>,
}

impl ConfigLoader {
    /// Create a new config loader
    pub fn new() -> Self {
        Self {
            env_vars: std::env::vars().collect(),
        }
    }

    /// Load a machine description from a YAML file
    pub fn load_machine_config<P: AsRef<Path>>(&self, path: P) -> Result<MachineConfig> {
        let content = fs::read_to_string(&path).map_err(|e| {
            crate::error::KmachineError::config(format!(
                "Failed to read machine file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        let expanded = self.expand_env_vars(&content)?;
        let config: MachineConfig = serde_yaml::from_str(&expanded)?;

        config.validate()?;

        Ok(config)
    }

    /// Load the machine called `name` from a storage directory
    pub fn load_machine(&self, storage: &Path, name: &str) -> Result<MachineConfig> {
        let path = super::machine_config_path(storage, name);
        if !path.exists() {
            return Err(crate::error::KmachineError::invalid_argument(format!(
                "Unknown machine {} (no {})",
                name,
                path.display()
            )));
        }

        let config = self.load_machine_config(&path)?;
        if config.name != name {
            return Err(crate::error::KmachineError::config(format!(
                "Machine file {} describes {}, expected {}",
                path.display(),
                config.name,
                name
            )));
        }

        Ok(config)
    }

    /// Expand `${VAR}` references in configuration content
    fn expand_env_vars(&self, content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| {
            crate::error::KmachineError::config(format!("Invalid regex pattern: {}", e))
        })?;

        let mut result = content.to_string();
        let mut missing_vars = Vec::new();

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let placeholder = &cap[0];

            if let Some(value) = self.env_vars.get(var_name) {
                result = result.replace(placeholder, value);
            } else if !missing_vars.iter().any(|v| v == var_name) {
                missing_vars.push(var_name.to_string());
            }
        }

        if !missing_vars.is_empty() {
            return Err(crate::error::KmachineError::config(format!(
                "Missing environment variables: {}",
                missing_vars.join(", ")
            )));
        }

        Ok(result)
    }

    /// Set environment variable for substitution
    pub fn set_env_var(&mut self, key: String, value: String) {
        self.env_vars.insert(key, value);
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    const MACHINE_YAML: &str = r#"
name: node1
ip: 10.0.0.5
ssh:
  user: core
auth:
  ca_cert_path: ${KMACHINE_TEST_CA_DIR}/ca.pem
  ca_key_path: ${KMACHINE_TEST_CA_DIR}/ca-key.pem
kubernetes:
  version: 1.2.0
  token: abc123
"#;

    #[test]
    fn test_env_var_expansion() {
        let mut loader = ConfigLoader::new();
        loader.set_env_var("TEST_VAR".to_string(), "test_value".to_string());

        let content = "key: ${TEST_VAR}";
        let result = loader.expand_env_vars(content).unwrap();
        assert_eq!(result, "key: test_value");
    }

    #[test]
    fn test_missing_env_var() {
        let loader = ConfigLoader::new();
        let content = "key: ${KMACHINE_SURELY_MISSING_VAR}";

        let result = loader.expand_env_vars(content);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Missing environment variables"));
    }

    #[test]
    fn test_load_machine_config() -> Result<()> {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", MACHINE_YAML).unwrap();

        let mut loader = ConfigLoader::new();
        loader.set_env_var("KMACHINE_TEST_CA_DIR".to_string(), "/srv/ca".to_string());
        let config = loader.load_machine_config(file.path())?;

        assert_eq!(config.name, "node1");
        assert_eq!(config.ssh.user, "core");
        assert_eq!(config.auth.ca_cert_path, Path::new("/srv/ca/ca.pem"));
        assert_eq!(config.kubernetes.token.as_deref(), Some("abc123"));

        Ok(())
    }

    #[test]
    fn test_load_machine_from_storage() -> Result<()> {
        let storage = TempDir::new().unwrap();
        let dir = crate::config::machine_dir(storage.path(), "node1");
        fs::create_dir_all(&dir)?;
        fs::write(dir.join("config.yaml"), MACHINE_YAML)?;

        let mut loader = ConfigLoader::new();
        loader.set_env_var("KMACHINE_TEST_CA_DIR".to_string(), "/srv/ca".to_string());

        let config = loader.load_machine(storage.path(), "node1")?;
        assert_eq!(config.ip, "10.0.0.5");

        let unknown = loader.load_machine(storage.path(), "node2");
        assert!(matches!(
            unknown,
            Err(crate::error::KmachineError::InvalidArgument(_))
        ));

        Ok(())
    }

    #[test]
    fn test_invalid_machine_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            "name: node1\nip: not-an-ip\nauth:\n  ca_cert_path: /a\n  ca_key_path: /b\n"
        )
        .unwrap();

        let loader = ConfigLoader::new();
        assert!(loader.load_machine_config(file.path()).is_err());
    }
}
