// file: src/config/token.rs
// version: 1.0.0
// guid: 2c4e6a8b-0d1f-4a3c-8e5b-7d9f1b3c5e7a

//! Generated API tokens kept next to the machine file

use super::machine_token_path;
use crate::error::KmachineError;
use crate::Result;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Token saved by an earlier `provision`, if any
pub fn load_stored_token(storage: &Path, name: &str) -> Result<Option<String>> {
    let path = machine_token_path(storage, name);
    match fs::read_to_string(&path) {
        Ok(content) => {
            let token = content.trim();
            Ok((!token.is_empty()).then(|| token.to_string()))
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(KmachineError::config(format!(
            "Failed to read stored token {}: {}",
            path.display(),
            e
        ))),
    }
}

/// Save `token` readable by the owner only
pub fn store_token(storage: &Path, name: &str, token: &str) -> Result<()> {
    let path = machine_token_path(storage, name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, format!("{}\n", token))?;
    restrict_permissions(&path)
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_token_is_none() -> Result<()> {
        let storage = TempDir::new()?;
        assert_eq!(load_stored_token(storage.path(), "node1")?, None);
        Ok(())
    }

    #[test]
    fn test_store_then_load() -> Result<()> {
        let storage = TempDir::new()?;
        store_token(storage.path(), "node1", "s3cr3t")?;
        assert_eq!(
            load_stored_token(storage.path(), "node1")?,
            Some("s3cr3t".to_string())
        );
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn test_stored_token_is_owner_only() -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let storage = TempDir::new()?;
        store_token(storage.path(), "node1", "s3cr3t")?;
        let mode = fs::metadata(machine_token_path(storage.path(), "node1"))?
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
        Ok(())
    }
}
