// file: src/provision/transfer.rs
// version: 1.0.0
// guid: 5b0e7f7e-3f42-4d0c-9a0e-27c5f7c1a6d3

//! Shell command builders for moving content onto the remote host

/// Heredoc terminator used for every file write
pub const HEREDOC_MARKER: &str = "KMACHINE_EOF";

/// Write `content` to `remote_path` as root through a quoted heredoc
///
/// The quoted marker keeps the remote shell from expanding `$` or
/// backticks inside certificates, keys and scripts.
pub fn write_file_command(remote_path: &str, content: &str) -> String {
    let body = content.strip_suffix('\n').unwrap_or(content);
    format!(
        "sudo tee {} > /dev/null << '{marker}'\n{}\n{marker}",
        remote_path,
        body,
        marker = HEREDOC_MARKER
    )
}

pub fn mkdir_command(remote_dir: &str) -> String {
    format!("sudo mkdir -p {}", remote_dir)
}

/// Restrict a private key to owner read-only
pub fn harden_key_command(remote_path: &str) -> String {
    format!("sudo chmod 0400 {}", remote_path)
}

pub fn make_executable_command(remote_path: &str) -> String {
    format!("sudo chmod +x {}", remote_path)
}

/// Idempotent symlink creation
pub fn symlink_command(target: &str, link: &str) -> String {
    format!("sudo ln -sf {} {}", target, link)
}
