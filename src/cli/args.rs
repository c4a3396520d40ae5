// file: src/cli/args.rs
// version: 2.0.0
// guid: f6a7b8c9-d0e1-4234-8567-89abcdef0123

//! Command line argument definitions

use crate::addons::AddonKind;
use crate::config::default_storage_path;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kmachine")]
#[command(about = "Bootstrap a single-node Kubernetes control plane over SSH")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Root directory for machine descriptions and issued certificates
    #[arg(short, long, global = true, env = "KMACHINE_STORAGE_PATH")]
    pub storage_path: Option<PathBuf>,
}

impl Cli {
    pub fn storage_path(&self) -> PathBuf {
        self.storage_path
            .clone()
            .unwrap_or_else(default_storage_path)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Install and start the Kubernetes control plane on a machine
    Provision {
        /// Machine name
        machine: String,
    },

    /// Print shell commands that point Docker and kubectl at a machine
    Env {
        /// Machine name
        machine: String,

        #[arg(long, help = "Shell dialect: posix, fish, powershell or cmd (default: from $SHELL)")]
        shell: Option<String>,

        #[arg(short, long, help = "Emit commands that unset the variables instead")]
        unset: bool,

        #[arg(long, help = "Add the machine IP to the no_proxy list")]
        no_proxy: bool,
    },

    /// Create a bundled addon on the machine's cluster
    Deploy {
        /// Machine name
        machine: String,

        #[arg(value_enum)]
        kind: AddonArg,
    },
}

/// Addon argument for CLI
#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum AddonArg {
    Dns,
    Helm,
    Dashboard,
}

impl From<AddonArg> for AddonKind {
    fn from(arg: AddonArg) -> Self {
        match arg {
            AddonArg::Dns => AddonKind::Dns,
            AddonArg::Helm => AddonKind::Helm,
            AddonArg::Dashboard => AddonKind::Dashboard,
        }
    }
}
