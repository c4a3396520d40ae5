// file: src/shellenv/mod.rs
// version: 1.0.0
// guid: 8f2a4c6e-1b3d-4f5a-9c7e-0d2f4a6b8c1e

//! Shell environment directives pointing a client shell at a machine
//!
//! Output goes to stdout and is meant to be evaluated by the user's shell,
//! so nothing here logs to stdout.

use crate::machine::api_server_url;
use crate::template::TemplateRenderer;
use crate::Result;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

const DIRECTIVES_TEMPLATE: &str = "{% for stmt in statements %}{{ stmt }}{{ suffix2 }}{% endfor %}\
{% for var in vars %}{{ prefix }}{{ var.name }}{{ delimiter }}{{ var.value }}{{ suffix }}{% endfor %}\
{{ usage_hint }}";

/// Shell syntax family the directives are written for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShellDialect {
    #[default]
    Posix,
    Fish,
    PowerShell,
    Cmd,
}

impl FromStr for ShellDialect {
    type Err = std::convert::Infallible;

    /// Unknown names fall back to POSIX syntax
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "fish" => ShellDialect::Fish,
            "powershell" | "pwsh" => ShellDialect::PowerShell,
            "cmd" => ShellDialect::Cmd,
            _ => ShellDialect::Posix,
        })
    }
}

impl fmt::Display for ShellDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShellDialect::Posix => "posix",
            ShellDialect::Fish => "fish",
            ShellDialect::PowerShell => "powershell",
            ShellDialect::Cmd => "cmd",
        })
    }
}

impl ShellDialect {
    /// Dialect of the shell named by a `$SHELL` style value
    pub fn from_shell_path(shell: &str) -> Self {
        let name = Path::new(shell)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default();
        name.parse().unwrap_or_default()
    }

    /// Detect from the invoking environment
    pub fn detect<F: Fn(&str) -> Option<String>>(env: F) -> Self {
        env("SHELL")
            .map(|shell| Self::from_shell_path(&shell))
            .unwrap_or_default()
    }

    /// Immutable syntax table for this dialect and mode
    pub fn syntax(&self, mode: EnvMode) -> DialectSyntax {
        match (mode, self) {
            (EnvMode::Set, ShellDialect::Posix) => DialectSyntax::new("export ", "=\"", "\"\n", "\n"),
            (EnvMode::Set, ShellDialect::Fish) => DialectSyntax::new("set -x ", " \"", "\";\n", ";\n"),
            (EnvMode::Set, ShellDialect::PowerShell) => DialectSyntax::new("$Env:", " = \"", "\"\n", "\n"),
            (EnvMode::Set, ShellDialect::Cmd) => DialectSyntax::new("SET ", "=", "\n", "\n"),
            (EnvMode::Unset, ShellDialect::Posix) => DialectSyntax::new("unset ", "", "\n", "\n"),
            (EnvMode::Unset, ShellDialect::Fish) => DialectSyntax::new("set -e ", "", ";\n", ";\n"),
            (EnvMode::Unset, ShellDialect::PowerShell) => {
                DialectSyntax::new("Remove-Item Env:\\", "", "\n", "\n")
            }
            // cmd cannot unset; assigning nothing empties the variable
            (EnvMode::Unset, ShellDialect::Cmd) => DialectSyntax::new("SET ", "=", "\n", "\n"),
        }
    }

    /// Comment marker and evaluation idiom for the usage hint
    pub fn usage_hint(&self, command_line: &str) -> String {
        let (comment, cmd) = match self {
            ShellDialect::Posix => ("#", format!("eval \"$({})\"", command_line)),
            ShellDialect::Fish => ("#", format!("eval ({})", command_line)),
            ShellDialect::PowerShell => ("#", format!("{} | Invoke-Expression", command_line)),
            ShellDialect::Cmd => (
                "REM",
                format!("\tFOR /f \"tokens=*\" %i IN ('{}') DO %i", command_line),
            ),
        };
        format!(
            "{} Run this command to configure your shell: \n{} {}\n",
            comment, comment, cmd
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvMode {
    Set,
    Unset,
}

/// String fragments a dialect wraps around each directive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DialectSyntax {
    pub prefix: &'static str,
    pub delimiter: &'static str,
    pub suffix: &'static str,
    /// Terminator for plain statements (the `kubectl config` lines)
    pub suffix2: &'static str,
}

impl DialectSyntax {
    const fn new(
        prefix: &'static str,
        delimiter: &'static str,
        suffix: &'static str,
        suffix2: &'static str,
    ) -> Self {
        Self {
            prefix,
            delimiter,
            suffix,
            suffix2,
        }
    }
}

/// Add `ip` to a comma-separated proxy exclusion list
///
/// Already-present addresses (by substring) leave the list unchanged.
pub fn merge_no_proxy(existing: &str, ip: &str) -> String {
    if existing.is_empty() {
        ip.to_string()
    } else if existing.contains(ip) {
        existing.to_string()
    } else {
        format!("{},{}", existing, ip)
    }
}

/// Pick the exclusion variable and its merged value
///
/// The lowercase `no_proxy` wins when it is set and non-empty.
pub fn no_proxy_entry<F: Fn(&str) -> Option<String>>(env: &F, ip: &str) -> (&'static str, String) {
    let (name, existing) = match env("no_proxy").filter(|v| !v.is_empty()) {
        Some(value) => ("no_proxy", value),
        None => ("NO_PROXY", env("NO_PROXY").unwrap_or_default()),
    };
    (name, merge_no_proxy(&existing, ip))
}

/// Inputs for one directive block
#[derive(Debug, Clone)]
pub struct DirectiveRequest<'a> {
    pub machine_name: &'a str,
    pub machine_ip: &'a str,
    /// Docker endpoint, e.g. `tcp://10.0.0.5:2376`
    pub docker_host: &'a str,
    /// Client certificate directory for the machine
    pub cert_path: &'a Path,
    /// API token; enables the `kubectl config` statements in set mode
    pub token: Option<&'a str>,
    pub dialect: ShellDialect,
    pub mode: EnvMode,
    pub no_proxy: bool,
    /// How the user invoked us, echoed in the usage hint
    pub command_line: &'a str,
}

#[derive(Debug, Serialize)]
struct EnvVar {
    name: &'static str,
    value: String,
}

#[derive(Debug, Serialize)]
struct DirectiveParams {
    prefix: &'static str,
    delimiter: &'static str,
    suffix: &'static str,
    suffix2: &'static str,
    statements: Vec<String>,
    vars: Vec<EnvVar>,
    usage_hint: String,
}

/// Render the directive block for `request`, reading proxy settings via `env`
pub fn generate_directives<F: Fn(&str) -> Option<String>>(
    renderer: &TemplateRenderer,
    request: &DirectiveRequest<'_>,
    env: F,
) -> Result<String> {
    let syntax = request.dialect.syntax(request.mode);

    let mut vars = vec![
        EnvVar {
            name: "DOCKER_TLS_VERIFY",
            value: "1".to_string(),
        },
        EnvVar {
            name: "DOCKER_HOST",
            value: request.docker_host.to_string(),
        },
        EnvVar {
            name: "DOCKER_CERT_PATH",
            value: request.cert_path.display().to_string(),
        },
        EnvVar {
            name: "DOCKER_MACHINE_NAME",
            value: request.machine_name.to_string(),
        },
    ];
    if request.no_proxy {
        let (name, value) = no_proxy_entry(&env, request.machine_ip);
        vars.push(EnvVar { name, value });
    }

    let mut statements = Vec::new();
    match request.mode {
        EnvMode::Set => {
            if let Some(token) = request.token {
                statements = kubectl_statements(&api_server_url(request.docker_host)?, token);
            }
        }
        EnvMode::Unset => {
            for var in &mut vars {
                var.value.clear();
            }
        }
    }

    let params = DirectiveParams {
        prefix: syntax.prefix,
        delimiter: syntax.delimiter,
        suffix: syntax.suffix,
        suffix2: syntax.suffix2,
        statements,
        vars,
        usage_hint: request.dialect.usage_hint(request.command_line),
    };
    renderer.render("env", DIRECTIVES_TEMPLATE, &params)
}

fn kubectl_statements(server: &str, token: &str) -> Vec<String> {
    vec![
        format!(
            "kubectl config set-cluster kmachine --server={} --insecure-skip-tls-verify=true",
            server
        ),
        format!("kubectl config set-credentials kuser --token={}", token),
        "kubectl config set-context kmachine --user=kuser --cluster=kmachine".to_string(),
        "kubectl config use-context kmachine".to_string(),
    ]
}
