// file: src/artifacts/policy.rs
// version: 1.0.0
// guid: 6c0d2e9f-7b1a-4e38-8f4d-a5b6c7d8e9f0

//! ABAC access policy file

use super::{ArtifactKind, RenderedArtifact, POLICY_PATH};
use crate::error::KmachineError;
use crate::template::TemplateRenderer;
use crate::Result;
use serde::Serialize;

const POLICY_TEMPLATE: &str = include_str!("../../templates/policy.jsonl");

/// One line of the policy file
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Grant {
    pub user: &'static str,
    pub resource: &'static str,
    pub readonly: bool,
}

const fn grant(user: &'static str, resource: &'static str, readonly: bool) -> Grant {
    Grant {
        user,
        resource,
        readonly,
    }
}

/// Fixed grants for the built-in component identities
pub const GRANTS: [Grant; 9] = [
    grant("scheduler", "pods", true),
    grant("scheduler", "bindings", false),
    grant("proxy", "services", false),
    grant("proxy", "endpoints", false),
    grant("kubelet", "pods", false),
    grant("kubelet", "nodes", false),
    grant("kubelet", "services", true),
    grant("kubelet", "endpoints", true),
    grant("kubelet", "events", false),
];

#[derive(Debug, Serialize)]
struct PolicyParams<'a> {
    username: &'a str,
    grants: &'a [Grant],
}

/// Render the policy: full access for `username` plus [`GRANTS`]
pub fn render_policy(renderer: &TemplateRenderer, username: &str) -> Result<RenderedArtifact> {
    if username.is_empty() || username.contains(['"', '\\']) || username.contains(char::is_control) {
        return Err(KmachineError::invalid_argument(format!(
            "Policy username is not usable: {:?}",
            username
        )));
    }

    let params = PolicyParams {
        username,
        grants: &GRANTS,
    };
    let content = renderer.render("policy.jsonl", POLICY_TEMPLATE, &params)?;
    Ok(RenderedArtifact::new(
        ArtifactKind::AccessPolicy,
        content,
        POLICY_PATH,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_policy_lines_are_json() {
        let renderer = TemplateRenderer::new();
        let artifact = render_policy(&renderer, "admin").unwrap();

        assert_eq!(artifact.remote_path, "/etc/kubernetes/policies/policy.jsonl");

        let lines: Vec<Value> = artifact
            .content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 1 + GRANTS.len());
        assert_eq!(lines[0], serde_json::json!({"user": "admin"}));
    }

    #[test]
    fn test_policy_grant_table() {
        let renderer = TemplateRenderer::new();
        let artifact = render_policy(&renderer, "admin").unwrap();
        let lines: Vec<Value> = artifact
            .content
            .lines()
            .skip(1)
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(
            lines[0],
            serde_json::json!({"user": "scheduler", "readonly": true, "resource": "pods"})
        );
        assert_eq!(
            lines[1],
            serde_json::json!({"user": "scheduler", "resource": "bindings"})
        );
        assert!(lines
            .iter()
            .any(|l| l["user"] == "kubelet" && l["resource"] == "events" && l.get("readonly").is_none()));
        assert!(lines
            .iter()
            .any(|l| l["user"] == "kubelet" && l["resource"] == "endpoints" && l["readonly"] == true));
    }

    #[test]
    fn test_policy_rejects_quote_in_username() {
        let renderer = TemplateRenderer::new();
        let err = render_policy(&renderer, "ad\"min").unwrap_err();
        assert!(matches!(err, KmachineError::InvalidArgument(_)));
    }
}
