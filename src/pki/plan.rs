// file: src/pki/plan.rs
// version: 1.0.0
// guid: a8203c61-a0ad-4902-b67f-b07b5b188b53

//! Certificate plan: the three control plane certificate/key pairs

use super::issuer::{CertificateIssuer, IssueRequest};
use crate::error::KmachineError;
use crate::provision::ProvisioningContext;
use crate::Result;
use std::fmt;
use std::path::PathBuf;
use tracing::{error, info};

/// Key size requested for every control plane certificate
pub const KEY_BITS: u32 = 2048;

/// Which control plane identity a certificate belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CertRole {
    Api,
    Admin,
    Proxy,
}

impl CertRole {
    /// Issue order
    pub const ALL: [CertRole; 3] = [CertRole::Api, CertRole::Admin, CertRole::Proxy];

    pub fn as_str(&self) -> &'static str {
        match self {
            CertRole::Api => "api",
            CertRole::Admin => "admin",
            CertRole::Proxy => "proxy",
        }
    }

    /// Subdirectory of the remote certificate directory holding this pair
    pub fn remote_subdir(&self) -> &'static str {
        match self {
            CertRole::Api => "apiserver",
            CertRole::Admin => "kubelet",
            CertRole::Proxy => "proxyserver",
        }
    }
}

impl fmt::Display for CertRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Organization string for a machine's certificate of `role`
pub fn organization(machine_name: &str, role: CertRole) -> String {
    format!("{}-{}", machine_name, role.as_str())
}

/// One certificate/key pair to issue, with its role carried alongside
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateSpec {
    pub role: CertRole,
    pub subject_alt_names: Vec<String>,
    pub organization: String,
    /// Local path the issued certificate is written to
    pub cert_path: PathBuf,
    /// Local path the issued private key is written to
    pub key_path: PathBuf,
}

impl CertificateSpec {
    /// Remote directory the pair is transferred into
    pub fn remote_dir(&self, cert_dir: &str) -> String {
        format!("{}/{}", cert_dir, self.role.remote_subdir())
    }

    pub fn remote_cert_path(&self, cert_dir: &str) -> String {
        format!("{}/cert.pem", self.remote_dir(cert_dir))
    }

    pub fn remote_key_path(&self, cert_dir: &str) -> String {
        format!("{}/key.pem", self.remote_dir(cert_dir))
    }
}

/// The fixed set of certificates a control plane needs
#[derive(Debug, Clone)]
pub struct CertificatePlan {
    specs: Vec<CertificateSpec>,
}

impl CertificatePlan {
    /// Derive the plan from the provisioning context
    ///
    /// The API server certificate covers the host IP, the service network
    /// gateway and `localhost`. The admin and proxy certificates carry no
    /// SAN constraint.
    pub fn new(ctx: &ProvisioningContext) -> Self {
        let specs = CertRole::ALL
            .iter()
            .map(|&role| {
                let subject_alt_names = match role {
                    CertRole::Api => vec![
                        ctx.machine_ip.clone(),
                        ctx.service_gateway.clone(),
                        "localhost".to_string(),
                    ],
                    CertRole::Admin | CertRole::Proxy => Vec::new(),
                };
                let base = organization(&ctx.machine_name, role);
                CertificateSpec {
                    role,
                    subject_alt_names,
                    cert_path: ctx.local_cert_dir.join(format!("{}-cert.pem", base)),
                    key_path: ctx.local_cert_dir.join(format!("{}-key.pem", base)),
                    organization: base,
                }
            })
            .collect();

        Self { specs }
    }

    pub fn specs(&self) -> &[CertificateSpec] {
        &self.specs
    }

    pub fn get(&self, role: CertRole) -> Option<&CertificateSpec> {
        self.specs.iter().find(|spec| spec.role == role)
    }

    /// Issue every pair, stopping at the first failure
    pub fn issue_all(
        &self,
        issuer: &dyn CertificateIssuer,
        ctx: &ProvisioningContext,
    ) -> Result<()> {
        for spec in &self.specs {
            info!("Generating {} certificate ({})", spec.role, spec.organization);
            issuer
                .issue(&IssueRequest {
                    subject_alt_names: &spec.subject_alt_names,
                    cert_path: &spec.cert_path,
                    key_path: &spec.key_path,
                    ca_cert_path: &ctx.ca_cert_path,
                    ca_key_path: &ctx.ca_key_path,
                    organization: &spec.organization,
                    key_bits: KEY_BITS,
                })
                .map_err(|e| {
                    error!("Failed to generate {} certificate: {}", spec.role, e);
                    KmachineError::certificate(spec.role.as_str(), e.to_string())
                })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provision::context::tests::test_context;
    use std::cell::RefCell;
    use std::collections::HashSet;

    struct RecordingIssuer {
        issued: RefCell<Vec<String>>,
        fail_on: Option<&'static str>,
    }

    impl CertificateIssuer for RecordingIssuer {
        fn issue(&self, request: &IssueRequest<'_>) -> Result<()> {
            if self
                .fail_on
                .is_some_and(|org| request.organization.ends_with(org))
            {
                return Err(KmachineError::config("CA key is encrypted"));
            }
            self.issued
                .borrow_mut()
                .push(request.organization.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_plan_has_three_roles() {
        let ctx = test_context();
        let plan = CertificatePlan::new(&ctx);

        let roles: HashSet<CertRole> = plan.specs().iter().map(|s| s.role).collect();
        assert_eq!(plan.specs().len(), 3);
        assert_eq!(roles.len(), 3);
        assert!(roles.contains(&CertRole::Api));
        assert!(roles.contains(&CertRole::Admin));
        assert!(roles.contains(&CertRole::Proxy));
    }

    #[test]
    fn test_organizations_are_distinct() {
        let ctx = test_context();
        let plan = CertificatePlan::new(&ctx);

        let orgs: HashSet<&str> = plan.specs().iter().map(|s| s.organization.as_str()).collect();
        assert_eq!(orgs.len(), 3);
        assert!(orgs.contains("node1-api"));
        assert!(orgs.contains("node1-admin"));
        assert!(orgs.contains("node1-proxy"));
    }

    #[test]
    fn test_subject_alt_names() {
        let ctx = test_context();
        let plan = CertificatePlan::new(&ctx);

        assert_eq!(
            plan.get(CertRole::Api).unwrap().subject_alt_names,
            vec!["10.0.0.5", "10.0.0.1", "localhost"]
        );
        assert!(plan.get(CertRole::Admin).unwrap().subject_alt_names.is_empty());
        assert!(plan.get(CertRole::Proxy).unwrap().subject_alt_names.is_empty());
    }

    #[test]
    fn test_api_sans_follow_service_network() {
        let mut ctx = test_context();
        ctx.service_cluster_ip_range = "10.96.0.0/12".to_string();
        ctx.service_gateway = "10.96.0.1".to_string();
        let plan = CertificatePlan::new(&ctx);

        assert_eq!(
            plan.get(CertRole::Api).unwrap().subject_alt_names,
            vec!["10.0.0.5", "10.96.0.1", "localhost"]
        );
    }

    #[test]
    fn test_plan_is_deterministic() {
        let ctx = test_context();
        assert_eq!(
            CertificatePlan::new(&ctx).specs(),
            CertificatePlan::new(&ctx).specs()
        );
    }

    #[test]
    fn test_remote_paths() {
        let ctx = test_context();
        let plan = CertificatePlan::new(&ctx);
        let api = plan.get(CertRole::Api).unwrap();
        let admin = plan.get(CertRole::Admin).unwrap();

        assert_eq!(
            api.remote_cert_path("/var/run/kubernetes"),
            "/var/run/kubernetes/apiserver/cert.pem"
        );
        assert_eq!(
            admin.remote_key_path("/var/run/kubernetes"),
            "/var/run/kubernetes/kubelet/key.pem"
        );
        assert!(api.cert_path.ends_with("node1-api-cert.pem"));
        assert!(api.key_path.ends_with("node1-api-key.pem"));
    }

    #[test]
    fn test_issue_all_stops_at_failing_role() {
        let ctx = test_context();
        let plan = CertificatePlan::new(&ctx);
        let issuer = RecordingIssuer {
            issued: RefCell::new(Vec::new()),
            fail_on: Some("admin"),
        };

        let err = plan.issue_all(&issuer, &ctx).unwrap_err();

        match err {
            KmachineError::Certificate { role, .. } => assert_eq!(role, "admin"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(*issuer.issued.borrow(), vec!["node1-api".to_string()]);
    }
}
