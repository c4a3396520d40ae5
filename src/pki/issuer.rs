// file: src/pki/issuer.rs
// version: 1.0.0
// guid: c356da4c-81da-4650-945e-7eb49c61869f

//! Certificate issuance against the local CA

use crate::error::KmachineError;
use crate::Result;
use rcgen::{
    string::Ia5String, CertificateParams, DistinguishedName, DnType, DnValue,
    ExtendedKeyUsagePurpose, IsCa, Issuer, KeyPair, KeyUsagePurpose, RsaKeySize, SanType,
};
use std::fs;
use std::net::IpAddr;
use std::path::Path;
use tracing::{debug, info};

/// Validity period for issued control plane certificates
pub const CERT_VALIDITY_DAYS: i64 = 1095;

/// Everything the PKI primitive needs to issue one certificate/key pair
#[derive(Debug, Clone)]
pub struct IssueRequest<'a> {
    pub subject_alt_names: &'a [String],
    pub cert_path: &'a Path,
    pub key_path: &'a Path,
    pub ca_cert_path: &'a Path,
    pub ca_key_path: &'a Path,
    pub organization: &'a str,
    pub key_bits: u32,
}

/// PKI primitive: issues a CA-signed certificate and writes cert and key as PEM
pub trait CertificateIssuer {
    fn issue(&self, request: &IssueRequest<'_>) -> Result<()>;
}

/// Issuer backed by `rcgen`, producing RSA keys signed with SHA-256
#[derive(Debug, Default, Clone, Copy)]
pub struct RcgenIssuer;

impl RcgenIssuer {
    pub fn new() -> Self {
        Self
    }

    fn rsa_key_size(bits: u32) -> Result<RsaKeySize> {
        match bits {
            2048 => Ok(RsaKeySize::_2048),
            3072 => Ok(RsaKeySize::_3072),
            4096 => Ok(RsaKeySize::_4096),
            other => Err(KmachineError::invalid_argument(format!(
                "unsupported RSA key size {} (expected 2048, 3072 or 4096)",
                other
            ))),
        }
    }

    fn generate_key(size: RsaKeySize) -> Result<KeyPair> {
        KeyPair::generate_rsa_for(&rcgen::PKCS_RSA_SHA256, size)
            .map_err(|e| KmachineError::config(format!("failed to generate key: {}", e)))
    }

    fn san_entries(names: &[String]) -> Result<Vec<SanType>> {
        names
            .iter()
            .filter(|name| !name.is_empty())
            .map(|name| {
                if let Ok(ip) = name.parse::<IpAddr>() {
                    Ok(SanType::IpAddress(ip))
                } else {
                    Ia5String::try_from(name.to_string())
                        .map(SanType::DnsName)
                        .map_err(|e| {
                            KmachineError::config(format!("invalid DNS name '{}': {}", name, e))
                        })
                }
            })
            .collect()
    }
}

impl CertificateIssuer for RcgenIssuer {
    fn issue(&self, request: &IssueRequest<'_>) -> Result<()> {
        debug!(
            "Issuing certificate org={} sans={:?} ca={}",
            request.organization,
            request.subject_alt_names,
            request.ca_cert_path.display()
        );

        let key_size = Self::rsa_key_size(request.key_bits)?;

        let ca_cert_pem = fs::read_to_string(request.ca_cert_path)?;
        let ca_key_pem = fs::read_to_string(request.ca_key_path)?;

        let ca_key = KeyPair::from_pem(&ca_key_pem)
            .map_err(|e| KmachineError::config(format!("failed to parse CA key: {}", e)))?;
        let issuer = Issuer::from_ca_cert_pem(&ca_cert_pem, &ca_key)
            .map_err(|e| KmachineError::config(format!("failed to load CA certificate: {}", e)))?;

        let mut params = CertificateParams::default();

        let mut dn = DistinguishedName::new();
        dn.push(
            DnType::CommonName,
            DnValue::Utf8String(request.organization.to_string()),
        );
        dn.push(
            DnType::OrganizationName,
            DnValue::Utf8String(request.organization.to_string()),
        );
        params.distinguished_name = dn;

        params.is_ca = IsCa::NoCa;
        params.key_usages = vec![
            KeyUsagePurpose::DigitalSignature,
            KeyUsagePurpose::KeyEncipherment,
        ];
        params.extended_key_usages = vec![
            ExtendedKeyUsagePurpose::ServerAuth,
            ExtendedKeyUsagePurpose::ClientAuth,
        ];

        let now = time::OffsetDateTime::now_utc();
        params.not_before = now;
        params.not_after = now + time::Duration::days(CERT_VALIDITY_DAYS);

        params.subject_alt_names = Self::san_entries(request.subject_alt_names)?;

        let key = Self::generate_key(key_size)?;
        let cert = params
            .signed_by(&key, &issuer)
            .map_err(|e| KmachineError::config(format!("failed to sign certificate: {}", e)))?;

        if let Some(parent) = request.cert_path.parent() {
            fs::create_dir_all(parent)?;
        }
        if let Some(parent) = request.key_path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(request.cert_path, cert.pem())?;
        fs::write(request.key_path, key.serialize_pem())?;
        restrict_permissions(request.key_path)?;

        info!(
            "Issued certificate {} for {}",
            request.cert_path.display(),
            request.organization
        );
        Ok(())
    }
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
