// file: src/pki/mod.rs
// version: 1.0.0
// guid: 3059566e-96c4-439c-b80f-30d3b0a91c4c

//! Control plane PKI: which certificates a machine needs and how they are issued

pub mod issuer;
pub mod plan;

pub use issuer::{CertificateIssuer, IssueRequest, RcgenIssuer};
pub use plan::{CertRole, CertificatePlan, CertificateSpec};
