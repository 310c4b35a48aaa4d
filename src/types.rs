use rustls::pki_types::CertificateDer;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 443;
pub const DEFAULT_WORKERS: usize = 100;
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Issuer or subject attributes, flattened to string lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistinguishedName {
    #[serde(rename = "Country")]
    pub country: Vec<String>,
    #[serde(rename = "Organization")]
    pub organization: Vec<String>,
    #[serde(rename = "OrganizationalUnit")]
    pub organizational_unit: Vec<String>,
    #[serde(rename = "Locality")]
    pub locality: Vec<String>,
    #[serde(rename = "Province")]
    pub province: Vec<String>,
    #[serde(rename = "StreetAddress")]
    pub street_address: Vec<String>,
    #[serde(rename = "PostalCode")]
    pub postal_code: Vec<String>,
}

/// One certificate from a peer or verified chain.
///
/// URIs, IP range constraints and the excluded/email/URI name constraints
/// are not carried.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateRecord {
    #[serde(rename = "Signature")]
    pub signature: String,
    #[serde(rename = "SignatureAlgorithm")]
    pub signature_algorithm: String,
    #[serde(rename = "PublicKeyAlgorithm")]
    pub public_key_algorithm: String,
    #[serde(rename = "Version")]
    pub version: u32,
    #[serde(rename = "SerialNumber")]
    pub serial_number: String,
    #[serde(rename = "Issuer")]
    pub issuer: DistinguishedName,
    #[serde(rename = "Subject")]
    pub subject: DistinguishedName,
    #[serde(rename = "NotBefore")]
    pub not_before: String,
    #[serde(rename = "NotAfter")]
    pub not_after: String,
    #[serde(rename = "KeyUsage")]
    pub key_usage: u32,
    #[serde(rename = "OCSPServer")]
    pub ocsp_server: Vec<String>,
    #[serde(rename = "IssuingCertificateURL")]
    pub issuing_certificate_url: Vec<String>,
    #[serde(rename = "DNSNames")]
    pub dns_names: Vec<String>,
    #[serde(rename = "EmailAddresses")]
    pub email_addresses: Vec<String>,
    #[serde(rename = "IPAddresses")]
    pub ip_addresses: Vec<IpAddr>,
    #[serde(rename = "PermittedDNSDomainsCritical")]
    pub permitted_dns_domains_critical: bool,
    #[serde(rename = "PermittedDNSDomains")]
    pub permitted_dns_domains: Vec<String>,
    #[serde(rename = "BasicConstraintsValid")]
    pub basic_constraints_valid: bool,
    #[serde(rename = "IsCA")]
    pub is_ca: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Negotiated protocol version as its wire code (0x0303 for TLS 1.2).
    #[serde(rename = "Version")]
    pub version: u16,
    #[serde(rename = "ServerName")]
    pub server_name: String,
    #[serde(rename = "PeerCertificates")]
    pub peer_certificates: Vec<CertificateRecord>,
    #[serde(rename = "VerifiedChains")]
    pub verified_chains: Vec<Vec<CertificateRecord>>,
}

/// Raw handshake result, before any certificate is parsed.
#[derive(Debug, Clone, Default)]
pub struct NegotiatedSession {
    pub version: u16,
    pub server_name: String,
    pub peer_certificates: Vec<CertificateDer<'static>>,
    pub verified_chains: Vec<Vec<CertificateDer<'static>>>,
}

/// One `rank,hostname` row of a batch host list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEntry {
    pub rank: i64,
    pub hostname: String,
}

impl HostEntry {
    pub fn new(rank: i64, hostname: impl Into<String>) -> Self {
        Self {
            rank,
            hostname: hostname.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanConfig {
    pub port: u16,
    pub workers: usize,
    pub connect_timeout: Duration,
}

impl ScanConfig {
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            workers: DEFAULT_WORKERS,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub succeeded: usize,
    pub failed: usize,
}

impl ScanSummary {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}
