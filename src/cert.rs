use crate::error::{Error, Result};
use crate::types::{CertificateRecord, DistinguishedName};
use chrono::{DateTime, Utc};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use x509_parser::extensions::KeyUsage;
use x509_parser::prelude::*;
use x509_parser::time::ASN1Time;

const SERIAL_CODEC_VERSION: u8 = 1;

const OID_AIA_OCSP: &str = "1.3.6.1.5.5.7.48.1";
const OID_AIA_CA_ISSUERS: &str = "1.3.6.1.5.5.7.48.2";

/// Flattens an X.509 name into the seven list attributes we report.
///
/// Attributes that do not decode as a string are skipped, as is everything
/// outside the seven (CN included).
pub fn normalize_name(name: &X509Name) -> DistinguishedName {
    let mut dn = DistinguishedName::default();

    for rdn in name.iter() {
        for attr in rdn.iter() {
            let value = match attr.as_str() {
                Ok(value) => value.to_string(),
                Err(_) => continue,
            };

            let slot = match attr.attr_type().to_id_string().as_str() {
                "2.5.4.6" => &mut dn.country,
                "2.5.4.10" => &mut dn.organization,
                "2.5.4.11" => &mut dn.organizational_unit,
                "2.5.4.7" => &mut dn.locality,
                "2.5.4.8" => &mut dn.province,
                "2.5.4.9" => &mut dn.street_address,
                "2.5.4.17" => &mut dn.postal_code,
                _ => continue,
            };

            slot.push(value);
        }
    }

    dn
}

pub fn normalize_certificate(cert: &X509Certificate<'_>) -> CertificateRecord {
    let mut record = CertificateRecord {
        signature: hex::encode(&*cert.signature_value.data),
        signature_algorithm: signature_algorithm_name(
            &cert.signature_algorithm.algorithm.to_id_string(),
        ),
        public_key_algorithm: public_key_algorithm_name(
            &cert.public_key().algorithm.algorithm.to_id_string(),
        ),
        version: cert.version().0 + 1,
        serial_number: hex::encode(encode_serial(cert.raw_serial())),
        issuer: normalize_name(cert.issuer()),
        subject: normalize_name(cert.subject()),
        not_before: format_time(&cert.validity().not_before),
        not_after: format_time(&cert.validity().not_after),
        ..Default::default()
    };

    if let Ok(Some(ku_ext)) = cert.key_usage() {
        record.key_usage = key_usage_bits(ku_ext.value);
    }

    for ext in cert.extensions() {
        if let ParsedExtension::AuthorityInfoAccess(aia) = ext.parsed_extension() {
            for desc in &aia.accessdescs {
                let uri = match &desc.access_location {
                    GeneralName::URI(uri) => uri.to_string(),
                    _ => continue,
                };
                match desc.access_method.to_id_string().as_str() {
                    OID_AIA_OCSP => record.ocsp_server.push(uri),
                    OID_AIA_CA_ISSUERS => record.issuing_certificate_url.push(uri),
                    _ => {}
                }
            }
        }
    }

    if let Ok(Some(san_ext)) = cert.subject_alternative_name() {
        for san in &san_ext.value.general_names {
            match san {
                GeneralName::DNSName(name) => record.dns_names.push(name.to_string()),
                GeneralName::RFC822Name(email) => record.email_addresses.push(email.to_string()),
                GeneralName::IPAddress(bytes) => {
                    if let Some(ip) = ip_from_bytes(bytes) {
                        record.ip_addresses.push(ip);
                    }
                }
                _ => {}
            }
        }
    }

    if let Ok(Some(nc_ext)) = cert.name_constraints() {
        record.permitted_dns_domains_critical = nc_ext.critical;
        if let Some(subtrees) = &nc_ext.value.permitted_subtrees {
            for subtree in subtrees {
                if let GeneralName::DNSName(domain) = &subtree.base {
                    record.permitted_dns_domains.push(domain.to_string());
                }
            }
        }
    }

    if let Ok(Some(bc_ext)) = cert.basic_constraints() {
        record.basic_constraints_valid = true;
        record.is_ca = bc_ext.value.ca;
    }

    record
}

/// Re-encodes a DER INTEGER (two's complement) as a version/sign byte
/// followed by the big-endian magnitude with no leading zeros.
pub fn encode_serial(raw: &[u8]) -> Vec<u8> {
    let negative = raw.first().map_or(false, |b| b & 0x80 != 0);
    let magnitude = if negative {
        twos_complement(raw)
    } else {
        raw.to_vec()
    };
    let start = magnitude
        .iter()
        .position(|&b| b != 0)
        .unwrap_or(magnitude.len());

    let mut out = Vec::with_capacity(1 + magnitude.len() - start);
    out.push(SERIAL_CODEC_VERSION << 1 | negative as u8);
    out.extend_from_slice(&magnitude[start..]);
    out
}

/// Inverse of the hex-encoded [`encode_serial`] output: `(negative, magnitude)`.
pub fn decode_serial(encoded: &str) -> Result<(bool, Vec<u8>)> {
    let bytes = hex::decode(encoded).map_err(|e| Error::SerialEncoding(e.to_string()))?;
    let (&head, magnitude) = bytes
        .split_first()
        .ok_or_else(|| Error::SerialEncoding("empty serial".to_string()))?;

    if head >> 1 != SERIAL_CODEC_VERSION {
        return Err(Error::SerialEncoding(format!(
            "unsupported version byte {:#04x}",
            head
        )));
    }

    Ok((head & 1 == 1, magnitude.to_vec()))
}

fn twos_complement(bytes: &[u8]) -> Vec<u8> {
    let mut out: Vec<u8> = bytes.iter().map(|b| !b).collect();
    for byte in out.iter_mut().rev() {
        let (value, carry) = byte.overflowing_add(1);
        *byte = value;
        if !carry {
            break;
        }
    }
    out
}

fn format_time(time: &ASN1Time) -> String {
    DateTime::<Utc>::from_timestamp(time.timestamp(), 0)
        .unwrap_or_default()
        .format("%Y-%m-%dT%H:%M:%SZ")
        .to_string()
}

fn key_usage_bits(ku: &KeyUsage) -> u32 {
    [
        ku.digital_signature(),
        ku.non_repudiation(),
        ku.key_encipherment(),
        ku.data_encipherment(),
        ku.key_agreement(),
        ku.key_cert_sign(),
        ku.crl_sign(),
        ku.encipher_only(),
        ku.decipher_only(),
    ]
    .iter()
    .enumerate()
    .filter(|(_, set)| **set)
    .fold(0, |bits, (i, _)| bits | 1u32 << i)
}

fn ip_from_bytes(bytes: &[u8]) -> Option<IpAddr> {
    if let Ok(octets) = <[u8; 4]>::try_from(bytes) {
        Some(IpAddr::V4(Ipv4Addr::from(octets)))
    } else if let Ok(octets) = <[u8; 16]>::try_from(bytes) {
        Some(IpAddr::V6(Ipv6Addr::from(octets)))
    } else {
        None
    }
}

fn signature_algorithm_name(oid: &str) -> String {
    let name = match oid {
        "1.2.840.113549.1.1.2" => "MD2-RSA",
        "1.2.840.113549.1.1.4" => "MD5-RSA",
        "1.2.840.113549.1.1.5" => "SHA1-RSA",
        "1.2.840.113549.1.1.11" => "SHA256-RSA",
        "1.2.840.113549.1.1.12" => "SHA384-RSA",
        "1.2.840.113549.1.1.13" => "SHA512-RSA",
        "1.2.840.113549.1.1.10" => "RSASSA-PSS",
        "1.2.840.10040.4.3" => "DSA-SHA1",
        "2.16.840.1.101.3.4.3.2" => "DSA-SHA256",
        "1.2.840.10045.4.1" => "ECDSA-SHA1",
        "1.2.840.10045.4.3.2" => "ECDSA-SHA256",
        "1.2.840.10045.4.3.3" => "ECDSA-SHA384",
        "1.2.840.10045.4.3.4" => "ECDSA-SHA512",
        "1.3.101.112" => "Ed25519",
        "1.3.101.113" => "Ed448",
        other => return other.to_string(),
    };
    name.to_string()
}

fn public_key_algorithm_name(oid: &str) -> String {
    let name = match oid {
        "1.2.840.113549.1.1.1" => "RSA",
        "1.2.840.113549.1.1.10" => "RSA",
        "1.2.840.10040.4.1" => "DSA",
        "1.2.840.10045.2.1" => "ECDSA",
        "1.3.101.112" => "Ed25519",
        "1.3.101.110" => "X25519",
        other => return other.to_string(),
    };
    name.to_string()
}
