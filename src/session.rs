use crate::cert::normalize_certificate;
use crate::types::{CertificateRecord, NegotiatedSession, SessionRecord};
use rustls::pki_types::CertificateDer;
use tracing::debug;
use x509_parser::prelude::*;

/// Converts a raw handshake result into its serializable record.
///
/// Certificates that fail to parse are dropped without disturbing the order
/// of the rest. Zero-length verified chains are dropped as a whole.
pub fn normalize_session(session: &NegotiatedSession) -> SessionRecord {
    let verified_chains = session
        .verified_chains
        .iter()
        .filter(|chain| !chain.is_empty())
        .map(|chain| normalize_chain(chain))
        .collect();

    SessionRecord {
        version: session.version,
        server_name: session.server_name.clone(),
        peer_certificates: normalize_chain(&session.peer_certificates),
        verified_chains,
    }
}

pub fn normalize_chain(chain: &[CertificateDer<'_>]) -> Vec<CertificateRecord> {
    chain
        .iter()
        .enumerate()
        .filter_map(|(idx, der)| match X509Certificate::from_der(der.as_ref()) {
            Ok((_, cert)) => Some(normalize_certificate(&cert)),
            Err(e) => {
                debug!(index = idx, error = %e, "skipping unparseable certificate");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::tests::{leaf_certificate_der, sample_certificate_der};

    fn der(bytes: Vec<u8>) -> CertificateDer<'static> {
        CertificateDer::from(bytes)
    }

    fn garbage() -> CertificateDer<'static> {
        der(vec![0x30, 0x03, 0x02, 0x01])
    }

    #[test]
    fn test_peer_chain_drops_malformed_in_order() {
        let session = NegotiatedSession {
            version: 0x0304,
            server_name: "example.com".to_string(),
            peer_certificates: vec![
                der(leaf_certificate_der("first.example")),
                garbage(),
                der(leaf_certificate_der("second.example")),
                der(Vec::new()),
                der(leaf_certificate_der("third.example")),
            ],
            verified_chains: Vec::new(),
        };

        let record = normalize_session(&session);

        assert_eq!(record.version, 0x0304);
        assert_eq!(record.server_name, "example.com");
        assert_eq!(record.peer_certificates.len(), 3);
        let names: Vec<&str> = record
            .peer_certificates
            .iter()
            .map(|c| c.dns_names[0].as_str())
            .collect();
        assert_eq!(names, vec!["first.example", "second.example", "third.example"]);
        assert!(record.verified_chains.is_empty());
    }

    #[test]
    fn test_verified_chains_filtering() {
        let session = NegotiatedSession {
            version: 0x0303,
            server_name: String::new(),
            peer_certificates: vec![der(sample_certificate_der())],
            verified_chains: vec![
                Vec::new(),
                vec![garbage(), der(leaf_certificate_der("leaf.example"))],
                vec![garbage()],
                Vec::new(),
                vec![
                    der(leaf_certificate_der("a.example")),
                    der(leaf_certificate_der("b.example")),
                ],
            ],
        };

        let record = normalize_session(&session);

        assert_eq!(record.verified_chains.len(), 3);
        assert_eq!(record.verified_chains[0].len(), 1);
        assert_eq!(record.verified_chains[0][0].dns_names, vec!["leaf.example"]);
        assert!(record.verified_chains[1].is_empty());
        assert_eq!(record.verified_chains[2].len(), 2);
        assert_eq!(record.verified_chains[2][1].dns_names, vec!["b.example"]);
    }

    #[test]
    fn test_empty_session_serializes() {
        let record = normalize_session(&NegotiatedSession::default());
        let json = serde_json::to_string(&record).unwrap();

        assert_eq!(
            json,
            r#"{"Version":0,"ServerName":"","PeerCertificates":[],"VerifiedChains":[]}"#
        );
    }

    #[test]
    fn test_session_json_is_stable() {
        let session = NegotiatedSession {
            version: 0x0304,
            server_name: "example.com".to_string(),
            peer_certificates: vec![der(sample_certificate_der())],
            verified_chains: Vec::new(),
        };

        let first = serde_json::to_string(&normalize_session(&session)).unwrap();
        let second = serde_json::to_string(&normalize_session(&session)).unwrap();
        assert_eq!(first, second);
        assert!(first.contains(r#""ServerName":"example.com""#));
    }
}
