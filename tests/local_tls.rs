use getcerts::{normalize_session, probe_host, Connect, Outcome, SessionRecord, TlsConnector};
use rcgen::{CertificateParams, KeyPair};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use rustls::{ServerConfig, ServerConnection};
use std::net::TcpListener;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Serves `connections` TLS handshakes on 127.0.0.1 with a fresh self-signed
/// `localhost` certificate.
fn spawn_tls_server(connections: usize) -> (u16, Vec<CertificateDer<'static>>) {
    let key = KeyPair::generate().unwrap();
    let cert = CertificateParams::new(vec!["localhost".to_string()])
        .unwrap()
        .self_signed(&key)
        .unwrap();
    let chain = vec![cert.der().clone()];
    let key_der = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(key.serialize_der()));

    let config = ServerConfig::builder_with_provider(Arc::new(
        rustls::crypto::ring::default_provider(),
    ))
    .with_safe_default_protocol_versions()
    .unwrap()
    .with_no_client_auth()
    .with_single_cert(chain.clone(), key_der)
    .unwrap();
    let config = Arc::new(config);

    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    thread::spawn(move || {
        for stream in listener.incoming().take(connections) {
            let Ok(mut stream) = stream else { continue };
            let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
            let mut conn = ServerConnection::new(Arc::clone(&config)).unwrap();
            while conn.is_handshaking() {
                if conn.complete_io(&mut stream).is_err() {
                    break;
                }
            }
            let _ = conn.complete_io(&mut stream);
        }
    });

    (port, chain)
}

fn connector() -> TlsConnector {
    TlsConnector::new(Duration::from_secs(3)).unwrap()
}

#[test]
fn fetches_chain_from_local_endpoint() {
    let (port, chain) = spawn_tls_server(1);

    let session = connector().connect("localhost", port).unwrap();

    assert_eq!(session.server_name, "localhost");
    assert_eq!(session.version, 0x0304);
    assert_eq!(session.peer_certificates, chain);
    assert!(session.verified_chains.is_empty());

    let record = normalize_session(&session);
    assert_eq!(record.peer_certificates.len(), 1);
    assert_eq!(record.peer_certificates[0].dns_names, vec!["localhost"]);
    assert_eq!(record.peer_certificates[0].version, 3);
}

#[test]
fn ip_target_has_empty_server_name() {
    let (port, _) = spawn_tls_server(1);

    let session = connector().connect("127.0.0.1", port).unwrap();

    assert_eq!(session.server_name, "");
    assert_eq!(session.peer_certificates.len(), 1);
}

#[test]
fn probe_emits_one_json_line_for_reachable_host() {
    let (port, _) = spawn_tls_server(1);

    let outcome = probe_host(&connector(), 1, "localhost", port);
    assert!(outcome.is_success());

    let mut buf = Vec::new();
    outcome.write_json(&mut buf).unwrap();
    let text = String::from_utf8(buf).unwrap();
    assert_eq!(text.lines().count(), 1);

    let record: SessionRecord = serde_json::from_str(text.trim_end()).unwrap();
    assert!(!record.peer_certificates.is_empty());
}

#[test]
fn probe_reports_unreachable_host_once() {
    let outcome = probe_host(&connector(), 2, "nonexistent.invalid", 443);

    match &outcome {
        Outcome::Failure { hostname, .. } => assert_eq!(hostname, "nonexistent.invalid"),
        other => panic!("unexpected outcome: {:?}", other),
    }
    let line = outcome.failure_line().unwrap();
    assert!(line.starts_with("[       2:nonexistent.invalid] "));

    let mut buf = Vec::new();
    outcome.write_json(&mut buf).unwrap();
    assert!(buf.is_empty());
}
