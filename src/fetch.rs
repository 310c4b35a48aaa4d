use crate::error::{Error, Result};
use crate::types::NegotiatedSession;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, ClientConnection, DigitallySignedStruct, SignatureScheme};
use std::io::{self, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Opens a TLS session to `host:port` and hands back what was negotiated.
///
/// Implementations block; the batch scanner runs them on the blocking pool.
/// The connect timeout bounds the TCP dial as a whole, across every resolved
/// address, and then each handshake read and write.
pub trait Connect: Send + Sync {
    fn connect(&self, host: &str, port: u16) -> Result<NegotiatedSession>;
}

/// Accepts any server chain. We are here to look at certificates, not to
/// decide whether to trust them.
#[derive(Debug)]
struct AcceptAnyServerCert {
    schemes: Vec<SignatureScheme>,
}

impl ServerCertVerifier for AcceptAnyServerCert {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.schemes.clone()
    }
}

/// rustls-backed [`Connect`] with certificate verification switched off.
#[derive(Debug, Clone)]
pub struct TlsConnector {
    config: Arc<ClientConfig>,
    timeout: Duration,
}

impl TlsConnector {
    pub fn new(timeout: Duration) -> Result<Self> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let verifier = Arc::new(AcceptAnyServerCert {
            schemes: provider
                .signature_verification_algorithms
                .supported_schemes(),
        });

        let config = ClientConfig::builder_with_provider(Arc::clone(&provider))
            .with_safe_default_protocol_versions()?
            .dangerous()
            .with_custom_certificate_verifier(verifier)
            .with_no_client_auth();

        Ok(Self {
            config: Arc::new(config),
            timeout,
        })
    }

    fn open_socket(&self, host: &str, port: u16) -> Result<TcpStream> {
        let addrs: Vec<SocketAddr> = (host, port)
            .to_socket_addrs()
            .map_err(|e| Error::Resolve(format!("{}: {}", host, e)))?
            .collect();

        if addrs.is_empty() {
            return Err(Error::Resolve(format!("{}: no addresses found", host)));
        }

        dial_within(&addrs, self.timeout, TcpStream::connect_timeout)
    }
}

/// Tries each address in turn until one connects. All attempts share a single
/// `budget`, so a host with many dead addresses still gives up after `budget`.
fn dial_within<T, F>(addrs: &[SocketAddr], budget: Duration, mut dial: F) -> Result<T>
where
    F: FnMut(&SocketAddr, Duration) -> io::Result<T>,
{
    let deadline = Instant::now() + budget;
    let mut last_err = None;
    for addr in addrs {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            last_err = Some((*addr, io::Error::from(io::ErrorKind::TimedOut)));
            break;
        }
        match dial(addr, remaining) {
            Ok(sock) => return Ok(sock),
            Err(e) => last_err = Some((*addr, e)),
        }
    }

    match last_err {
        Some((addr, e)) if e.kind() == io::ErrorKind::TimedOut => {
            Err(Error::Timeout(format!("{} after {:?}", addr, budget)))
        }
        Some((addr, e)) => Err(Error::Connection(format!(
            "failed to connect to {}: {}",
            addr, e
        ))),
        None => Err(Error::Connection("no address to dial".to_string())),
    }
}

impl Connect for TlsConnector {
    fn connect(&self, host: &str, port: u16) -> Result<NegotiatedSession> {
        let server_name = ServerName::try_from(host.to_string())
            .map_err(|e| Error::DnsName(format!("Invalid DNS name '{}': {}", host, e)))?;
        let sni = match &server_name {
            ServerName::DnsName(name) => name.as_ref().to_string(),
            _ => String::new(),
        };

        let mut sock = self.open_socket(host, port)?;
        sock.set_read_timeout(Some(self.timeout))?;
        sock.set_write_timeout(Some(self.timeout))?;

        let mut conn = ClientConnection::new(Arc::clone(&self.config), server_name)?;
        while conn.is_handshaking() {
            conn.complete_io(&mut sock)
                .map_err(|e| Error::Handshake(format!("{}:{}: {}", host, port, e)))?;
        }

        let session = NegotiatedSession {
            version: conn.protocol_version().map(u16::from).unwrap_or_default(),
            server_name: sni,
            peer_certificates: conn
                .peer_certificates()
                .map(|certs| certs.to_vec())
                .unwrap_or_default(),
            verified_chains: Vec::new(),
        };

        conn.send_close_notify();
        let _ = conn.complete_io(&mut sock);
        let _ = sock.flush();

        Ok(session)
    }
}
