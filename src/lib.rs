//! getcerts - dump TLS certificate chains as JSON lines
//!
//! This library connects to TLS endpoints with certificate verification
//! turned off, captures whatever chain the peer presents, and flattens it into
//! plain serializable records:
//!
//! - Normalizing X.509 names and certificates into fixed-schema records
//! - Normalizing a negotiated session (version, SNI, peer and verified chains)
//! - Probing a single host, with one fallback to its `www.` variant
//! - Scanning a ranked host list with a bounded number of probes in flight
//!
//! # Examples
//!
//! ## Probing one host
//!
//! ```no_run
//! use getcerts::fetch::{Connect, TlsConnector};
//! use getcerts::session::normalize_session;
//! use std::time::Duration;
//!
//! let connector = TlsConnector::new(Duration::from_secs(3)).unwrap();
//! let session = connector.connect("example.com", 443).unwrap();
//! let record = normalize_session(&session);
//! println!("{}", serde_json::to_string(&record).unwrap());
//! ```
//!
//! ## Scanning a host list
//!
//! ```no_run
//! use getcerts::fetch::TlsConnector;
//! use getcerts::hosts::read_host_file;
//! use getcerts::scan::BatchScanner;
//! use getcerts::types::ScanConfig;
//!
//! # async fn scan() -> getcerts::Result<()> {
//! let config = ScanConfig::default();
//! let connector = TlsConnector::new(config.connect_timeout)?;
//! let entries = read_host_file("top-1m.csv")?;
//!
//! let summary = BatchScanner::new(connector, config).run(entries).await;
//! println!("{} ok, {} failed", summary.succeeded, summary.failed);
//! # Ok(())
//! # }
//! ```

pub mod cert;
pub mod error;
pub mod fetch;
pub mod hosts;
pub mod runner;
pub mod scan;
pub mod session;
pub mod types;

#[cfg(feature = "cli")]
pub mod cli;

pub use error::{Error, Result};

pub use cert::{decode_serial, encode_serial, normalize_certificate, normalize_name};
pub use fetch::{Connect, TlsConnector};
pub use hosts::{read_host_file, read_host_list};
pub use runner::{probe_host, Outcome};
pub use scan::BatchScanner;
pub use session::normalize_session;
pub use types::{
    CertificateRecord, DistinguishedName, HostEntry, NegotiatedSession, ScanConfig, ScanSummary,
    SessionRecord,
};

use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

/// Installs a stderr `fmt` subscriber filtered by `RUST_LOG` (default `info`).
/// Per-host failure lines are always let through. Safe to call more than once.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let filter = log_filter(filter);
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Pins the failure target to `warn` on top of the user's directives.
pub(crate) fn log_filter(filter: EnvFilter) -> EnvFilter {
    match format!("{}=warn", runner::FAILURE_TARGET).parse::<Directive>() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    }
}
