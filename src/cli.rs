use crate::error::Result;
use crate::fetch::{Connect, TlsConnector};
use crate::hosts::read_host_file;
use crate::runner::Outcome;
use crate::scan::BatchScanner;
use crate::session::normalize_session;
use crate::types::{ScanConfig, DEFAULT_PORT, DEFAULT_WORKERS};
use clap::Parser;
use std::time::Duration;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "getcerts")]
#[command(
    version,
    about = "Fetch TLS certificate chains and print them as JSON lines",
    long_about = None
)]
pub struct Cli {
    #[arg(long, default_value = "127.0.0.1", help = "Host to dial in single-target mode")]
    pub host: String,

    #[arg(long, default_value_t = DEFAULT_PORT, help = "Port to dial in single-target mode")]
    pub port: u16,

    #[arg(
        long = "csvFile",
        help = "CSV of rank,hostname rows; switches to batch mode on port 443"
    )]
    pub csv_file: Option<String>,

    #[arg(long, default_value_t = DEFAULT_WORKERS, help = "Maximum probes in flight in batch mode")]
    pub workers: usize,

    #[arg(
        long,
        default_value = "3",
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Connect and handshake timeout in seconds"
    )]
    pub timeout: u64,
}

impl Cli {
    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig::default()
            .with_workers(self.workers)
            .with_connect_timeout(Duration::from_secs(self.timeout))
    }

    /// Batch mode is selected by a non-empty `--csvFile`.
    pub fn batch_file(&self) -> Option<&str> {
        self.csv_file.as_deref().filter(|path| !path.is_empty())
    }
}

pub fn run_cli() -> Result<()> {
    crate::init_tracing();
    let cli = Cli::parse();
    let config = cli.scan_config();
    let connector = TlsConnector::new(config.connect_timeout)?;

    match cli.batch_file() {
        Some(path) => run_batch(connector, config, path),
        None => run_single(&connector, &cli.host, cli.port),
    }
}

fn run_single(connector: &TlsConnector, host: &str, port: u16) -> Result<()> {
    let session = connector.connect(host, port)?;
    Outcome::Success(normalize_session(&session)).emit()
}

fn run_batch(connector: TlsConnector, config: ScanConfig, path: &str) -> Result<()> {
    let entries = read_host_file(path)?;
    info!(file = path, hosts = entries.len(), "loaded host list");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let scanner = BatchScanner::new(connector, config);
    runtime.block_on(scanner.run(entries));
    Ok(())
}
