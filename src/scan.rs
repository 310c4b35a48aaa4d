use crate::fetch::Connect;
use crate::runner::probe_host;
use crate::types::{HostEntry, ScanConfig, ScanSummary};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{error, info};

/// Probes a ranked host list with at most `workers` probes in flight.
pub struct BatchScanner<C> {
    connector: Arc<C>,
    port: u16,
    workers: usize,
}

impl<C> BatchScanner<C>
where
    C: Connect + 'static,
{
    pub fn new(connector: C, config: ScanConfig) -> Self {
        Self::with_shared(Arc::new(connector), config)
    }

    pub fn with_shared(connector: Arc<C>, config: ScanConfig) -> Self {
        Self {
            connector,
            port: config.port,
            workers: config.workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Dispatches one probe per entry, in input order, and waits for all of
    /// them. Each probe emits its own line as soon as it finishes.
    pub async fn run(&self, entries: Vec<HostEntry>) -> ScanSummary {
        info!(
            hosts = entries.len(),
            workers = self.workers,
            port = self.port,
            "starting batch scan"
        );

        let gate = Arc::new(Semaphore::new(self.workers));
        let mut tasks = JoinSet::new();
        let mut summary = ScanSummary::default();

        for entry in entries {
            // The gate is never closed.
            let permit = match Arc::clone(&gate).acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };
            // Reap finished units so the set stays at roughly `workers` entries.
            while let Some(joined) = tasks.try_join_next() {
                tally(&mut summary, joined);
            }
            let connector = Arc::clone(&self.connector);
            let port = self.port;

            tasks.spawn_blocking(move || {
                let outcome = probe_host(connector.as_ref(), entry.rank, &entry.hostname, port);
                if let Err(e) = outcome.emit() {
                    error!(host = %entry.hostname, error = %e, "failed to write result");
                }
                drop(permit);
                outcome.is_success()
            });
        }

        while let Some(joined) = tasks.join_next().await {
            tally(&mut summary, joined);
        }

        info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            "batch scan finished"
        );
        summary
    }
}

fn tally(summary: &mut ScanSummary, joined: std::result::Result<bool, JoinError>) {
    match joined {
        Ok(true) => summary.succeeded += 1,
        Ok(false) => summary.failed += 1,
        Err(e) => {
            error!(error = %e, "probe task panicked");
            summary.failed += 1;
        }
    }
}
