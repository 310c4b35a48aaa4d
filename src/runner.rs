use crate::error::Result;
use crate::fetch::Connect;
use crate::session::normalize_session;
use crate::types::SessionRecord;
use std::io::Write;
use tracing::{debug, warn};

/// Tracing target for per-host failure lines. Kept at `warn` whatever
/// `RUST_LOG` says.
pub const FAILURE_TARGET: &str = "getcerts::failure";

/// What a single host probe produced. Exactly one line is emitted per outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success(SessionRecord),
    Failure {
        position: i64,
        hostname: String,
        error: String,
    },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    /// `[<position, right-aligned to 8>:<hostname>] <error>`, or `None` on success.
    pub fn failure_line(&self) -> Option<String> {
        match self {
            Outcome::Success(_) => None,
            Outcome::Failure {
                position,
                hostname,
                error,
            } => Some(format!("[{:>8}:{}] {}", position, hostname, error)),
        }
    }

    /// Writes the JSON line for a success. Failures write nothing here.
    pub fn write_json<W: Write>(&self, out: &mut W) -> Result<()> {
        if let Outcome::Success(record) = self {
            let line = serde_json::to_string(record)?;
            writeln!(out, "{}", line)?;
        }
        Ok(())
    }

    /// Successes go to stdout as one JSON line, failures to the log stream.
    pub fn emit(&self) -> Result<()> {
        match self.failure_line() {
            Some(line) => {
                warn!(target: FAILURE_TARGET, "{}", line);
                Ok(())
            }
            None => {
                let stdout = std::io::stdout();
                let mut out = stdout.lock();
                self.write_json(&mut out)?;
                out.flush()?;
                Ok(())
            }
        }
    }
}

/// Probes `hostname`, falling back once to `www.<hostname>`.
///
/// A failure outcome always names the original hostname, with the error from
/// the fallback attempt.
pub fn probe_host<C>(connector: &C, position: i64, hostname: &str, port: u16) -> Outcome
where
    C: Connect + ?Sized,
{
    let attempt = connector.connect(hostname, port).or_else(|err| {
        debug!(host = hostname, error = %err, "direct connection failed, trying www. prefix");
        connector.connect(&format!("www.{}", hostname), port)
    });

    match attempt {
        Ok(session) => Outcome::Success(normalize_session(&session)),
        Err(err) => Outcome::Failure {
            position,
            hostname: hostname.to_string(),
            error: err.to_string(),
        },
    }
}
