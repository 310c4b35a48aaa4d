use crate::error::{Error, Result};
use crate::types::HostEntry;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, warn};

/// Reads `rank,hostname` rows (no header).
///
/// An unparseable rank becomes 0. Any read error other than end of input,
/// including rows whose field count differs from the first row, is returned.
pub fn read_host_list<R: Read>(reader: R) -> Result<Vec<HostEntry>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut entries = Vec::new();
    for (line, record) in rdr.records().enumerate() {
        let record = record?;
        let line = line + 1;

        let raw_rank = record.get(0).unwrap_or_default();
        let rank = raw_rank.parse::<i64>().unwrap_or_else(|e| {
            debug!(line, rank = raw_rank, error = %e, "rank is not an integer, using 0");
            0
        });

        let hostname = record
            .get(1)
            .ok_or_else(|| Error::InvalidInput(format!("line {}: missing hostname column", line)))?;
        if hostname.is_empty() {
            warn!(line, "skipping row with empty hostname");
            continue;
        }

        entries.push(HostEntry::new(rank, hostname));
    }

    Ok(entries)
}

pub fn read_host_file(path: impl AsRef<Path>) -> Result<Vec<HostEntry>> {
    let file = File::open(path.as_ref()).map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("{}: {}", path.as_ref().display(), e),
        ))
    })?;
    read_host_list(BufReader::new(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_reads_ranked_rows() {
        let input = "1,google.com\n2,youtube.com\n 3 , facebook.com \n";
        let entries = read_host_list(input.as_bytes()).unwrap();

        assert_eq!(
            entries,
            vec![
                HostEntry::new(1, "google.com"),
                HostEntry::new(2, "youtube.com"),
                HostEntry::new(3, "facebook.com"),
            ]
        );
    }

    #[test]
    fn test_bad_rank_defaults_to_zero() {
        let entries = read_host_list("rank,example.com\n-4,example.org\n".as_bytes()).unwrap();

        assert_eq!(entries[0], HostEntry::new(0, "example.com"));
        assert_eq!(entries[1], HostEntry::new(-4, "example.org"));
    }

    #[test]
    fn test_empty_hostname_is_skipped() {
        let entries = read_host_list("1,\n2,example.com\n".as_bytes()).unwrap();
        assert_eq!(entries, vec![HostEntry::new(2, "example.com")]);
    }

    #[test]
    fn test_uneven_rows_are_fatal() {
        let err = read_host_list("1,a.example\n2,b.example,extra\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Csv(_)));
    }

    #[test]
    fn test_missing_hostname_column() {
        let err = read_host_list("1\n2\n".as_bytes()).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_read_host_file() {
        let mut tmp = NamedTempFile::new().unwrap();
        writeln!(tmp, "10,example.com").unwrap();
        writeln!(tmp, "20,example.net").unwrap();
        tmp.flush().unwrap();

        let entries = read_host_file(tmp.path()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1], HostEntry::new(20, "example.net"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = read_host_file("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
