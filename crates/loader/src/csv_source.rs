use crate::align::{PricePoint, RawSeries};
use crate::error::LoaderError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Reads a wide price table: a `timestamp` column followed by one close
/// column per symbol. Empty cells are gaps and are left for the aligner to drop.
pub fn read_wide_csv<R: Read>(reader: R) -> Result<Vec<RawSeries>, LoaderError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let headers = reader.headers()?.clone();
    if headers.len() < 2 {
        return Err(LoaderError::Parse {
            line: 1,
            message: "expected a timestamp column followed by symbol columns".to_string(),
        });
    }

    let mut series: Vec<RawSeries> = headers
        .iter()
        .skip(1)
        .map(|symbol| RawSeries::new(symbol, Vec::new()))
        .collect();

    for result in reader.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        let raw_timestamp = record.get(0).unwrap_or_default();
        let timestamp = parse_timestamp(raw_timestamp).ok_or_else(|| LoaderError::Parse {
            line,
            message: format!("unrecognized timestamp '{}'", raw_timestamp),
        })?;

        for (column, s) in series.iter_mut().enumerate() {
            let cell = record.get(column + 1).unwrap_or_default();
            let close = if cell.is_empty() {
                f64::NAN
            } else {
                cell.parse::<f64>().map_err(|e| LoaderError::Parse {
                    line,
                    message: format!("{} close '{}': {}", s.symbol, cell, e),
                })?
            };
            s.points.push(PricePoint::new(timestamp, close));
        }
    }

    tracing::debug!(assets = series.len(), "Read wide price table.");
    Ok(series)
}

/// Opens `path` and parses it with [`read_wide_csv`].
pub fn load_csv(path: &Path) -> Result<Vec<RawSeries>, LoaderError> {
    let file = File::open(path)?;
    read_wide_csv(BufReader::new(file))
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS` (UTC) and plain `YYYY-MM-DD` dates.
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%:z") {
        return Some(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Write;

    #[test]
    fn parses_supported_timestamp_layouts() {
        let midnight = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2024-01-02"), Some(midnight));
        assert_eq!(parse_timestamp("2024-01-02T00:00:00Z"), Some(midnight));
        assert_eq!(parse_timestamp("2024-01-02 00:00:00"), Some(midnight));
        assert_eq!(parse_timestamp("2024-01-02 01:00:00+01:00"), Some(midnight));
        assert_eq!(parse_timestamp("02/01/2024"), None);
    }

    #[test]
    fn empty_cells_become_gaps() {
        let data = "timestamp,BTC,ETH\n2024-01-01,42000.5,2200\n2024-01-02,,2250\n";
        let series = read_wide_csv(data.as_bytes()).unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series[0].symbol, "BTC");
        assert_eq!(series[0].points.len(), 2);
        assert!(series[0].points[1].close.is_nan());
        assert_eq!(series[1].points[1].close, 2250.0);
    }

    #[test]
    fn bad_number_reports_line() {
        let data = "timestamp,BTC,ETH\n2024-01-01,abc,2200\n";
        let err = read_wide_csv(data.as_bytes()).unwrap_err();
        assert!(matches!(err, LoaderError::Parse { line: 2, .. }));
    }

    #[test]
    fn header_without_symbols_is_rejected() {
        let err = read_wide_csv("timestamp\n2024-01-01\n".as_bytes()).unwrap_err();
        assert!(matches!(err, LoaderError::Parse { line: 1, .. }));
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "timestamp,A,B").unwrap();
        writeln!(file, "2024-01-01,1.0,2.0").unwrap();
        let series = load_csv(file.path()).unwrap();
        assert_eq!(series[1].points[0].close, 2.0);
    }
}
