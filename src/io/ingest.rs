//! CSV ingest of wideband TOAs.
//!
//! Expected columns (header names are case-insensitive):
//!
//! | column        | unit      | required |
//! |---------------|-----------|----------|
//! | `mjd`         | days      | yes      |
//! | `freq_mhz`    | MHz       | yes      |
//! | `toa_err_us`  | µs        | yes      |
//! | `residual_us` | µs        | yes      |
//! | `dm`          | pc cm⁻³   | no       |
//! | `dm_err`      | pc cm⁻³   | no       |
//! | `backend`     | -         | no       |
//!
//! Rows with invalid values are skipped and reported, the rest are kept in
//! file order. A file without `dm`/`dm_err` values still loads; it is simply
//! not wideband.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use tracing::{info, warn};

use crate::domain::{ToaRecord, ToaSet, us_to_seconds};
use crate::error::AppError;

/// Backend label used when the CSV has no `backend` column or value.
pub const DEFAULT_BACKEND: &str = "default";

const REQUIRED_COLUMNS: [&str; 4] = ["mjd", "freq_mhz", "toa_err_us", "residual_us"];

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: the TOA set plus what was skipped.
#[derive(Debug, Clone)]
pub struct IngestedToas {
    pub toas: ToaSet,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

impl IngestedToas {
    pub fn rows_used(&self) -> usize {
        self.toas.len()
    }
}

/// Load TOAs from a CSV file. The pulsar name defaults to the file stem.
pub fn load_toas(path: &Path, name: Option<&str>) -> Result<IngestedToas, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::input(format!("Failed to open TOA CSV '{}': {e}", path.display())))?;
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown");
    let ingested = read_toas(file, name.unwrap_or(stem))?;

    info!(
        path = %path.display(),
        rows_read = ingested.rows_read,
        rows_used = ingested.rows_used(),
        wideband = ingested.toas.is_wideband(),
        "loaded TOAs"
    );
    Ok(ingested)
}

/// Parse TOAs from any CSV reader.
pub fn read_toas<R: Read>(reader: R, name: &str) -> Result<IngestedToas, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .comment(Some(b'#'))
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| AppError::input(format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    for col in REQUIRED_COLUMNS {
        if !header_map.contains_key(col) {
            return Err(AppError::input(format!("Missing required column: `{col}`")));
        }
    }

    let mut records = Vec::new();
    let mut row_errors = Vec::new();
    let mut rows_read = 0usize;

    for (idx, result) in reader.records().enumerate() {
        // +2: records start after the header line, and lines are 1-based.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_row(&record, &header_map) {
            Ok(r) => records.push(r),
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    for e in row_errors.iter().take(5) {
        warn!(line = e.line, "skipped TOA row: {}", e.message);
    }

    if records.is_empty() {
        return Err(AppError::input("No valid TOA rows remain after validation."));
    }

    Ok(IngestedToas {
        toas: ToaSet::new(name, records),
        row_errors,
        rows_read,
    })
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn parse_row(record: &StringRecord, header_map: &HashMap<String, usize>) -> Result<ToaRecord, String> {
    let mjd = parse_f64(get_required(record, header_map, "mjd")?, "mjd")?;
    let freq_mhz = parse_f64(get_required(record, header_map, "freq_mhz")?, "freq_mhz")?;
    let toa_err_us = parse_f64(get_required(record, header_map, "toa_err_us")?, "toa_err_us")?;
    let residual_us = parse_f64(get_required(record, header_map, "residual_us")?, "residual_us")?;

    if freq_mhz <= 0.0 {
        return Err(format!("Non-positive frequency {freq_mhz} MHz."));
    }
    if toa_err_us <= 0.0 {
        return Err(format!("Non-positive TOA uncertainty {toa_err_us} us."));
    }

    let dm = get_optional(record, header_map, "dm")
        .map(|s| parse_f64(s, "dm"))
        .transpose()?;
    let dm_err = get_optional(record, header_map, "dm_err")
        .map(|s| parse_f64(s, "dm_err"))
        .transpose()?;
    if let Some(e) = dm_err {
        if e <= 0.0 {
            return Err(format!("Non-positive DM uncertainty {e}."));
        }
    }

    let backend = get_optional(record, header_map, "backend")
        .unwrap_or(DEFAULT_BACKEND)
        .to_string();

    Ok(ToaRecord {
        mjd,
        freq_mhz,
        toa_err: us_to_seconds(toa_err_us),
        residual: us_to_seconds(residual_us),
        dm,
        dm_err,
        backend,
    })
}

fn get_required<'a>(
    record: &'a StringRecord,
    header_map: &HashMap<String, usize>,
    name: &str,
) -> Result<&'a str, String> {
    let idx = header_map
        .get(name)
        .ok_or_else(|| format!("Missing required column: `{name}`"))?;
    record
        .get(*idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))
}

fn get_optional<'a>(record: &'a StringRecord, header_map: &HashMap<String, usize>, name: &str) -> Option<&'a str> {
    let idx = header_map.get(name)?;
    record.get(*idx).map(str::trim).filter(|s| !s.is_empty())
}

fn parse_f64(s: &str, name: &str) -> Result<f64, String> {
    let v = s
        .parse::<f64>()
        .map_err(|_| format!("Invalid `{name}` value '{s}'."))?;
    if v.is_finite() {
        Ok(v)
    } else {
        Err(format!("Non-finite `{name}` value."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\u{feff}MJD,freq_mhz,toa_err_us,residual_us,dm,dm_err,backend
55000.5,1400,0.5,1.25,10.39,0.0002,GUPPI
55001.5,820,0.7,-0.5,10.391,0.0003,GUPPI
55002.5,820,-1,0.0,10.392,0.0003,GUPPI
55003.5,abc,0.5,0.0,10.39,0.0002,PUPPI
";

    #[test]
    fn parses_valid_rows_and_reports_bad_ones() {
        let ingested = read_toas(CSV.as_bytes(), "J1909-3744").unwrap();
        assert_eq!(ingested.rows_read, 4);
        assert_eq!(ingested.rows_used(), 2);
        assert_eq!(ingested.row_errors.len(), 2);
        assert_eq!(ingested.row_errors[0].line, 4);

        let toas = &ingested.toas;
        assert!(toas.is_wideband());
        assert_eq!(toas.name, "J1909-3744");
        let r = &toas.records[0];
        assert!((r.toa_err - 5e-7).abs() < 1e-20);
        assert!((r.residual - 1.25e-6).abs() < 1e-20);
        assert_eq!(r.backend, "GUPPI");
    }

    #[test]
    fn narrowband_file_loads_but_is_not_wideband() {
        let csv = "mjd,freq_mhz,toa_err_us,residual_us\n55000,1400,1.0,0.0\n";
        let ingested = read_toas(csv.as_bytes(), "J0000+0000").unwrap();
        assert!(!ingested.toas.is_wideband());
        assert_eq!(ingested.toas.records[0].backend, DEFAULT_BACKEND);
    }

    #[test]
    fn missing_required_column_is_an_input_error() {
        let csv = "mjd,freq_mhz,residual_us\n55000,1400,0.0\n";
        let err = read_toas(csv.as_bytes(), "J0000+0000").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Input);
        assert!(err.message().contains("toa_err_us"));
    }
}
