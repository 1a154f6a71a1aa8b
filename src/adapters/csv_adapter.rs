//! CSV file data adapter.
//!
//! Expects a header row naming `timestamp,open,high,low,close,volume` (any
//! column order, case-insensitive). Timestamps are `YYYY-MM-DD`,
//! `YYYY-MM-DD HH:MM:SS` or `YYYY-MM-DDTHH:MM:SS`.

use chrono::{NaiveDate, NaiveDateTime};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::domain::error::StrategylabError;
use crate::domain::ohlcv::OhlcvBar;
use crate::ports::data_port::DataPort;

const COLUMNS: [&str; 6] = ["timestamp", "open", "high", "low", "close", "volume"];

pub struct CsvDataAdapter {
    path: PathBuf,
}

impl CsvDataAdapter {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parses CSV text. `origin` names the source in error messages.
    pub fn parse(content: &str, origin: &str) -> Result<Vec<OhlcvBar>, StrategylabError> {
        let data_err = |reason: String| StrategylabError::Data {
            reason: format!("{origin}: {reason}"),
        };

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let headers = rdr
            .headers()
            .map_err(|e| data_err(format!("unreadable header: {e}")))?
            .clone();
        let mut index = [0usize; 6];
        for (slot, name) in index.iter_mut().zip(COLUMNS) {
            *slot = headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(name))
                .ok_or_else(|| data_err(format!("missing '{name}' column")))?;
        }

        let mut bars = Vec::new();
        for (row, record) in rdr.records().enumerate() {
            // header is line 1
            let line = row + 2;
            let record = record.map_err(|e| data_err(format!("line {line}: {e}")))?;
            let field = |col: usize| -> Result<&str, StrategylabError> {
                record
                    .get(index[col])
                    .ok_or_else(|| data_err(format!("line {line}: missing {}", COLUMNS[col])))
            };
            let number = |col: usize| -> Result<f64, StrategylabError> {
                let raw = field(col)?;
                raw.parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| {
                        data_err(format!("line {line}: invalid {} value '{raw}'", COLUMNS[col]))
                    })
            };

            let raw_ts = field(0)?;
            let timestamp = parse_timestamp(raw_ts)
                .ok_or_else(|| data_err(format!("line {line}: invalid timestamp '{raw_ts}'")))?;
            let bar = OhlcvBar {
                timestamp,
                open: number(1)?,
                high: number(2)?,
                low: number(3)?,
                close: number(4)?,
                volume: number(5)?,
            };

            if bar.high < bar.low || bar.volume < 0.0 {
                warn!(line, timestamp = %bar.timestamp, "inconsistent bar, skipping");
                continue;
            }
            bars.push(bar);
        }

        bars.sort_by_key(|b| b.timestamp);
        debug!(bars = bars.len(), origin, "bars loaded");
        Ok(bars)
    }
}

impl DataPort for CsvDataAdapter {
    fn load_bars(&self) -> Result<Vec<OhlcvBar>, StrategylabError> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| StrategylabError::Data {
            reason: format!("failed to read {}: {e}", self.path.display()),
        })?;
        Self::parse(&content, &self.path.display().to_string())
    }
}

pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
