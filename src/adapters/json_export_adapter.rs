//! JSON export of a backtest result.
//!
//! The document carries a `metadata` block with a format version; files with
//! a newer version than this build understands are rejected on import.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::backtest::{BacktestConfig, BacktestResult, EquityPoint};
use crate::domain::error::StrategylabError;
use crate::domain::metrics::PerformanceMetrics;
use crate::domain::position::{Signal, Trade};
use crate::ports::export_port::ExportPort;

pub const FORMAT_VERSION: u32 = 1;
const GENERATOR: &str = concat!("strategylab ", env!("CARGO_PKG_VERSION"));
const DECIMALS: i32 = 6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub exported_at: DateTime<Utc>,
    pub format_version: u32,
    pub generator: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    pub metadata: ExportMetadata,
    pub config: BacktestConfig,
    pub metrics: PerformanceMetrics,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
    pub signals: Vec<Signal>,
}

impl ExportDocument {
    pub fn new(result: &BacktestResult) -> Self {
        ExportDocument {
            metadata: ExportMetadata {
                exported_at: Utc::now(),
                format_version: FORMAT_VERSION,
                generator: GENERATOR.to_string(),
            },
            config: result.config.clone(),
            metrics: result.metrics.clone(),
            trades: result.trades.clone(),
            equity_curve: result.equity_curve.clone(),
            signals: result.signals.clone(),
        }
    }

    pub fn into_result(self) -> BacktestResult {
        BacktestResult {
            config: self.config,
            trades: self.trades,
            signals: self.signals,
            equity_curve: self.equity_curve,
            metrics: self.metrics,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct JsonExportAdapter;

impl JsonExportAdapter {
    pub fn new() -> Self {
        JsonExportAdapter
    }

    /// Pretty-printed document with every float rounded.
    pub fn render(&self, result: &BacktestResult) -> Result<String, StrategylabError> {
        let mut value = serde_json::to_value(ExportDocument::new(result)).map_err(export_err)?;
        round_numbers(&mut value);
        serde_json::to_string_pretty(&value).map_err(export_err)
    }
}

impl ExportPort for JsonExportAdapter {
    fn write(&self, result: &BacktestResult, path: &Path) -> Result<Vec<PathBuf>, StrategylabError> {
        let json = self.render(result)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, json)?;
        Ok(vec![path.to_path_buf()])
    }
}

pub fn parse_export(json: &str) -> Result<ExportDocument, StrategylabError> {
    let doc: ExportDocument = serde_json::from_str(json).map_err(export_err)?;
    if doc.metadata.format_version > FORMAT_VERSION {
        return Err(StrategylabError::Export {
            reason: format!(
                "unsupported format version {} (max supported: {FORMAT_VERSION})",
                doc.metadata.format_version
            ),
        });
    }
    Ok(doc)
}

pub fn read_export(path: &Path) -> Result<ExportDocument, StrategylabError> {
    parse_export(&fs::read_to_string(path)?)
}

fn export_err(e: serde_json::Error) -> StrategylabError {
    StrategylabError::Export {
        reason: e.to_string(),
    }
}

fn round_numbers(value: &mut Value) {
    match value {
        Value::Number(n) if n.is_f64() => {
            if let Some(rounded) = n.as_f64().map(round).and_then(Number::from_f64) {
                *n = rounded;
            }
        }
        Value::Array(items) => items.iter_mut().for_each(round_numbers),
        Value::Object(map) => map.values_mut().for_each(round_numbers),
        _ => {}
    }
}

fn round(x: f64) -> f64 {
    let scale = 10f64.powi(DECIMALS);
    (x * scale).round() / scale
}
