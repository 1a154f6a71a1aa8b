//! CSV export: a trade tape and an equity curve next to each other.
//!
//! For an output path `out/run.csv` the files are `out/run_trades.csv` and
//! `out/run_equity.csv`.

use chrono::NaiveDateTime;
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::backtest::{BacktestResult, EquityPoint};
use crate::domain::error::StrategylabError;
use crate::domain::position::Trade;
use crate::ports::export_port::ExportPort;

const ISO_8601: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Default, Clone, Copy)]
pub struct CsvExportAdapter;

impl CsvExportAdapter {
    pub fn new() -> Self {
        CsvExportAdapter
    }
}

impl ExportPort for CsvExportAdapter {
    fn write(&self, result: &BacktestResult, path: &Path) -> Result<Vec<PathBuf>, StrategylabError> {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| StrategylabError::Export {
                reason: format!("no file name in {}", path.display()),
            })?;
        let dir = path.parent().unwrap_or_else(|| Path::new(""));
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)?;
        }

        let trades_path = dir.join(format!("{stem}_trades.csv"));
        let equity_path = dir.join(format!("{stem}_equity.csv"));
        fs::write(&trades_path, trades_csv(&result.trades)?)?;
        fs::write(&equity_path, equity_csv(&result.equity_curve)?)?;
        Ok(vec![trades_path, equity_path])
    }
}

pub fn trades_csv(trades: &[Trade]) -> Result<String, StrategylabError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "id",
        "side",
        "entry_timestamp",
        "entry_price",
        "exit_timestamp",
        "exit_price",
        "size",
        "pnl",
        "pnl_percent",
        "status",
        "exit_reason",
    ])
    .map_err(csv_err)?;

    for t in trades {
        wtr.write_record([
            t.id.to_string(),
            t.side.to_string(),
            timestamp(t.entry_timestamp),
            number(t.entry_price),
            t.exit_timestamp.map(timestamp).unwrap_or_default(),
            t.exit_price.map(number).unwrap_or_default(),
            number(t.size),
            t.pnl.map(number).unwrap_or_default(),
            t.pnl_percent.map(number).unwrap_or_default(),
            format!("{:?}", t.status).to_uppercase(),
            t.exit_reason.clone().unwrap_or_default(),
        ])
        .map_err(csv_err)?;
    }
    finish(wtr)
}

pub fn equity_csv(curve: &[EquityPoint]) -> Result<String, StrategylabError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["timestamp", "equity", "drawdown_percent", "benchmark_percent"])
        .map_err(csv_err)?;
    for p in curve {
        wtr.write_record([
            timestamp(p.timestamp),
            number(p.equity),
            number(p.drawdown_percent),
            number(p.benchmark_percent),
        ])
        .map_err(csv_err)?;
    }
    finish(wtr)
}

fn timestamp(ts: NaiveDateTime) -> String {
    ts.format(ISO_8601).to_string()
}

fn number(x: f64) -> String {
    format!("{x:.4}")
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String, StrategylabError> {
    let data = wtr.into_inner().map_err(|e| StrategylabError::Export {
        reason: format!("failed to flush CSV writer: {e}"),
    })?;
    String::from_utf8(data).map_err(|e| StrategylabError::Export {
        reason: format!("CSV output is not valid UTF-8: {e}"),
    })
}

fn csv_err(e: csv::Error) -> StrategylabError {
    StrategylabError::Export {
        reason: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::backtest::{run_backtest, BacktestConfig};
    use crate::domain::indicator::test_support::flat_bars;
    use crate::domain::position::Side;
    use crate::domain::strategy::{StrategyKind, StrategyParams};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn ts(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 2, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn trade_rows_are_formatted() {
        let mut trade = Trade::open(1, ts(1), 100.0, Side::Long, 1.0);
        trade.close(ts(5), 104.5, "Take profit");
        let open = Trade::open(2, ts(6), 99.0, Side::Long, 1.0);

        let csv = trades_csv(&[trade, open]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("id,side,entry_timestamp"));
        assert_eq!(
            lines[1],
            "1,LONG,2024-02-01T00:00:00,100.0000,2024-02-05T00:00:00,104.5000,1.0000,4.5000,4.5000,CLOSED,Take profit"
        );
        assert_eq!(lines[2], "2,LONG,2024-02-06T00:00:00,99.0000,,,1.0000,,,OPEN,");
    }

    #[test]
    fn writes_both_files() {
        let dir = TempDir::new().unwrap();
        let prices: Vec<f64> = (0..40).map(|i| 50.0 + (i as f64 / 3.0).sin() * 4.0).collect();
        let mut config = BacktestConfig::new(StrategyKind::EmaCrossover);
        config.params = StrategyParams::new()
            .with("fast_period", 2.0)
            .with("slow_period", 5.0);
        let result = run_backtest(&flat_bars(&prices), &config).unwrap();

        let written = CsvExportAdapter::new()
            .write(&result, &dir.path().join("run.csv"))
            .unwrap();
        assert_eq!(
            written,
            vec![dir.path().join("run_trades.csv"), dir.path().join("run_equity.csv")]
        );

        let equity = fs::read_to_string(&written[1]).unwrap();
        assert_eq!(equity.lines().count(), prices.len() + 1);
        let first = equity.lines().nth(1).unwrap();
        assert_eq!(first, "2024-01-01T00:00:00,10000.0000,0.0000,0.0000");

        let trades = fs::read_to_string(&written[0]).unwrap();
        assert_eq!(trades.lines().count(), result.trades.len() + 1);
    }
}
