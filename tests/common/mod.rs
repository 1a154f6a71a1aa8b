#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
pub use strategylab::domain::ohlcv::OhlcvBar;
use strategylab::domain::error::StrategylabError;
use strategylab::ports::data_port::DataPort;

/// Serves a fixed bar series, or a fixed failure.
pub struct MockDataPort {
    pub bars: Vec<OhlcvBar>,
    pub error: Option<String>,
}

impl MockDataPort {
    pub fn new(bars: Vec<OhlcvBar>) -> Self {
        Self { bars, error: None }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            bars: Vec::new(),
            error: Some(reason.to_string()),
        }
    }
}

impl DataPort for MockDataPort {
    fn load_bars(&self) -> Result<Vec<OhlcvBar>, StrategylabError> {
        match &self.error {
            Some(reason) => Err(StrategylabError::Data {
                reason: reason.clone(),
            }),
            None => Ok(self.bars.clone()),
        }
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

pub fn make_bar(timestamp: NaiveDateTime, close: f64) -> OhlcvBar {
    OhlcvBar {
        timestamp,
        open: close - 0.5,
        high: close + 1.0,
        low: close - 1.0,
        close,
        volume: 1000.0,
    }
}

/// Daily bars starting 2023-01-02, one per close.
pub fn bars_from_closes(closes: &[f64]) -> Vec<OhlcvBar> {
    let start = date(2023, 1, 2);
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| make_bar(start + chrono::Duration::days(i as i64), close))
        .collect()
}

/// A noisy uptrend with swings large enough to trigger every strategy.
pub fn wave_bars(count: usize) -> Vec<OhlcvBar> {
    let closes: Vec<f64> = (0..count)
        .map(|i| {
            let x = i as f64;
            100.0 + 0.05 * x + 8.0 * (x / 7.0).sin() + 3.0 * (x / 2.3).cos()
        })
        .collect();
    bars_from_closes(&closes)
}

/// Steadily falling prices.
pub fn falling_bars(count: usize) -> Vec<OhlcvBar> {
    let closes: Vec<f64> = (0..count).map(|i| 300.0 - 0.5 * i as f64).collect();
    bars_from_closes(&closes)
}

pub fn bars_to_csv(bars: &[OhlcvBar]) -> String {
    let mut csv = String::from("timestamp,open,high,low,close,volume\n");
    for b in bars {
        csv.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.timestamp.format("%Y-%m-%d"),
            b.open,
            b.high,
            b.low,
            b.close,
            b.volume
        ));
    }
    csv
}
