//! Intraday VWAP bounce.

use crate::domain::error::StrategylabError;
use crate::domain::indicator::{calculate_rsi, calculate_vwap};
use crate::domain::ohlcv::{closes, OhlcvBar};

use super::params::{ParamReader, RiskLimits, StrategyParams};
use super::{PositionBook, StrategyOutput};

pub const DEFAULTS: &[(&str, f64)] = &[
    ("deviation_percent", 1.0),
    ("rsi_period", 14.0),
    ("rsi_lower", 40.0),
    ("rsi_upper", 60.0),
    ("stop_loss_percent", 1.5),
    ("take_profit_percent", 3.0),
];

#[derive(Debug, Clone, PartialEq)]
pub struct VwapBounceParams {
    pub deviation_percent: f64,
    pub rsi_period: usize,
    pub rsi_lower: f64,
    pub rsi_upper: f64,
    pub risk: RiskLimits,
}

impl VwapBounceParams {
    pub fn from_params(params: &StrategyParams) -> Result<Self, StrategylabError> {
        let reader = ParamReader::new(params, DEFAULTS);
        Ok(Self {
            deviation_percent: reader.non_negative("deviation_percent")?,
            rsi_period: reader.period("rsi_period")?,
            rsi_lower: reader.level("rsi_lower")?,
            rsi_upper: reader.level("rsi_upper")?,
            risk: reader.risk()?,
        })
    }
}

/// Buys a close stretched at least `deviation_percent` below session VWAP
/// while RSI is neutral; sells once price is back at VWAP.
pub fn run(bars: &[OhlcvBar], params: &StrategyParams) -> Result<StrategyOutput, StrategylabError> {
    let p = VwapBounceParams::from_params(params)?;
    let close = closes(bars);
    let vwap = calculate_vwap(bars);
    let rsi = calculate_rsi(&close, p.rsi_period);

    let mut book = PositionBook::new();

    for i in p.rsi_period..bars.len() {
        let bar = &bars[i];
        let (Some(vwap_now), Some(rsi_now)) = (vwap[i], rsi[i]) else {
            continue;
        };

        if book.is_flat() {
            let threshold = vwap_now * (1.0 - p.deviation_percent / 100.0);
            if bar.close <= threshold && (p.rsi_lower..=p.rsi_upper).contains(&rsi_now) {
                book.enter(
                    bar,
                    format!("Close {:.2} below VWAP {:.2}, RSI {:.1}", bar.close, vwap_now, rsi_now),
                );
            }
            continue;
        }

        let technical = (bar.close >= vwap_now)
            .then(|| format!("Close {:.2} back at VWAP {:.2}", bar.close, vwap_now));
        book.exit_on(bar, technical, &p.risk);
    }

    Ok(book.finish(bars))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::flat_bars;
    use crate::domain::position::SignalKind;
    use chrono::Duration;

    fn hourly(prices: &[f64]) -> Vec<OhlcvBar> {
        let mut bars = flat_bars(prices);
        let open = bars[0].timestamp + Duration::hours(9);
        for (i, bar) in bars.iter_mut().enumerate() {
            bar.timestamp = open + Duration::hours(i as i64);
        }
        bars
    }

    #[test]
    fn bounces_back_to_vwap() {
        let bars = hourly(&[
            100.0, 102.0, 100.0, 102.0, 100.0, 102.0, 100.0, 102.0, 99.5, 98.5, 99.0, 100.5, 101.0,
        ]);
        let params = StrategyParams::new().with("rsi_period", 4.0);
        let output = run(&bars, &params).unwrap();

        assert_eq!(output.trades.len(), 1);
        let trade = &output.trades[0];
        assert_eq!(trade.entry_price, 99.5);
        assert_eq!(trade.exit_price, Some(100.5));
        assert_eq!(output.signals[1].kind, SignalKind::Sell);
    }

    #[test]
    fn rsi_band_blocks_entry() {
        let bars = hourly(&[
            100.0, 102.0, 100.0, 102.0, 100.0, 102.0, 100.0, 102.0, 99.5, 98.5, 99.0, 100.5, 101.0,
        ]);
        let params = StrategyParams::new()
            .with("rsi_period", 4.0)
            .with("rsi_lower", 45.0);
        let output = run(&bars, &params).unwrap();
        assert!(output.trades.is_empty());
    }
}
