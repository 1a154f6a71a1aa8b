//! MACD momentum with a moving-average trend filter.

use crate::domain::error::StrategylabError;
use crate::domain::indicator::{calculate_macd, calculate_sma, cross_at, macd_warmup};
use crate::domain::ohlcv::{closes, OhlcvBar};

use super::params::{ParamReader, RiskLimits, StrategyParams};
use super::{PositionBook, StrategyOutput};

pub const DEFAULTS: &[(&str, f64)] = &[
    ("fast_period", 12.0),
    ("slow_period", 26.0),
    ("signal_period", 9.0),
    ("trend_fast", 50.0),
    ("trend_slow", 200.0),
    ("stop_loss_percent", 3.0),
    ("take_profit_percent", 6.0),
];

#[derive(Debug, Clone, PartialEq)]
pub struct MomentumParams {
    pub fast_period: usize,
    pub slow_period: usize,
    pub signal_period: usize,
    pub trend_fast: usize,
    pub trend_slow: usize,
    pub risk: RiskLimits,
}

impl MomentumParams {
    pub fn from_params(params: &StrategyParams) -> Result<Self, StrategylabError> {
        let reader = ParamReader::new(params, DEFAULTS);
        Ok(Self {
            fast_period: reader.period("fast_period")?,
            slow_period: reader.period("slow_period")?,
            signal_period: reader.period("signal_period")?,
            trend_fast: reader.period("trend_fast")?,
            trend_slow: reader.period("trend_slow")?,
            risk: reader.risk()?,
        })
    }
}

/// Buys when the MACD line crosses above its signal line while the fast
/// trend average sits above the slow one; sells on the opposite cross.
pub fn run(bars: &[OhlcvBar], params: &StrategyParams) -> Result<StrategyOutput, StrategylabError> {
    let p = MomentumParams::from_params(params)?;
    let close = closes(bars);
    let macd = calculate_macd(&close, p.fast_period, p.slow_period, p.signal_period);
    let trend_fast = calculate_sma(&close, p.trend_fast);
    let trend_slow = calculate_sma(&close, p.trend_slow);

    let mut book = PositionBook::new();
    let start = (p.trend_fast.max(p.trend_slow) - 1)
        .max(macd_warmup(p.fast_period, p.slow_period, p.signal_period));

    for i in start.max(1)..bars.len() {
        let bar = &bars[i];
        let (Some(fast), Some(slow)) = (trend_fast[i], trend_slow[i]) else {
            continue;
        };
        let cross = cross_at(&macd.macd, &macd.signal, i);

        if book.is_flat() {
            if cross > 0 && fast > slow {
                book.enter(bar, "MACD crossed above signal in uptrend".to_string());
            }
            continue;
        }

        let technical = (cross < 0).then(|| "MACD crossed below signal".to_string());
        book.exit_on(bar, technical, &p.risk);
    }

    Ok(book.finish(bars))
}
