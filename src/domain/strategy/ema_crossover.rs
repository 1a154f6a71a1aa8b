//! Fast/slow EMA crossover.

use crate::domain::error::StrategylabError;
use crate::domain::indicator::{calculate_ema, cross_at, ema_warmup};
use crate::domain::ohlcv::{closes, OhlcvBar};

use super::params::{ParamReader, RiskLimits, StrategyParams};
use super::{PositionBook, StrategyOutput};

pub const DEFAULTS: &[(&str, f64)] = &[
    ("fast_period", 12.0),
    ("slow_period", 26.0),
    ("stop_loss_percent", 3.0),
    ("take_profit_percent", 6.0),
];

#[derive(Debug, Clone, PartialEq)]
pub struct EmaCrossoverParams {
    pub fast_period: usize,
    pub slow_period: usize,
    pub risk: RiskLimits,
}

impl EmaCrossoverParams {
    pub fn from_params(params: &StrategyParams) -> Result<Self, StrategylabError> {
        let reader = ParamReader::new(params, DEFAULTS);
        Ok(Self {
            fast_period: reader.period("fast_period")?,
            slow_period: reader.period("slow_period")?,
            risk: reader.risk()?,
        })
    }
}

pub fn run(bars: &[OhlcvBar], params: &StrategyParams) -> Result<StrategyOutput, StrategylabError> {
    let p = EmaCrossoverParams::from_params(params)?;
    let close = closes(bars);
    let fast = calculate_ema(&close, p.fast_period);
    let slow = calculate_ema(&close, p.slow_period);

    let mut book = PositionBook::new();
    let start = ema_warmup(p.fast_period.max(p.slow_period)).max(1);

    for (i, bar) in bars.iter().enumerate().skip(start) {
        let cross = cross_at(&fast, &slow, i);
        if book.is_flat() {
            if cross > 0 {
                book.enter(
                    bar,
                    format!("EMA({}) crossed above EMA({})", p.fast_period, p.slow_period),
                );
            }
            continue;
        }

        let technical = (cross < 0)
            .then(|| format!("EMA({}) crossed below EMA({})", p.fast_period, p.slow_period));
        book.exit_on(bar, technical, &p.risk);
    }

    Ok(book.finish(bars))
}
