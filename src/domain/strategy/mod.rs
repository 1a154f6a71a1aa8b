//! Built-in trading strategies.
//!
//! Every strategy scans the bar series once, long only, holding at most one
//! position. Entries and exits fill at the bar close. A position still open
//! after the last bar is closed there with reason `"End of data"`.

pub mod atr_trailing;
pub mod book;
pub mod breakout;
pub mod combined;
pub mod ema_crossover;
pub mod mean_reversion;
pub mod momentum;
pub mod params;
pub mod rsi;
pub mod stochastic;
pub mod vwap_bounce;

pub use book::PositionBook;
pub use params::{RiskLimits, StrategyParams};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::error::StrategylabError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::position::{Signal, Trade};

/// Trades and signals produced by one strategy run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrategyOutput {
    pub trades: Vec<Trade>,
    pub signals: Vec<Signal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    MeanReversion,
    Momentum,
    VwapBounce,
    Rsi,
    Breakout,
    EmaCrossover,
    Stochastic,
    AtrTrailing,
    Combined,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 9] = [
        StrategyKind::MeanReversion,
        StrategyKind::Momentum,
        StrategyKind::VwapBounce,
        StrategyKind::Rsi,
        StrategyKind::Breakout,
        StrategyKind::EmaCrossover,
        StrategyKind::Stochastic,
        StrategyKind::AtrTrailing,
        StrategyKind::Combined,
    ];

    pub fn id(self) -> &'static str {
        match self {
            StrategyKind::MeanReversion => "mean-reversion",
            StrategyKind::Momentum => "momentum",
            StrategyKind::VwapBounce => "vwap-bounce",
            StrategyKind::Rsi => "rsi",
            StrategyKind::Breakout => "breakout",
            StrategyKind::EmaCrossover => "ema-crossover",
            StrategyKind::Stochastic => "stochastic",
            StrategyKind::AtrTrailing => "atr-trailing",
            StrategyKind::Combined => "combined",
        }
    }

    /// Human-readable name for listings and reports.
    pub fn name(self) -> &'static str {
        match self {
            StrategyKind::MeanReversion => "Bollinger/RSI Mean Reversion",
            StrategyKind::Momentum => "MACD Momentum",
            StrategyKind::VwapBounce => "VWAP Bounce",
            StrategyKind::Rsi => "RSI Reversal",
            StrategyKind::Breakout => "Channel Breakout",
            StrategyKind::EmaCrossover => "EMA Crossover",
            StrategyKind::Stochastic => "Stochastic Crossover",
            StrategyKind::AtrTrailing => "ATR Trailing Stop",
            StrategyKind::Combined => "Multi-Indicator Vote",
        }
    }

    pub fn defaults(self) -> &'static [(&'static str, f64)] {
        match self {
            StrategyKind::MeanReversion => mean_reversion::DEFAULTS,
            StrategyKind::Momentum => momentum::DEFAULTS,
            StrategyKind::VwapBounce => vwap_bounce::DEFAULTS,
            StrategyKind::Rsi => rsi::DEFAULTS,
            StrategyKind::Breakout => breakout::DEFAULTS,
            StrategyKind::EmaCrossover => ema_crossover::DEFAULTS,
            StrategyKind::Stochastic => stochastic::DEFAULTS,
            StrategyKind::AtrTrailing => atr_trailing::DEFAULTS,
            StrategyKind::Combined => combined::DEFAULTS,
        }
    }

    pub fn default_params(self) -> StrategyParams {
        StrategyParams::from(self.defaults())
    }

    /// Runs the strategy over `bars`. Keys absent from `params` take their
    /// default value.
    pub fn run(
        self,
        bars: &[OhlcvBar],
        params: &StrategyParams,
    ) -> Result<StrategyOutput, StrategylabError> {
        match self {
            StrategyKind::MeanReversion => mean_reversion::run(bars, params),
            StrategyKind::Momentum => momentum::run(bars, params),
            StrategyKind::VwapBounce => vwap_bounce::run(bars, params),
            StrategyKind::Rsi => rsi::run(bars, params),
            StrategyKind::Breakout => breakout::run(bars, params),
            StrategyKind::EmaCrossover => ema_crossover::run(bars, params),
            StrategyKind::Stochastic => stochastic::run(bars, params),
            StrategyKind::AtrTrailing => atr_trailing::run(bars, params),
            StrategyKind::Combined => combined::run(bars, params),
        }
    }

    /// Checks `params` (over the defaults) without running anything.
    pub fn validate_params(self, params: &StrategyParams) -> Result<(), StrategylabError> {
        match self {
            StrategyKind::MeanReversion => mean_reversion::MeanReversionParams::from_params(params).map(drop),
            StrategyKind::Momentum => momentum::MomentumParams::from_params(params).map(drop),
            StrategyKind::VwapBounce => vwap_bounce::VwapBounceParams::from_params(params).map(drop),
            StrategyKind::Rsi => rsi::RsiParams::from_params(params).map(drop),
            StrategyKind::Breakout => breakout::BreakoutParams::from_params(params).map(drop),
            StrategyKind::EmaCrossover => ema_crossover::EmaCrossoverParams::from_params(params).map(drop),
            StrategyKind::Stochastic => stochastic::StochasticParams::from_params(params).map(drop),
            StrategyKind::AtrTrailing => atr_trailing::AtrTrailingParams::from_params(params).map(drop),
            StrategyKind::Combined => combined::CombinedParams::from_params(params).map(drop),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for StrategyKind {
    type Err = StrategylabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        StrategyKind::ALL
            .into_iter()
            .find(|kind| kind.id() == wanted)
            .ok_or_else(|| StrategylabError::UnknownStrategy { id: s.to_string() })
    }
}
