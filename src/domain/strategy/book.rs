//! Per-run position state shared by every strategy scan.

use crate::domain::ohlcv::OhlcvBar;
use crate::domain::position::{Side, Signal, SignalKind, Trade};

use super::params::RiskLimits;
use super::StrategyOutput;

pub const UNIT_SIZE: f64 = 1.0;
pub const END_OF_DATA: &str = "End of data";

/// Trade ledger for a single strategy run: at most one open trade, ids
/// counting up from 1.
#[derive(Debug, Default)]
pub struct PositionBook {
    next_id: u64,
    open: Option<Trade>,
    trades: Vec<Trade>,
    signals: Vec<Signal>,
}

impl PositionBook {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Self::default()
        }
    }

    pub fn is_flat(&self) -> bool {
        self.open.is_none()
    }

    /// Opens a long unit position at the bar close. Ignored when a trade is
    /// already open.
    pub fn enter(&mut self, bar: &OhlcvBar, reason: String) {
        if self.open.is_some() {
            return;
        }
        let trade = Trade::open(self.next_id, bar.timestamp, bar.close, Side::Long, UNIT_SIZE);
        self.next_id += 1;
        self.signals.push(Signal {
            timestamp: bar.timestamp,
            kind: SignalKind::Buy,
            price: bar.close,
            reason,
        });
        self.open = Some(trade);
    }

    /// Closes the open trade at the bar close.
    pub fn exit(&mut self, bar: &OhlcvBar, kind: SignalKind, reason: String) {
        let Some(mut trade) = self.open.take() else {
            return;
        };
        trade.close(bar.timestamp, bar.close, &reason);
        self.signals.push(Signal {
            timestamp: bar.timestamp,
            kind,
            price: bar.close,
            reason,
        });
        self.trades.push(trade);
    }

    /// Applies the exit precedence: a technical exit (if any) first, then
    /// the stop-loss and take-profit limits.
    pub fn exit_on(&mut self, bar: &OhlcvBar, technical: Option<String>, risk: &RiskLimits) {
        let Some(trade) = &self.open else {
            return;
        };
        let exit = match technical {
            Some(reason) => Some((SignalKind::Sell, reason)),
            None => risk
                .check(trade, bar.close)
                .map(|reason| (SignalKind::Exit, reason.to_string())),
        };
        if let Some((kind, reason)) = exit {
            self.exit(bar, kind, reason);
        }
    }

    /// Force-closes any open trade on the last bar and hands back the run
    /// output.
    pub fn finish(mut self, bars: &[OhlcvBar]) -> StrategyOutput {
        if let Some(last) = bars.last() {
            self.exit(last, SignalKind::Exit, END_OF_DATA.to_string());
        }
        StrategyOutput {
            trades: self.trades,
            signals: self.signals,
        }
    }
}
