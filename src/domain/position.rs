//! Trades and signals emitted by strategies.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Long,
    Short,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeStatus {
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalKind {
    Buy,
    Sell,
    Exit,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalKind::Buy => write!(f, "BUY"),
            SignalKind::Sell => write!(f, "SELL"),
            SignalKind::Exit => write!(f, "EXIT"),
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Long => write!(f, "LONG"),
            Side::Short => write!(f, "SHORT"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub timestamp: NaiveDateTime,
    pub kind: SignalKind,
    pub price: f64,
    pub reason: String,
}

/// A single round trip. Exit fields are populated only by [`Trade::close`],
/// so they are present exactly when `status` is `Closed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: u64,
    pub entry_timestamp: NaiveDateTime,
    pub entry_price: f64,
    pub exit_timestamp: Option<NaiveDateTime>,
    pub exit_price: Option<f64>,
    pub side: Side,
    pub size: f64,
    pub pnl: Option<f64>,
    pub pnl_percent: Option<f64>,
    pub status: TradeStatus,
    pub exit_reason: Option<String>,
}

impl Trade {
    pub fn open(id: u64, timestamp: NaiveDateTime, price: f64, side: Side, size: f64) -> Self {
        Trade {
            id,
            entry_timestamp: timestamp,
            entry_price: price,
            exit_timestamp: None,
            exit_price: None,
            side,
            size,
            pnl: None,
            pnl_percent: None,
            status: TradeStatus::Open,
            exit_reason: None,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.status == TradeStatus::Closed
    }

    /// Profit of the position marked at `price`.
    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        match self.side {
            Side::Long => (price - self.entry_price) * self.size,
            Side::Short => (self.entry_price - price) * self.size,
        }
    }

    /// Return of the position marked at `price`, in percent of entry.
    pub fn pnl_percent_at(&self, price: f64) -> f64 {
        if self.entry_price == 0.0 {
            return 0.0;
        }
        let direction = match self.side {
            Side::Long => 1.0,
            Side::Short => -1.0,
        };
        direction * (price - self.entry_price) / self.entry_price * 100.0
    }

    /// Closes the trade. A trade is closed at most once; later calls are
    /// ignored.
    pub fn close(&mut self, timestamp: NaiveDateTime, price: f64, reason: &str) {
        if self.is_closed() {
            return;
        }
        self.exit_timestamp = Some(timestamp);
        self.exit_price = Some(price);
        self.pnl = Some(self.unrealized_pnl(price));
        self.pnl_percent = Some(self.pnl_percent_at(price));
        self.exit_reason = Some(reason.to_string());
        self.status = TradeStatus::Closed;
    }

    /// Holding time in hours, if closed.
    pub fn duration_hours(&self) -> Option<f64> {
        self.exit_timestamp
            .map(|exit| (exit - self.entry_timestamp).num_seconds() as f64 / 3600.0)
    }
}
