//! Market data port trait.

use crate::domain::error::StrategylabError;
use crate::domain::ohlcv::OhlcvBar;

pub trait DataPort {
    /// Loads bars sorted by ascending timestamp.
    fn load_bars(&self) -> Result<Vec<OhlcvBar>, StrategylabError>;
}
