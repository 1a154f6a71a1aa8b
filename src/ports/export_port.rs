//! Result export port trait.

use std::path::{Path, PathBuf};

use crate::domain::backtest::BacktestResult;
use crate::domain::error::StrategylabError;

pub trait ExportPort {
    /// Writes `result` at or next to `path` and returns the files written.
    fn write(&self, result: &BacktestResult, path: &Path) -> Result<Vec<PathBuf>, StrategylabError>;
}
