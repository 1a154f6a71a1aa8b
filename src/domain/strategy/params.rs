//! Strategy parameter maps and typed readers over them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::error::StrategylabError;
use crate::domain::position::Trade;

/// String-keyed numeric parameters. Keys missing here fall back to the
/// strategy's default table; unknown keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StrategyParams(BTreeMap<String, f64>);

impl StrategyParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: f64) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: &str, value: f64) {
        self.0.insert(key.to_string(), value);
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.0.get(key).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Returns `defaults` overridden by every key present in `self`.
    pub fn merged_over(&self, defaults: &StrategyParams) -> StrategyParams {
        let mut merged = defaults.clone();
        for (key, value) in self.iter() {
            merged.set(key, value);
        }
        merged
    }
}

impl From<&[(&str, f64)]> for StrategyParams {
    fn from(pairs: &[(&str, f64)]) -> Self {
        pairs.iter().map(|&(k, v)| (k.to_string(), v)).collect()
    }
}

impl FromIterator<(String, f64)> for StrategyParams {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        StrategyParams(iter.into_iter().collect())
    }
}

/// Reads typed values from caller parameters, falling back to a default
/// table.
pub(crate) struct ParamReader<'a> {
    params: &'a StrategyParams,
    defaults: &'static [(&'static str, f64)],
}

impl<'a> ParamReader<'a> {
    pub(crate) fn new(params: &'a StrategyParams, defaults: &'static [(&'static str, f64)]) -> Self {
        Self { params, defaults }
    }

    pub(crate) fn number(&self, key: &str) -> Result<f64, StrategylabError> {
        let value = self
            .params
            .get(key)
            .or_else(|| self.defaults.iter().find(|(k, _)| *k == key).map(|(_, v)| *v))
            .ok_or_else(|| StrategylabError::invalid_param(key, f64::NAN, "no value and no default"))?;
        if !value.is_finite() {
            return Err(StrategylabError::invalid_param(key, value, "must be finite"));
        }
        Ok(value)
    }

    /// A whole number of bars, at least 1.
    pub(crate) fn period(&self, key: &str) -> Result<usize, StrategylabError> {
        let value = self.number(key)?;
        if value < 1.0 || value.fract() != 0.0 {
            return Err(StrategylabError::invalid_param(
                key,
                value,
                "must be a whole number of at least 1",
            ));
        }
        Ok(value as usize)
    }

    pub(crate) fn non_negative(&self, key: &str) -> Result<f64, StrategylabError> {
        let value = self.number(key)?;
        if value < 0.0 {
            return Err(StrategylabError::invalid_param(key, value, "must not be negative"));
        }
        Ok(value)
    }

    pub(crate) fn positive(&self, key: &str) -> Result<f64, StrategylabError> {
        let value = self.number(key)?;
        if value <= 0.0 {
            return Err(StrategylabError::invalid_param(key, value, "must be positive"));
        }
        Ok(value)
    }

    /// A threshold on a 0..=100 oscillator scale.
    pub(crate) fn level(&self, key: &str) -> Result<f64, StrategylabError> {
        let value = self.number(key)?;
        if !(0.0..=100.0).contains(&value) {
            return Err(StrategylabError::invalid_param(key, value, "must be within 0..=100"));
        }
        Ok(value)
    }

    pub(crate) fn risk(&self) -> Result<RiskLimits, StrategylabError> {
        Ok(RiskLimits {
            stop_loss_percent: self.non_negative("stop_loss_percent")?,
            take_profit_percent: self.non_negative("take_profit_percent")?,
        })
    }
}

/// Percentage stop-loss and take-profit. A zero limit is disabled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskLimits {
    pub stop_loss_percent: f64,
    pub take_profit_percent: f64,
}

impl RiskLimits {
    /// Exit reason when the trade marked at `price` breaches a limit.
    /// The stop is checked before the target.
    pub fn check(&self, trade: &Trade, price: f64) -> Option<&'static str> {
        let pnl_percent = trade.pnl_percent_at(price);
        if self.stop_loss_percent > 0.0 && pnl_percent <= -self.stop_loss_percent {
            Some("Stop loss")
        } else if self.take_profit_percent > 0.0 && pnl_percent >= self.take_profit_percent {
            Some("Take profit")
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::position::Side;
    use chrono::NaiveDate;

    const DEFAULTS: &[(&str, f64)] = &[
        ("period", 14.0),
        ("multiplier", 2.5),
        ("stop_loss_percent", 2.0),
        ("take_profit_percent", 4.0),
    ];

    #[test]
    fn reader_prefers_caller_values() {
        let params = StrategyParams::new().with("period", 20.0);
        let reader = ParamReader::new(&params, DEFAULTS);
        assert_eq!(reader.period("period").unwrap(), 20);
        assert_eq!(reader.number("multiplier").unwrap(), 2.5);
    }

    #[test]
    fn reader_rejects_bad_periods() {
        for bad in [0.0, -3.0, 2.5, f64::NAN] {
            let params = StrategyParams::new().with("period", bad);
            let reader = ParamReader::new(&params, DEFAULTS);
            assert!(reader.period("period").is_err(), "{bad}");
        }
    }

    #[test]
    fn reader_missing_key_without_default() {
        let params = StrategyParams::new();
        let reader = ParamReader::new(&params, DEFAULTS);
        assert!(reader.number("unknown").is_err());
    }

    #[test]
    fn reader_level_bounds() {
        let params = StrategyParams::new().with("oversold", 120.0);
        let reader = ParamReader::new(&params, &[]);
        assert!(reader.level("oversold").is_err());
    }

    #[test]
    fn merged_over_overrides_defaults() {
        let defaults = StrategyParams::from(DEFAULTS);
        let merged = StrategyParams::new().with("period", 9.0).merged_over(&defaults);
        assert_eq!(merged.get("period"), Some(9.0));
        assert_eq!(merged.get("multiplier"), Some(2.5));
    }

    #[test]
    fn risk_limits_stop_before_target() {
        let trade = Trade::open(
            1,
            NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            100.0,
            Side::Long,
            1.0,
        );
        let limits = RiskLimits {
            stop_loss_percent: 2.0,
            take_profit_percent: 4.0,
        };
        assert_eq!(limits.check(&trade, 97.5), Some("Stop loss"));
        assert_eq!(limits.check(&trade, 105.0), Some("Take profit"));
        assert_eq!(limits.check(&trade, 101.0), None);

        let disabled = RiskLimits {
            stop_loss_percent: 0.0,
            take_profit_percent: 0.0,
        };
        assert_eq!(disabled.check(&trade, 1.0), None);
    }

    #[test]
    fn params_serialize_as_plain_map() {
        let params = StrategyParams::new().with("a", 1.0).with("b", 2.5);
        let json = serde_json::to_string(&params).unwrap();
        assert_eq!(json, r#"{"a":1.0,"b":2.5}"#);
    }
}
