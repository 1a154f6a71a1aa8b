//! Reads run settings from a [`ConfigPort`] and validates them.
//!
//! Recognised sections:
//!
//! ```ini
//! [backtest]
//! data_file = prices.csv
//! initial_capital = 10000
//! commission_rate = 0.001
//! slippage_rate = 0.0005
//! start_date = 2023-01-01
//! end_date = 2023-12-31
//!
//! [strategy]
//! id = ema-crossover
//! fast_period = 10
//!
//! [optimizer]
//! metric = sharpe_ratio
//! fast_period = 5, 8, 12
//!
//! [compare]
//! strategies = rsi, breakout, momentum
//! ```

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::domain::backtest::{BacktestConfig, DEFAULT_INITIAL_CAPITAL};
use crate::domain::error::StrategylabError;
use crate::domain::metrics::MetricField;
use crate::domain::optimizer::ParameterGrid;
use crate::domain::strategy::{StrategyKind, StrategyParams};
use crate::ports::config_port::ConfigPort;

const BACKTEST: &str = "backtest";
const STRATEGY: &str = "strategy";
const OPTIMIZER: &str = "optimizer";
const COMPARE: &str = "compare";

pub const DEFAULT_METRIC: MetricField = MetricField::SharpeRatio;

fn invalid(section: &str, key: &str, reason: String) -> StrategylabError {
    StrategylabError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason,
    }
}

/// Builds a validated [`BacktestConfig`] from `[backtest]` and `[strategy]`.
pub fn load_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, StrategylabError> {
    let strategy: StrategyKind = config
        .get_string(STRATEGY, "id")
        .ok_or_else(|| StrategylabError::ConfigMissing {
            section: STRATEGY.to_string(),
            key: "id".to_string(),
        })?
        .parse()?;

    let params = load_strategy_params(config)?;
    strategy.validate_params(&params)?;

    let backtest = BacktestConfig {
        strategy,
        params,
        initial_capital: read_number(config, BACKTEST, "initial_capital")?
            .unwrap_or(DEFAULT_INITIAL_CAPITAL),
        commission_rate: read_number(config, BACKTEST, "commission_rate")?.unwrap_or(0.0),
        slippage_rate: read_number(config, BACKTEST, "slippage_rate")?.unwrap_or(0.0),
        start: read_timestamp(config, "start_date", NaiveTime::MIN)?,
        end: read_timestamp(config, "end_date", end_of_day())?,
    };
    backtest.validate()?;
    Ok(backtest)
}

/// Every `[strategy]` key except `id`, as numbers.
pub fn load_strategy_params(config: &dyn ConfigPort) -> Result<StrategyParams, StrategylabError> {
    let mut params = StrategyParams::new();
    for key in config.keys(STRATEGY) {
        if key == "id" {
            continue;
        }
        if let Some(value) = read_number(config, STRATEGY, &key)? {
            params.set(&key, value);
        }
    }
    Ok(params)
}

pub fn data_file(config: &dyn ConfigPort) -> Option<String> {
    config.get_string(BACKTEST, "data_file")
}

/// `[optimizer] metric`, defaulting to the Sharpe ratio.
pub fn load_metric(config: &dyn ConfigPort) -> Result<MetricField, StrategylabError> {
    match config.get_string(OPTIMIZER, "metric") {
        Some(name) => name.parse(),
        None => Ok(DEFAULT_METRIC),
    }
}

/// Every `[optimizer]` key except `metric`, as comma-separated candidates.
pub fn load_parameter_grid(config: &dyn ConfigPort) -> Result<ParameterGrid, StrategylabError> {
    let mut grid = ParameterGrid::new();
    for key in config.keys(OPTIMIZER) {
        if key == "metric" {
            continue;
        }
        let Some(raw) = config.get_string(OPTIMIZER, &key) else {
            continue;
        };
        let values = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<f64>()
                    .map_err(|_| invalid(OPTIMIZER, &key, format!("'{s}' is not a number")))
            })
            .collect::<Result<Vec<f64>, _>>()?;
        if values.is_empty() {
            return Err(invalid(OPTIMIZER, &key, "needs at least one candidate".to_string()));
        }
        grid.insert(&key, values);
    }
    Ok(grid)
}

/// `[compare] strategies`, or every built-in strategy when absent.
pub fn load_compare_strategies(config: &dyn ConfigPort) -> Result<Vec<StrategyKind>, StrategylabError> {
    match config.get_string(COMPARE, "strategies") {
        Some(list) => parse_strategy_list(&list),
        None => Ok(StrategyKind::ALL.to_vec()),
    }
}

pub fn parse_strategy_list(list: &str) -> Result<Vec<StrategyKind>, StrategylabError> {
    let kinds = list
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect::<Result<Vec<StrategyKind>, _>>()?;
    if kinds.is_empty() {
        return Err(invalid(COMPARE, "strategies", "no strategies listed".to_string()));
    }
    Ok(kinds)
}

/// Checks every section the file defines.
pub fn validate_config(config: &dyn ConfigPort) -> Result<(), StrategylabError> {
    load_backtest_config(config)?;
    if config.has_section(OPTIMIZER) {
        load_metric(config)?;
        load_parameter_grid(config)?;
    }
    if config.has_section(COMPARE) {
        load_compare_strategies(config)?;
    }
    Ok(())
}

fn read_number(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<f64>, StrategylabError> {
    let Some(raw) = config.get_string(section, key) else {
        return Ok(None);
    };
    let value: f64 = raw
        .parse()
        .map_err(|_| invalid(section, key, format!("'{raw}' is not a number")))?;
    if !value.is_finite() {
        return Err(invalid(section, key, "must be finite".to_string()));
    }
    Ok(Some(value))
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN)
}

/// Accepts `YYYY-MM-DD` (at `date_time`) or a full `YYYY-MM-DD HH:MM:SS`.
fn read_timestamp(
    config: &dyn ConfigPort,
    key: &str,
    date_time: NaiveTime,
) -> Result<Option<NaiveDateTime>, StrategylabError> {
    let Some(raw) = config.get_string(BACKTEST, key) else {
        return Ok(None);
    };
    if let Ok(ts) = NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(Some(ts));
    }
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .map(|date| Some(date.and_time(date_time)))
        .map_err(|_| invalid(BACKTEST, key, format!("invalid {key} '{raw}', expected YYYY-MM-DD")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    const FULL: &str = r#"
[backtest]
data_file = prices.csv
initial_capital = 50000
commission_rate = 0.001
slippage_rate = 0.0005
start_date = 2023-01-01
end_date = 2023-06-30

[strategy]
id = ema-crossover
fast_period = 10
slow_period = 30

[optimizer]
metric = total_return
fast_period = 5, 8, 12
slow_period = 20,30

[compare]
strategies = rsi, breakout
"#;

    #[test]
    fn loads_full_backtest_config() {
        let cfg = config(FULL);
        let backtest = load_backtest_config(&cfg).unwrap();

        assert_eq!(backtest.strategy, StrategyKind::EmaCrossover);
        assert_eq!(backtest.params.get("fast_period"), Some(10.0));
        assert_eq!(backtest.params.get("slow_period"), Some(30.0));
        assert!((backtest.initial_capital - 50_000.0).abs() < f64::EPSILON);
        assert!((backtest.commission_rate - 0.001).abs() < f64::EPSILON);
        assert_eq!(
            backtest.start.unwrap().to_string(),
            "2023-01-01 00:00:00"
        );
        assert_eq!(backtest.end.unwrap().to_string(), "2023-06-30 23:59:59");
        assert_eq!(data_file(&cfg), Some("prices.csv".to_string()));
    }

    #[test]
    fn defaults_apply_for_missing_backtest_keys() {
        let cfg = config("[strategy]\nid = rsi\n");
        let backtest = load_backtest_config(&cfg).unwrap();
        assert!((backtest.initial_capital - DEFAULT_INITIAL_CAPITAL).abs() < f64::EPSILON);
        assert_eq!(backtest.commission_rate, 0.0);
        assert!(backtest.start.is_none());
        assert!(backtest.params.is_empty());
    }

    #[test]
    fn missing_strategy_id() {
        let cfg = config("[backtest]\ninitial_capital = 100\n");
        assert!(matches!(
            load_backtest_config(&cfg),
            Err(StrategylabError::ConfigMissing { key, .. }) if key == "id"
        ));
    }

    #[test]
    fn unknown_strategy_id() {
        let cfg = config("[strategy]\nid = martingale\n");
        assert!(matches!(
            load_backtest_config(&cfg),
            Err(StrategylabError::UnknownStrategy { .. })
        ));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let cases = [
            "[strategy]\nid = rsi\nrsi_period = fourteen\n",
            "[strategy]\nid = rsi\nrsi_period = 0\n",
            "[strategy]\nid = rsi\n[backtest]\ninitial_capital = -5\n",
            "[strategy]\nid = rsi\n[backtest]\nstart_date = 01/02/2023\n",
            "[strategy]\nid = rsi\n[backtest]\nstart_date = 2023-05-01\nend_date = 2023-01-01\n",
        ];
        for case in cases {
            assert!(load_backtest_config(&config(case)).is_err(), "{case}");
        }
    }

    #[test]
    fn optimizer_grid_and_metric() {
        let cfg = config(FULL);
        assert_eq!(load_metric(&cfg).unwrap(), MetricField::TotalReturn);
        let grid = load_parameter_grid(&cfg).unwrap();
        assert_eq!(grid.len(), 6);
        assert_eq!(grid.keys().collect::<Vec<_>>(), vec!["fast_period", "slow_period"]);
    }

    #[test]
    fn optimizer_defaults_and_errors() {
        let cfg = config("[strategy]\nid = rsi\n");
        assert_eq!(load_metric(&cfg).unwrap(), DEFAULT_METRIC);
        assert!(load_parameter_grid(&cfg).unwrap().keys().next().is_none());

        let cfg = config("[optimizer]\nlookback = 10, x\n");
        assert!(load_parameter_grid(&cfg).is_err());
        let cfg = config("[optimizer]\nmetric = alpha\n");
        assert!(load_metric(&cfg).is_err());
    }

    #[test]
    fn compare_strategy_list() {
        let cfg = config(FULL);
        assert_eq!(
            load_compare_strategies(&cfg).unwrap(),
            vec![StrategyKind::Rsi, StrategyKind::Breakout]
        );
        let cfg = config("[strategy]\nid = rsi\n");
        assert_eq!(load_compare_strategies(&cfg).unwrap().len(), StrategyKind::ALL.len());
        assert!(parse_strategy_list("rsi, nope").is_err());
        assert!(parse_strategy_list(" , ").is_err());
    }

    #[test]
    fn validate_config_checks_all_sections() {
        assert!(validate_config(&config(FULL)).is_ok());
        let broken = format!("{FULL}\n[optimizer]\nmetric = bogus\n");
        assert!(validate_config(&config(&broken)).is_err());
    }
}
