//! CLI orchestration tests.
//!
//! Tests cover:
//! - Backtest, compare and optimize pipelines over a mock data port
//! - Config and data files on disk, as the binary reads them
//! - Exit code mapping for each error category

mod common;

use common::*;
use std::io::Write;
use std::path::Path;
use strategylab::adapters::csv_adapter::CsvDataAdapter;
use strategylab::adapters::file_config_adapter::FileConfigAdapter;
use strategylab::cli;
use strategylab::domain::error::StrategylabError;
use strategylab::domain::metrics::MetricField;
use strategylab::domain::strategy::StrategyKind;
use strategylab::ports::data_port::DataPort;
use tempfile::TempDir;

const VALID_INI: &str = r#"
[backtest]
data_file = prices.csv
initial_capital = 25000
commission_rate = 0.001
slippage_rate = 0.0005

[strategy]
id = ema-crossover
fast_period = 3
slow_period = 10

[optimizer]
metric = net_profit
fast_period = 3, 5
slow_period = 10, 20

[compare]
strategies = ema-crossover, breakout, rsi
"#;

fn config(content: &str) -> FileConfigAdapter {
    FileConfigAdapter::from_string(content).unwrap()
}

fn write_file(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    path
}

mod pipelines {
    use super::*;

    #[test]
    fn backtest_pipeline_prints_summary() {
        let port = MockDataPort::new(wave_bars(200));
        let mut out = Vec::new();
        let result = cli::run_backtest_pipeline(&port, &config(VALID_INI), &mut out).unwrap();

        assert_eq!(result.config.strategy, StrategyKind::EmaCrossover);
        assert!((result.config.initial_capital - 25_000.0).abs() < f64::EPSILON);
        assert_eq!(result.equity_curve.len(), 200);

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("EMA Crossover (ema-crossover)"));
        assert!(text.contains("Initial capital:   25000.00"));
    }

    #[test]
    fn compare_pipeline_uses_configured_list() {
        let port = MockDataPort::new(wave_bars(250));
        let mut out = Vec::new();
        let results = cli::run_compare_pipeline(&port, &config(VALID_INI), None, &mut out).unwrap();

        assert_eq!(results.len(), 3);
        let ema = results
            .iter()
            .find(|r| r.config.strategy == StrategyKind::EmaCrossover)
            .unwrap();
        assert_eq!(ema.config.params.get("fast_period"), Some(3.0));
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 4);
    }

    #[test]
    fn compare_pipeline_override_list() {
        let port = MockDataPort::new(wave_bars(250));
        let mut out = Vec::new();
        let results =
            cli::run_compare_pipeline(&port, &config(VALID_INI), Some("momentum,combined"), &mut out)
                .unwrap();
        let mut kinds: Vec<_> = results.iter().map(|r| r.config.strategy).collect();
        kinds.sort_by_key(|k| k.id());
        assert_eq!(kinds, vec![StrategyKind::Combined, StrategyKind::Momentum]);
    }

    #[test]
    fn optimize_pipeline_sweeps_the_grid() {
        let port = MockDataPort::new(wave_bars(250));
        let mut out = Vec::new();
        let best = cli::run_optimize_pipeline(&port, &config(VALID_INI), None, &mut out).unwrap();

        assert_eq!(best.total, 4);
        assert_eq!(best.evaluated, 4);
        assert_eq!(best.metric, Some(MetricField::NetProfit));
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("evaluated 4 of 4 combinations"));
    }

    #[test]
    fn optimize_metric_override() {
        let port = MockDataPort::new(wave_bars(250));
        let mut out = Vec::new();
        let best =
            cli::run_optimize_pipeline(&port, &config(VALID_INI), Some("sortino_ratio"), &mut out)
                .unwrap();
        assert_eq!(best.metric, Some(MetricField::SortinoRatio));

        let err = cli::run_optimize_pipeline(&port, &config(VALID_INI), Some("alpha"), &mut out)
            .unwrap_err();
        assert!(matches!(err, StrategylabError::ConfigInvalid { .. }));
    }

    #[test]
    fn data_port_failure_propagates() {
        let port = MockDataPort::failing("disk on fire");
        let mut out = Vec::new();
        let err = cli::run_backtest_pipeline(&port, &config(VALID_INI), &mut out).unwrap_err();
        assert!(matches!(err, StrategylabError::Data { reason } if reason == "disk on fire"));
    }

    #[test]
    fn empty_data_is_an_error() {
        let port = MockDataPort::new(Vec::new());
        let mut out = Vec::new();
        let err = cli::run_backtest_pipeline(&port, &config(VALID_INI), &mut out).unwrap_err();
        assert!(matches!(err, StrategylabError::Data { .. }));
    }
}

mod files_on_disk {
    use super::*;

    #[test]
    fn csv_data_feeds_the_pipeline() {
        let dir = TempDir::new().unwrap();
        let bars = wave_bars(120);
        let data_path = write_file(dir.path(), "prices.csv", &bars_to_csv(&bars));
        let config_path = write_file(dir.path(), "run.ini", VALID_INI);

        let adapter = FileConfigAdapter::from_file(&config_path).unwrap();
        let resolved = cli::resolve_data_path(&adapter, &config_path, None).unwrap();
        assert_eq!(resolved, data_path);

        let loaded = CsvDataAdapter::new(&resolved).load_bars().unwrap();
        assert_eq!(loaded, bars);

        let mut out = Vec::new();
        let result =
            cli::run_backtest_pipeline(&CsvDataAdapter::new(&resolved), &adapter, &mut out).unwrap();
        assert_eq!(result.equity_curve.len(), 120);
    }

    #[test]
    fn backtest_command_writes_export() {
        let dir = TempDir::new().unwrap();
        write_file(dir.path(), "prices.csv", &bars_to_csv(&wave_bars(150)));
        let config_path = write_file(dir.path(), "run.ini", VALID_INI);
        let output = dir.path().join("out").join("run.csv");

        let command = cli::Command::Backtest {
            config: config_path,
            data: None,
            output: Some(output),
            format: cli::ExportFormat::Csv,
        };
        let mut out = Vec::new();
        cli::execute(command, &mut out).unwrap();
        assert!(dir.path().join("out").join("run_trades.csv").exists());
        assert!(dir.path().join("out").join("run_equity.csv").exists());
    }

    #[test]
    fn indicator_dump_has_one_row_per_bar() {
        let bars = bars_from_closes(&[10.0, 11.0, 10.5]);
        let mut out = Vec::new();
        cli::write_indicator_csv(&bars, &"SMA(2)".parse().unwrap(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "timestamp,value");
        assert_eq!(lines[1], "2023-01-02T00:00:00,");
        assert_eq!(lines[2], "2023-01-03T00:00:00,10.500000");
        assert_eq!(lines[3], "2023-01-04T00:00:00,10.750000");
    }
}

mod exit_codes {
    use super::*;

    #[test]
    fn categories_map_to_distinct_codes() {
        let cases = [
            (StrategylabError::Io(std::io::Error::other("x")), 1),
            (
                StrategylabError::ConfigMissing {
                    section: "strategy".into(),
                    key: "id".into(),
                },
                2,
            ),
            (StrategylabError::Data { reason: "x".into() }, 3),
            (StrategylabError::UnknownStrategy { id: "x".into() }, 4),
            (StrategylabError::Export { reason: "x".into() }, 5),
        ];
        for (err, expected) in cases {
            assert_eq!(err.exit_code(), expected, "{err}");
        }
    }

    #[test]
    fn validate_command_reports_bad_config() {
        let dir = TempDir::new().unwrap();
        let good = write_file(dir.path(), "good.ini", VALID_INI);
        let bad = write_file(dir.path(), "bad.ini", "[strategy]\nid = martingale\n");

        let validate = |config| {
            let mut out = Vec::new();
            cli::execute(cli::Command::Validate { config }, &mut out).map(|()| out)
        };
        let out = validate(good).unwrap();
        assert!(String::from_utf8(out).unwrap().ends_with(": OK\n"));
        assert_eq!(validate(bad).unwrap_err().exit_code(), 4);
        assert_eq!(validate(dir.path().join("missing.ini")).unwrap_err().exit_code(), 1);
    }
}
