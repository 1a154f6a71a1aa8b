//! CLI definition and dispatch.

use clap::{Parser, Subcommand, ValueEnum};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};

use crate::adapters::csv_adapter::CsvDataAdapter;
use crate::adapters::csv_export_adapter::CsvExportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_export_adapter::JsonExportAdapter;
use crate::domain::backtest::{run_backtest, BacktestResult};
use crate::domain::compare::compare_strategies;
use crate::domain::config_validation::{
    data_file, load_backtest_config, load_compare_strategies, load_metric, load_parameter_grid,
    parse_strategy_list, validate_config,
};
use crate::domain::error::StrategylabError;
use crate::domain::indicator::IndicatorType;
use crate::domain::indicator_helpers::compute_indicator;
use crate::domain::metrics::MetricField;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::optimizer::{OptimizationResult, Optimizer};
use crate::domain::strategy::{StrategyKind, StrategyParams};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::export_port::ExportPort;

#[derive(Parser, Debug)]
#[command(name = "strategylab", version, about = "Trading strategy backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one strategy over a price file
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Price CSV, overriding [backtest] data_file
        #[arg(short, long)]
        data: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,
    },
    /// Rank several strategies by Sharpe ratio
    Compare {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        data: Option<PathBuf>,
        /// Comma-separated strategy ids, overriding [compare] strategies
        #[arg(long)]
        strategies: Option<String>,
    },
    /// Sweep the [optimizer] parameter grid
    Optimize {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        data: Option<PathBuf>,
        /// Metric to maximize, overriding [optimizer] metric
        #[arg(long)]
        metric: Option<String>,
    },
    /// List strategies and their default parameters
    Strategies,
    /// Print an indicator series as CSV
    Indicators {
        #[arg(short, long)]
        data: PathBuf,
        /// e.g. "SMA(20)", "MACD(12,26,9)", "BOLLINGER(20,2)"
        #[arg(short, long)]
        indicator: String,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    fn exporter(self) -> Box<dyn ExportPort> {
        match self {
            ExportFormat::Json => Box::new(JsonExportAdapter::new()),
            ExportFormat::Csv => Box::new(CsvExportAdapter::new()),
        }
    }
}

pub fn run(cli: Cli) -> ExitCode {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match execute(cli.command, &mut out) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

/// Runs one command, writing its report to `out`.
pub fn execute(command: Command, out: &mut dyn Write) -> Result<(), StrategylabError> {
    match command {
        Command::Backtest {
            config,
            data,
            output,
            format,
        } => run_backtest_command(&config, data.as_deref(), output.as_deref(), format, out),
        Command::Compare {
            config,
            data,
            strategies,
        } => run_compare_command(&config, data.as_deref(), strategies.as_deref(), out),
        Command::Optimize {
            config,
            data,
            metric,
        } => run_optimize_command(&config, data.as_deref(), metric.as_deref(), out),
        Command::Strategies => write_strategies(out),
        Command::Indicators { data, indicator } => run_indicators_command(&data, &indicator, out),
        Command::Validate { config } => run_validate(&config, out),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, StrategylabError> {
    info!(path = %path.display(), "loading config");
    FileConfigAdapter::from_file(path)
}

/// The price file to load: the command-line override, else `[backtest]
/// data_file` resolved against the config file's directory.
pub fn resolve_data_path(
    config: &dyn ConfigPort,
    config_path: &Path,
    data_override: Option<&Path>,
) -> Result<PathBuf, StrategylabError> {
    if let Some(path) = data_override {
        return Ok(path.to_path_buf());
    }
    let file = data_file(config).ok_or_else(|| StrategylabError::ConfigMissing {
        section: "backtest".to_string(),
        key: "data_file".to_string(),
    })?;
    let file = PathBuf::from(file);
    if file.is_relative() {
        if let Some(dir) = config_path.parent() {
            return Ok(dir.join(file));
        }
    }
    Ok(file)
}

fn open_inputs(
    config_path: &Path,
    data_override: Option<&Path>,
) -> Result<(FileConfigAdapter, CsvDataAdapter), StrategylabError> {
    let config = load_config(config_path)?;
    let data = CsvDataAdapter::new(resolve_data_path(&config, config_path, data_override)?);
    info!(path = %data.path().display(), "loading bars");
    Ok((config, data))
}

fn run_backtest_command(
    config_path: &Path,
    data_override: Option<&Path>,
    output: Option<&Path>,
    format: ExportFormat,
    out: &mut dyn Write,
) -> Result<(), StrategylabError> {
    let (config, data) = open_inputs(config_path, data_override)?;
    let result = run_backtest_pipeline(&data, &config, out)?;
    if let Some(path) = output {
        for file in format.exporter().write(&result, path)? {
            info!(path = %file.display(), "wrote export");
        }
    }
    Ok(())
}

/// Loads, runs and summarizes one backtest.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    config: &dyn ConfigPort,
    out: &mut dyn Write,
) -> Result<BacktestResult, StrategylabError> {
    let backtest = load_backtest_config(config)?;
    let bars = load_bars(data_port)?;
    info!(strategy = %backtest.strategy, bars = bars.len(), "running backtest");
    let result = run_backtest(&bars, &backtest)?;
    write_summary(&result, out)?;
    Ok(result)
}

fn run_compare_command(
    config_path: &Path,
    data_override: Option<&Path>,
    strategies: Option<&str>,
    out: &mut dyn Write,
) -> Result<(), StrategylabError> {
    let (config, data) = open_inputs(config_path, data_override)?;
    run_compare_pipeline(&data, &config, strategies, out).map(drop)
}

/// Compares the configured strategies. The strategy named in `[strategy]`
/// runs with its configured parameters; the others use their defaults.
pub fn run_compare_pipeline(
    data_port: &dyn DataPort,
    config: &dyn ConfigPort,
    strategies: Option<&str>,
    out: &mut dyn Write,
) -> Result<Vec<BacktestResult>, StrategylabError> {
    let base = load_backtest_config(config)?;
    let kinds = match strategies {
        Some(list) => parse_strategy_list(list)?,
        None => load_compare_strategies(config)?,
    };
    let candidates: Vec<(StrategyKind, StrategyParams)> = kinds
        .into_iter()
        .map(|kind| {
            let params = if kind == base.strategy {
                base.params.clone()
            } else {
                StrategyParams::new()
            };
            (kind, params)
        })
        .collect();

    let bars = load_bars(data_port)?;
    let results = compare_strategies(&bars, &base, &candidates);

    writeln!(
        out,
        "{:<4} {:<16} {:>7} {:>9} {:>11} {:>9} {:>9}",
        "rank", "strategy", "trades", "win %", "return %", "sharpe", "max dd %"
    )?;
    for (rank, result) in results.iter().enumerate() {
        let m = &result.metrics;
        writeln!(
            out,
            "{:<4} {:<16} {:>7} {:>9.2} {:>11.2} {:>9.3} {:>9.2}",
            rank + 1,
            result.config.strategy.id(),
            m.total_trades,
            m.win_rate,
            m.total_return,
            m.sharpe_ratio,
            m.max_drawdown
        )?;
    }
    Ok(results)
}

fn run_optimize_command(
    config_path: &Path,
    data_override: Option<&Path>,
    metric: Option<&str>,
    out: &mut dyn Write,
) -> Result<(), StrategylabError> {
    let (config, data) = open_inputs(config_path, data_override)?;
    run_optimize_pipeline(&data, &config, metric, out).map(drop)
}

pub fn run_optimize_pipeline(
    data_port: &dyn DataPort,
    config: &dyn ConfigPort,
    metric: Option<&str>,
    out: &mut dyn Write,
) -> Result<OptimizationResult, StrategylabError> {
    let base = load_backtest_config(config)?;
    let metric: MetricField = match metric {
        Some(name) => name.parse()?,
        None => load_metric(config)?,
    };
    let grid = load_parameter_grid(config)?;
    let bars = load_bars(data_port)?;

    info!(
        strategy = %base.strategy,
        %metric,
        combinations = grid.len(),
        "starting optimization"
    );
    let best = Optimizer::new(&bars, base, metric).run_with_progress(&grid, |done, total| {
        debug!(done, total, "optimizer progress");
    });

    writeln!(
        out,
        "evaluated {} of {} combinations",
        best.evaluated, best.total
    )?;
    match best.metric {
        Some(metric) => {
            writeln!(out, "best {metric}: {:.4}", best.value)?;
            for (key, value) in best.params.iter() {
                writeln!(out, "  {key} = {value}")?;
            }
        }
        None => writeln!(out, "no combination produced a result")?,
    }
    Ok(best)
}

pub fn write_strategies(out: &mut dyn Write) -> Result<(), StrategylabError> {
    for kind in StrategyKind::ALL {
        writeln!(out, "{:<16} {}", kind.id(), kind.name())?;
        for (key, value) in kind.defaults() {
            writeln!(out, "    {key} = {value}")?;
        }
    }
    Ok(())
}

fn run_indicators_command(
    data_path: &Path,
    indicator: &str,
    out: &mut dyn Write,
) -> Result<(), StrategylabError> {
    let indicator: IndicatorType = indicator.parse()?;
    let bars = load_bars(&CsvDataAdapter::new(data_path))?;
    write_indicator_csv(&bars, &indicator, out)
}

/// One row per bar: the timestamp then every output column of
/// `indicator`. Undefined positions are left blank.
pub fn write_indicator_csv(
    bars: &[OhlcvBar],
    indicator: &IndicatorType,
    out: &mut dyn Write,
) -> Result<(), StrategylabError> {
    let columns = compute_indicator(bars, indicator);
    let mut wtr = csv::Writer::from_writer(out);
    let export_err = |e: csv::Error| StrategylabError::Export {
        reason: e.to_string(),
    };

    let mut header = vec!["timestamp".to_string()];
    header.extend(columns.iter().map(|(name, _)| name.clone()));
    wtr.write_record(&header).map_err(export_err)?;

    for (i, bar) in bars.iter().enumerate() {
        let mut row = vec![bar.timestamp.format("%Y-%m-%dT%H:%M:%S").to_string()];
        row.extend(
            columns
                .iter()
                .map(|(_, series)| series[i].map(|v| format!("{v:.6}")).unwrap_or_default()),
        );
        wtr.write_record(&row).map_err(export_err)?;
    }
    wtr.flush()?;
    Ok(())
}

fn run_validate(config_path: &Path, out: &mut dyn Write) -> Result<(), StrategylabError> {
    let config = load_config(config_path)?;
    validate_config(&config)?;
    writeln!(out, "{}: OK", config_path.display())?;
    Ok(())
}

fn load_bars(data_port: &dyn DataPort) -> Result<Vec<OhlcvBar>, StrategylabError> {
    let bars = data_port.load_bars()?;
    if bars.is_empty() {
        return Err(StrategylabError::Data {
            reason: "no bars loaded".to_string(),
        });
    }
    Ok(bars)
}

pub fn write_summary(result: &BacktestResult, out: &mut dyn Write) -> Result<(), StrategylabError> {
    let m = &result.metrics;
    let config = &result.config;
    writeln!(out, "Strategy:          {} ({})", config.strategy.name(), config.strategy)?;
    writeln!(out, "Bars:              {}", result.equity_curve.len())?;
    writeln!(out, "Initial capital:   {:.2}", config.initial_capital)?;
    // the zero metrics record of a tradeless run carries no final equity
    let final_equity = if m.total_trades == 0 {
        config.initial_capital
    } else {
        m.final_equity
    };
    writeln!(out, "Final equity:      {:.2}", final_equity)?;
    writeln!(out, "Net profit:        {:.2}", m.net_profit)?;
    writeln!(out, "Total return:      {:.2}%", m.total_return)?;
    writeln!(out, "Annualized return: {:.2}%", m.annualized_return)?;
    writeln!(out, "Sharpe ratio:      {:.3}", m.sharpe_ratio)?;
    writeln!(out, "Sortino ratio:     {:.3}", m.sortino_ratio)?;
    writeln!(out, "Max drawdown:      {:.2}%", m.max_drawdown)?;
    writeln!(
        out,
        "Trades:            {} ({} won, {} lost, {:.1}% win rate)",
        m.total_trades, m.winning_trades, m.losing_trades, m.win_rate
    )?;
    writeln!(out, "Profit factor:     {:.3}", m.profit_factor)?;
    Ok(())
}
