//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::paper_broker::PaperBroker;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig, BacktestResult};
use crate::domain::config::{
    RankDirection, RebalanceConfig, Resolution, SelectionConfig, UniverseConfig,
};
use crate::domain::config_validation::{
    parse_date, validate_algorithm_config, validate_rebalance_config, validate_universe_config,
};
use crate::domain::engine::SelectionEngine;
use crate::domain::error::FundscreenError;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "fundscreen", about = "Fundamental universe screen and rebalancer")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay the selection strategy over a CSV data directory
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Data directory; overrides [data] path
        #[arg(short, long)]
        data: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            data,
            output,
            dry_run,
        } => {
            if dry_run {
                run_dry_run(&config, data.as_ref())
            } else {
                run_backtest_command(&config, data.as_ref(), output.as_ref())
            }
        }
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|err| {
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

pub fn validate_config(adapter: &dyn ConfigPort) -> Result<(), FundscreenError> {
    validate_algorithm_config(adapter)?;
    validate_universe_config(adapter)?;
    validate_rebalance_config(adapter)?;
    Ok(())
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> Result<BacktestConfig, FundscreenError> {
    let start_date = parse_date(
        adapter.get_string("algorithm", "start_date").as_deref(),
        "start_date",
    )?;
    let end_date = parse_date(
        adapter.get_string("algorithm", "end_date").as_deref(),
        "end_date",
    )?;

    Ok(BacktestConfig {
        start_date,
        end_date,
        initial_capital: adapter.get_double("algorithm", "cash", 100_000.0),
    })
}

pub fn build_selection_config(adapter: &dyn ConfigPort) -> Result<SelectionConfig, FundscreenError> {
    let defaults = UniverseConfig::default();

    let history_resolution = match adapter.get_string("universe", "universe_history_resolution") {
        Some(raw) => raw
            .parse::<Resolution>()
            .map_err(|reason| FundscreenError::ConfigInvalid {
                section: "universe".into(),
                key: "universe_history_resolution".into(),
                reason,
            })?,
        None => defaults.history_resolution,
    };

    let universe = UniverseConfig {
        market_cap_floor: adapter.get_double("universe", "market_cap_filter", defaults.market_cap_floor),
        volume_floor: adapter.get_double("universe", "volume_filter", defaults.volume_floor),
        turnover_floor: adapter.get_double("universe", "turnover_filter", defaults.turnover_floor),
        min_price: adapter.get_double("universe", "min_price", defaults.min_price),
        revenue_growth_year: adapter.get_double(
            "universe",
            "revenue_growth_year",
            defaults.revenue_growth_year,
        ),
        revenue_growth_quarter: adapter.get_double(
            "universe",
            "revenue_growth_quarter",
            defaults.revenue_growth_quarter,
        ),
        pe_ratio_min: adapter.get_double("universe", "pe_ratio_min", defaults.pe_ratio_min),
        pe_ratio_max: adapter.get_double("universe", "pe_ratio_max", defaults.pe_ratio_max),
        year_low_threshold: adapter.get_double(
            "universe",
            "year_low_threshold",
            defaults.year_low_threshold,
        ),
        max_debt_to_equity: adapter.get_double(
            "universe",
            "max_debt_to_equity",
            defaults.max_debt_to_equity,
        ),
        num_stocks: positive_usize(adapter, "universe", "num_stocks", defaults.num_stocks)?,
        history_bars: positive_usize(
            adapter,
            "universe",
            "universe_history_bars",
            defaults.history_bars,
        )?,
        history_resolution,
        rank_direction: RankDirection::from_descending(adapter.get_bool(
            "universe",
            "market_cap_descending",
            true,
        )),
    };

    let rebalance_defaults = RebalanceConfig::default();
    let warmup = adapter.get_int(
        "rebalance",
        "warmup_ticks",
        i64::from(rebalance_defaults.warmup_ticks),
    );
    let rebalance = RebalanceConfig {
        rebalance_days: adapter.get_int("rebalance", "rebalance_days", rebalance_defaults.rebalance_days),
        warmup_ticks: u32::try_from(warmup).map_err(|_| FundscreenError::ConfigInvalid {
            section: "rebalance".into(),
            key: "warmup_ticks".into(),
            reason: "warmup_ticks must be non-negative".into(),
        })?,
    };

    let test_symbol = if adapter.get_bool("algorithm", "test_one_symbol", false) {
        adapter
            .get_string("algorithm", "test_symbol")
            .map(|s| s.to_uppercase())
    } else {
        None
    };

    Ok(SelectionConfig {
        universe,
        rebalance,
        test_symbol,
    })
}

fn positive_usize(
    adapter: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, FundscreenError> {
    let fallback = i64::try_from(default).unwrap_or(i64::MAX);
    let value = adapter.get_int(section, key, fallback);
    match usize::try_from(value) {
        Ok(v) if v >= 1 => Ok(v),
        _ => Err(FundscreenError::ConfigInvalid {
            section: section.into(),
            key: key.into(),
            reason: format!("{key} must be at least 1"),
        }),
    }
}

/// `--data` wins over `[data] path`.
pub fn resolve_data_dir(data_override: Option<&PathBuf>, config: &dyn ConfigPort) -> Option<PathBuf> {
    data_override
        .cloned()
        .or_else(|| config.get_string("data", "path").map(PathBuf::from))
}

fn run_backtest_command(
    config_path: &PathBuf,
    data_override: Option<&PathBuf>,
    output_path: Option<&PathBuf>,
) -> ExitCode {
    // Stage 1: Load and validate config
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(e) = validate_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    // Stage 2: Build run parameters
    let (bt_config, selection) = match build_backtest_config(&adapter)
        .and_then(|bt| build_selection_config(&adapter).map(|sel| (bt, sel)))
    {
        Ok(pair) => pair,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 3: Load data
    let Some(data_dir) = resolve_data_dir(data_override, &adapter) else {
        let err = FundscreenError::ConfigMissing {
            section: "data".into(),
            key: "path".into(),
        };
        eprintln!("error: {err}");
        return (&err).into();
    };
    eprintln!("Loading data from {}", data_dir.display());
    let data = match CsvAdapter::load(&data_dir) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    // Stage 4: Replay
    eprintln!(
        "Running backtest: {} to {}, rebalance every {} days",
        bt_config.start_date, bt_config.end_date, selection.rebalance.rebalance_days
    );
    let result = match run_replay(&data, selection, &bt_config) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    print_summary(&result);

    // Stage 5: Write rebalance log
    let output = output_path
        .cloned()
        .unwrap_or_else(|| PathBuf::from("rebalances.csv"));
    match CsvReportAdapter.write(&result, &output.to_string_lossy()) {
        Ok(()) => {
            eprintln!("\nRebalance log written to: {}", output.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: failed to write report: {e}");
            (&e).into()
        }
    }
}

/// Runs a full replay over a loaded data directory with a fresh paper broker.
pub fn run_replay(
    data: &CsvAdapter,
    selection: SelectionConfig,
    bt_config: &BacktestConfig,
) -> Result<BacktestResult, FundscreenError> {
    let mut engine = SelectionEngine::new(selection, bt_config.start_time());
    let mut broker = PaperBroker::new();
    backtest_engine::run_backtest(&mut engine, data, data, &mut broker, bt_config)
}

fn print_summary(result: &BacktestResult) {
    eprintln!("\n=== Replay Summary ===");
    eprintln!("Days processed:   {}", result.days);
    eprintln!("Selections:       {}", result.selections.len());
    eprintln!("Rebalances:       {}", result.rebalances.len());
    eprintln!("Liquidations:     {}", result.liquidations.len());
    eprintln!("Final universe:   {} symbols", result.final_universe.len());
    if let Some(last) = result.rebalances.last() {
        eprintln!("\nLast rebalance ({}):", last.date);
        for target in &last.targets {
            eprintln!("  {:<8} {:.4}", target.symbol, target.weight);
        }
        if !last.pruned.is_empty() {
            eprintln!("  pruned: {}", last.pruned.join(", "));
        }
    }
}

pub fn run_dry_run(config_path: &PathBuf, data_override: Option<&PathBuf>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(e) = validate_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }
    eprintln!("Config validated successfully");

    let (bt_config, selection) = match build_backtest_config(&adapter)
        .and_then(|bt| build_selection_config(&adapter).map(|sel| (bt, sel)))
    {
        Ok(pair) => pair,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    print_selection_config(&bt_config, &selection);

    if let Some(data_dir) = resolve_data_dir(data_override, &adapter) {
        let data = match CsvAdapter::load(&data_dir) {
            Ok(d) => d,
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        };
        match data.trading_days(bt_config.start_date, bt_config.end_date) {
            Ok(days) => {
                eprintln!("\nData:");
                eprintln!("  path: {}", data.base_path().display());
                eprintln!("  trading days in range: {}", days.len());
            }
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        }
    }

    eprintln!("\nDry run complete: configuration is valid");
    ExitCode::SUCCESS
}

fn print_selection_config(bt_config: &BacktestConfig, selection: &SelectionConfig) {
    let u = &selection.universe;
    eprintln!("\nPeriod:");
    eprintln!("  {} to {}", bt_config.start_date, bt_config.end_date);
    eprintln!("  cash: {:.2}", bt_config.initial_capital);

    eprintln!("\nCoarse filter:");
    eprintln!("  market cap >  {}", u.market_cap_floor);
    eprintln!("  dollar vol >  {}", u.volume_floor);
    eprintln!("  turnover >    {}", u.turnover_floor);
    eprintln!("  price >       {}", u.min_price);
    if let Some(symbol) = &selection.test_symbol {
        eprintln!("  restricted to: {symbol}");
    }

    eprintln!("\nFine filter:");
    eprintln!("  revenue growth 1y > {}, 3m > {}", u.revenue_growth_year, u.revenue_growth_quarter);
    eprintln!("  P/E in ({}, {})", u.pe_ratio_min, u.pe_ratio_max);
    eprintln!("  debt/equity < {}", u.max_debt_to_equity);
    eprintln!(
        "  history: {} {} bars, year-low threshold {}",
        u.history_bars, u.history_resolution, u.year_low_threshold
    );
    eprintln!("  keep top {} by market cap ({:?})", u.num_stocks, u.rank_direction);

    eprintln!("\nRebalance:");
    eprintln!("  every {} days", selection.rebalance.rebalance_days);
    eprintln!("  warm-up ticks: {}", selection.rebalance.warmup_ticks);
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_config(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    match build_backtest_config(&adapter)
        .and_then(|bt| build_selection_config(&adapter).map(|sel| (bt, sel)))
    {
        Ok((bt_config, selection)) => print_selection_config(&bt_config, &selection),
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    }

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}
