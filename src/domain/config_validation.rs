//! Configuration validation.
//!
//! Validates all config fields before a run.

use crate::domain::config::Resolution;
use crate::domain::error::FundscreenError;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_algorithm_config(config: &dyn ConfigPort) -> Result<(), FundscreenError> {
    validate_cash(config)?;
    validate_dates(config)?;
    validate_test_symbol(config)?;
    Ok(())
}

pub fn validate_universe_config(config: &dyn ConfigPort) -> Result<(), FundscreenError> {
    for key in ["market_cap_filter", "volume_filter", "turnover_filter", "min_price"] {
        validate_non_negative(config, "universe", key)?;
    }
    validate_non_negative(config, "universe", "max_debt_to_equity")?;
    validate_non_negative(config, "universe", "year_low_threshold")?;
    validate_pe_bounds(config)?;
    validate_at_least_one(config, "universe", "num_stocks")?;
    validate_at_least_one(config, "universe", "universe_history_bars")?;
    validate_resolution(config)?;
    Ok(())
}

/// One century of calendar days.
pub const MAX_REBALANCE_DAYS: i64 = 36_500;

pub fn validate_rebalance_config(config: &dyn ConfigPort) -> Result<(), FundscreenError> {
    validate_at_least_one(config, "rebalance", "rebalance_days")?;
    if config.get_int("rebalance", "rebalance_days", 30) > MAX_REBALANCE_DAYS {
        return Err(invalid(
            "rebalance",
            "rebalance_days",
            &format!("rebalance_days must be at most {MAX_REBALANCE_DAYS}"),
        ));
    }
    let warmup = config.get_int("rebalance", "warmup_ticks", 2);
    if !(0..=i64::from(u32::MAX)).contains(&warmup) {
        return Err(invalid("rebalance", "warmup_ticks", "warmup_ticks must be non-negative"));
    }
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> FundscreenError {
    FundscreenError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn validate_cash(config: &dyn ConfigPort) -> Result<(), FundscreenError> {
    let value = config.get_double("algorithm", "cash", 100_000.0);
    if value <= 0.0 {
        return Err(invalid("algorithm", "cash", "cash must be positive"));
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), FundscreenError> {
    let start_str = config.get_string("algorithm", "start_date");
    let end_str = config.get_string("algorithm", "end_date");

    let start_date = parse_date(start_str.as_deref(), "start_date")?;
    let end_date = parse_date(end_str.as_deref(), "end_date")?;

    if start_date >= end_date {
        return Err(invalid(
            "algorithm",
            "start_date",
            "start_date must be before end_date",
        ));
    }
    Ok(())
}

pub fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, FundscreenError> {
    match value {
        None => Err(FundscreenError::ConfigMissing {
            section: "algorithm".to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            FundscreenError::ConfigInvalid {
                section: "algorithm".to_string(),
                key: field.to_string(),
                reason: format!("invalid {} format, expected YYYY-MM-DD", field),
            }
        }),
    }
}

fn validate_test_symbol(config: &dyn ConfigPort) -> Result<(), FundscreenError> {
    if !config.get_bool("algorithm", "test_one_symbol", false) {
        return Ok(());
    }
    match config.get_string("algorithm", "test_symbol") {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(FundscreenError::ConfigMissing {
            section: "algorithm".to_string(),
            key: "test_symbol".to_string(),
        }),
    }
}

fn validate_non_negative(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<(), FundscreenError> {
    let value = config.get_double(section, key, 0.0);
    if value < 0.0 || value.is_nan() {
        return Err(invalid(section, key, &format!("{key} must be non-negative")));
    }
    Ok(())
}

fn validate_at_least_one(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<(), FundscreenError> {
    if config.get_int(section, key, 1) < 1 {
        return Err(invalid(section, key, &format!("{key} must be at least 1")));
    }
    Ok(())
}

fn validate_pe_bounds(config: &dyn ConfigPort) -> Result<(), FundscreenError> {
    let min = config.get_double("universe", "pe_ratio_min", 10.0);
    let max = config.get_double("universe", "pe_ratio_max", 200.0);
    if min >= max {
        return Err(invalid(
            "universe",
            "pe_ratio_min",
            "pe_ratio_min must be below pe_ratio_max",
        ));
    }
    Ok(())
}

fn validate_resolution(config: &dyn ConfigPort) -> Result<(), FundscreenError> {
    if let Some(value) = config.get_string("universe", "universe_history_resolution") {
        value
            .parse::<Resolution>()
            .map_err(|reason| invalid("universe", "universe_history_resolution", &reason))?;
    }
    Ok(())
}
