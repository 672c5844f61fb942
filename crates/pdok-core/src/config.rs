use std::fmt;
use std::str::FromStr;

use crate::app_config::AppConfig;
use crate::ConfigError;

pub(crate) const DEFAULT_CSW_URL: &str = "https://nationaalgeoregister.nl/geonetwork/srv/dut/csw";
pub(crate) const DEFAULT_OWNER: &str = "Beheer PDOK";
pub(crate) const DEFAULT_USER_AGENT: &str = "pdok-spider/0.1 (catalog-harvest)";

/// Load spider configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load spider configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build configuration using the provided env-var lookup function, so the
/// parsing can be tested with a plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let csw_url = or_default("PDOK_CSW_URL", DEFAULT_CSW_URL);
    if csw_url.trim().is_empty() {
        return Err(invalid("PDOK_CSW_URL", "must not be empty"));
    }

    let fan_out_workers: usize = parse_number(&lookup, "PDOK_FAN_OUT_WORKERS", 10)?;
    if fan_out_workers == 0 {
        return Err(invalid("PDOK_FAN_OUT_WORKERS", "must be at least 1"));
    }
    let csw_page_size: u32 = parse_number(&lookup, "PDOK_CSW_PAGE_SIZE", 50)?;
    if csw_page_size == 0 {
        return Err(invalid("PDOK_CSW_PAGE_SIZE", "must be at least 1"));
    }

    Ok(AppConfig {
        csw_url: csw_url.trim().to_owned(),
        owner: or_default("PDOK_OWNER", DEFAULT_OWNER),
        log_level: or_default("PDOK_LOG_LEVEL", "info"),
        http_timeout_secs: parse_number(&lookup, "PDOK_HTTP_TIMEOUT_SECS", 30)?,
        user_agent: or_default("PDOK_USER_AGENT", DEFAULT_USER_AGENT),
        fan_out_workers,
        csw_page_size,
        csw_max_retries: parse_number(&lookup, "PDOK_CSW_MAX_RETRIES", 2)?,
        csw_retry_backoff_base_secs: parse_number(
            &lookup,
            "PDOK_CSW_RETRY_BACKOFF_BASE_SECS",
            1,
        )?,
    })
}

/// Parses a numeric variable, falling back to `default` when it is unset.
fn parse_number<F, T>(lookup: &F, var: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match lookup(var) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| invalid(var, &e.to_string())),
        Err(_) => Ok(default),
    }
}

fn invalid(var: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidEnvVar {
        var: var.to_owned(),
        reason: reason.to_owned(),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
