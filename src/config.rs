use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::debug;

use super::bonding_curve::CurveParameters;
use super::chart::PlotWindow;
use super::constants::{
    DEFAULT_LOG_FILTER, DEFAULT_LISTEN_ADDR, DEFAULT_REDRAW_DEBOUNCE, DEFAULT_START_DELTA, DEFAULT_START_SUPPLY,
};
use super::errors::ServerError;

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: String,
    pub curve: CurveParameters,
    pub start_supply: f64,
    pub start_delta: f64,
    pub window: PlotWindow,
    pub redraw_debounce: Duration,
    /// HS256 secret. Sessions are anonymous when unset.
    pub jwt_secret: Option<String>,
    pub jwt_audience: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            curve: CurveParameters::default(),
            start_supply: DEFAULT_START_SUPPLY,
            start_delta: DEFAULT_START_DELTA,
            window: PlotWindow::default(),
            redraw_debounce: DEFAULT_REDRAW_DEBOUNCE,
            jwt_secret: None,
            jwt_audience: None,
        }
    }
}

impl Config {
    /// Reads configuration from the environment (after `.env`, if present).
    /// Unset variables fall back to the defaults.
    pub fn from_env() -> Result<Self, ServerError> {
        // No-op when main already loaded it; existing variables are never overwritten
        load_env();

        let defaults = Config::default();
        let window = PlotWindow {
            min_supply: defaults.window.min_supply,
            max_supply: parse_var("CHART_MAX_SUPPLY", defaults.window.max_supply)?,
            sample_max: parse_var("CHART_SAMPLE_MAX", defaults.window.sample_max)?,
            sample_step: parse_var("CHART_SAMPLE_STEP", defaults.window.sample_step)?,
        };
        if window.sample_step == 0 {
            return Err(ServerError::Config("CHART_SAMPLE_STEP must be at least 1".to_string()));
        }

        let debounce_ms = parse_var("REDRAW_DEBOUNCE_MS", defaults.redraw_debounce.as_millis() as u64)?;

        Ok(Config {
            listen_addr: env::var("LISTEN_ADDR").unwrap_or(defaults.listen_addr),
            curve: CurveParameters {
                initial_price: parse_var("CURVE_INITIAL_PRICE", defaults.curve.initial_price)?,
                growth_rate: parse_var("CURVE_GROWTH_RATE", defaults.curve.growth_rate)?,
            },
            start_supply: parse_var("CURVE_START_SUPPLY", defaults.start_supply)?,
            start_delta: parse_var("CURVE_START_DELTA", defaults.start_delta)?,
            window,
            redraw_debounce: Duration::from_millis(debounce_ms),
            jwt_secret: non_empty_var("JWT_SECRET"),
            jwt_audience: non_empty_var("JWT_AUDIENCE"),
        })
    }
}

/// Loads `.env` into the process environment, if one is found.
///
/// Call before logging is set up so a `RUST_LOG` in the file takes effect.
pub fn load_env() -> Option<PathBuf> {
    dotenvy::dotenv().ok()
}

/// `RUST_LOG`, or [`DEFAULT_LOG_FILTER`] when unset or blank.
pub fn log_filter() -> String {
    non_empty_var("RUST_LOG").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string())
}

fn parse_var<T>(name: &str, default: T) -> Result<T, ServerError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ServerError::Config(format!("{} is invalid ('{}'): {}", name, raw, e))),
        Err(_) => {
            debug!("{} not set, using default", name);
            Ok(default)
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
