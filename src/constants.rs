// --- Constants ---

use std::time::Duration;

// Curve defaults: price(s) = 1 * e^(0.001 * s)
pub const DEFAULT_INITIAL_PRICE: f64 = 1.0;
pub const DEFAULT_GROWTH_RATE: f64 = 0.001;

// Starting point for a new session
pub const DEFAULT_START_SUPPLY: f64 = 4000.0;
pub const DEFAULT_START_DELTA: f64 = 1000.0;

// Visible chart window (supply axis)
pub const DEFAULT_CHART_MIN_SUPPLY: f64 = 0.0;
pub const DEFAULT_CHART_MAX_SUPPLY: f64 = 7200.0;
pub const DEFAULT_CHART_SAMPLE_MAX: u32 = 7000;
pub const DEFAULT_CHART_SAMPLE_STEP: u32 = 1;

// USDC carries 6 decimals; supplies are shown in whole tokens
pub const USDC_DECIMALS: u32 = 6;
pub const SUPPLY_DECIMALS: u32 = 0;
// Largest price, pool size or delta shown; Decimal tops out near 7.9e28
pub const MAX_DISPLAY_AMOUNT: f64 = 1.0e28;

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_LOG_FILTER: &str = "info";
pub const DEFAULT_REDRAW_DEBOUNCE: Duration = Duration::from_millis(100);
pub const AUTH_TIMEOUT: Duration = Duration::from_secs(5);
pub const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(50);

// Outbound queue per connection
pub const CLIENT_CHANNEL_CAPACITY: usize = 32;
