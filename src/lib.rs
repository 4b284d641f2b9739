// src/lib.rs

//! Exponential bonding curve explorer.
//!
//! The curve math ([`bonding_curve`]) and the mint/burn reconciliation
//! ([`reconcile`]) are pure and usable on their own. The remaining modules
//! serve them over WebSocket: each connection gets its own curve state and
//! receives snapshots and chart frames as it edits supply, delta, or price.

pub mod auth;
pub mod bonding_curve;
pub mod calculations;
pub mod chart;
pub mod config;
pub mod constants;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod protocol;
pub mod reconcile;
pub mod state;
pub mod websocket;

pub use bonding_curve::{CurveModel, CurveParameters};
pub use config::Config;
pub use errors::{CurveError, ServerError};
pub use handlers::handle_client_message;
pub use reconcile::{CurveInput, CurveState};
pub use state::AppState;
pub use websocket::serve;
