use thiserror::Error;
use tokio_tungstenite::tungstenite;

// Errors raised by the curve model. Callers keep their previous state on any of these.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CurveError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid curve parameters: {0}")]
    InvalidParameters(String),
}

// Server-level errors. None of these are fatal past startup; a failing
// connection is logged and dropped.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Curve(#[from] CurveError),
}
