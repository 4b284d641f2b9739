use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::{watch, Mutex};

use super::bonding_curve::CurveModel;
use super::calculations::build_snapshot;
use super::chart::PlotWindow;
use super::config::Config;
use super::errors::CurveError;
use super::reconcile::CurveState;

// One explorer session per connection
#[derive(Debug)]
pub struct Session {
    pub user_id: String,
    pub state: CurveState,
    // Latest state for the redraw task
    pub redraw: watch::Sender<CurveState>,
}

// Type aliases for shared state
pub type SessionMap = Arc<Mutex<HashMap<SocketAddr, Session>>>; // Peer address -> Session

// Combined Application State
#[derive(Clone)]
pub struct AppState {
    pub model: CurveModel,
    pub window: PlotWindow,
    pub config: Arc<Config>,
    pub sessions: SessionMap,
}

impl AppState {
    /// Validates the configured curve and starting point.
    pub fn new(config: Config) -> Result<Self, CurveError> {
        let model = CurveModel::new(config.curve)?;
        // Fail at startup rather than on the first connection
        let start = CurveState::new(&model, config.start_supply, config.start_delta)?;
        build_snapshot(&model, &start)?;
        Ok(Self {
            model,
            window: config.window,
            config: Arc::new(config),
            sessions: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    pub fn start_state(&self) -> Result<CurveState, CurveError> {
        CurveState::new(&self.model, self.config.start_supply, self.config.start_delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_starts() {
        let app = AppState::new(Config::default()).unwrap();
        let start = app.start_state().unwrap();
        assert_eq!(start.current_supply(), 4000.0);
        assert_eq!(start.new_supply(), 5000.0);
    }

    #[test]
    fn test_undisplayable_start_is_rejected() {
        let config = Config {
            start_supply: 70_000.0,
            ..Config::default()
        };
        let err = AppState::new(config).err().expect("start supply 70000 accepted");
        assert!(matches!(err, CurveError::InvalidInput(_)));
        assert!(err.to_string().contains("largest displayable supply"));

        let config = Config {
            start_supply: 57_000.0,
            start_delta: 5_000.0,
            ..Config::default()
        };
        assert!(AppState::new(config).is_err());
    }
}
