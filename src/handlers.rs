use std::net::SocketAddr;

use tracing::{debug, info, warn};

use super::calculations::build_snapshot;
use super::errors::CurveError;
use super::protocol::{ClientMessage, ServerMessage};
use super::reconcile::{CurveInput, CurveState};
use super::state::AppState;

/// Applies one client message to the caller's session and returns the reply.
///
/// Accepted inputs replace the session state and wake the redraw task.
/// Rejected inputs leave the session untouched and produce `ServerMessage::Error`.
pub async fn handle_client_message(state: &AppState, addr: SocketAddr, msg: ClientMessage) -> ServerMessage {
    let mut sessions = state.sessions.lock().await;
    let session = match sessions.get_mut(&addr) {
        Some(session) => session,
        None => {
            warn!(%addr, "Message for unknown session");
            return ServerMessage::Error {
                message: "No active session".to_string(),
            };
        }
    };

    debug!(%addr, user = %session.user_id, ?msg, "Client request");

    let next = match next_state(state, &session.state, &msg) {
        Ok(next) => next,
        Err(e) => {
            info!(%addr, user = %session.user_id, "Input rejected: {}", e);
            return ServerMessage::Error { message: e.to_string() };
        }
    };

    // Check the display form before committing so a failure keeps the old state
    let snapshot = match build_snapshot(&state.model, &next) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            info!(%addr, user = %session.user_id, "Input rejected: {}", e);
            return ServerMessage::Error { message: e.to_string() };
        }
    };

    session.state = next;
    session.redraw.send_replace(next);
    debug!(
        %addr,
        supply = next.current_supply(),
        delta = next.delta(),
        new_supply = next.new_supply(),
        trade_funds = next.trade_funds(),
        "State reconciled"
    );

    ServerMessage::Snapshot { snapshot }
}

fn next_state(state: &AppState, current: &CurveState, msg: &ClientMessage) -> Result<CurveState, CurveError> {
    let input = match *msg {
        ClientMessage::SetSupply { value } => CurveInput::Supply(value),
        ClientMessage::SetDelta { value } => CurveInput::Delta(value),
        ClientMessage::SetPrice { value } => CurveInput::Price(value),
        ClientMessage::ChartClick { offset_x, width } => {
            CurveInput::Supply(state.window.supply_at_offset(offset_x, width)?)
        }
        ClientMessage::Reset => return state.start_state(),
        ClientMessage::Auth { .. } => {
            return Err(CurveError::InvalidInput("session is already established".to_string()));
        }
    };
    state.model.reconcile(current, input)
}
