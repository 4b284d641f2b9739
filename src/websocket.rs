//! WebSocket connection handling.
//!
//! Per connection: a writer task drains an mpsc queue into the socket, a
//! redraw task turns state changes into chart frames, and the reader loop
//! feeds client messages to [`handle_client_message`] in arrival order.

use std::borrow::Cow;
use std::net::SocketAddr;
use std::time::Duration;

use futures_util::stream::SplitStream;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep, timeout};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{accept_async, WebSocketStream};
use tracing::{debug, error, info, warn};

use super::auth::validate_token;
use super::bonding_curve::CurveModel;
use super::calculations::build_snapshot;
use super::chart::{render_frame, PlotWindow};
use super::constants::{ACCEPT_RETRY_DELAY, AUTH_TIMEOUT, CLIENT_CHANNEL_CAPACITY};
use super::errors::ServerError;
use super::handlers::handle_client_message;
use super::protocol::{ClientMessage, ServerMessage};
use super::reconcile::CurveState;
use super::state::{AppState, Session};

type WsReader = SplitStream<WebSocketStream<TcpStream>>;

const ANONYMOUS_USER: &str = "anonymous";
// Control frame payloads are capped at 125 bytes, two of which hold the close code
const MAX_CLOSE_REASON: usize = 123;

/// Accepts connections forever. A failed accept (e.g. out of file
/// descriptors) is logged and retried after [`ACCEPT_RETRY_DELAY`].
pub async fn serve(listener: TcpListener, state: AppState) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                tokio::spawn(handle_connection(stream, addr, state.clone()));
            }
            Err(e) => {
                warn!("Failed to accept connection: {}", e);
                sleep(ACCEPT_RETRY_DELAY).await;
            }
        }
    }
}

pub async fn handle_connection(stream: TcpStream, addr: SocketAddr, state: AppState) {
    debug!(%addr, "Incoming TCP connection");

    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!(%addr, "WebSocket handshake error: {}", e);
            return;
        }
    };
    info!(%addr, "WebSocket connection established");

    let (mut writer, mut reader) = ws_stream.split();
    let (tx, mut rx) = mpsc::channel::<Message>(CLIENT_CHANNEL_CAPACITY);

    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let closing = matches!(msg, Message::Close(_));
            if let Err(e) = writer.send(msg).await {
                debug!(%addr, "Send task: error sending message: {}", e);
                break;
            }
            if closing {
                break;
            }
        }
        debug!(%addr, "Send task finished");
    });

    // --- Authentication Step --- //
    let user_id = match state.config.jwt_secret.as_deref() {
        Some(secret) => match authenticate(&mut reader, secret, state.config.jwt_audience.as_deref()).await {
            Ok(user_id) => {
                info!(%addr, user = %user_id, "Client authenticated");
                send_json(&tx, &ServerMessage::AuthOk).await;
                user_id
            }
            Err(e) => {
                warn!(%addr, "Authentication failed: {}. Closing connection.", e);
                let close_msg = Message::Close(Some(CloseFrame {
                    code: CloseCode::Policy,
                    reason: Cow::Owned(close_reason(&e)),
                }));
                let _ = tx.send(close_msg).await;
                drop(tx);
                let _ = send_task.await;
                return;
            }
        },
        None => ANONYMOUS_USER.to_string(),
    };

    // --- Session Setup --- //
    let start = match state.start_state() {
        Ok(start) => start,
        Err(e) => {
            error!(%addr, "Cannot build starting state: {}", e);
            return;
        }
    };
    let (redraw_tx, redraw_rx) = watch::channel(start);
    state.sessions.lock().await.insert(
        addr,
        Session {
            user_id: user_id.clone(),
            state: start,
            redraw: redraw_tx,
        },
    );

    match build_snapshot(&state.model, &start) {
        Ok(snapshot) => {
            send_json(&tx, &ServerMessage::Snapshot { snapshot }).await;
        }
        Err(e) => error!(%addr, "Cannot display starting state: {}", e),
    }

    let redraw_task = tokio::spawn(redraw_loop(
        state.model,
        state.window,
        state.config.redraw_debounce,
        redraw_rx,
        tx.clone(),
    ));

    // --- Message Loop --- //
    let receive_task = async {
        while let Some(msg_result) = reader.next().await {
            match msg_result {
                Ok(Message::Text(text)) => {
                    let reply = match serde_json::from_str::<ClientMessage>(&text) {
                        Ok(client_message) => handle_client_message(&state, addr, client_message).await,
                        Err(e) => {
                            info!(%addr, "Failed to parse message: {}. Text: '{}'", e, text);
                            ServerMessage::Error {
                                message: format!("Invalid message format: {}", e),
                            }
                        }
                    };
                    if !send_json(&tx, &reply).await {
                        break;
                    }
                }
                Ok(Message::Binary(_)) => debug!(%addr, "Received binary message (ignored)"),
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) | Ok(Message::Frame(_)) => {}
                Ok(Message::Close(_)) => {
                    debug!(%addr, "Received Close frame");
                    break;
                }
                Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => {
                    debug!(%addr, "Connection closed");
                    break;
                }
                Err(e) => {
                    warn!(%addr, "WebSocket receive error: {}", e);
                    break;
                }
            }
        }
    };

    tokio::select! {
        _ = send_task => debug!(%addr, "Send task exited"),
        _ = receive_task => debug!(%addr, "Receive task exited"),
    }

    // --- Cleanup --- //
    state.sessions.lock().await.remove(&addr);
    redraw_task.abort();
    info!(%addr, user = %user_id, "Connection closed");
}

/// Waits up to [`AUTH_TIMEOUT`] for an `Auth` message and validates its token.
async fn authenticate(reader: &mut WsReader, secret: &str, audience: Option<&str>) -> Result<String, ServerError> {
    match timeout(AUTH_TIMEOUT, reader.next()).await {
        Ok(Some(Ok(Message::Text(text)))) => match serde_json::from_str::<ClientMessage>(&text)? {
            ClientMessage::Auth { token } => validate_token(&token, secret, audience),
            _ => Err(ServerError::Auth("first message must be Auth".to_string())),
        },
        Ok(Some(Ok(_))) => Err(ServerError::Auth("invalid auth message type".to_string())),
        Ok(Some(Err(e))) => Err(ServerError::WebSocket(e)),
        Ok(None) | Err(_) => Err(ServerError::Auth(
            "authentication timed out or connection closed".to_string(),
        )),
    }
}

/// Renders one frame per burst of state changes.
///
/// After a change it waits `debounce`, then draws whatever state is latest,
/// so a drag producing many inputs yields one frame per interval.
async fn redraw_loop(
    model: CurveModel,
    window: PlotWindow,
    debounce: Duration,
    mut states: watch::Receiver<CurveState>,
    tx: mpsc::Sender<Message>,
) {
    let first = *states.borrow_and_update();
    if !send_frame(&model, &window, &first, &tx).await {
        return;
    }

    while states.changed().await.is_ok() {
        sleep(debounce).await;
        let latest = *states.borrow_and_update();
        if !send_frame(&model, &window, &latest, &tx).await {
            break;
        }
    }
}

async fn send_frame(model: &CurveModel, window: &PlotWindow, state: &CurveState, tx: &mpsc::Sender<Message>) -> bool {
    let frame = render_frame(model, state, window);
    send_json(tx, &ServerMessage::Frame { frame }).await
}

/// Queues a message for the writer task. Returns false once the client is gone.
async fn send_json(tx: &mpsc::Sender<Message>, msg: &ServerMessage) -> bool {
    match serde_json::to_string(msg) {
        Ok(json) => tx.send(Message::Text(json)).await.is_ok(),
        Err(e) => {
            error!("Failed to serialize {} message: {}", msg.kind(), e);
            true
        }
    }
}

fn close_reason(err: &ServerError) -> String {
    let mut reason = err.to_string();
    if reason.len() > MAX_CLOSE_REASON {
        let mut end = MAX_CLOSE_REASON;
        while !reason.is_char_boundary(end) {
            end -= 1;
        }
        reason.truncate(end);
    }
    reason
}
