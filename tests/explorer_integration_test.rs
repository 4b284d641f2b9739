// tests/explorer_integration_test.rs
use std::net::SocketAddr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use futures_util::{SinkExt, StreamExt};
use jsonwebtoken::{encode, EncodingKey, Header};
use rust_decimal_macros::dec;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use curve_server::chart::PlotWindow;
use curve_server::models::{ChartFrame, Claims, CurveSnapshot, Direction};
use curve_server::protocol::{ClientMessage, ServerMessage};
use curve_server::{serve, AppState, Config};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WAIT: Duration = Duration::from_secs(5);
const SECRET: &str = "integration-secret";

fn test_config() -> Config {
    Config {
        window: PlotWindow {
            min_supply: 0.0,
            max_supply: 7200.0,
            sample_max: 7000,
            sample_step: 500,
        },
        redraw_debounce: Duration::from_millis(20),
        ..Config::default()
    }
}

/// Starts a server on an ephemeral port.
async fn start_server(config: Config) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind");
    let addr = listener.local_addr().unwrap();
    let state = AppState::new(config).expect("Invalid test config");
    tokio::spawn(serve(listener, state));
    addr
}

async fn connect(addr: SocketAddr) -> Client {
    let (ws, _) = connect_async(format!("ws://{}", addr)).await.expect("Failed to connect");
    ws
}

async fn send(ws: &mut Client, msg: &ClientMessage) {
    ws.send(Message::Text(serde_json::to_string(msg).unwrap())).await.unwrap();
}

async fn next_server_message(ws: &mut Client) -> ServerMessage {
    loop {
        let msg = timeout(WAIT, ws.next())
            .await
            .expect("Timed out waiting for server message")
            .expect("Connection closed")
            .expect("WebSocket error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(&text).expect("Unparseable server message");
        }
    }
}

async fn next_snapshot(ws: &mut Client) -> CurveSnapshot {
    loop {
        match next_server_message(ws).await {
            ServerMessage::Snapshot { snapshot } => return snapshot,
            ServerMessage::Frame { .. } => continue,
            other => panic!("Expected Snapshot, got {:?}", other),
        }
    }
}

async fn next_frame(ws: &mut Client) -> ChartFrame {
    loop {
        if let ServerMessage::Frame { frame } = next_server_message(ws).await {
            return frame;
        }
    }
}

async fn next_error(ws: &mut Client) -> String {
    loop {
        match next_server_message(ws).await {
            ServerMessage::Error { message } => return message,
            ServerMessage::Frame { .. } => continue,
            other => panic!("Expected Error, got {:?}", other),
        }
    }
}

fn token(sub: &str) -> String {
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs() as usize;
    let claims = Claims {
        sub: sub.to_string(),
        aud: None,
        exp: now + 3600,
    };
    encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_ref())).unwrap()
}

// --- Test Cases ---

#[tokio::test]
async fn test_session_starts_with_snapshot_and_frame() {
    let addr = start_server(test_config()).await;
    let mut ws = connect(addr).await;

    let snapshot = next_snapshot(&mut ws).await;
    assert_eq!(snapshot.current_supply, dec!(4000));
    assert_eq!(snapshot.delta, dec!(1000));
    assert_eq!(snapshot.new_supply, dec!(5000));
    assert_eq!(snapshot.current_price, dec!(54.59815));
    assert!(!snapshot.is_burn);

    let frame = next_frame(&mut ws).await;
    assert_eq!(frame.curve.len(), 15); // 0, 500, ..., 7000
    assert_eq!(frame.direction, Direction::Mint);
    assert_eq!(frame.current_marker.supply, 4000.0);
    assert_eq!(frame.new_marker.supply, 5000.0);
}

#[tokio::test]
async fn test_invalid_price_is_rejected_and_state_kept() {
    let addr = start_server(test_config()).await;
    let mut ws = connect(addr).await;
    next_snapshot(&mut ws).await;

    send(&mut ws, &ClientMessage::SetPrice { value: -5.0 }).await;
    let message = next_error(&mut ws).await;
    assert!(message.contains("price must be positive"), "unexpected error: {}", message);

    // Delta still applies to the untouched supply of 4000
    send(&mut ws, &ClientMessage::SetDelta { value: -1000.0 }).await;
    let snapshot = next_snapshot(&mut ws).await;
    assert_eq!(snapshot.current_supply, dec!(4000));
    assert_eq!(snapshot.new_supply, dec!(3000));
    assert!(snapshot.is_burn);
    assert!(snapshot.trade_funds < dec!(0));
}

#[tokio::test]
async fn test_negative_supply_is_clamped() {
    let addr = start_server(test_config()).await;
    let mut ws = connect(addr).await;
    next_snapshot(&mut ws).await;

    send(&mut ws, &ClientMessage::SetSupply { value: -100.0 }).await;
    let snapshot = next_snapshot(&mut ws).await;
    assert_eq!(snapshot.current_supply, dec!(0));
    assert_eq!(snapshot.new_supply, dec!(1000));
    assert_eq!(snapshot.current_price, dec!(1));
}

#[tokio::test]
async fn test_price_and_chart_click_inputs() {
    let addr = start_server(test_config()).await;
    let mut ws = connect(addr).await;
    next_snapshot(&mut ws).await;

    // ln(148.413159) / 0.001 = 5000
    send(&mut ws, &ClientMessage::SetPrice { value: 148.413159 }).await;
    let snapshot = next_snapshot(&mut ws).await;
    assert_eq!(snapshot.current_supply, dec!(5000));
    assert_eq!(snapshot.new_supply, dec!(6000));

    send(&mut ws, &ClientMessage::ChartClick { offset_x: 90.0, width: 720.0 }).await;
    let snapshot = next_snapshot(&mut ws).await;
    assert_eq!(snapshot.current_supply, dec!(900));

    send(&mut ws, &ClientMessage::Reset).await;
    let snapshot = next_snapshot(&mut ws).await;
    assert_eq!(snapshot.current_supply, dec!(4000));
    assert_eq!(snapshot.new_supply, dec!(5000));
}

#[tokio::test]
async fn test_malformed_message_gets_error() {
    let addr = start_server(test_config()).await;
    let mut ws = connect(addr).await;
    next_snapshot(&mut ws).await;

    ws.send(Message::Text("{\"type\":\"Buy\"}".to_string())).await.unwrap();
    let message = next_error(&mut ws).await;
    assert!(message.starts_with("Invalid message format"));
}

#[tokio::test]
async fn test_blank_and_null_fields_are_read_as_zero() {
    let addr = start_server(test_config()).await;
    let mut ws = connect(addr).await;
    next_snapshot(&mut ws).await;

    ws.send(Message::Text(r#"{"type":"SetDelta","payload":{"value":null}}"#.to_string()))
        .await
        .unwrap();
    let snapshot = next_snapshot(&mut ws).await;
    assert_eq!(snapshot.delta, dec!(0));
    assert_eq!(snapshot.new_supply, dec!(4000));
    assert_eq!(snapshot.trade_funds, dec!(0));

    ws.send(Message::Text(r#"{"type":"SetSupply","payload":{"value":""}}"#.to_string()))
        .await
        .unwrap();
    let snapshot = next_snapshot(&mut ws).await;
    assert_eq!(snapshot.current_supply, dec!(0));
    assert_eq!(snapshot.current_price, dec!(1));

    // A blank price becomes 0, which is still not a valid price
    ws.send(Message::Text(r#"{"type":"SetPrice","payload":{"value":""}}"#.to_string()))
        .await
        .unwrap();
    let message = next_error(&mut ws).await;
    assert!(message.contains("price must be positive"), "unexpected error: {}", message);
}

#[tokio::test]
async fn test_undisplayable_supply_is_rejected_readably() {
    let addr = start_server(test_config()).await;
    let mut ws = connect(addr).await;
    next_snapshot(&mut ws).await;

    send(&mut ws, &ClientMessage::SetSupply { value: 70_000.0 }).await;
    let message = next_error(&mut ws).await;
    assert_eq!(
        message,
        "Invalid input: supply exceeds the largest displayable supply of 57564 tokens"
    );

    // Reset still works and the session is unchanged until then
    send(&mut ws, &ClientMessage::Reset).await;
    let snapshot = next_snapshot(&mut ws).await;
    assert_eq!(snapshot.current_supply, dec!(4000));
}

#[tokio::test]
async fn test_server_survives_dropped_connection() {
    let addr = start_server(test_config()).await;

    // Connects and hangs up before the handshake
    drop(TcpStream::connect(addr).await.expect("Failed to open raw connection"));

    let mut ws = connect(addr).await;
    let snapshot = next_snapshot(&mut ws).await;
    assert_eq!(snapshot.current_supply, dec!(4000));
}

#[tokio::test]
async fn test_input_burst_is_coalesced_into_latest_frame() {
    let config = Config {
        redraw_debounce: Duration::from_millis(300),
        ..test_config()
    };
    let addr = start_server(config).await;
    let mut ws = connect(addr).await;
    next_snapshot(&mut ws).await;
    next_frame(&mut ws).await;

    for delta in 1..=5 {
        send(&mut ws, &ClientMessage::SetDelta { value: delta as f64 }).await;
    }

    let mut snapshots = 0;
    let mut frames = Vec::new();
    while snapshots < 5 || frames.last().map(|f: &ChartFrame| f.new_marker.supply) != Some(4005.0) {
        match next_server_message(&mut ws).await {
            ServerMessage::Snapshot { .. } => snapshots += 1,
            ServerMessage::Frame { frame } => frames.push(frame),
            other => panic!("Unexpected message {:?}", other),
        }
    }

    assert!(frames.len() < 5, "expected coalesced frames, got {}", frames.len());
    let last = frames.last().unwrap();
    assert_eq!(last.direction, Direction::Mint);
    assert_eq!(last.impact_area.first().unwrap().supply, 4000.0);
    assert_eq!(last.impact_area.last().unwrap().supply, 4005.0);
}

#[tokio::test]
async fn test_auth_accepts_valid_token() {
    let config = Config {
        jwt_secret: Some(SECRET.to_string()),
        ..test_config()
    };
    let addr = start_server(config).await;
    let mut ws = connect(addr).await;

    send(&mut ws, &ClientMessage::Auth { token: token("user-42") }).await;
    assert_eq!(next_server_message(&mut ws).await, ServerMessage::AuthOk);
    let snapshot = next_snapshot(&mut ws).await;
    assert_eq!(snapshot.current_supply, dec!(4000));
}

#[tokio::test]
async fn test_auth_rejects_bad_token() {
    let config = Config {
        jwt_secret: Some(SECRET.to_string()),
        ..test_config()
    };
    let addr = start_server(config).await;
    let mut ws = connect(addr).await;

    send(&mut ws, &ClientMessage::Auth { token: "garbage".to_string() }).await;
    let msg = timeout(WAIT, ws.next()).await.expect("Timed out waiting for close");
    match msg {
        Some(Ok(Message::Close(Some(frame)))) => assert_eq!(frame.code, CloseCode::Policy),
        other => panic!("Expected policy close, got {:?}", other),
    }
}

#[tokio::test]
async fn test_auth_requires_auth_first() {
    let config = Config {
        jwt_secret: Some(SECRET.to_string()),
        ..test_config()
    };
    let addr = start_server(config).await;
    let mut ws = connect(addr).await;

    send(&mut ws, &ClientMessage::SetDelta { value: 10.0 }).await;
    let msg = timeout(WAIT, ws.next()).await.expect("Timed out waiting for close");
    assert!(
        matches!(msg, Some(Ok(Message::Close(_))) | None | Some(Err(_))),
        "Expected the connection to close, got {:?}",
        msg
    );
}
