//! End-to-end signaling over real WebSocket connections

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use pairlink::protocol::ServerEvent;
use pairlink::{ConnectionId, Role, RoomId, ServerConfig, SignalServer};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WAIT: Duration = Duration::from_secs(5);

async fn spawn_server(config: ServerConfig) -> (SocketAddr, Arc<SignalServer>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = Arc::new(SignalServer::new(config));

    let running = Arc::clone(&server);
    tokio::spawn(async move {
        running
            .serve(listener, std::future::pending())
            .await
            .unwrap();
    });

    (addr, server)
}

async fn connect(addr: SocketAddr) -> Client {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .unwrap();
    ws
}

async fn send(client: &mut Client, frame: serde_json::Value) {
    client.send(Message::Text(frame.to_string())).await.unwrap();
}

async fn recv(client: &mut Client) -> ServerEvent {
    loop {
        let frame = tokio::time::timeout(WAIT, client.next())
            .await
            .expect("timed out waiting for event")
            .expect("connection closed")
            .unwrap();

        if let Message::Text(text) = frame {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

/// Start matchmaking and collect the role and room id
async fn start(client: &mut Client) -> (Role, RoomId) {
    send(client, json!({"event": "start"})).await;

    let ServerEvent::Assigned(role) = recv(client).await else {
        panic!("expected role first");
    };
    if role == Role::P2 {
        assert!(matches!(recv(client).await, ServerEvent::RemoteSocket(_)));
    }
    let ServerEvent::RoomAssigned(room) = recv(client).await else {
        panic!("expected room id");
    };

    (role, room)
}

async fn remote_of(client: &mut Client) -> ConnectionId {
    match recv(client).await {
        ServerEvent::RemoteSocket(id) => id,
        other => panic!("expected remote-socket, got {other:?}"),
    }
}

#[tokio::test]
async fn test_pair_relay_and_rematch() {
    let (addr, server) = spawn_server(ServerConfig::default().disable_online_broadcast()).await;

    // A opens a room and waits
    let mut a = connect(addr).await;
    let (role_a, room_x) = start(&mut a).await;
    assert_eq!(role_a, Role::P1);

    // B joins it; both learn of each other
    let mut b = connect(addr).await;
    send(&mut b, json!({"event": "start"})).await;
    assert_eq!(recv(&mut b).await, ServerEvent::Assigned(Role::P2));
    let a_id = remote_of(&mut b).await;
    assert_eq!(recv(&mut b).await, ServerEvent::RoomAssigned(room_x.clone()));
    let b_id = remote_of(&mut a).await;
    assert_ne!(a_id, b_id);

    // Offer and answer reach only the counterpart
    send(&mut a, json!({"event": "sdp:send", "data": {"sdp": {"type": "offer", "sdp": "v=0"}}})).await;
    assert_eq!(
        recv(&mut b).await,
        ServerEvent::SdpReply {
            sdp: json!({"type": "offer", "sdp": "v=0"}),
            from: a_id.clone(),
        }
    );

    send(&mut b, json!({"event": "sdp:send", "data": {"sdp": {"type": "answer"}}})).await;
    assert_eq!(
        recv(&mut a).await,
        ServerEvent::SdpReply {
            sdp: json!({"type": "answer"}),
            from: b_id.clone(),
        }
    );

    send(&mut b, json!({"event": "ice:send", "data": {"candidate": {"candidate": "c1"}}})).await;
    assert_eq!(
        recv(&mut a).await,
        ServerEvent::IceReply {
            candidate: json!({"candidate": "c1"}),
            from: b_id.clone(),
        }
    );

    // Chat carries the label of the claimed role
    send(
        &mut a,
        json!({
            "event": "send-message",
            "data": {"message": "hello", "senderRole": "p1", "roomId": room_x.as_str()}
        }),
    )
    .await;
    assert_eq!(
        recv(&mut b).await,
        ServerEvent::GetMessage {
            message: "hello".into(),
            label: "You: ".into(),
        }
    );

    // C opens a second room
    let mut c = connect(addr).await;
    let (role_c, room_y) = start(&mut c).await;
    assert_eq!(role_c, Role::P1);
    assert_ne!(room_x, room_y);

    // A leaves; B is promoted and waits in X
    drop(a);
    assert_eq!(recv(&mut b).await, ServerEvent::Disconnected);

    // D is matched with the oldest waiting room, which is Y
    let mut d = connect(addr).await;
    send(&mut d, json!({"event": "start"})).await;
    assert_eq!(recv(&mut d).await, ServerEvent::Assigned(Role::P2));
    remote_of(&mut d).await;
    assert_eq!(recv(&mut d).await, ServerEvent::RoomAssigned(room_y.clone()));
    remote_of(&mut c).await;

    // E fills X opposite B
    let mut e = connect(addr).await;
    send(&mut e, json!({"event": "start"})).await;
    assert_eq!(recv(&mut e).await, ServerEvent::Assigned(Role::P2));
    assert_eq!(remote_of(&mut e).await, b_id);
    assert_eq!(recv(&mut e).await, ServerEvent::RoomAssigned(room_x));
    remote_of(&mut b).await;

    let stats = server.stats().await;
    assert_eq!(stats.rooms, 2);
    assert_eq!(stats.paired_rooms, 2);
    assert_eq!(stats.active_connections, 4);
}

#[tokio::test]
async fn test_lone_client_signal_goes_nowhere() {
    let (addr, server) = spawn_server(ServerConfig::default().disable_online_broadcast()).await;

    let mut a = connect(addr).await;
    let _ = start(&mut a).await;
    send(&mut a, json!({"event": "ice:send", "data": {"candidate": {}}})).await;

    // Repeated start is answered with an error, which also shows the
    // signal above was processed without producing a reply
    send(&mut a, json!({"event": "start"})).await;
    assert!(matches!(recv(&mut a).await, ServerEvent::Error { .. }));

    let stats = server.stats().await;
    assert_eq!(stats.signals_dropped, 1);
    assert_eq!(stats.rooms, 1);
}

#[tokio::test]
async fn test_malformed_frame_keeps_connection() {
    let (addr, _server) = spawn_server(ServerConfig::default().disable_online_broadcast()).await;

    let mut a = connect(addr).await;
    send(&mut a, json!({"event": "teleport"})).await;
    assert!(matches!(recv(&mut a).await, ServerEvent::Error { .. }));

    let (role, _) = start(&mut a).await;
    assert_eq!(role, Role::P1);
}

#[tokio::test]
async fn test_online_counter() {
    let (addr, server) = spawn_server(ServerConfig::default()).await;

    let mut a = connect(addr).await;
    assert_eq!(recv(&mut a).await, ServerEvent::Online(1));

    let mut b = connect(addr).await;
    assert_eq!(recv(&mut b).await, ServerEvent::Online(2));
    assert_eq!(recv(&mut a).await, ServerEvent::Online(2));

    tokio_test::assert_ok!(b.close(None).await);
    assert_eq!(recv(&mut a).await, ServerEvent::Online(1));
    assert_eq!(server.online().await, 1);
}

#[tokio::test]
async fn test_oversized_frame_keeps_connection() {
    let config = ServerConfig::default()
        .disable_online_broadcast()
        .max_message_size(20);
    let (addr, server) = spawn_server(config).await;

    let mut a = connect(addr).await;
    send(&mut a, json!({"event": "start", "pad": "x".repeat(40)})).await;
    let ServerEvent::Error { message } = recv(&mut a).await else {
        panic!("expected error for oversized frame");
    };
    assert!(message.contains("frame too large"));

    // Nothing was dispatched, and the same client can still start
    assert_eq!(server.stats().await.rooms, 0);
    let (role, _) = start(&mut a).await;
    assert_eq!(role, Role::P1);
    assert_eq!(server.stats().await.rooms, 1);
}

#[tokio::test]
async fn test_binary_frame_is_ignored() {
    let (addr, server) = spawn_server(ServerConfig::default().disable_online_broadcast()).await;

    let mut a = connect(addr).await;
    let frame = json!({"event": "start"}).to_string().into_bytes();
    tokio_test::assert_ok!(a.send(Message::Binary(frame)).await);

    // The next reply belongs to the text start, not to the binary frame
    let (role, _) = start(&mut a).await;
    assert_eq!(role, Role::P1);

    let stats = server.stats().await;
    assert_eq!(stats.rooms, 1);
    assert_eq!(stats.active_connections, 1);
}

#[tokio::test]
async fn test_frame_over_hard_limit_closes_connection() {
    let config = ServerConfig::default()
        .disable_online_broadcast()
        .max_message_size(16);
    let (addr, server) = spawn_server(config).await;

    let mut a = connect(addr).await;
    let padding = "x".repeat(16 * pairlink::server::config::HARD_LIMIT_FACTOR * 4);
    // The server may already be gone by the time the write completes
    let _ = a.send(Message::Text(padding)).await;

    loop {
        let frame = tokio::time::timeout(WAIT, a.next())
            .await
            .expect("connection stayed open");
        match frame {
            None | Some(Err(_)) | Some(Ok(Message::Close(_))) => break,
            Some(Ok(Message::Text(text))) => panic!("unexpected reply {text}"),
            Some(Ok(_)) => {}
        }
    }

    // Wait for the server side to finish unregistering
    for _ in 0..50 {
        if server.online().await == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(server.online().await, 0);
}
