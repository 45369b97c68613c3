//! Per-connection WebSocket handling
//!
//! Each accepted socket gets a reader loop (this task) and a writer task
//! draining the connection's bounded outbound queue. The reader turns text
//! frames into hub dispatches; when it stops, the connection is unregistered,
//! which releases its seat and notifies the partner.

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

use crate::error::{Error, Result};
use crate::protocol::{ClientEvent, ServerEvent};
use crate::registry::ConnectionId;
use crate::relay::Delivery;
use crate::server::config::ServerConfig;
use crate::server::hub::Hub;
use crate::session::SessionState;

type WsSink = SplitSink<WebSocketStream<TcpStream>, Message>;
type WsSource = SplitStream<WebSocketStream<TcpStream>>;

/// One client connection
pub(crate) struct Connection {
    session: SessionState,
    config: ServerConfig,
    hub: Arc<Mutex<Hub>>,
}

impl Connection {
    pub(crate) fn new(
        id: ConnectionId,
        peer_addr: SocketAddr,
        config: ServerConfig,
        hub: Arc<Mutex<Hub>>,
    ) -> Self {
        Self {
            session: SessionState::new(id, peer_addr),
            config,
            hub,
        }
    }

    /// Upgrade the socket and serve it until the client goes away
    pub(crate) async fn run(&mut self, socket: TcpStream) -> Result<()> {
        let timeout = self.config.handshake_timeout;
        let ws_config = self.config.websocket_config();
        let ws = tokio::time::timeout(
            timeout,
            tokio_tungstenite::accept_async_with_config(socket, Some(ws_config)),
        )
        .await
        .map_err(|_| Error::HandshakeTimeout(timeout))??;

        let (sink, mut source) = ws.split();
        let (tx, rx) = mpsc::channel(self.config.outbound_queue);

        self.hub.lock().await.register(self.session.id.clone(), tx);
        let writer = tokio::spawn(write_loop(self.session.id.clone(), sink, rx));

        tracing::debug!(
            connection = %self.session.id,
            peer = %self.session.peer_addr,
            "WebSocket established"
        );

        let result = self.read_loop(&mut source).await;

        // Partner may have left since our last frame
        {
            let mut hub = self.hub.lock().await;
            self.session.observe(hub.phase(&self.session.id));
            hub.unregister(&self.session.id);
        }
        let last_phase = self.session.phase;
        self.session.close();
        writer.abort();

        tracing::debug!(
            connection = %self.session.id,
            last_phase = ?last_phase,
            duration_ms = self.session.duration().as_millis() as u64,
            frames = self.session.frames_received,
            rejected = self.session.frames_rejected,
            "Session ended"
        );

        result
    }

    async fn read_loop(&mut self, source: &mut WsSource) -> Result<()> {
        while let Some(frame) = source.next().await {
            match frame? {
                Message::Text(text) => self.on_text(&text).await,
                Message::Close(_) => break,
                // Pings are answered by tungstenite; binary frames carry nothing we accept
                _ => {}
            }
        }

        Ok(())
    }

    async fn on_text(&mut self, text: &str) {
        self.session.frames_received += 1;

        let event = match decode(text, self.config.max_message_size) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(connection = %self.session.id, error = %e, "Rejected frame");
                self.reject(e.to_string()).await;
                return;
            }
        };

        let mut hub = self.hub.lock().await;
        hub.dispatch(&self.session.id, event);
        self.session.observe(hub.phase(&self.session.id));
    }

    async fn reject(&mut self, reason: impl Into<String>) {
        self.session.frames_rejected += 1;
        self.hub.lock().await.deliver(Delivery::new(
            self.session.id.clone(),
            ServerEvent::error(reason),
        ));
    }
}

/// Decode one text frame, enforcing the soft size limit
fn decode(text: &str, limit: usize) -> Result<ClientEvent> {
    if text.len() > limit {
        return Err(Error::FrameTooLarge {
            size: text.len(),
            limit,
        });
    }

    Ok(serde_json::from_str(text)?)
}

async fn write_loop(id: ConnectionId, mut sink: WsSink, mut rx: mpsc::Receiver<ServerEvent>) {
    while let Some(event) = rx.recv().await {
        let text = match serde_json::to_string(&event) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(connection = %id, error = %e, "Failed to encode event");
                continue;
            }
        };

        if let Err(e) = sink.send(Message::Text(text)).await {
            tracing::debug!(connection = %id, error = %e, "Write failed");
            break;
        }
    }

    let _ = sink.close().await;
}
