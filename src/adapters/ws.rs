//! WebSocket connection to the agent network
//!
//! Implements both [`DiscoveryPort`] and [`MessagingPort`] over a single
//! WebSocket session carrying JSON text frames. Connecting performs a
//! registration handshake; afterwards a background reader task routes
//! inbound direct messages to the registered handler and resolves pending
//! discovery queries. The reader task is aborted when the connection is
//! closed or dropped, so the session cannot outlive the client.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::sync::{oneshot, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::{AgentDescriptor, DiscoveryPort, InboundHandler, MessagingPort};
use crate::error::{ConvertError, ConvertResult};

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type WsSource = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

const REGISTER_TIMEOUT: Duration = Duration::from_secs(10);

/// State shared with the reader task.
struct SharedState {
    handler: RwLock<Option<Arc<dyn InboundHandler>>>,
    pending_discoveries: Mutex<HashMap<String, oneshot::Sender<Vec<AgentDescriptor>>>>,
}

/// A registered session on the agent network.
pub struct WsConnection {
    agent_id: String,
    writer: Mutex<WsSink>,
    state: Arc<SharedState>,
    reader_task: JoinHandle<()>,
    discovery_timeout: Duration,
}

impl WsConnection {
    /// Connect to `host:port` and register as `agent_id`.
    pub async fn connect(
        host: &str,
        port: u16,
        agent_id: &str,
        discovery_timeout: Duration,
    ) -> ConvertResult<Self> {
        let url = format!("ws://{host}:{port}");
        let (stream, _) = connect_async(&url)
            .await
            .map_err(|e| ConvertError::Connection(format!("{url}: {e}")))?;
        let (mut writer, mut reader) = stream.split();

        let register = json!({
            "type": "register",
            "agent_id": agent_id,
            "metadata": {
                "name": "OpenConvert CLI Client",
                "type": "conversion_client",
                "capabilities": ["file_conversion_requests"],
                "version": env!("CARGO_PKG_VERSION"),
            },
        });
        writer
            .send(Message::Text(register.to_string()))
            .await
            .map_err(|e| ConvertError::Connection(format!("registration failed: {e}")))?;
        Self::await_register_ack(&mut reader).await?;
        debug!(agent_id, "registered with network");

        let state = Arc::new(SharedState {
            handler: RwLock::new(None),
            pending_discoveries: Mutex::new(HashMap::new()),
        });
        let reader_task = tokio::spawn(Self::read_loop(reader, state.clone()));

        Ok(Self {
            agent_id: agent_id.to_string(),
            writer: Mutex::new(writer),
            state,
            reader_task,
            discovery_timeout,
        })
    }

    async fn await_register_ack(reader: &mut WsSource) -> ConvertResult<()> {
        let ack = tokio::time::timeout(REGISTER_TIMEOUT, async {
            while let Some(message) = reader.next().await {
                let message =
                    message.map_err(|e| ConvertError::Connection(e.to_string()))?;
                let Message::Text(text) = message else {
                    continue;
                };
                let Ok(frame) = serde_json::from_str::<Value>(&text) else {
                    continue;
                };
                if frame.get("type").and_then(Value::as_str) == Some("register_ack") {
                    return if frame.get("success").and_then(Value::as_bool) == Some(false) {
                        let reason = frame
                            .get("error")
                            .and_then(Value::as_str)
                            .unwrap_or("registration rejected");
                        Err(ConvertError::Connection(reason.to_string()))
                    } else {
                        Ok(())
                    };
                }
            }
            Err(ConvertError::Connection(
                "connection closed during registration".to_string(),
            ))
        })
        .await;

        match ack {
            Ok(result) => result,
            Err(_) => Err(ConvertError::Connection(
                "timed out waiting for registration ack".to_string(),
            )),
        }
    }

    async fn read_loop(mut reader: WsSource, state: Arc<SharedState>) {
        while let Some(message) = reader.next().await {
            match message {
                Ok(Message::Text(text)) => match serde_json::from_str::<Value>(&text) {
                    Ok(frame) => Self::dispatch(&state, frame).await,
                    Err(e) => warn!("ignoring malformed frame: {e}"),
                },
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    warn!("connection read error: {e}");
                    break;
                }
            }
        }
        // Fail any discovery query still waiting on this connection.
        state.pending_discoveries.lock().await.clear();
        debug!("reader task finished");
    }

    async fn dispatch(state: &SharedState, frame: Value) {
        match frame.get("type").and_then(Value::as_str) {
            Some("direct_message") => {
                let Some(sender_id) = frame.get("source_id").and_then(Value::as_str) else {
                    warn!("direct message without source_id");
                    return;
                };
                let content = frame.get("content").cloned().unwrap_or(Value::Null);
                let handler = state.handler.read().await.clone();
                if let Some(handler) = handler {
                    handler.on_direct_message(sender_id, content).await;
                } else {
                    debug!(sender_id, "dropping direct message: no handler registered");
                }
            }
            Some("discovery_response") => {
                let Some(query_id) = frame.get("query_id").and_then(Value::as_str) else {
                    warn!("discovery response without query_id");
                    return;
                };
                let agents = frame
                    .get("agents")
                    .cloned()
                    .map(serde_json::from_value::<Vec<AgentDescriptor>>)
                    .and_then(Result::ok)
                    .unwrap_or_default();
                if let Some(tx) = state.pending_discoveries.lock().await.remove(query_id) {
                    let _ = tx.send(agents);
                } else {
                    debug!(query_id, "discovery response for unknown query");
                }
            }
            other => debug!(frame_type = ?other, "ignoring frame"),
        }
    }

    async fn send_frame(&self, frame: Value) -> ConvertResult<()> {
        self.writer
            .lock()
            .await
            .send(Message::Text(frame.to_string()))
            .await
            .map_err(|e| ConvertError::Connection(format!("send failed: {e}")))
    }

    /// Close the session and stop the reader task.
    pub async fn close(&self) {
        let _ = self.writer.lock().await.send(Message::Close(None)).await;
        self.reader_task.abort();
    }
}

impl Drop for WsConnection {
    fn drop(&mut self) {
        self.reader_task.abort();
    }
}

#[async_trait]
impl DiscoveryPort for WsConnection {
    async fn discover(
        &self,
        source_format: &str,
        target_format: &str,
    ) -> ConvertResult<Vec<AgentDescriptor>> {
        let query_id = Uuid::new_v4().to_string();
        let (tx, rx) = oneshot::channel();
        self.state
            .pending_discoveries
            .lock()
            .await
            .insert(query_id.clone(), tx);

        let query = json!({
            "type": "discovery_query",
            "query_id": query_id,
            "source_id": self.agent_id,
            "source_format": source_format,
            "target_format": target_format,
        });
        if let Err(e) = self.send_frame(query).await {
            self.state.pending_discoveries.lock().await.remove(&query_id);
            return Err(ConvertError::Discovery(e.to_string()));
        }

        match tokio::time::timeout(self.discovery_timeout, rx).await {
            Ok(Ok(agents)) => Ok(agents),
            Ok(Err(_)) => Err(ConvertError::Discovery(
                "connection closed during discovery".to_string(),
            )),
            Err(_) => {
                // No response inside the window means no capable agent is
                // currently known, which is a normal outcome.
                self.state.pending_discoveries.lock().await.remove(&query_id);
                Ok(Vec::new())
            }
        }
    }
}

#[async_trait]
impl MessagingPort for WsConnection {
    async fn send_direct(&self, target_id: &str, content: Value) -> ConvertResult<()> {
        let frame = json!({
            "type": "direct_message",
            "message_id": Uuid::new_v4().to_string(),
            "source_id": self.agent_id,
            "target_id": target_id,
            "content": content,
        });
        self.send_frame(frame).await
    }

    async fn register_handler(&self, handler: Arc<dyn InboundHandler>) {
        *self.state.handler.write().await = Some(handler);
    }
}
