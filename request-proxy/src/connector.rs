use crate::protocol::{ClientMessage, ServerMessage};
use async_trait::async_trait;
use coordinator::{Connector, ConnectorError, InboundHandler, Request, RequestReceiver, Response};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::{info, warn};
use uuid::Uuid;

pub type Outbound = mpsc::UnboundedReceiver<String>;

/// WebSocket transport keyed by connection id
///
/// Each socket session registers an outbound channel and feeds its inbound frames through
/// [`WebSocketConnector::handle_frame`]. Requests are forwarded to the shared
/// [`RequestReceiver`] since sessions come and go independently of the coordinator.
pub struct WebSocketConnector {
    connections: RwLock<HashMap<String, mpsc::UnboundedSender<String>>>,
    receiver: Arc<RequestReceiver<String>>,
}

impl WebSocketConnector {
    pub fn new(receiver: Arc<RequestReceiver<String>>) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            receiver,
        }
    }

    /// Allocates a connection id and the channel of frames to push to it
    pub async fn register(&self) -> (String, Outbound) {
        let connection_id = Uuid::new_v4().to_string();
        let (tx, rx) = mpsc::unbounded_channel();

        self.connections
            .write()
            .await
            .insert(connection_id.clone(), tx);

        info!(%connection_id, "Client has connected");
        (connection_id, rx)
    }

    pub async fn unregister(&self, connection_id: &str) {
        self.connections.write().await.remove(connection_id);
        info!(%connection_id, "Client has disconnected");
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Parses a text frame from `connection_id` and hands the request off
    ///
    /// Answers with an `accepted` frame once the request is enqueued or an `error` frame if it
    /// was rejected. Processing happens later, the response is pushed separately.
    pub async fn handle_frame(&self, connection_id: &str, text: &str) {
        let reply = match serde_json::from_str::<ClientMessage>(text) {
            Ok(message) if message.request_id.is_empty() => {
                warn!(%connection_id, "The received request ID is empty");
                ServerMessage::Error {
                    request_id: None,
                    message: ConnectorError::EmptyRequestId.to_string(),
                }
            }
            Ok(ClientMessage { request_id, data }) => {
                info!(%request_id, %connection_id, "Received client request");
                let request = Request::new(request_id.clone(), connection_id, data);

                match self.receiver.receive(request).await {
                    Ok(()) => ServerMessage::Accepted { request_id },
                    Err(e) => ServerMessage::Error {
                        request_id: Some(request_id),
                        message: format!("An error occurred while processing your request: {e}"),
                    },
                }
            }
            Err(e) => {
                warn!(%connection_id, error = %e, "Malformed client frame");
                ServerMessage::Error {
                    request_id: None,
                    message: format!("malformed frame: {e}"),
                }
            }
        };

        if let Err(e) = self.push(connection_id, &reply).await {
            warn!(%connection_id, error = %e, "Unable to answer client frame");
        }
    }

    async fn push(&self, connection_id: &str, message: &ServerMessage) -> Result<(), ConnectorError> {
        if connection_id.is_empty() {
            return Err(ConnectorError::EmptyConnectionId);
        }

        let frame =
            serde_json::to_string(message).map_err(|e| ConnectorError::Transport(Box::new(e)))?;

        let connections = self.connections.read().await;
        let tx = connections
            .get(connection_id)
            .ok_or_else(|| ConnectorError::UnknownConnection(connection_id.to_owned()))?;

        tx.send(frame)
            .map_err(|_| ConnectorError::Closed(connection_id.to_owned()))
    }
}

#[async_trait]
impl Connector<String, String> for WebSocketConnector {
    fn subscribe(&self, handler: Arc<dyn InboundHandler<String>>) {
        self.receiver.subscribe(handler);
    }

    async fn send_response(
        &self,
        connection_id: &str,
        response: &Response<String>,
    ) -> Result<(), ConnectorError> {
        let message = ServerMessage::Response {
            request_id: response.request_id().to_owned(),
            data: response.data().clone(),
        };

        self.push(connection_id, &message).await
    }
}
