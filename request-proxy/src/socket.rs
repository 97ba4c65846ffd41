use crate::connector::WebSocketConnector;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::{response::IntoResponse, routing::get, Extension, Router};
use futures::{SinkExt, StreamExt};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub fn router(connector: Arc<WebSocketConnector>) -> Router {
    Router::new()
        .route("/ws", get(upgrade))
        .layer(Extension(connector))
}

/// Serves client sockets on `addr` until `shutdown` resolves
pub async fn run(
    addr: SocketAddr,
    connector: Arc<WebSocketConnector>,
    shutdown: impl Future<Output = ()>,
) -> anyhow::Result<()> {
    info!(%addr, "Listening for client connections");

    axum::Server::try_bind(&addr)?
        .serve(router(connector).into_make_service())
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

async fn upgrade(
    ws: WebSocketUpgrade,
    Extension(connector): Extension<Arc<WebSocketConnector>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| session(socket, connector))
}

async fn session(socket: WebSocket, connector: Arc<WebSocketConnector>) {
    let (connection_id, mut outbound) = connector.register().await;
    let (mut sink, mut stream) = socket.split();

    let writer = tokio::spawn(async move {
        while let Some(frame) = outbound.recv().await {
            if sink.send(Message::Text(frame)).await.is_err() {
                break;
            }
        }
    });

    while let Some(message) = stream.next().await {
        match message {
            Ok(Message::Text(text)) => connector.handle_frame(&connection_id, &text).await,
            Ok(Message::Close(_)) => break,
            Ok(other) => debug!(%connection_id, ?other, "Ignoring non-text frame"),
            Err(e) => {
                warn!(%connection_id, error = %e, "Socket error");
                break;
            }
        }
    }

    connector.unregister(&connection_id).await;
    writer.abort();
}
