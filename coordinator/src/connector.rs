//! Transport-facing boundary
//!
//! Inbound requests are delivered by calling a single registered [`InboundHandler`]. A
//! [`Connector`] accepts the handler directly. Transports which can not hold a subscription
//! themselves, for example because a framework creates them per call, share a
//! [`RequestReceiver`] instead and forward every request into it.

use crate::error::ConnectorError;
use crate::model::{Payload, Request, Response};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, error};

/// Consumer of inbound requests
///
/// Implementations should return as soon as the request has been handed off. The transport
/// may acknowledge the request to the client once this returns.
#[async_trait]
pub trait InboundHandler<T>: Send + Sync {
    async fn on_request(&self, request: Request<T>) -> Result<(), ConnectorError>;
}

/// Transport which receives requests from and pushes responses to client connections
#[async_trait]
pub trait Connector<Req, Res>: Send + Sync {
    /// Registers the handler invoked for every inbound request, replacing any previous one
    fn subscribe(&self, handler: Arc<dyn InboundHandler<Req>>);

    /// Pushes a response to a specific client connection
    ///
    /// Fails with [`ConnectorError::EmptyConnectionId`] if `connection_id` is empty.
    async fn send_response(
        &self,
        connection_id: &str,
        response: &Response<Res>,
    ) -> Result<(), ConnectorError>;
}

/// Bridge between a transport and the handler of inbound requests
pub struct RequestReceiver<T> {
    handler: RwLock<Option<Arc<dyn InboundHandler<T>>>>,
}

impl<T: Payload> RequestReceiver<T> {
    pub fn new() -> Self {
        Self {
            handler: RwLock::new(None),
        }
    }

    pub fn subscribe(&self, handler: Arc<dyn InboundHandler<T>>) {
        debug!("Handler subscribed to request receiver");
        *self.handler.write() = Some(handler);
    }

    pub fn has_subscriber(&self) -> bool {
        self.handler.read().is_some()
    }

    /// Forwards a request to the subscribed handler
    pub async fn receive(&self, request: Request<T>) -> Result<(), ConnectorError> {
        let handler = self.handler.read().clone();

        let Some(handler) = handler else {
            error!(request_id = request.request_id(), "The request receiver has no subscribers");
            return Err(ConnectorError::NoSubscriber);
        };

        let request_id = request.request_id().to_owned();
        handler.on_request(request).await.map_err(|e| {
            error!(%request_id, error = %e, "Error invoking the inbound handler");
            e
        })
    }
}

impl<T: Payload> Default for RequestReceiver<T> {
    fn default() -> Self {
        Self::new()
    }
}
