use crate::connector::{Connector, InboundHandler, RequestReceiver};
use crate::error::{require, CoordinatorError};
use crate::lifecycle::Lifecycle;
use crate::model::{Payload, Request, Response};
use crate::pipeline::{poll, Deliver, EnqueueRequest, DEFAULT_POLL_INTERVAL};
use crate::queue::Queue;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, Span};

/// Transport-side coordinator of a split deployment
///
/// Enqueues every inbound request onto the request queue and runs one background loop that
/// delivers responses from the response queue through the connector. Delivery failures are
/// logged per response and never retried.
pub struct ReceiverCoordinator<Req, Res> {
    connector: Arc<dyn Connector<Req, Res>>,
    request_queue: Arc<dyn Queue<Request<Req>>>,
    response_queue: Arc<dyn Queue<Response<Res>>>,
    request_receiver: Option<Arc<RequestReceiver<Req>>>,
    poll_interval: Duration,
    subscribed: AtomicBool,
    lifecycle: Lifecycle,
}

impl<Req: Payload, Res: Payload> ReceiverCoordinator<Req, Res> {
    /// Builder for a coordinator which subscribes to the connector itself
    pub fn builder() -> ReceiverCoordinatorBuilder<Req, Res> {
        ReceiverCoordinatorBuilder::new(false)
    }

    /// Builder for a coordinator which subscribes to a [`RequestReceiver`] fed by the transport
    pub fn bridge_builder() -> ReceiverCoordinatorBuilder<Req, Res> {
        ReceiverCoordinatorBuilder::new(true)
    }

    pub fn is_running(&self) -> bool {
        self.lifecycle.is_running()
    }

    /// Subscribes to inbound requests and launches the response delivery loop
    pub fn start(&self, token: &CancellationToken) -> Result<(), CoordinatorError> {
        self.lifecycle
            .span()
            .in_scope(|| info!("Receiver coordinator is starting"));

        if !self.subscribed.swap(true, Ordering::SeqCst) {
            let handler: Arc<dyn InboundHandler<Req>> = Arc::new(EnqueueRequest {
                queue: self.request_queue.clone(),
            });

            match &self.request_receiver {
                Some(receiver) => receiver.subscribe(handler),
                None => self.connector.subscribe(handler),
            }
        }

        let queue = self.response_queue.clone();
        let step = Deliver {
            connector: self.connector.clone(),
        };
        let poll_interval = self.poll_interval;

        self.lifecycle
            .start(token, move |token| poll(queue, step, poll_interval, token))
    }

    pub async fn stop(&self) {
        self.lifecycle
            .span()
            .in_scope(|| info!("Stopping the receiver coordinator"));
        self.lifecycle.stop().await;
        self.lifecycle
            .span()
            .in_scope(|| info!("Receiver coordinator has been stopped"));
    }
}

pub struct ReceiverCoordinatorBuilder<Req, Res> {
    bridged: bool,
    connector: Option<Arc<dyn Connector<Req, Res>>>,
    request_queue: Option<Arc<dyn Queue<Request<Req>>>>,
    response_queue: Option<Arc<dyn Queue<Response<Res>>>>,
    request_receiver: Option<Arc<RequestReceiver<Req>>>,
    logger: Option<Span>,
    poll_interval: Duration,
}

impl<Req: Payload, Res: Payload> ReceiverCoordinatorBuilder<Req, Res> {
    fn new(bridged: bool) -> Self {
        Self {
            bridged,
            connector: None,
            request_queue: None,
            response_queue: None,
            request_receiver: None,
            logger: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn connector(mut self, connector: Arc<dyn Connector<Req, Res>>) -> Self {
        self.connector = Some(connector);
        self
    }

    pub fn request_queue(mut self, queue: Arc<dyn Queue<Request<Req>>>) -> Self {
        self.request_queue = Some(queue);
        self
    }

    pub fn response_queue(mut self, queue: Arc<dyn Queue<Response<Res>>>) -> Self {
        self.response_queue = Some(queue);
        self
    }

    /// Ignored unless built through [`ReceiverCoordinator::bridge_builder`]
    pub fn request_receiver(mut self, receiver: Arc<RequestReceiver<Req>>) -> Self {
        self.request_receiver = Some(receiver);
        self
    }

    /// Span every log record of the coordinator is emitted in
    pub fn logger(mut self, span: Span) -> Self {
        self.logger = Some(span);
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn build(self) -> Result<ReceiverCoordinator<Req, Res>, CoordinatorError> {
        let connector = require(self.connector, "connector")?;
        let request_queue = require(self.request_queue, "requestQueue")?;
        let response_queue = require(self.response_queue, "responseQueue")?;
        let logger = require(self.logger, "logger")?;

        // only the bridge variant subscribes through a receiver
        let request_receiver = if self.bridged {
            Some(require(self.request_receiver, "requestReceiver")?)
        } else {
            None
        };

        Ok(ReceiverCoordinator {
            connector,
            request_queue,
            response_queue,
            request_receiver,
            poll_interval: self.poll_interval,
            subscribed: AtomicBool::new(false),
            lifecycle: Lifecycle::new(logger),
        })
    }
}
