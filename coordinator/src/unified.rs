use crate::connector::{Connector, InboundHandler};
use crate::error::{require, CoordinatorError};
use crate::lifecycle::Lifecycle;
use crate::model::{Payload, Request};
use crate::pipeline::{poll, Dispatch, EnqueueRequest, Process, DEFAULT_POLL_INTERVAL};
use crate::processor::Processor;
use crate::queue::Queue;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, Span};

/// Single-process coordinator
///
/// Runs the processing stage of [`ProcessorCoordinator`](crate::ProcessorCoordinator) but pushes
/// each response straight to the connector instead of going through a response queue.
pub struct Coordinator<Req, Res> {
    connector: Arc<dyn Connector<Req, Res>>,
    queue: Arc<dyn Queue<Request<Req>>>,
    processor: Arc<dyn Processor<Req, Res>>,
    poll_interval: Duration,
    subscribed: AtomicBool,
    lifecycle: Lifecycle,
}

impl<Req: Payload, Res: Payload> Coordinator<Req, Res> {
    pub fn builder() -> CoordinatorBuilder<Req, Res> {
        CoordinatorBuilder {
            connector: None,
            queue: None,
            processor: None,
            logger: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn is_running(&self) -> bool {
        self.lifecycle.is_running()
    }

    pub fn start(&self, token: &CancellationToken) -> Result<(), CoordinatorError> {
        self.lifecycle
            .span()
            .in_scope(|| info!("Coordinator is starting"));

        if !self.subscribed.swap(true, Ordering::SeqCst) {
            let handler: Arc<dyn InboundHandler<Req>> = Arc::new(EnqueueRequest {
                queue: self.queue.clone(),
            });
            self.connector.subscribe(handler);
        }

        let queue = self.queue.clone();
        let step = Process {
            processor: self.processor.clone(),
            dispatch: Dispatch::Send(self.connector.clone()),
        };
        let poll_interval = self.poll_interval;

        self.lifecycle
            .start(token, move |token| poll(queue, step, poll_interval, token))
    }

    /// Starts with a token owned by the coordinator, only [`Coordinator::stop`] ends the loop
    pub fn start_default(&self) -> Result<(), CoordinatorError> {
        self.start(&CancellationToken::new())
    }

    pub async fn stop(&self) {
        self.lifecycle
            .span()
            .in_scope(|| info!("Coordinator is stopping"));
        self.lifecycle.stop().await;
        self.lifecycle
            .span()
            .in_scope(|| info!("Coordinator has stopped"));
    }
}

pub struct CoordinatorBuilder<Req, Res> {
    connector: Option<Arc<dyn Connector<Req, Res>>>,
    queue: Option<Arc<dyn Queue<Request<Req>>>>,
    processor: Option<Arc<dyn Processor<Req, Res>>>,
    logger: Option<Span>,
    poll_interval: Duration,
}

impl<Req: Payload, Res: Payload> CoordinatorBuilder<Req, Res> {
    pub fn connector(mut self, connector: Arc<dyn Connector<Req, Res>>) -> Self {
        self.connector = Some(connector);
        self
    }

    pub fn queue(mut self, queue: Arc<dyn Queue<Request<Req>>>) -> Self {
        self.queue = Some(queue);
        self
    }

    pub fn processor(mut self, processor: Arc<dyn Processor<Req, Res>>) -> Self {
        self.processor = Some(processor);
        self
    }

    pub fn logger(mut self, span: Span) -> Self {
        self.logger = Some(span);
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn build(self) -> Result<Coordinator<Req, Res>, CoordinatorError> {
        Ok(Coordinator {
            connector: require(self.connector, "connector")?,
            queue: require(self.queue, "queue")?,
            processor: require(self.processor, "processor")?,
            poll_interval: self.poll_interval,
            subscribed: AtomicBool::new(false),
            lifecycle: Lifecycle::new(require(self.logger, "logger")?),
        })
    }
}
