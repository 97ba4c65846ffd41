use crate::error::{require, CoordinatorError};
use crate::lifecycle::Lifecycle;
use crate::model::{Payload, Request, Response};
use crate::pipeline::{poll, Dispatch, Process, DEFAULT_POLL_INTERVAL};
use crate::processor::Processor;
use crate::queue::Queue;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, Span};

/// Worker-side coordinator of a split deployment
///
/// Drains the request queue, invokes the processor and enqueues each response with the
/// identifiers of its request. A request whose processing fails yields no response.
pub struct ProcessorCoordinator<Req, Res> {
    request_queue: Arc<dyn Queue<Request<Req>>>,
    response_queue: Arc<dyn Queue<Response<Res>>>,
    processor: Arc<dyn Processor<Req, Res>>,
    poll_interval: Duration,
    lifecycle: Lifecycle,
}

impl<Req: Payload, Res: Payload> ProcessorCoordinator<Req, Res> {
    pub fn builder() -> ProcessorCoordinatorBuilder<Req, Res> {
        ProcessorCoordinatorBuilder {
            request_queue: None,
            response_queue: None,
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
            .in_scope(|| info!("Processor coordinator is starting"));

        let queue = self.request_queue.clone();
        let step = Process {
            processor: self.processor.clone(),
            dispatch: Dispatch::<Req, Res>::Enqueue(self.response_queue.clone()),
        };
        let poll_interval = self.poll_interval;

        self.lifecycle
            .start(token, move |token| poll(queue, step, poll_interval, token))
    }

    pub async fn stop(&self) {
        self.lifecycle
            .span()
            .in_scope(|| info!("Processor coordinator is stopping"));
        self.lifecycle.stop().await;
        self.lifecycle
            .span()
            .in_scope(|| info!("Processor coordinator is stopped"));
    }
}

pub struct ProcessorCoordinatorBuilder<Req, Res> {
    request_queue: Option<Arc<dyn Queue<Request<Req>>>>,
    response_queue: Option<Arc<dyn Queue<Response<Res>>>>,
    processor: Option<Arc<dyn Processor<Req, Res>>>,
    logger: Option<Span>,
    poll_interval: Duration,
}

impl<Req: Payload, Res: Payload> ProcessorCoordinatorBuilder<Req, Res> {
    pub fn request_queue(mut self, queue: Arc<dyn Queue<Request<Req>>>) -> Self {
        self.request_queue = Some(queue);
        self
    }

    pub fn response_queue(mut self, queue: Arc<dyn Queue<Response<Res>>>) -> Self {
        self.response_queue = Some(queue);
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

    pub fn build(self) -> Result<ProcessorCoordinator<Req, Res>, CoordinatorError> {
        Ok(ProcessorCoordinator {
            request_queue: require(self.request_queue, "requestQueue")?,
            response_queue: require(self.response_queue, "responseQueue")?,
            processor: require(self.processor, "processor")?,
            poll_interval: self.poll_interval,
            lifecycle: Lifecycle::new(require(self.logger, "logger")?),
        })
    }
}
