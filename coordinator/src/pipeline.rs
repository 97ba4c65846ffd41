//! Loop core shared by all coordinators
//!
//! Every coordinator runs the same [`poll`] loop over a source queue. What happens to a dequeued
//! item is decided by a [`Step`]: either delivering a response to a connector, or processing a
//! request and dispatching the result. Whether the processed result goes through a response
//! queue or straight to the connector is a [`Dispatch`] choice, not a separate code path.

use crate::connector::{Connector, InboundHandler};
use crate::error::ConnectorError;
use crate::model::{Payload, Request, Response};
use crate::processor::Processor;
use crate::queue::Queue;
use async_trait::async_trait;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace};

/// Idle interval between polls of an empty queue
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Handling of a single dequeued item
///
/// Failures are handled within the step, one item can never terminate the loop.
#[async_trait]
pub(crate) trait Step<T>: Send + Sync {
    async fn handle(&self, item: T);
}

/// Drains `queue` into `step` until `token` is cancelled
pub(crate) async fn poll<T, S>(
    queue: Arc<dyn Queue<T>>,
    step: S,
    poll_interval: Duration,
    token: CancellationToken,
) where
    T: Send + 'static,
    S: Step<T>,
{
    info!("Starting to process the queue");

    while !token.is_cancelled() {
        match queue.dequeue().await {
            Ok(Some(item)) => step.handle(item).await,
            Ok(None) => {
                trace!("Queue is empty");
                if !idle(&token, poll_interval).await {
                    break;
                }
            }
            Err(e) => {
                error!(error = %e, "Failed to dequeue");
                if !idle(&token, poll_interval).await {
                    break;
                }
            }
        }
    }

    info!("Finished processing the queue");
}

/// Waits for `interval`, returning `false` if cancelled in the meantime
async fn idle(token: &CancellationToken, interval: Duration) -> bool {
    tokio::select! {
        _ = token.cancelled() => false,
        _ = tokio::time::sleep(interval) => true,
    }
}

/// Destination of processed responses
pub(crate) enum Dispatch<Req, Res> {
    /// Hand the response to a queue for a receiver coordinator to deliver
    Enqueue(Arc<dyn Queue<Response<Res>>>),
    /// Push the response straight to the client connection
    Send(Arc<dyn Connector<Req, Res>>),
}

/// Inbound handler enqueueing every request before returning
pub(crate) struct EnqueueRequest<Req> {
    pub queue: Arc<dyn Queue<Request<Req>>>,
}

#[async_trait]
impl<Req: Payload> InboundHandler<Req> for EnqueueRequest<Req> {
    async fn on_request(&self, request: Request<Req>) -> Result<(), ConnectorError> {
        let request_id = request.request_id().to_owned();

        info!(
            %request_id,
            connection_id = request.connection_id(),
            data = ?request.data(),
            "Received request"
        );

        match self.queue.enqueue(request).await {
            Ok(length) => {
                debug!(%request_id, length, "Enqueued request");
                Ok(())
            }
            Err(e) => {
                error!(%request_id, error = %e, "Failed to enqueue request");
                Err(e.into())
            }
        }
    }
}

/// Delivers queued responses to their client connection
pub(crate) struct Deliver<Req, Res> {
    pub connector: Arc<dyn Connector<Req, Res>>,
}

#[async_trait]
impl<Req: Payload, Res: Payload> Step<Response<Res>> for Deliver<Req, Res> {
    async fn handle(&self, response: Response<Res>) {
        send(self.connector.as_ref(), &response).await;
    }
}

/// Invokes the processor for a request and dispatches the result
pub(crate) struct Process<Req, Res> {
    pub processor: Arc<dyn Processor<Req, Res>>,
    pub dispatch: Dispatch<Req, Res>,
}

#[async_trait]
impl<Req: Payload, Res: Payload> Step<Request<Req>> for Process<Req, Res> {
    async fn handle(&self, request: Request<Req>) {
        let (head, data) = request.into_parts();
        let request_id = head.request_id();

        info!(%request_id, "Processing request");

        // Failed requests produce no response, the client is never notified
        let output = match AssertUnwindSafe(self.processor.process(data))
            .catch_unwind()
            .await
        {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                error!(%request_id, error = %e, "An error occurred while processing the request");
                return;
            }
            Err(panic) => {
                error!(
                    %request_id,
                    panic = panic_message(&*panic),
                    "The processor panicked while processing the request"
                );
                return;
            }
        };

        let response = head.respond(output);

        match &self.dispatch {
            Dispatch::Enqueue(queue) => match queue.enqueue(response).await {
                Ok(length) => info!(%request_id, length, "Request processing complete"),
                Err(e) => error!(%request_id, error = %e, "Failed to enqueue response"),
            },
            Dispatch::Send(connector) => send(connector.as_ref(), &response).await,
        }
    }
}

async fn send<Req, Res: Payload>(connector: &dyn Connector<Req, Res>, response: &Response<Res>) {
    let request_id = response.request_id();
    let connection_id = response.connection_id();

    debug!(%request_id, %connection_id, "Sending response");

    match AssertUnwindSafe(connector.send_response(connection_id, response))
        .catch_unwind()
        .await
    {
        Ok(Ok(())) => info!(%request_id, %connection_id, "Response sent"),
        Ok(Err(e)) => error!(
            %request_id,
            %connection_id,
            error = %e,
            "An error occurred while sending the response"
        ),
        Err(panic) => error!(
            %request_id,
            %connection_id,
            panic = panic_message(&*panic),
            "The connector panicked while sending the response"
        ),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
