//! Coordination layer decoupling request ingestion from request processing
//!
//! Requests arrive through a [`Connector`], are handed to a request [`Queue`], processed by a
//! [`Processor`] and routed back to their client connection. Two deployment modes share one
//! loop core:
//!
//! - split: a [`ReceiverCoordinator`] next to the transport and any number of
//!   [`ProcessorCoordinator`]s elsewhere, talking through a request and a response queue
//! - unified: a single [`Coordinator`] which processes requests in-process and sends the
//!   responses straight through the connector
//!
//! Delivery is best effort. A request whose processing fails is dropped without notifying the
//! client, failed sends are not retried and nothing is dead-lettered.

mod connector;
mod error;
mod lifecycle;
mod model;
mod pipeline;
mod processing;
mod processor;
mod queue;
mod receiver;
mod unified;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use connector::{Connector, InboundHandler, RequestReceiver};
pub use error::{BoxedError, ConnectorError, CoordinatorError, ProcessError, QueueError};
pub use model::{Payload, Request, Response};
pub use pipeline::DEFAULT_POLL_INTERVAL;
pub use processing::{ProcessorCoordinator, ProcessorCoordinatorBuilder};
pub use processor::{FnProcessor, Processor};
pub use queue::{MemoryQueue, Queue};
pub use receiver::{ReceiverCoordinator, ReceiverCoordinatorBuilder};
pub use unified::{Coordinator, CoordinatorBuilder};

pub use tokio_util::sync::CancellationToken;
