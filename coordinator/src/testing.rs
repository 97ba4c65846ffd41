//! Recording collaborators for exercising coordinators without a transport or backend

use crate::connector::{Connector, InboundHandler};
use crate::error::{ConnectorError, ProcessError, QueueError};
use crate::model::{Payload, Request, Response};
use crate::processor::Processor;
use crate::queue::Queue;
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Queue which records every enqueued item and counts dequeue calls
pub struct RecordingQueue<T> {
    items: Mutex<VecDeque<T>>,
    enqueued: Mutex<Vec<T>>,
    dequeues: AtomicUsize,
    fail_dequeue: AtomicBool,
}

impl<T: Clone> RecordingQueue<T> {
    pub fn new() -> Self {
        Self::with_items(Vec::new())
    }

    /// Queue which yields `items` in order and the empty sentinel afterwards
    pub fn with_items(items: impl IntoIterator<Item = T>) -> Self {
        Self {
            items: Mutex::new(items.into_iter().collect()),
            enqueued: Mutex::new(Vec::new()),
            dequeues: AtomicUsize::new(0),
            fail_dequeue: AtomicBool::new(false),
        }
    }

    /// Makes every following dequeue fail with a backend error
    pub fn fail_dequeue(&self, fail: bool) {
        self.fail_dequeue.store(fail, Ordering::SeqCst);
    }

    pub fn enqueued(&self) -> Vec<T> {
        self.enqueued.lock().clone()
    }

    pub fn dequeue_count(&self) -> usize {
        self.dequeues.load(Ordering::SeqCst)
    }
}

impl<T: Clone> Default for RecordingQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Clone + Send + 'static> Queue<T> for RecordingQueue<T> {
    async fn enqueue(&self, item: T) -> Result<usize, QueueError> {
        self.enqueued.lock().push(item.clone());
        let mut items = self.items.lock();
        items.push_back(item);
        Ok(items.len())
    }

    async fn dequeue(&self) -> Result<Option<T>, QueueError> {
        self.dequeues.fetch_add(1, Ordering::SeqCst);

        if self.fail_dequeue.load(Ordering::SeqCst) {
            return Err(QueueError::Backend("backend unavailable".into()));
        }

        Ok(self.items.lock().pop_front())
    }
}

/// Connector recording every response it is asked to send
pub struct RecordingConnector<Req, Res> {
    handler: RwLock<Option<Arc<dyn InboundHandler<Req>>>>,
    sent: Mutex<Vec<(String, Response<Res>)>>,
    attempts: AtomicUsize,
    disconnected: Mutex<HashSet<String>>,
    panicking: Mutex<HashSet<String>>,
}

impl<Req: Payload, Res: Payload + Clone> RecordingConnector<Req, Res> {
    pub fn new() -> Self {
        Self {
            handler: RwLock::new(None),
            sent: Mutex::new(Vec::new()),
            attempts: AtomicUsize::new(0),
            disconnected: Mutex::new(HashSet::new()),
            panicking: Mutex::new(HashSet::new()),
        }
    }

    /// Simulates a request arriving from a client
    pub async fn receive(&self, request: Request<Req>) -> Result<(), ConnectorError> {
        let handler = self.handler.read().clone();
        match handler {
            Some(handler) => handler.on_request(request).await,
            None => Err(ConnectorError::NoSubscriber),
        }
    }

    /// Makes sends to `connection_id` fail as if the client went away
    pub fn disconnect(&self, connection_id: &str) {
        self.disconnected.lock().insert(connection_id.to_owned());
    }

    /// Makes sends to `connection_id` panic inside the transport
    pub fn panic_on(&self, connection_id: &str) {
        self.panicking.lock().insert(connection_id.to_owned());
    }

    pub fn is_subscribed(&self) -> bool {
        self.handler.read().is_some()
    }

    /// Successfully sent responses with the connection they were routed to
    pub fn sent(&self) -> Vec<(String, Response<Res>)> {
        self.sent.lock().clone()
    }

    /// Number of send calls, including failed ones
    pub fn send_attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl<Req: Payload, Res: Payload + Clone> Default for RecordingConnector<Req, Res> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<Req: Payload, Res: Payload + Clone> Connector<Req, Res> for RecordingConnector<Req, Res> {
    fn subscribe(&self, handler: Arc<dyn InboundHandler<Req>>) {
        *self.handler.write() = Some(handler);
    }

    async fn send_response(
        &self,
        connection_id: &str,
        response: &Response<Res>,
    ) -> Result<(), ConnectorError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        if connection_id.is_empty() {
            return Err(ConnectorError::EmptyConnectionId);
        }

        if self.panicking.lock().contains(connection_id) {
            panic!("transport exploded while sending to {connection_id}");
        }

        if self.disconnected.lock().contains(connection_id) {
            return Err(ConnectorError::Closed(connection_id.to_owned()));
        }

        self.sent
            .lock()
            .push((connection_id.to_owned(), response.clone()));
        Ok(())
    }
}

type MapFn<Req, Res> = Box<dyn Fn(&Req) -> Result<Res, ProcessError> + Send + Sync>;

/// Processor recording its inputs and mapping them with a synchronous function
pub struct RecordingProcessor<Req, Res> {
    calls: Mutex<Vec<Req>>,
    map: MapFn<Req, Res>,
}

impl<Req: Clone, Res> RecordingProcessor<Req, Res> {
    pub fn new(map: impl Fn(&Req) -> Result<Res, ProcessError> + Send + Sync + 'static) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            map: Box::new(map),
        }
    }

    pub fn calls(&self) -> Vec<Req> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl<Req, Res> Processor<Req, Res> for RecordingProcessor<Req, Res>
where
    Req: Clone + Send + 'static,
    Res: Send + 'static,
{
    async fn process(&self, data: Req) -> Result<Res, ProcessError> {
        self.calls.lock().push(data.clone());
        (self.map)(&data)
    }
}

/// Polls `condition` every few milliseconds until it holds, panicking after `timeout`
pub async fn eventually(timeout: Duration, condition: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + timeout;

    while !condition() {
        if tokio::time::Instant::now() >= deadline {
            panic!("condition not met within {timeout:?}");
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
