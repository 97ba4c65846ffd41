//! Durable [`Queue`] backed by a Redis list
//!
//! Items are pushed to the tail with `RPUSH` and popped from the head with `LPOP`, making the
//! list a strict FIFO no matter how many producers and consumers share it. Consumers race for
//! items: a popped item is gone, there is no visibility timeout or redelivery.

pub mod codec;

use async_trait::async_trait;
use coordinator::{Queue, QueueError};
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, IntoConnectionInfo, RedisError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, trace, warn};

const RETRY_INTERVAL: Duration = Duration::from_secs(2);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(4);

fn backend(e: RedisError) -> QueueError {
    QueueError::Backend(Box::new(e))
}

/// Connects to the Redis server at `url`, retrying until it becomes reachable
///
/// Only a malformed URL is reported as an error.
pub async fn connect(url: &str) -> Result<ConnectionManager, QueueError> {
    let info = url.into_connection_info().map_err(backend)?;
    let client = redis::Client::open(info).map_err(backend)?;

    loop {
        match timeout(CONNECT_TIMEOUT, ConnectionManager::new(client.clone())).await {
            Ok(Ok(manager)) => {
                info!(%url, "Connected to redis");
                return Ok(manager);
            }
            Ok(Err(e)) => warn!(error = %e, "Unable to connect to redis server"),
            Err(e) => warn!(error = %e, "Timed out while connecting to redis"),
        }

        sleep(RETRY_INTERVAL).await;
    }
}

/// Queue stored as a named Redis list
pub struct RedisQueue<T> {
    connection: ConnectionManager,
    name: String,
    item: PhantomData<fn() -> T>,
}

impl<T> RedisQueue<T> {
    pub fn new(connection: ConnectionManager, name: impl Into<String>) -> Result<Self, QueueError> {
        let name = name.into();

        if name.trim().is_empty() {
            return Err(QueueError::InvalidName);
        }

        Ok(Self {
            connection,
            name,
            item: PhantomData,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<T> Clone for RedisQueue<T> {
    fn clone(&self) -> Self {
        Self {
            connection: self.connection.clone(),
            name: self.name.clone(),
            item: PhantomData,
        }
    }
}

#[async_trait]
impl<T> Queue<T> for RedisQueue<T>
where
    T: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn enqueue(&self, item: T) -> Result<usize, QueueError> {
        let payload = codec::encode(&item)?;
        let mut con = self.connection.clone();

        let length: usize = con.rpush(&self.name, payload).await.map_err(|e| {
            error!(queue = %self.name, error = %e, "An error occurred during enqueue");
            backend(e)
        })?;

        debug!(queue = %self.name, length, "The item has been added to the queue");
        Ok(length)
    }

    async fn dequeue(&self) -> Result<Option<T>, QueueError> {
        let mut con = self.connection.clone();

        let payload: Option<String> = con.lpop(&self.name, None).await.map_err(|e| {
            error!(queue = %self.name, error = %e, "An error occurred while retrieving an item");
            backend(e)
        })?;

        match payload {
            Some(payload) if !payload.is_empty() => {
                let item = codec::decode(&payload).map_err(|e| {
                    error!(queue = %self.name, error = %e, "Discarding undecodable item");
                    e
                })?;
                debug!(queue = %self.name, "Retrieved an item from the queue");
                Ok(Some(item))
            }
            _ => {
                trace!(queue = %self.name, "Queue is empty");
                Ok(None)
            }
        }
    }
}
