//! Wire format of queued items
//!
//! Every item is stored as one self-describing JSON text element, e.g.
//! `{"RequestId":"1","ConnectionId":"conn1","Data":"payload"}` for a request.

use coordinator::QueueError;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub fn encode<T: Serialize>(item: &T) -> Result<String, QueueError> {
    serde_json::to_string(item).map_err(|e| QueueError::Serialization(Box::new(e)))
}

pub fn decode<T: DeserializeOwned>(payload: &str) -> Result<T, QueueError> {
    serde_json::from_str(payload).map_err(|e| QueueError::Serialization(Box::new(e)))
}
