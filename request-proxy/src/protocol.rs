//! JSON frames exchanged with clients over the socket

use serde::{Deserialize, Serialize};

/// Frame sent by a client to submit a request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientMessage {
    pub request_id: String,
    pub data: String,
}

/// Frame pushed to a client
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// The request has been handed off, its response follows later
    #[serde(rename_all = "camelCase")]
    Accepted { request_id: String },
    #[serde(rename_all = "camelCase")]
    Response { request_id: String, data: String },
    #[serde(rename_all = "camelCase")]
    Error {
        #[serde(skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
        message: String,
    },
}
