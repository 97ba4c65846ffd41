use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Bound shared by every request and response payload
pub trait Payload: Debug + Send + Sync + 'static {}

impl<T> Payload for T where T: Debug + Send + Sync + 'static {}

/// Request from a client connection, correlated by a caller supplied id
///
/// The id is opaque to this crate. Duplicates are not detected and are processed independently.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Request<T> {
    request_id: String,
    connection_id: String,
    data: T,
}

impl<T> Request<T> {
    pub fn new(request_id: impl Into<String>, connection_id: impl Into<String>, data: T) -> Self {
        Self {
            request_id: request_id.into(),
            connection_id: connection_id.into(),
            data,
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn connection_id(&self) -> &str {
        &self.connection_id
    }

    pub fn data(&self) -> &T {
        &self.data
    }

    /// Builds the response to this request, carrying both identifiers over unchanged
    pub fn respond<R>(&self, data: R) -> Response<R> {
        Response {
            request_id: self.request_id.clone(),
            connection_id: self.connection_id.clone(),
            data,
        }
    }

    /// Splits the request into its correlation part and its payload
    pub(crate) fn into_parts(self) -> (Request<()>, T) {
        let Self {
            request_id,
            connection_id,
            data,
        } = self;

        (
            Request {
                request_id,
                connection_id,
                data: (),
            },
            data,
        )
    }
}

/// Result of processing a [`Request`], routed back via its connection id
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Response<T> {
    request_id: String,
    connection_id: String,
    data: T,
}

impl<T> Response<T> {
    pub fn new(request_id: impl Into<String>, connection_id: impl Into<String>, data: T) -> Self {
        Self {
            request_id: request_id.into(),
            connection_id: connection_id.into(),
            data,
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn connection_id(&self) -> &str {
        &self.connection_id
    }

    pub fn data(&self) -> &T {
        &self.data
    }

    pub fn into_data(self) -> T {
        self.data
    }
}
