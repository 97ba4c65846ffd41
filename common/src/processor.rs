use crate::options::ProcessorOptions;
use async_trait::async_trait;
use coordinator::{ProcessError, Processor};
use tracing::debug;

/// Processor forwarding each payload to a REST endpoint and answering with the response body
#[derive(Clone)]
pub struct HttpProcessor {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpProcessor {
    pub fn new(options: &ProcessorOptions) -> Self {
        Self::with_endpoint(options.endpoint())
    }

    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl Processor<String, String> for HttpProcessor {
    async fn process(&self, data: String) -> Result<String, ProcessError> {
        debug!(endpoint = %self.endpoint, "Forwarding payload");

        let response = self
            .client
            .post(&self.endpoint)
            .body(data)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| ProcessError::Failed(Box::new(e)))?;

        response
            .text()
            .await
            .map_err(|e| ProcessError::Failed(Box::new(e)))
    }
}
