use crate::error::ProcessError;
use async_trait::async_trait;
use std::future::Future;

/// Business logic mapping a request payload to a response payload
#[async_trait]
pub trait Processor<Req, Res>: Send + Sync {
    async fn process(&self, data: Req) -> Result<Res, ProcessError>;
}

/// [`Processor`] backed by an async closure
pub struct FnProcessor<F> {
    f: F,
}

impl<F> FnProcessor<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<Req, Res, F, Fut> Processor<Req, Res> for FnProcessor<F>
where
    Req: Send + 'static,
    Res: Send + 'static,
    F: Fn(Req) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Res, ProcessError>> + Send,
{
    async fn process(&self, data: Req) -> Result<Res, ProcessError> {
        (self.f)(data).await
    }
}
