use clap::{Parser, ValueEnum};
use common::options::{LogOptions, ProcessorOptions, QueueOptions, RedisOptions};
use common::{logging, shutdown_signal, HttpProcessor};
use coordinator::{
    CancellationToken, Coordinator, CoordinatorError, MemoryQueue, ReceiverCoordinator,
    Request, RequestReceiver, Response,
};
use redis_queue::RedisQueue;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info_span;

mod connector;
mod protocol;
mod socket;

use connector::WebSocketConnector;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Hand requests to the Redis queue for a separate response-proxy
    Split,
    /// Process requests in this process and answer directly
    Unified,
}

/// Accepts client requests over WebSocket and pushes their responses back
#[derive(Debug, Parser)]
#[command(version, about)]
struct Options {
    /// Address to listen on for client sockets
    #[arg(long, env = "LISTEN", default_value = "127.0.0.1:3000")]
    listen: SocketAddr,

    #[arg(long, env = "MODE", value_enum, default_value_t = Mode::Split)]
    mode: Mode,

    #[command(flatten)]
    redis: RedisOptions,

    #[command(flatten)]
    queue: QueueOptions,

    #[command(flatten)]
    processor: ProcessorOptions,

    #[command(flatten)]
    log: LogOptions,
}

enum Service {
    Split(ReceiverCoordinator<String, String>),
    Unified(Coordinator<String, String>),
}

impl Service {
    fn start(&self, token: &CancellationToken) -> Result<(), CoordinatorError> {
        match self {
            Self::Split(coordinator) => coordinator.start(token),
            Self::Unified(coordinator) => coordinator.start(token),
        }
    }

    async fn stop(&self) {
        match self {
            Self::Split(coordinator) => coordinator.stop().await,
            Self::Unified(coordinator) => coordinator.stop().await,
        }
    }
}

async fn build_service(
    options: &Options,
    connector: Arc<WebSocketConnector>,
    receiver: Arc<RequestReceiver<String>>,
) -> anyhow::Result<Service> {
    let service = match options.mode {
        Mode::Split => {
            let redis = redis_queue::connect(&options.redis.url).await?;

            let coordinator = ReceiverCoordinator::<String, String>::bridge_builder()
                .connector(connector)
                .request_receiver(receiver)
                .request_queue(Arc::new(RedisQueue::<Request<String>>::new(
                    redis.clone(),
                    &options.queue.request_queue,
                )?))
                .response_queue(Arc::new(RedisQueue::<Response<String>>::new(
                    redis,
                    &options.queue.response_queue,
                )?))
                .logger(info_span!("receiver"))
                .poll_interval(options.queue.poll_interval())
                .build()?;

            Service::Split(coordinator)
        }
        Mode::Unified => {
            let coordinator = Coordinator::<String, String>::builder()
                .connector(connector)
                .queue(Arc::new(MemoryQueue::<Request<String>>::new()))
                .processor(Arc::new(HttpProcessor::new(&options.processor)))
                .logger(info_span!("coordinator"))
                .poll_interval(options.queue.poll_interval())
                .build()?;

            Service::Unified(coordinator)
        }
    };

    Ok(service)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let options = Options::parse();
    logging::init(&options.log);

    let receiver = Arc::new(RequestReceiver::new());
    let connector = Arc::new(WebSocketConnector::new(receiver.clone()));
    let service = build_service(&options, connector.clone(), receiver).await?;

    let token = CancellationToken::new();
    service.start(&token)?;

    let served = socket::run(options.listen, connector, shutdown_signal()).await;

    token.cancel();
    service.stop().await;

    served
}
