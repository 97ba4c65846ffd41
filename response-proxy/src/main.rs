use clap::Parser;
use common::options::{LogOptions, ProcessorOptions, QueueOptions, RedisOptions};
use common::{logging, shutdown_signal, HttpProcessor};
use coordinator::{CancellationToken, ProcessorCoordinator, Request, Response};
use redis_queue::RedisQueue;
use std::sync::Arc;
use tracing::{info, info_span};

/// Takes requests off the shared queue, has the REST API process them and queues the responses
#[derive(Debug, Parser)]
#[command(version, about)]
struct Options {
    #[command(flatten)]
    redis: RedisOptions,

    #[command(flatten)]
    queue: QueueOptions,

    #[command(flatten)]
    processor: ProcessorOptions,

    #[command(flatten)]
    log: LogOptions,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let options = Options::parse();
    logging::init(&options.log);

    let redis = redis_queue::connect(&options.redis.url).await?;
    let requests = RedisQueue::<Request<String>>::new(redis.clone(), &options.queue.request_queue)?;
    let responses = RedisQueue::<Response<String>>::new(redis, &options.queue.response_queue)?;

    info!(
        endpoint = %options.processor.endpoint(),
        requests = requests.name(),
        responses = responses.name(),
        "Processing queued requests"
    );

    let coordinator = ProcessorCoordinator::<String, String>::builder()
        .request_queue(Arc::new(requests))
        .response_queue(Arc::new(responses))
        .processor(Arc::new(HttpProcessor::new(&options.processor)))
        .logger(info_span!("processor"))
        .poll_interval(options.queue.poll_interval())
        .build()?;

    let token = CancellationToken::new();
    coordinator.start(&token)?;

    shutdown_signal().await;

    token.cancel();
    coordinator.stop().await;

    Ok(())
}
