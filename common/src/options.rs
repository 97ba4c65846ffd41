//! Option groups flattened into the command line of each binary
//!
//! Every option can be provided through the environment as well.

use clap::Args;
use std::time::Duration;

/// Options for connecting to the Redis server
#[derive(Debug, Clone, Args)]
pub struct RedisOptions {
    /// Redis server URL
    #[arg(
        short = 'r',
        long = "redis",
        env = "REDIS_URL",
        default_value = "redis://127.0.0.1:6379/",
        value_name = "url"
    )]
    pub url: String,
}

/// Names of the shared queues and how often to poll them
#[derive(Debug, Clone, Args)]
pub struct QueueOptions {
    /// List holding requests waiting for a processor
    #[arg(long, env = "REQUEST_QUEUE", default_value = "requests")]
    pub request_queue: String,

    /// List holding responses waiting for delivery
    #[arg(long, env = "RESPONSE_QUEUE", default_value = "responses")]
    pub response_queue: String,

    /// Idle wait between polls of an empty queue
    #[arg(long, env = "POLL_INTERVAL_MS", default_value_t = 100, value_name = "ms")]
    pub poll_interval_ms: u64,
}

impl QueueOptions {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Where requests are processed
#[derive(Debug, Clone, Args)]
pub struct ProcessorOptions {
    /// Base URL of the REST API doing the actual work
    #[arg(long, env = "REST_API", default_value = "http://127.0.0.1:8080")]
    pub rest_api: String,

    /// Route the request payload is posted to
    #[arg(long, env = "ROUTE", default_value = "/processed")]
    pub route: String,
}

impl ProcessorOptions {
    pub fn endpoint(&self) -> String {
        format!(
            "{}/{}",
            self.rest_api.trim_end_matches('/'),
            self.route.trim_start_matches('/')
        )
    }
}

/// Log level, scopable to different modules
#[derive(Debug, Clone, Args)]
pub struct LogOptions {
    /// Levels: trace, debug, info, warn, error
    #[arg(
        short,
        long,
        env = "RUST_LOG",
        default_value = "info,hyper=warn,tower=warn",
        value_name = "level"
    )]
    pub log: String,
}

#[cfg(test)]
mod does {
    use super::*;
    use clap::Parser;

    #[derive(Debug, Parser)]
    struct Cli {
        #[command(flatten)]
        queue: QueueOptions,
        #[command(flatten)]
        processor: ProcessorOptions,
    }

    #[test]
    fn fall_back_to_defaults() {
        let cli = Cli::try_parse_from(["test"]).unwrap();

        assert_eq!(cli.queue.request_queue, "requests");
        assert_eq!(cli.queue.response_queue, "responses");
        assert_eq!(cli.queue.poll_interval(), Duration::from_millis(100));
        assert_eq!(cli.processor.endpoint(), "http://127.0.0.1:8080/processed");
    }

    #[test]
    fn join_endpoint_without_duplicate_slashes() {
        let cli = Cli::try_parse_from([
            "test",
            "--rest-api",
            "http://api:8080/",
            "--route",
            "/upper",
            "--poll-interval-ms",
            "25",
        ])
        .unwrap();

        assert_eq!(cli.processor.endpoint(), "http://api:8080/upper");
        assert_eq!(cli.queue.poll_interval(), Duration::from_millis(25));
    }
}
