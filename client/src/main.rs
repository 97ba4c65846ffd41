use std::collections::HashSet;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use common::{logging, options::LogOptions};
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{info, warn};
use uuid::Uuid;

/// Submits requests to the request-proxy and waits for their responses
#[derive(Debug, Parser)]
#[command(version, about)]
struct Options {
    #[arg(long, env = "PROXY_URL", default_value = "ws://127.0.0.1:3000/ws")]
    url: String,

    /// Number of requests to send
    #[arg(short = 'n', long, default_value_t = 1)]
    count: usize,

    #[arg(short, long, default_value = "Hello from the client")]
    data: String,

    /// Seconds to wait for all responses
    #[arg(short, long, default_value_t = 10)]
    timeout: u64,

    #[command(flatten)]
    log: LogOptions,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let options = Options::parse();
    logging::init(&options.log);

    let (socket, _) = connect_async(&options.url)
        .await
        .with_context(|| format!("unable to connect to {}", options.url))?;
    let (mut sink, mut stream) = socket.split();

    let mut pending = HashSet::new();
    for _ in 0..options.count {
        let request_id = Uuid::new_v4().to_string();
        let frame = json!({ "requestId": request_id, "data": options.data });

        sink.send(Message::Text(frame.to_string())).await?;
        pending.insert(request_id);
    }

    let receive = async {
        while !pending.is_empty() {
            let Some(message) = stream.next().await else {
                bail!("connection closed by the proxy");
            };

            let Message::Text(text) = message? else {
                continue;
            };

            let frame: Value = serde_json::from_str(&text)?;
            let request_id = frame["requestId"].as_str().unwrap_or_default().to_owned();

            match frame["type"].as_str() {
                Some("accepted") => info!(%request_id, "Accepted"),
                Some("response") => {
                    println!("{request_id}: {}", frame["data"]);
                    pending.remove(&request_id);
                }
                Some("error") => {
                    warn!(%request_id, reason = %frame["message"], "Request failed");
                    pending.remove(&request_id);
                }
                _ => warn!(%text, "Unexpected frame"),
            }
        }

        Ok::<_, anyhow::Error>(())
    };

    tokio::time::timeout(Duration::from_secs(options.timeout), receive)
        .await
        .context("timed out waiting for responses")??;

    sink.close().await?;
    Ok(())
}
