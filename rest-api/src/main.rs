use std::net::SocketAddr;

use axum::{http::StatusCode, response::IntoResponse, routing::post, Router};
use clap::Parser;
use common::{logging, options::LogOptions, shutdown_signal};
use tracing::{debug, info, warn};

/// Stand-in backend the proxies hand their requests to
#[derive(Debug, Parser)]
#[command(version, about)]
struct Options {
    #[arg(long, env = "LISTEN", default_value = "127.0.0.1:8080")]
    listen: SocketAddr,

    #[command(flatten)]
    log: LogOptions,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let options = Options::parse();
    logging::init(&options.log);

    info!(addr = %options.listen, "Listening");

    axum::Server::try_bind(&options.listen)?
        .serve(app().into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn app() -> Router {
    Router::new()
        .route("/reverse", post(reverse))
        .route("/upper", post(upper))
        .route("/processed", post(processed))
        .route("/fail", post(fail))
}

async fn reverse(payload: String) -> impl IntoResponse {
    payload.chars().rev().collect::<String>()
}

async fn upper(payload: String) -> impl IntoResponse {
    payload.to_uppercase()
}

async fn processed(payload: String) -> impl IntoResponse {
    debug!(%payload, "Processing");
    format!("Processed: {payload}")
}

async fn fail(payload: String) -> impl IntoResponse {
    warn!(%payload, "Refusing to process");
    (StatusCode::INTERNAL_SERVER_ERROR, "processing failed")
}

#[cfg(test)]
mod does {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use pretty_assertions::assert_eq;
    use tower::ServiceExt;

    async fn post(uri: &str, body: &'static str) -> (StatusCode, String) {
        let response = app()
            .oneshot(
                Request::post(uri)
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn transform_payloads() {
        assert_eq!(post("/reverse", "abc").await, (StatusCode::OK, "cba".into()));
        assert_eq!(post("/upper", "abc").await, (StatusCode::OK, "ABC".into()));
        assert_eq!(
            post("/processed", "Test Request").await,
            (StatusCode::OK, "Processed: Test Request".into())
        );
    }

    #[tokio::test]
    async fn fail_on_request() {
        let (status, _) = post("/fail", "x").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn reject_unknown_route() {
        let (status, _) = post("/missing", "x").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
