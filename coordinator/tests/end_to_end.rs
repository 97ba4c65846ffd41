//! Split deployment wired together in one process with volatile queues

use coordinator::testing::{eventually, RecordingConnector};
use coordinator::{
    CancellationToken, FnProcessor, MemoryQueue, ProcessError, ProcessorCoordinator,
    ReceiverCoordinator, Request, Response,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn round_trip_through_both_queues() {
    let connector = Arc::new(RecordingConnector::<String, String>::new());
    let requests = Arc::new(MemoryQueue::<Request<String>>::new());
    let responses = Arc::new(MemoryQueue::<Response<String>>::new());
    let processor = FnProcessor::new(|data: String| async move {
        if data.is_empty() {
            Err(ProcessError::Rejected("empty payload".into()))
        } else {
            Ok(format!("Processed: {data}"))
        }
    });

    let receiver = ReceiverCoordinator::<String, String>::builder()
        .connector(connector.clone())
        .request_queue(requests.clone())
        .response_queue(responses.clone())
        .logger(tracing::info_span!("receiver"))
        .build()
        .unwrap();

    let worker = ProcessorCoordinator::<String, String>::builder()
        .request_queue(requests.clone())
        .response_queue(responses.clone())
        .processor(Arc::new(processor))
        .logger(tracing::info_span!("worker"))
        .build()
        .unwrap();

    let shutdown = CancellationToken::new();
    receiver.start(&shutdown).unwrap();
    worker.start(&shutdown).unwrap();

    for (id, connection, data) in [("1", "a", "one"), ("2", "b", ""), ("3", "a", "three")] {
        connector
            .receive(Request::new(id, connection, data.to_string()))
            .await
            .unwrap();
    }

    eventually(Duration::from_secs(5), || connector.sent().len() == 2).await;
    tokio::time::sleep(Duration::from_millis(500)).await;

    worker.stop().await;
    receiver.stop().await;

    assert_eq!(
        connector.sent(),
        vec![
            ("a".to_string(), Response::new("1", "a", "Processed: one".to_string())),
            ("a".to_string(), Response::new("3", "a", "Processed: three".to_string())),
        ]
    );
    assert!(requests.is_empty());
    assert!(responses.is_empty());
}
