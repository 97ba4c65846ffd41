use coordinator::testing::{eventually, RecordingConnector, RecordingProcessor};
use coordinator::{
    Coordinator, CoordinatorBuilder, CoordinatorError, MemoryQueue, ProcessError, Request,
    Response,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

type Transport = RecordingConnector<String, String>;

const PATIENCE: Duration = Duration::from_secs(5);

fn processor() -> Arc<RecordingProcessor<String, String>> {
    Arc::new(RecordingProcessor::new(|data: &String| match data.as_str() {
        "Test Request" => Ok("Processed Response".to_string()),
        "fail" => Err(ProcessError::Rejected("unprocessable".into())),
        other => Ok(other.chars().rev().collect()),
    }))
}

fn builder(
    connector: &Arc<Transport>,
    processor: &Arc<RecordingProcessor<String, String>>,
) -> CoordinatorBuilder<String, String> {
    Coordinator::<String, String>::builder()
        .connector(connector.clone())
        .queue(Arc::new(MemoryQueue::<Request<String>>::new()))
        .processor(processor.clone())
        .logger(tracing::info_span!("coordinator"))
}

#[tokio::test(start_paused = true)]
async fn answer_request_through_connector() {
    let connector = Arc::new(Transport::new());
    let processor = processor();
    let coordinator = builder(&connector, &processor).build().unwrap();

    coordinator.start_default().unwrap();
    connector
        .receive(Request::new("1", "conn1", "Test Request".to_string()))
        .await
        .unwrap();

    eventually(PATIENCE, || connector.sent().len() == 1).await;
    coordinator.stop().await;

    assert_eq!(
        connector.sent(),
        vec![(
            "conn1".to_string(),
            Response::new("1", "conn1", "Processed Response".to_string())
        )]
    );
    assert_eq!(processor.calls(), vec!["Test Request".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn isolate_processing_and_send_failures() {
    let connector = Arc::new(Transport::new());
    connector.disconnect("gone");
    let processor = processor();
    let coordinator = builder(&connector, &processor).build().unwrap();

    coordinator.start_default().unwrap();
    for (id, connection, data) in [
        ("1", "conn1", "fail"),
        ("2", "gone", "abc"),
        ("3", "conn3", "xyz"),
    ] {
        connector
            .receive(Request::new(id, connection, data.to_string()))
            .await
            .unwrap();
    }

    eventually(PATIENCE, || connector.sent().len() == 1).await;
    coordinator.stop().await;

    assert_eq!(processor.calls().len(), 3);
    assert_eq!(connector.send_attempts(), 2);
    assert_eq!(
        connector.sent(),
        vec![(
            "conn3".to_string(),
            Response::new("3", "conn3", "zyx".to_string())
        )]
    );
}

#[tokio::test(start_paused = true)]
async fn survive_panicking_processor_and_transport() {
    let connector = Arc::new(Transport::new());
    connector.panic_on("doomed");
    let processor = Arc::new(RecordingProcessor::new(|data: &String| {
        if data == "boom" {
            panic!("processor exploded");
        }
        Ok(data.to_uppercase())
    }));
    let coordinator = builder(&connector, &processor).build().unwrap();

    coordinator.start_default().unwrap();
    for (id, connection, data) in [
        ("1", "conn1", "boom"),
        ("2", "doomed", "abc"),
        ("3", "conn3", "ok"),
    ] {
        connector
            .receive(Request::new(id, connection, data.to_string()))
            .await
            .unwrap();
    }

    eventually(PATIENCE, || connector.sent().len() == 1).await;
    assert!(coordinator.is_running());
    coordinator.stop().await;

    assert_eq!(processor.calls().len(), 3);
    assert_eq!(connector.send_attempts(), 2);
    assert_eq!(
        connector.sent(),
        vec![(
            "conn3".to_string(),
            Response::new("3", "conn3", "OK".to_string())
        )]
    );
}

#[tokio::test(start_paused = true)]
async fn keep_requests_received_after_stop() {
    let connector = Arc::new(Transport::new());
    let processor = processor();
    let queue = Arc::new(MemoryQueue::<Request<String>>::new());
    let coordinator = Coordinator::<String, String>::builder()
        .connector(connector.clone())
        .queue(queue.clone())
        .processor(processor.clone())
        .logger(tracing::info_span!("coordinator"))
        .build()
        .unwrap();

    coordinator.start_default().unwrap();
    coordinator.stop().await;

    connector
        .receive(Request::new("1", "conn1", "late".to_string()))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert!(processor.calls().is_empty());
    assert_eq!(queue.len(), 1);
}

#[tokio::test]
async fn refuse_second_start() {
    let connector = Arc::new(Transport::new());
    let processor = processor();
    let coordinator = builder(&connector, &processor).build().unwrap();

    coordinator.start_default().unwrap();
    assert_eq!(
        coordinator.start_default(),
        Err(CoordinatorError::AlreadyRunning)
    );
    coordinator.stop().await;
}

#[test]
fn name_missing_dependencies() {
    let connector = Arc::new(Transport::new());
    let processor = processor();

    let missing = |builder: CoordinatorBuilder<String, String>| {
        builder.build().err().and_then(|e| e.parameter())
    };

    assert_eq!(
        missing(
            Coordinator::<String, String>::builder()
                .queue(Arc::new(MemoryQueue::<Request<String>>::new()))
                .processor(processor.clone())
                .logger(tracing::info_span!("coordinator"))
        ),
        Some("connector")
    );
    assert_eq!(
        missing(
            Coordinator::<String, String>::builder()
                .connector(connector.clone())
                .processor(processor.clone())
                .logger(tracing::info_span!("coordinator"))
        ),
        Some("queue")
    );
    assert_eq!(
        missing(
            Coordinator::<String, String>::builder()
                .connector(connector.clone())
                .queue(Arc::new(MemoryQueue::<Request<String>>::new()))
                .logger(tracing::info_span!("coordinator"))
        ),
        Some("processor")
    );
    assert_eq!(
        missing(
            Coordinator::<String, String>::builder()
                .connector(connector.clone())
                .queue(Arc::new(MemoryQueue::<Request<String>>::new()))
                .processor(processor.clone())
        ),
        Some("logger")
    );
}
