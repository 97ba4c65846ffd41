use coordinator::testing::{eventually, RecordingConnector, RecordingQueue};
use coordinator::{
    CancellationToken, ConnectorError, Queue, ReceiverCoordinator, ReceiverCoordinatorBuilder,
    Request, RequestReceiver, Response,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

type Requests = RecordingQueue<Request<String>>;
type Responses = RecordingQueue<Response<String>>;
type Transport = RecordingConnector<String, String>;

const PATIENCE: Duration = Duration::from_secs(5);

fn response(id: &str, connection: &str) -> Response<String> {
    Response::new(id, connection, format!("response {id}"))
}

fn builder(
    connector: &Arc<Transport>,
    requests: &Arc<Requests>,
    responses: &Arc<Responses>,
) -> ReceiverCoordinatorBuilder<String, String> {
    ReceiverCoordinator::<String, String>::builder()
        .connector(connector.clone())
        .request_queue(requests.clone())
        .response_queue(responses.clone())
        .logger(tracing::info_span!("receiver"))
}

#[tokio::test]
async fn enqueue_inbound_request_before_returning() {
    let connector = Arc::new(Transport::new());
    let requests = Arc::new(Requests::new());
    let responses = Arc::new(Responses::new());
    let coordinator = builder(&connector, &requests, &responses).build().unwrap();

    assert!(!connector.is_subscribed());
    coordinator.start(&CancellationToken::new()).unwrap();
    assert!(connector.is_subscribed());

    let request = Request::new("1", "conn1", "Test Request".to_string());
    connector.receive(request.clone()).await.unwrap();

    assert_eq!(requests.enqueued(), vec![request]);
    coordinator.stop().await;
}

#[tokio::test]
async fn surface_enqueue_failure_to_transport() {
    struct Broken;

    #[async_trait::async_trait]
    impl Queue<Request<String>> for Broken {
        async fn enqueue(&self, _: Request<String>) -> Result<usize, coordinator::QueueError> {
            Err(coordinator::QueueError::Backend("down".into()))
        }

        async fn dequeue(&self) -> Result<Option<Request<String>>, coordinator::QueueError> {
            Ok(None)
        }
    }

    let connector = Arc::new(Transport::new());
    let responses = Arc::new(Responses::new());
    let coordinator = ReceiverCoordinator::<String, String>::builder()
        .connector(connector.clone())
        .request_queue(Arc::new(Broken))
        .response_queue(responses.clone())
        .logger(tracing::info_span!("receiver"))
        .build()
        .unwrap();

    coordinator.start(&CancellationToken::new()).unwrap();
    let result = connector
        .receive(Request::new("1", "conn1", "x".to_string()))
        .await;

    assert!(matches!(result, Err(ConnectorError::Enqueue(_))));
    coordinator.stop().await;
}

#[tokio::test(start_paused = true)]
async fn deliver_queued_responses() {
    let connector = Arc::new(Transport::new());
    let requests = Arc::new(Requests::new());
    let responses = Arc::new(Responses::with_items([
        response("1", "conn1"),
        response("2", "conn2"),
    ]));
    let coordinator = builder(&connector, &requests, &responses).build().unwrap();

    coordinator.start(&CancellationToken::new()).unwrap();
    eventually(PATIENCE, || connector.sent().len() == 2).await;
    coordinator.stop().await;

    assert_eq!(
        connector.sent(),
        vec![
            ("conn1".to_string(), response("1", "conn1")),
            ("conn2".to_string(), response("2", "conn2")),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn continue_after_failed_send_without_retry() {
    let connector = Arc::new(Transport::new());
    connector.disconnect("gone");

    let requests = Arc::new(Requests::new());
    let responses = Arc::new(Responses::with_items([
        response("1", "gone"),
        response("2", "conn2"),
    ]));
    let coordinator = builder(&connector, &requests, &responses).build().unwrap();

    coordinator.start(&CancellationToken::new()).unwrap();
    eventually(PATIENCE, || connector.sent().len() == 1).await;
    tokio::time::sleep(Duration::from_millis(500)).await;
    coordinator.stop().await;

    assert_eq!(connector.send_attempts(), 2);
    assert_eq!(connector.sent()[0].1.request_id(), "2");
    assert!(responses.enqueued().is_empty());
}

#[tokio::test(start_paused = true)]
async fn subscribe_only_once_across_restarts() {
    let connector = Arc::new(Transport::new());
    let requests = Arc::new(Requests::new());
    let responses = Arc::new(Responses::new());
    let coordinator = builder(&connector, &requests, &responses).build().unwrap();
    let token = CancellationToken::new();

    coordinator.start(&token).unwrap();
    coordinator.stop().await;
    coordinator.start(&token).unwrap();

    connector
        .receive(Request::new("1", "conn1", "x".to_string()))
        .await
        .unwrap();
    assert_eq!(requests.enqueued().len(), 1);

    coordinator.stop().await;
    coordinator.stop().await;
    assert!(!coordinator.is_running());
}

#[tokio::test]
async fn subscribe_to_bridge_receiver() {
    let connector = Arc::new(Transport::new());
    let receiver = Arc::new(RequestReceiver::new());
    let requests = Arc::new(Requests::new());
    let responses = Arc::new(Responses::new());

    let coordinator = ReceiverCoordinator::<String, String>::bridge_builder()
        .connector(connector.clone())
        .request_queue(requests.clone())
        .response_queue(responses.clone())
        .request_receiver(receiver.clone())
        .logger(tracing::info_span!("receiver"))
        .build()
        .unwrap();

    coordinator.start(&CancellationToken::new()).unwrap();

    assert!(receiver.has_subscriber());
    assert!(!connector.is_subscribed());

    receiver
        .receive(Request::new("1", "conn1", "bridged".to_string()))
        .await
        .unwrap();
    assert_eq!(requests.enqueued()[0].data(), "bridged");

    coordinator.stop().await;
}

#[tokio::test]
async fn subscribe_to_connector_without_bridge() {
    let connector = Arc::new(Transport::new());
    let receiver = Arc::new(RequestReceiver::new());
    let requests = Arc::new(Requests::new());
    let responses = Arc::new(Responses::new());

    let coordinator = builder(&connector, &requests, &responses)
        .request_receiver(receiver.clone())
        .build()
        .unwrap();

    coordinator.start(&CancellationToken::new()).unwrap();

    assert!(connector.is_subscribed());
    assert!(!receiver.has_subscriber());

    connector
        .receive(Request::new("1", "conn1", "direct".to_string()))
        .await
        .unwrap();
    assert_eq!(requests.enqueued()[0].data(), "direct");

    coordinator.stop().await;
}

#[test]
fn name_missing_dependencies() {
    let connector = Arc::new(Transport::new());
    let requests = Arc::new(Requests::new());
    let responses = Arc::new(Responses::new());
    let span = || tracing::info_span!("receiver");

    let missing = |builder: ReceiverCoordinatorBuilder<String, String>| {
        builder.build().err().and_then(|e| e.parameter())
    };

    assert_eq!(
        missing(
            ReceiverCoordinator::<String, String>::builder()
                .request_queue(requests.clone())
                .response_queue(responses.clone())
                .logger(span())
        ),
        Some("connector")
    );
    assert_eq!(
        missing(
            ReceiverCoordinator::<String, String>::builder()
                .connector(connector.clone())
                .response_queue(responses.clone())
                .logger(span())
        ),
        Some("requestQueue")
    );
    assert_eq!(
        missing(
            ReceiverCoordinator::<String, String>::builder()
                .connector(connector.clone())
                .request_queue(requests.clone())
                .logger(span())
        ),
        Some("responseQueue")
    );
    assert_eq!(
        missing(
            ReceiverCoordinator::<String, String>::builder()
                .connector(connector.clone())
                .request_queue(requests.clone())
                .response_queue(responses.clone())
        ),
        Some("logger")
    );
    assert_eq!(
        missing(
            ReceiverCoordinator::<String, String>::bridge_builder()
                .connector(connector.clone())
                .request_queue(requests.clone())
                .response_queue(responses.clone())
                .logger(span())
        ),
        Some("requestReceiver")
    );
}
