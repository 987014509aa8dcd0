use std::time::Duration;

use fetchdag::fetch::{FetchError, QueryToggles, Rpc};
use serde::Deserialize;
use serde_json::json;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Deserialize)]
struct Sample {
    value: u64,
}

fn rpc_for(server: &MockServer, timeout: Duration) -> Rpc {
    Rpc::new(
        "testchain",
        Url::parse(&server.uri()).unwrap(),
        QueryToggles::default(),
        timeout,
    )
    .unwrap()
}

#[tokio::test]
async fn application_error_body_fails_the_call() {
    let server = MockServer::start().await;

    // Transport-level 200, application-level failure.
    Mock::given(method("GET"))
        .and(path("/sample"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"code": 5, "message": "key not found"})),
        )
        .mount(&server)
        .await;

    let rpc = rpc_for(&server, Duration::from_secs(5));
    let (result, outcome) = rpc.get::<Sample>("sample", "/sample").await.unwrap();

    assert!(!outcome.success);
    match result.unwrap_err() {
        FetchError::Application { code, message } => {
            assert_eq!(code, 5);
            assert_eq!(message, "key not found");
        }
        other => panic!("expected Application, got {other:?}"),
    }
}

#[tokio::test]
async fn http_error_status_fails_the_call() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sample"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let rpc = rpc_for(&server, Duration::from_secs(5));
    let (result, outcome) = rpc.get::<Sample>("sample", "/sample").await.unwrap();

    assert!(!outcome.success);
    assert!(matches!(result.unwrap_err(), FetchError::Status(s) if s.as_u16() == 502));
}

#[tokio::test]
async fn malformed_body_fails_the_call() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sample"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"wrong": "shape"})))
        .mount(&server)
        .await;

    let rpc = rpc_for(&server, Duration::from_secs(5));
    let (result, outcome) = rpc.get::<Sample>("sample", "/sample").await.unwrap();

    assert!(!outcome.success);
    assert!(matches!(result.unwrap_err(), FetchError::Decode(_)));
}

#[tokio::test]
async fn slow_endpoint_times_out_as_transport_failure() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sample"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"value": 1}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let rpc = rpc_for(&server, Duration::from_millis(300));
    let (result, outcome) = rpc.get::<Sample>("sample", "/sample").await.unwrap();

    assert!(!outcome.success);
    assert!(matches!(result.unwrap_err(), FetchError::Transport(_)));
    // Duration reflects the bounded wait, not the mock's full delay.
    assert!(outcome.duration < Duration::from_secs(2));
}

#[tokio::test]
async fn successful_call_decodes_typed_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/sample"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"value": 7})))
        .mount(&server)
        .await;

    let rpc = rpc_for(&server, Duration::from_secs(5));
    let (result, outcome) = rpc.get::<Sample>("sample", "/sample").await.unwrap();

    assert!(outcome.success);
    assert_eq!(result.unwrap().value, 7);
}
