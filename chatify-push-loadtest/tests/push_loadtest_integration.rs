//! 使用 wiremock 模拟推送服务，验证真实 HTTP 传输和端到端压测流程

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use chatify_load_core::config::{LoadGenAppConfig, PushLoadTestServiceConfig};
use chatify_push_loadtest::domain::model::{OutcomeErrorKind, PushRequest};
use chatify_push_loadtest::domain::repositories::PushTransport;
use chatify_push_loadtest::domain::service::decode_content;
use chatify_push_loadtest::error::TransportError;
use chatify_push_loadtest::infrastructure::transport::ReqwestPushTransport;
use chatify_push_loadtest::service::initialize;
use tokio::sync::watch;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PUSH_PATH: &str = "/chatify/logic/v1/sendSystemPush";

fn app_config(base_url: &str, service: PushLoadTestServiceConfig) -> LoadGenAppConfig {
    let mut app = LoadGenAppConfig::default();
    app.ensure_defaults();
    app.services.push_loadtest = Some(PushLoadTestServiceConfig {
        target_url: Some(base_url.to_string()),
        ..service
    });
    app
}

#[tokio::test]
async fn test_transport_posts_json_with_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(PUSH_PATH))
        .and(header("content-type", "application/json"))
        .and(header("x-load-test", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"code":0}"#))
        .expect(1)
        .mount(&server)
        .await;

    let transport = ReqwestPushTransport::new(Duration::from_secs(2)).unwrap();
    let headers = HashMap::from([("x-load-test".to_string(), "1".to_string())]);
    let response = transport
        .post_json(
            &format!("{}{}", server.uri(), PUSH_PATH),
            &headers,
            br#"{"push_type":"1"}"#.to_vec(),
        )
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.body, r#"{"code":0}"#);
}

#[tokio::test]
async fn test_transport_reports_server_errors_as_responses() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let transport = ReqwestPushTransport::new(Duration::from_secs(2)).unwrap();
    let response = transport
        .post_json(&server.uri(), &HashMap::new(), b"{}".to_vec())
        .await
        .unwrap();

    assert_eq!(response.status, 500);
}

#[tokio::test]
async fn test_transport_timeout_is_classified() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(800)))
        .mount(&server)
        .await;

    let transport = ReqwestPushTransport::new(Duration::from_millis(100)).unwrap();
    let err = transport
        .post_json(&server.uri(), &HashMap::new(), b"{}".to_vec())
        .await
        .unwrap_err();

    assert!(matches!(err, TransportError::Timeout(_)), "{err:?}");
    assert_eq!(err.kind(), OutcomeErrorKind::Timeout);
}

#[tokio::test]
async fn test_transport_connection_refused() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let transport = ReqwestPushTransport::new(Duration::from_secs(2)).unwrap();
    let err = transport
        .post_json(
            &format!("http://127.0.0.1:{port}{PUSH_PATH}"),
            &HashMap::new(),
            b"{}".to_vec(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), OutcomeErrorKind::Connect, "{err:?}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_end_to_end_run_against_mock_server() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(PUSH_PATH))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200))
        .expect(20)
        .mount(&server)
        .await;

    let app = app_config(
        &server.uri(),
        PushLoadTestServiceConfig {
            virtual_users: Some(5),
            iterations: Some(4),
            seed: Some(42),
            ..Default::default()
        },
    );
    let context = initialize(&app).unwrap();
    let (_tx, rx) = watch::channel(false);

    let report = context.runner.run(rx).await;

    assert_eq!(report.summary.total, 20);
    assert_eq!(report.summary.passed, 20);
    assert_eq!(report.summary.status_counts.get(&200), Some(&20));
    assert_eq!(report.crashed_virtual_users, 0);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 20);

    let mut content_ids = HashSet::new();
    for request in &requests {
        let push: PushRequest = serde_json::from_slice(&request.body).unwrap();
        assert_eq!(push.to_user_ids, vec!["uidhSSWsdYgB9".to_string()]);
        assert_eq!(push.expire_time_seconds(), Some(push.timestamp + 86_400));
        assert!(!decode_content(&push.content).unwrap().is_empty());
        content_ids.insert(push.content_id);
    }
    assert!(content_ids.len() > 1);
}

#[tokio::test]
async fn test_end_to_end_failed_checks_are_counted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let app = app_config(
        &server.uri(),
        PushLoadTestServiceConfig {
            virtual_users: Some(2),
            iterations: Some(3),
            ..Default::default()
        },
    );
    let context = initialize(&app).unwrap();
    let (_tx, rx) = watch::channel(false);

    let report = context.runner.run(rx).await;

    assert_eq!(report.summary.total, 6);
    assert_eq!(report.summary.failed, 6);
    assert_eq!(report.summary.status_counts.get(&503), Some(&6));
    assert_eq!(report.summary.pass_rate(), 0.0);
}
