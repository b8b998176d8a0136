//! 配置错误必须在发出任何请求之前终止启动
//!
//! 成功加载的配置会写入进程级缓存，所以这里只有一个测试函数，按顺序覆盖各类错误

use std::fs;

use chatify_push_loadtest::ApplicationBootstrap;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_configuration_errors_abort_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();

    // 类型错误
    let malformed = dir.path().join("malformed.toml");
    fs::write(
        &malformed,
        format!(
            "[services.push_loadtest]\ntarget_url = \"{}\"\nvirtual_users = \"ten\"\n",
            server.uri()
        ),
    )
    .unwrap();
    let err = ApplicationBootstrap::run(malformed.to_str())
        .await
        .expect_err("malformed config must be fatal");
    assert!(format!("{err:#}").contains("malformed.toml"), "{err:#}");

    // 不存在的路径
    let missing = dir.path().join("missing");
    let err = ApplicationBootstrap::run(missing.to_str())
        .await
        .expect_err("missing config path must be fatal");
    assert!(format!("{err:#}").contains("does not exist"), "{err:#}");

    // 能解析但语义非法
    let zero_vus = dir.path().join("zero_vus.toml");
    fs::write(
        &zero_vus,
        format!(
            "[services.push_loadtest]\ntarget_url = \"{}\"\nvirtual_users = 0\n",
            server.uri()
        ),
    )
    .unwrap();
    let err = ApplicationBootstrap::run(zero_vus.to_str())
        .await
        .expect_err("zero virtual users must be fatal");
    assert!(format!("{err:#}").contains("virtual_users"), "{err:#}");

    assert!(server.received_requests().await.unwrap().is_empty());
}
