use reqwest::StatusCode;
use sessiontrace::agent::host_inspector::MockHostInspector;
use sessiontrace::types::AgentProcessInfo;

mod common;
use common::{connection, inspector, process, TestAgent};

async fn agent_with_mysqld() -> TestAgent {
    TestAgent::start(inspector(
        vec![connection(22, 1), connection(3306, 42)],
        vec![
            process(1, "sshd", &["/usr/sbin/sshd"]),
            process(42, "mysqld", &["/usr/sbin/mysqld", "--port=3306"]),
        ],
    ))
    .await
}

#[tokio::test]
async fn test_conns_returns_owning_process() {
    let agent = agent_with_mysqld().await;

    let response = reqwest::get(agent.url("?port=3306")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let info: AgentProcessInfo = response.json().await.unwrap();
    assert_eq!(info.pid, 42);
    assert_eq!(info.name, "mysqld");
    assert_eq!(info.cmdline, vec!["/usr/sbin/mysqld", "--port=3306"]);
    assert_eq!(info.laddr.port, 3306);
    assert_eq!(info.hostname, "web-1");
}

#[tokio::test]
async fn test_conns_unknown_port_is_404() {
    let agent = agent_with_mysqld().await;

    let response = reqwest::get(agent.url("?port=9999")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_conns_missing_port_is_400() {
    let agent = agent_with_mysqld().await;

    let response = reqwest::get(agent.url("")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.text().await.unwrap().contains("port param is required"));
}

#[tokio::test]
async fn test_conns_malformed_port_is_400() {
    let agent = agent_with_mysqld().await;

    for query in ["?port=abc", "?port=-1", "?port=4294967296"] {
        let response = reqwest::get(agent.url(query)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", query);
    }
}

#[tokio::test]
async fn test_conns_lookup_failure_is_500() {
    let mut failing = MockHostInspector::new();
    failing
        .expect_connections()
        .returning(|| Err(anyhow::anyhow!("netlink unavailable")));
    let agent = TestAgent::start(failing).await;

    let response = reqwest::get(agent.url("?port=3306")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.text().await.unwrap().contains("netlink unavailable"));
}
