//! Scrape integration tests
//!
//! End-to-end tests for the scrape pipeline that verify:
//! - Fetch and render against a mock inventory
//! - Label rules applied to live records
//! - Metrics route status and content type
//! - Error handling

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use opennebula_exporter::collector::OneClient;
use opennebula_exporter::config::Config;
use opennebula_exporter::labeling::{render_pool, LabelRules, PoolRenderer};
use opennebula_exporter::server::{self, handlers::METRICS_CONTENT_TYPE, AppState};
use serde_json::json;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Create a mock inventory serving three VMs
async fn create_mock_inventory() -> MockServer {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/vmpool"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "VM_POOL": {
                "VM": [
                    {
                        "ID": "0",
                        "NAME": "staging-web-03",
                        "STATE": "3",
                        "LCM_STATE": "3",
                        "USER_TEMPLATE": {"OWNER": "teamA", "TIER": "front"},
                        "HISTORY_RECORDS": {"HISTORY": [
                            {"HOSTNAME": "node-old"},
                            {"HOSTNAME": "node-a"}
                        ]}
                    },
                    {
                        "ID": "1",
                        "NAME": "worker-7",
                        "STATE": "8",
                        "LCM_STATE": "0"
                    },
                    {
                        "ID": 2,
                        "NAME": "prod-db \"main\"",
                        "STATE": 3,
                        "LCM_STATE": 3,
                        "USER_TEMPLATE": {"OWNER": "dba"},
                        "HISTORY_RECORDS": {"HISTORY": {"HOSTNAME": "node-b"}}
                    }
                ]
            }
        })))
        .mount(&mock_server)
        .await;

    mock_server
}

fn rules() -> LabelRules {
    LabelRules::new()
        .with_name_regex("env", "^(prod|staging)-")
        .with_template_field("owner", "OWNER")
}

#[tokio::test]
async fn test_fetch_and_render_pool() {
    let server = create_mock_inventory().await;
    let client = OneClient::new(&format!("{}/vmpool", server.uri()), 5000, false).unwrap();

    let vms = client.fetch_pool().await.unwrap();
    let output = render_pool(&vms, &rules(), "opennebula");

    let expected = concat!(
        "opennebula_vms{name=\"staging-web-03\",id=\"0\",state=\"ACTIVE\",lcm_state=\"RUNNING\",host=\"node-a\",env=\"staging\",owner=\"teamA\"} 1\n",
        "opennebula_vms{name=\"worker-7\",id=\"1\",state=\"POWEROFF\",lcm_state=\"LCM_INIT\",host=\"\",owner=\"unknown\"} 1\n",
        "opennebula_vms{name=\"prod-db \\\"main\\\"\",id=\"2\",state=\"ACTIVE\",lcm_state=\"RUNNING\",host=\"node-b\",env=\"prod\",owner=\"dba\"} 1\n",
    );
    assert_eq!(output, expected);
}

#[tokio::test]
async fn test_pool_renderer_matches_render_pool() {
    let server = create_mock_inventory().await;
    let client = OneClient::new(&format!("{}/vmpool", server.uri()), 5000, false).unwrap();
    let vms = client.fetch_pool().await.unwrap();

    let renderer = PoolRenderer::new("opennebula", Arc::new(rules()));

    assert_eq!(renderer.render(&vms), render_pool(&vms, &rules(), "opennebula"));
    // repeated renders over the same input are identical
    assert_eq!(renderer.render(&vms), renderer.render(&vms));
}

#[tokio::test]
async fn test_invalid_rule_is_dropped_end_to_end() {
    let server = create_mock_inventory().await;
    let client = OneClient::new(&format!("{}/vmpool", server.uri()), 5000, false).unwrap();
    let vms = client.fetch_pool().await.unwrap();

    let rules = rules().with_name_regex("broken", "(");
    let output = render_pool(&vms, &rules, "opennebula");

    assert_eq!(output.lines().count(), 3);
    assert!(!output.contains("broken="));
    assert!(output.contains("env=\"staging\""));
}

#[tokio::test]
async fn test_empty_pool_renders_nothing() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"VM_POOL": {}})))
        .mount(&mock_server)
        .await;

    let client = OneClient::new(&format!("{}/vmpool", mock_server.uri()), 5000, false).unwrap();
    let vms = client.fetch_pool().await.unwrap();

    assert!(vms.is_empty());
    assert_eq!(render_pool(&vms, &rules(), "opennebula"), "");
}

fn app_config(endpoint: String) -> Config {
    let mut config = Config::default();
    config.exporter.namespace = "one".to_string();
    config.api.endpoint = endpoint;
    config.labels = rules();
    config
}

#[tokio::test]
async fn test_metrics_route_serves_pool() {
    let server = create_mock_inventory().await;
    let state = AppState::new(app_config(format!("{}/vmpool", server.uri()))).unwrap();

    let response = server::router(state)
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        METRICS_CONTENT_TYPE
    );

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert_eq!(text.lines().count(), 3);
    assert!(text.lines().all(|l| l.starts_with("one_vms{") && l.ends_with("} 1")));
}

#[tokio::test]
async fn test_metrics_route_upstream_error_then_recovers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "VM_POOL": {"VM": {"ID": "5", "NAME": "solo", "STATE": "1", "LCM_STATE": "0"}}
        })))
        .mount(&mock_server)
        .await;

    let state = AppState::new(app_config(format!("{}/vmpool", mock_server.uri()))).unwrap();
    let app = server::router(state);

    let first = app
        .clone()
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::BAD_GATEWAY);

    let second = app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::OK);

    let body = to_bytes(second.into_body(), usize::MAX).await.unwrap();
    assert_eq!(
        String::from_utf8(body.to_vec()).unwrap(),
        "one_vms{name=\"solo\",id=\"5\",state=\"PENDING\",lcm_state=\"LCM_INIT\",host=\"\",owner=\"unknown\"} 1\n"
    );
}
