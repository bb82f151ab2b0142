// Integration tests: HTTP endpoints backed by the Prometheus sink

use axum_test::TestServer;
use netmon::engine::TrafficEngine;
use netmon::metrics::PrometheusSink;
use netmon::models::{Ipv4Frame, Node};
use netmon::routes;
use std::net::Ipv4Addr;
use std::sync::Arc;

fn ip(s: &str) -> Ipv4Addr {
    s.parse().unwrap()
}

fn test_app() -> (axum::Router, Arc<PrometheusSink>) {
    let sink = Arc::new(PrometheusSink::new().unwrap());
    (routes::app(sink.clone()), sink)
}

#[tokio::test]
async fn test_root_endpoint() {
    let (app, _) = test_app();
    let server = TestServer::new(app).unwrap();
    let response = server.get("/").await;
    response.assert_status_ok();
    assert!(response.text().starts_with("netmon "));
}

#[tokio::test]
async fn test_version_endpoint() {
    let (app, _) = test_app();
    let server = TestServer::new(app).unwrap();
    let response = server.get("/version").await;
    response.assert_status_ok();
    let json: serde_json::Value = response.json();
    assert_eq!(json.get("name").and_then(|v| v.as_str()), Some("netmon"));
    assert!(json.get("version").and_then(|v| v.as_str()).is_some());
}

#[tokio::test]
async fn test_metrics_endpoint_exposes_classified_bytes() {
    let (app, sink) = test_app();
    let nodes = vec![
        Node::new(ip("10.0.0.1"), "nas.lan"),
        Node::new(ip("10.0.0.2"), Node::fallback_hostname(ip("10.0.0.2"))),
    ];
    let engine = TrafficEngine::new(nodes, sink.clone());
    engine.classify(&Ipv4Frame::new(ip("10.0.0.1"), ip("10.0.0.2"), 100));
    engine.classify(&Ipv4Frame::new(ip("1.2.3.4"), ip("10.0.0.1"), 20));
    engine.classify(&Ipv4Frame::new(ip("1.2.3.4"), ip("5.6.7.8"), 3));

    let server = TestServer::new(app).unwrap();
    let response = server.get("/metrics").await;
    response.assert_status_ok();
    let content_type = response.header("content-type");
    assert!(content_type.to_str().unwrap().starts_with("text/plain"));

    let body = response.text();
    assert!(body.contains("# TYPE network_bytes_total counter"));
    assert!(body.contains("network_bytes_total 123"));
    assert!(body.contains("# TYPE node_bytes_total counter"));
    assert!(body.contains(r#"node_bytes_total{device="nas.lan"} 120"#));
    assert!(body.contains(r#"node_bytes_total{device="unknown-10.0.0.2"} 100"#));

    assert_eq!(sink.network_bytes(), 123);
    assert_eq!(sink.node_bytes("nas.lan"), Some(120));
}

#[tokio::test]
async fn test_node_bytes_lookup_does_not_create_series() {
    let (app, sink) = test_app();
    assert_eq!(sink.node_bytes("ghost.lan"), None);

    let server = TestServer::new(app).unwrap();
    let body = server.get("/metrics").await.text();
    assert!(!body.contains("ghost.lan"));
}

#[tokio::test]
async fn test_metrics_survive_rotation() {
    let (app, sink) = test_app();
    let engine = TrafficEngine::new(vec![Node::new(ip("10.0.0.1"), "a")], sink.clone());
    engine.classify(&Ipv4Frame::new(ip("10.0.0.1"), ip("10.0.0.1"), 50));
    engine.rotate();

    let server = TestServer::new(app).unwrap();
    let body = server.get("/metrics").await.text();
    assert!(body.contains("network_bytes_total 50"));
    assert!(body.contains(r#"node_bytes_total{device="a"} 100"#));
}
