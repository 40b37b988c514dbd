//! End-to-end runs of the standard suite against a mock ActivityPub server

use ap_testsuite::prelude::*;
use serde_json::json;
use std::collections::HashMap;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_json(server: &MockServer, route: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_status(server: &MockServer, route: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// A server that behaves: paged outbox, tombstones, 403 for private objects
async fn conforming_server() -> MockServer {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_json(
        &server,
        "/users/alice",
        json!({
            "@context": "https://www.w3.org/ns/activitystreams",
            "id": format!("{base}/users/alice"),
            "type": "Person",
            "outbox": format!("{base}/users/alice/outbox")
        }),
    )
    .await;
    mount_json(
        &server,
        "/users/alice/outbox",
        json!({
            "id": format!("{base}/users/alice/outbox"),
            "type": "OrderedCollection",
            "totalItems": 1,
            "first": format!("{base}/users/alice/outbox/page/1")
        }),
    )
    .await;
    mount_json(
        &server,
        "/users/alice/outbox/page/1",
        json!({"type": "OrderedCollectionPage", "orderedItems": []}),
    )
    .await;
    mount_json(
        &server,
        "/notes/1",
        json!({"id": format!("{base}/notes/1"), "type": "Note"}),
    )
    .await;
    mount_status(&server, "/notes/2", 410).await;
    mount_status(&server, "/notes/private", 403).await;

    server
}

fn config(server: &MockServer, extra: &str) -> toml::Table {
    let text = format!(
        r#"
        [test_config]
        server = "{}"

        [test_config.resources]
        actor_id = "/users/alice"
        object_id = "/notes/1"
        deleted_object_id = "/notes/2"
        invalid_object_id = "/notes/never-existed"
        private_object_id = "/notes/private"
        {extra}
        "#,
        server.uri()
    );
    toml::from_str(&text).unwrap()
}

#[tokio::test]
async fn test_conforming_server_passes_everything() {
    let server = conforming_server().await;
    let transport = HttpTransport::new(&TransportConfig::default()).unwrap();

    let mut ctx = TestContext::new();
    let doc = config(&server, "use_tombstone = true\nuse_forbidden = true");
    assert!(ctx.load_config(&doc, &transport).await.unwrap());

    let report = Runner::new()
        .fail_fast(true)
        .run(&standard_suite(), &ctx, &transport)
        .await;

    assert!(report.success());
    assert!(report.failed().is_empty(), "failed: {:?}", report.failed());
    assert_eq!(report.passed().len(), 5);
}

#[tokio::test]
async fn test_flag_mismatch_fails_fast() {
    let server = conforming_server().await;
    let transport = HttpTransport::new(&TransportConfig::default()).unwrap();

    // Server answers 410/403 but the flags say 404
    let mut ctx = TestContext::new();
    ctx.load_config(&config(&server, ""), &transport)
        .await
        .unwrap();

    let report = Runner::new()
        .fail_fast(true)
        .run(&standard_suite(), &ctx, &transport)
        .await;

    assert!(!report.success());
    assert_eq!(report.aborted_by(), Some("DeletedObject"));
    assert_eq!(report.passed(), ["ActorTest", "ObjectTest"]);
    assert!(report.events_for("InvalidObject").is_empty());
    assert!(report.events_for("PrivateObject").is_empty());
}

#[tokio::test]
async fn test_direct_arguments_override_config() {
    let server = conforming_server().await;
    let transport = HttpTransport::new(&TransportConfig::default()).unwrap();

    let mut direct = HashMap::new();
    direct.insert(
        "deleted_object_id".to_string(),
        toml::Value::from(format!("{}/notes/never-existed", server.uri())),
    );

    let mut ctx = TestContext::new();
    assert!(ctx.load_direct(&direct).unwrap());
    ctx.load_config(&config(&server, "use_forbidden = true"), &transport)
        .await
        .unwrap();

    let report = Runner::new()
        .run(&standard_suite(), &ctx, &transport)
        .await;

    // The direct id 404s, which is what DeletedObject expects without tombstones
    assert!(report.success());
    assert!(report.failed().is_empty(), "failed: {:?}", report.failed());
}

#[tokio::test]
async fn test_unconfigured_cases_send_no_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/notes/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"type": "Note"})))
        .expect(2)
        .mount(&server)
        .await;

    let transport = HttpTransport::new(&TransportConfig::default()).unwrap();
    let mut ctx = TestContext::new();
    ctx.set("object_id", &toml::Value::from(format!("{}/notes/1", server.uri())))
        .unwrap();

    let report = Runner::new()
        .run(&standard_suite(), &ctx, &transport)
        .await;

    assert_eq!(report.passed(), ["ObjectTest"]);
    assert_eq!(report.skipped().len(), 4);
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}
