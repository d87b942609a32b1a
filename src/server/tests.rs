use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::routes::{router, AppState, MAX_BODY_BYTES};
use crate::config::ViewerConfig;
use crate::fetch::ExplorerClient;

fn app() -> Router {
    // nothing listens on the discard port; only validation paths reach the explorer
    let config = ViewerConfig::default().with_explorer_url("http://127.0.0.1:9");
    router(AppState::new(ExplorerClient::new(&config).unwrap()))
}

async fn send(app: &Router, method: Method, uri: &str, body: Body) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(body)
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Method::GET, uri, Body::empty()).await
}

async fn post(app: &Router, uri: &str, body: &Value) -> (StatusCode, Value) {
    send(app, Method::POST, uri, Body::from(body.to_string())).await
}

fn sample_idl() -> Value {
    json!({
        "metadata": {"name": "counter", "version": "0.1.0"},
        "instructions": [{
            "name": "initialize",
            "discriminator": [175, 175, 109, 31, 13, 152, 155, 237],
            "accounts": [
                {"name": "counter", "writable": true},
                {"name": "system_program", "address": "11111111111111111111111111111111"}
            ],
            "args": []
        }],
        "accounts": [{"name": "Counter", "discriminator": [255, 176, 4, 245, 188, 253, 124, 25]}]
    })
}

#[tokio::test]
async fn test_fetch_idl_requires_program_id() {
    let app = app();

    for uri in ["/api/fetch-idl", "/api/fetch-idl?programId="] {
        let (status, body) = get(&app, uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"error": "Program ID is required"}));
    }
}

#[tokio::test]
async fn test_fetch_idl_rejects_invalid_program_id() {
    let (status, body) = get(&app(), "/api/fetch-idl?programId=nope%21").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("nope!"));
}

#[tokio::test]
async fn test_upload_then_read_back() {
    let app = app();

    let (status, uploaded) = post(&app, "/api/idl", &sample_idl()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(uploaded["name"], "counter");
    assert_eq!(uploaded["systemPrograms"], json!(["11111111111111111111111111111111"]));

    let (status, body) = get(&app, "/api/program").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, uploaded);
}

#[tokio::test]
async fn test_invalid_upload_keeps_session() {
    let app = app();
    post(&app, "/api/idl", &sample_idl()).await;

    let (status, body) = post(&app, "/api/idl", &json!("not an object")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = send(&app, Method::POST, "/api/idl", Body::from("{")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = get(&app, "/api/program").await;
    assert_eq!(body["name"], "counter");
}

#[tokio::test]
async fn test_oversized_upload_is_rejected() {
    let app = app();
    let payload = vec![b' '; MAX_BODY_BYTES + 1];

    let (status, _) = send(&app, Method::POST, "/api/idl", Body::from(payload)).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);

    let (status, _) = get(&app, "/api/program").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_empty_session() {
    let app = app();

    let (status, body) = get(&app, "/api/program").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "No IDL loaded"}));

    let (status, _) = get(&app, "/api/diagram?kind=flow").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_diagrams() {
    let app = app();
    post(&app, "/api/idl", &sample_idl()).await;

    let (status, value) = get(&app, "/api/diagram?kind=flow").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(value["kind"], "flow");
    let text = value["diagrams"][0].as_str().unwrap();
    assert!(text.starts_with("flowchart TB"));
    assert!(text.contains("ix_initialize --> acc_Counter"));

    let (_, value) = get(&app, "/api/diagram?kind=ER").await;
    assert_eq!(value["diagrams"].as_array().unwrap().len(), 1);

    let (status, _) = get(&app, "/api/diagram?kind=gantt").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = get(&app, "/api/diagram").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_routes_and_methods() {
    let app = app();

    let (status, body) = get(&app, "/api/nothing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Not found"}));
    assert_eq!(get(&app, "/").await.0, StatusCode::NOT_FOUND);

    let (status, body) = get(&app, "/api/idl").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body, json!({"error": "Method not allowed"}));

    let (status, _) = send(&app, Method::DELETE, "/api/program", Body::empty()).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}
