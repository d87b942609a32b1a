use serde_json::{json, Value};
use solana_idl_viewer::server::{spawn_server, AppState};
use solana_idl_viewer::{
    fetch_idl, load_idl, load_idl_with, Cache, ExplorerClient, NormalizeOptions, ViewerConfig,
    ViewerError,
};
use solana_pubkey::Pubkey;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tempfile::tempdir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;

const PROGRAM_ID: &str = "Count3AcZucFDPSFBAeHkQ6AvttieKUkyJ8HiQGhQwe";

fn counter_idl() -> Value {
    json!({
        "address": PROGRAM_ID,
        "metadata": {"name": "counter", "version": "0.1.0", "description": "Counter program"},
        "instructions": [
            {
                "name": "initialize",
                "discriminator": [175, 175, 109, 31, 13, 152, 155, 237],
                "accounts": [
                    {"name": "payer", "writable": true, "signer": true},
                    {"name": "counter", "writable": true, "pda": {"seeds": [
                        {"kind": "const", "value": [99, 111, 117, 110, 116]},
                        {"kind": "account", "path": "payer"}
                    ]}},
                    {"name": "system_program", "address": "11111111111111111111111111111111"}
                ],
                "args": [{"name": "start", "type": "u64"}]
            }
        ],
        "accounts": [{"name": "Counter", "discriminator": [255, 176, 4, 245, 188, 253, 124, 25]}],
        "types": [{"name": "Counter", "type": {"kind": "struct", "fields": [{"name": "count", "type": "u64"}]}}]
    })
}

// An explorer that never answers; only used where no request may be made
fn offline_config() -> ViewerConfig {
    ViewerConfig::default().with_explorer_url("http://127.0.0.1:9")
}

async fn start_server() -> (SocketAddr, watch::Sender<()>, tokio::task::JoinHandle<()>) {
    start_server_with(offline_config()).await
}

async fn start_server_with(
    config: ViewerConfig,
) -> (SocketAddr, watch::Sender<()>, tokio::task::JoinHandle<()>) {
    let config = config.with_bind_addr("127.0.0.1:0".parse().unwrap());
    let explorer = ExplorerClient::new(&config).unwrap();
    let (shutdown_tx, shutdown_rx) = watch::channel(());
    let (handle, addr) = spawn_server(AppState::new(explorer), &config, shutdown_rx)
        .await
        .unwrap();
    (addr, shutdown_tx, handle)
}

async fn send_raw(addr: SocketAddr, raw: &[u8]) -> (u16, String) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw).await.unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();

    let status = response
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .unwrap();
    let body = response
        .split_once("\r\n\r\n")
        .map(|(_, body)| body.to_string())
        .unwrap_or_default();
    (status, body)
}

async fn request(addr: SocketAddr, method: &str, target: &str, body: Option<&Value>) -> (u16, Value) {
    let body = body.map(Value::to_string).unwrap_or_default();
    let raw = format!(
        "{} {} HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
        method,
        target,
        body.len(),
        body
    );
    let (status, text) = send_raw(addr, raw.as_bytes()).await;
    (status, serde_json::from_str(&text).unwrap())
}

#[test]
fn test_load_idl_from_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("counter.json");
    std::fs::write(&path, serde_json::to_string_pretty(&counter_idl()).unwrap()).unwrap();

    let model = load_idl(&path).unwrap();
    assert_eq!(model.name, "counter");
    assert_eq!(model.program_address.as_deref(), Some(PROGRAM_ID));
    assert_eq!(model.instructions[0].accounts.len(), 3);
    assert_eq!(model.pdas.len(), 1);
    assert_eq!(model.system_programs, vec!["11111111111111111111111111111111"]);
}

#[test]
fn test_load_idl_errors() {
    let dir = tempdir().unwrap();

    let missing = load_idl(&dir.path().join("missing.json")).unwrap_err();
    assert!(matches!(missing, ViewerError::Io(_)));

    let garbage = dir.path().join("garbage.json");
    std::fs::write(&garbage, "{ not json").unwrap();
    assert!(matches!(load_idl(&garbage).unwrap_err(), ViewerError::InvalidFormat(_)));

    let bare = dir.path().join("bare.json");
    std::fs::write(&bare, r#"{"metadata": {"name": "bare"}}"#).unwrap();
    assert!(load_idl(&bare).unwrap().instructions.is_empty());
    assert!(matches!(
        load_idl_with(&bare, &NormalizeOptions::strict()).unwrap_err(),
        ViewerError::MissingRequiredField(_)
    ));
}

#[tokio::test]
async fn test_server_fetch_idl_without_program_id() {
    let (addr, _shutdown, _handle) = start_server().await;

    let (status, body) = request(addr, "GET", "/api/fetch-idl", None).await;
    assert_eq!(status, 400);
    assert_eq!(body, json!({"error": "Program ID is required"}));
}

#[tokio::test]
async fn test_server_upload_program_and_diagram() {
    let (addr, _shutdown, _handle) = start_server().await;

    let (status, body) = request(addr, "GET", "/api/program", None).await;
    assert_eq!(status, 404);
    assert_eq!(body, json!({"error": "No IDL loaded"}));

    let (status, uploaded) = request(addr, "POST", "/api/idl", Some(&counter_idl())).await;
    assert_eq!(status, 200);
    assert_eq!(uploaded["programAddress"], PROGRAM_ID);
    assert_eq!(uploaded["instructions"][0]["accounts"][1]["pda"], json!(["const", "account"]));

    let (status, program) = request(addr, "GET", "/api/program", None).await;
    assert_eq!(status, 200);
    assert_eq!(program, uploaded);

    let (status, diagrams) = request(addr, "GET", "/api/diagram?kind=flow", None).await;
    assert_eq!(status, 200);
    assert_eq!(diagrams["kind"], "flow");
    let text = diagrams["diagrams"][0].as_str().unwrap();
    assert!(text.contains("ix_initialize --> acc_Counter"));
    assert!(text.contains("ix_initialize --> prog_SystemProgram"));

    let (status, _) = request(addr, "GET", "/api/diagram?kind=pie", None).await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn test_server_rejects_bad_requests() {
    let (addr, _shutdown, _handle) = start_server().await;

    let (status, _) = request(addr, "PUT", "/api/idl", Some(&counter_idl())).await;
    assert_eq!(status, 405);

    let (status, _) = request(addr, "GET", "/index.html", None).await;
    assert_eq!(status, 404);

    let (status, _) = send_raw(
        addr,
        b"POST /api/idl HTTP/1.1\r\nContent-Length: 99999999\r\n\r\n",
    )
    .await;
    assert_eq!(status, 413);

    let (status, _) = send_raw(addr, b"GARBAGE\r\n\r\n").await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn test_server_accepts_chunked_upload() {
    let (addr, _shutdown, _handle) = start_server().await;

    let body = counter_idl().to_string();
    let (first, second) = body.split_at(body.len() / 2);
    let raw = format!(
        "POST /api/idl HTTP/1.1\r\nHost: localhost\r\nTransfer-Encoding: chunked\r\n\r\n{:x}\r\n{}\r\n{:x}\r\n{}\r\n0\r\n\r\n",
        first.len(),
        first,
        second.len(),
        second
    );
    let (status, text) = send_raw(addr, raw.as_bytes()).await;
    assert_eq!(status, 200);
    let uploaded: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(uploaded["name"], "counter");
}

#[tokio::test]
async fn test_server_rejects_oversized_headers() {
    let (addr, _shutdown, _handle) = start_server().await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    let padding = "a".repeat(1024 * 1024);
    let raw = format!("GET /index.html HTTP/1.1\r\nX-Padding: {}\r\n\r\n", padding);
    // the server may close before the whole head is written
    let _ = stream.write_all(raw.as_bytes()).await;

    let mut response = Vec::new();
    let _ = tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut response)).await;
    let response = String::from_utf8_lossy(&response);
    assert!(!response.contains(" 404 "), "oversized head was routed: {}", response);
}

#[tokio::test]
async fn test_server_drops_stalled_connections() {
    let config = offline_config().with_connection_timeout(Duration::from_millis(500));
    let (addr, _shutdown, _handle) = start_server_with(config).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(b"GET /api/program HTTP/1.1\r\nHost: loc").await.unwrap();

    let started = Instant::now();
    let mut response = Vec::new();
    let closed = tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut response)).await;
    assert!(closed.is_ok(), "stalled connection was kept open");
    assert!(started.elapsed() < Duration::from_secs(5));

    // the listener keeps serving after dropping a stalled peer
    let (status, _) = request(addr, "GET", "/api/program", None).await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn test_server_shutdown() {
    let (_addr, shutdown, handle) = start_server().await;

    shutdown.send(()).unwrap();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server did not stop")
        .unwrap();
}

#[tokio::test]
async fn test_fetch_idl_prefers_cache() {
    let dir = tempdir().unwrap();
    let cache = Cache::new(dir.path());
    let pubkey = Pubkey::from_str(PROGRAM_ID).unwrap();
    cache.put(&pubkey, &counter_idl()).unwrap();

    let raw = fetch_idl(PROGRAM_ID, &offline_config(), Some(&cache)).await.unwrap();
    assert_eq!(raw, counter_idl());
}

// Serves an explorer page linking to `/idl.json` and the IDL itself
async fn mock_explorer() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let mut buf = vec![0u8; 8192];
            let n = stream.read(&mut buf).await.unwrap_or(0);
            let head = String::from_utf8_lossy(&buf[..n]).to_string();
            let (content_type, body) = if head.starts_with("GET /idl.json") {
                ("application/json", counter_idl().to_string())
            } else {
                (
                    "text/html",
                    r#"<html><body><a class="btn" href="/idl.json">Download IDL</a></body></html>"#
                        .to_string(),
                )
            };
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                content_type,
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_fetch_idl_downloads_and_caches() {
    let explorer = mock_explorer().await;
    let config = ViewerConfig::default().with_explorer_url(explorer.as_str());
    let dir = tempdir().unwrap();
    let cache = Cache::new(dir.path().join("cache"));

    let raw = fetch_idl(PROGRAM_ID, &config, Some(&cache)).await.unwrap();
    assert_eq!(raw, counter_idl());

    let pubkey = Pubkey::from_str(PROGRAM_ID).unwrap();
    assert_eq!(cache.get(&pubkey).unwrap(), Some(counter_idl()));
}
