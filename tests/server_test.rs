//! Integration tests driving a real listener on an ephemeral port.
//!
//! Each test builds its own root directory under the system temp dir,
//! starts the accept loop on port 0, and issues raw HTTP/1.1 requests over
//! TCP so status lines, headers, and bodies are observed exactly as a
//! client would see them.

use servedir::config::{AppState, Config};
use servedir::server;
use std::io::{Read, Write};
use std::net::TcpStream;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// Create a populated root directory for one test
fn create_test_root(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("servedir-test-{name}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(dir.join("sub/nested")).expect("create test root");
    std::fs::write(dir.join("index.html"), "<h1>hi</h1>").expect("write index.html");
    std::fs::write(dir.join("hello.txt"), "hello world").expect("write hello.txt");
    std::fs::write(dir.join("sub/a.txt"), "alpha").expect("write a.txt");
    std::fs::write(dir.join("sub/b.txt"), "bravo").expect("write b.txt");
    dir
}

/// Start the server on an ephemeral port; returns the port and the
/// shutdown handle.
fn start_server(root: &Path) -> (u16, Arc<Notify>) {
    let mut cfg = Config::load_from("servedir-test-nonexistent").expect("defaults");
    cfg.logging.access_log = false;

    let addr = "127.0.0.1:0".parse().expect("valid address");
    let listener = server::listener::create_listener(addr).expect("bind ephemeral port");
    let port = listener.local_addr().expect("local addr").port();

    let root = root.canonicalize().expect("canonical root");
    let state = Arc::new(AppState::new(cfg, root));
    let shutdown = Arc::new(Notify::new());
    let shutdown_for_server = Arc::clone(&shutdown);

    tokio::spawn(async move {
        server::run(listener, state, shutdown_for_server).await;
    });

    (port, shutdown)
}

fn send_request(port: u16, request: &str) -> String {
    let mut stream = TcpStream::connect(("127.0.0.1", port)).expect("connect");
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .expect("read timeout");
    stream.write_all(request.as_bytes()).expect("send request");
    let mut response = String::new();
    stream.read_to_string(&mut response).expect("read response");
    response
}

fn get(port: u16, path: &str) -> String {
    send_request(
        port,
        &format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n"),
    )
}

fn body_of(response: &str) -> &str {
    response
        .split_once("\r\n\r\n")
        .map_or("", |(_, body)| body)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn serves_file_bytes_exactly() {
    let root = create_test_root("file-bytes");
    let (port, _shutdown) = start_server(&root);

    let response = get(port, "/hello.txt");
    assert!(response.starts_with("HTTP/1.1 200"), "got: {response}");
    assert!(response.contains("Content-Type: text/plain"));
    assert_eq!(body_of(&response), "hello world");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn serves_html_with_content_type() {
    let root = create_test_root("html");
    let (port, _shutdown) = start_server(&root);

    let response = get(port, "/index.html");
    assert!(response.starts_with("HTTP/1.1 200"), "got: {response}");
    assert!(response.contains("text/html"));
    assert_eq!(body_of(&response), "<h1>hi</h1>");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn index_file_served_for_root() {
    let root = create_test_root("index");
    let (port, _shutdown) = start_server(&root);

    let response = get(port, "/");
    assert!(response.starts_with("HTTP/1.1 200"), "got: {response}");
    assert_eq!(body_of(&response), "<h1>hi</h1>");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn directory_listing_contains_every_child() {
    let root = create_test_root("listing");
    let (port, _shutdown) = start_server(&root);

    let response = get(port, "/sub/");
    assert!(response.starts_with("HTTP/1.1 200"), "got: {response}");
    let body = body_of(&response);
    assert!(body.contains("a.txt"));
    assert!(body.contains("b.txt"));
    assert!(body.contains("nested/"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn directory_without_slash_redirects() {
    let root = create_test_root("redirect");
    let (port, _shutdown) = start_server(&root);

    let response = get(port, "/sub");
    assert!(response.starts_with("HTTP/1.1 301"), "got: {response}");
    assert!(response.contains("Location: /sub/"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn file_with_trailing_slash_returns_404() {
    let root = create_test_root("file-slash");
    let (port, _shutdown) = start_server(&root);

    let response = get(port, "/hello.txt/");
    assert!(response.starts_with("HTTP/1.1 404"), "got: {response}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn missing_path_returns_404() {
    let root = create_test_root("missing");
    let (port, _shutdown) = start_server(&root);

    let response = get(port, "/nonexistent");
    assert!(response.starts_with("HTTP/1.1 404"), "got: {response}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn traversal_attempts_are_blocked() {
    let root = create_test_root("traversal");
    let (port, _shutdown) = start_server(&root);

    let plain = get(port, "/../../etc/passwd");
    assert!(plain.starts_with("HTTP/1.1 403"), "got: {plain}");
    assert!(!body_of(&plain).contains("root:"));

    let encoded = get(port, "/%2e%2e%2f%2e%2e%2fetc%2fpasswd");
    assert!(encoded.starts_with("HTTP/1.1 403"), "got: {encoded}");
    assert!(!body_of(&encoded).contains("root:"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn malformed_percent_encoding_returns_400() {
    let root = create_test_root("encoding");
    let (port, _shutdown) = start_server(&root);

    let response = get(port, "/%ff%fe");
    assert!(response.starts_with("HTTP/1.1 400"), "got: {response}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn post_returns_405_with_allow_header() {
    let root = create_test_root("method");
    let (port, _shutdown) = start_server(&root);

    let response = send_request(
        port,
        "POST / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\nContent-Length: 0\r\n\r\n",
    );
    assert!(response.starts_with("HTTP/1.1 405"), "got: {response}");
    assert!(response.contains("Allow: GET, HEAD"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn head_returns_headers_without_body() {
    let root = create_test_root("head");
    let (port, _shutdown) = start_server(&root);

    let response = send_request(
        port,
        "HEAD /hello.txt HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    );
    assert!(response.starts_with("HTTP/1.1 200"), "got: {response}");
    assert!(response.contains("Content-Length: 11"));
    assert_eq!(body_of(&response), "");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_requests_get_independent_bodies() {
    let root = create_test_root("concurrent");
    let (port, _shutdown) = start_server(&root);

    let first = std::thread::spawn(move || get(port, "/sub/a.txt"));
    let second = std::thread::spawn(move || get(port, "/sub/b.txt"));

    let first = first.join().expect("first request");
    let second = second.join().expect("second request");

    assert_eq!(body_of(&first), "alpha");
    assert_eq!(body_of(&second), "bravo");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn shutdown_stops_accepting_connections() {
    let root = create_test_root("shutdown");
    let (port, shutdown) = start_server(&root);

    // Server is up
    let response = get(port, "/hello.txt");
    assert!(response.starts_with("HTTP/1.1 200"));

    shutdown.notify_one();
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Listener is gone, so new connections are refused
    assert!(TcpStream::connect(("127.0.0.1", port)).is_err());
}

/// Interrupting the idle server process must exit with status 0 within a
/// bounded time.
#[cfg(unix)]
#[test]
fn interrupt_while_idle_exits_zero() {
    let root = create_test_root("interrupt");

    let mut child = std::process::Command::new(env!("CARGO_BIN_EXE_servedir"))
        .arg("--port")
        .arg("0")
        .arg("--root")
        .arg(&root)
        .stdout(std::process::Stdio::null())
        .spawn()
        .expect("spawn server binary");

    // Give the server time to bind and install its signal handler
    std::thread::sleep(Duration::from_millis(500));

    let kill = std::process::Command::new("kill")
        .arg("-INT")
        .arg(child.id().to_string())
        .status()
        .expect("send SIGINT");
    assert!(kill.success());

    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    loop {
        if let Some(status) = child.try_wait().expect("poll child") {
            assert!(status.success(), "expected exit 0, got {status}");
            break;
        }
        assert!(
            std::time::Instant::now() < deadline,
            "server did not exit within 5s of SIGINT"
        );
        std::thread::sleep(Duration::from_millis(50));
    }
}

/// A bind failure exits non-zero and reports the error exactly once.
#[test]
fn bind_failure_exits_nonzero_with_single_report() {
    let root = create_test_root("bindfail");

    let occupied = std::net::TcpListener::bind("0.0.0.0:0").expect("occupy a port");
    let port = occupied.local_addr().expect("local addr").port();

    let output = std::process::Command::new(env!("CARGO_BIN_EXE_servedir"))
        .arg("--port")
        .arg(port.to_string())
        .arg("--root")
        .arg(&root)
        .output()
        .expect("run server binary");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(
        stderr.matches("Failed to bind").count(),
        1,
        "bind failure should be reported once, got: {stderr}"
    );
}
