//! Shared utilities for integration testing.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Once};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use rpc_failover::config::EndpointConfig;

static TRACING: Once = Once::new();

/// Install a per-binary test subscriber so `RUST_LOG` works in test runs.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .with_test_writer()
            .try_init();
    });
}

/// Start a programmable mock JSON-RPC backend on an ephemeral port.
///
/// The handler returns `(http_status, json_body)` per request. The request
/// head and body are drained before answering so POSTing clients never see
/// a reset mid-write.
pub async fn start_rpc_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    init_tracing();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        drain_request(&mut socket).await;

                        let (status, body) = f().await;
                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            429 => "429 Too Many Requests",
                            500 => "500 Internal Server Error",
                            502 => "502 Bad Gateway",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Read the HTTP request head plus Content-Length bytes of body.
async fn drain_request(socket: &mut tokio::net::TcpStream) {
    let mut buf = vec![0u8; 16 * 1024];
    let mut total = 0;
    loop {
        match socket.read(&mut buf[total..]).await {
            Ok(0) => break,
            Ok(n) => {
                total += n;
                if let Some(head_end) = find_subslice(&buf[..total], b"\r\n\r\n") {
                    let head = String::from_utf8_lossy(&buf[..head_end]);
                    let content_length = head
                        .lines()
                        .find_map(|line| {
                            let line = line.to_ascii_lowercase();
                            line.strip_prefix("content-length:")
                                .map(|v| v.trim().parse::<usize>().unwrap_or(0))
                        })
                        .unwrap_or(0);
                    if total >= head_end + 4 + content_length {
                        break;
                    }
                }
                if total == buf.len() {
                    break;
                }
            }
            Err(_) => break,
        }
    }
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// A successful JSON-RPC response body carrying a string result.
pub fn rpc_result(value: &str) -> String {
    format!(r#"{{"jsonrpc":"2.0","id":1,"result":"{}"}}"#, value)
}

/// A JSON-RPC response body carrying an error object.
#[allow(dead_code)]
pub fn rpc_error(code: i64, message: &str) -> String {
    format!(
        r#"{{"jsonrpc":"2.0","id":1,"error":{{"code":{},"message":"{}"}}}}"#,
        code, message
    )
}

/// Endpoint descriptor pointing at a mock backend.
pub fn endpoint(addr: SocketAddr, identity: &str, priority: u32) -> EndpointConfig {
    EndpointConfig {
        url: format!("http://{}", addr),
        identity: identity.to_string(),
        priority,
    }
}
