//! Common test utilities for shortvid-dl integration tests

#[allow(dead_code)]
pub mod assertions;
#[allow(dead_code)]
pub mod fixtures;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;

use shortvid_dl::api::create_router;
use shortvid_dl::{Config, Extractor, VideoDownloader};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// A running service bound to an ephemeral port
pub struct TestServer {
    pub addr: SocketAddr,
    pub downloader: Arc<VideoDownloader>,
    pub temp_dir: TempDir,
    handle: JoinHandle<()>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Start the router over `extractor` with downloads under a fresh temp dir
pub async fn spawn_server(extractor: impl Extractor + 'static) -> TestServer {
    let temp_dir = tempfile::tempdir().expect("temp dir");
    let mut config = Config::default();
    config.download.download_dir = temp_dir.path().join("downloads");
    config.download.max_concurrent_downloads = 2;

    let downloader = Arc::new(VideoDownloader::with_extractor(config, Arc::new(extractor)));
    let app = create_router(downloader.clone(), downloader.get_config());

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server");
    });

    TestServer {
        addr,
        downloader,
        temp_dir,
        handle,
    }
}

/// A parsed HTTP/1.1 response
#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("json body")
    }
}

/// Send one request with `Connection: close` and read the whole response
pub async fn http(addr: SocketAddr, method: &str, path: &str, form: Option<&str>) -> HttpResponse {
    let mut stream = TcpStream::connect(addr).await.expect("connect");
    let mut request = format!("{method} {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n");
    if let Some(body) = form {
        request.push_str("Content-Type: application/x-www-form-urlencoded\r\n");
        request.push_str(&format!("Content-Length: {}\r\n\r\n{body}", body.len()));
    } else {
        request.push_str("\r\n");
    }
    stream.write_all(request.as_bytes()).await.expect("write");

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.expect("read");

    let split = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("header terminator");
    let head = String::from_utf8_lossy(&raw[..split]).into_owned();
    let body = raw[split + 4..].to_vec();

    let mut lines = head.lines();
    let status = lines
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|code| code.parse().ok())
        .expect("status line");
    let headers = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| (name.trim().to_ascii_lowercase(), value.trim().to_string()))
        .collect();

    HttpResponse {
        status,
        headers,
        body,
    }
}

/// Percent-encode a URL for a form body
pub fn form_url(url: &str) -> String {
    format!(
        "url={}",
        url.replace('%', "%25")
            .replace(':', "%3A")
            .replace('/', "%2F")
            .replace('@', "%40")
            .replace('?', "%3F")
            .replace('&', "%26")
            .replace('=', "%3D")
    )
}
