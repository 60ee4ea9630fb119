#![allow(dead_code)]

use docuchat_client::config::ApiSettings;
use docuchat_client::services::{ApiClient, PollSettings};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::MockServer;

pub const API_PREFIX: &str = "/api/v1";

/// A stand-in DocuChat server plus a client pointed at it.
pub struct TestApp {
    pub server: MockServer,
    pub client: Arc<ApiClient>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let server = MockServer::start().await;
        let settings = ApiSettings {
            base_url: format!("{}{}", server.uri(), API_PREFIX),
            request_timeout_secs: 5,
            ..Default::default()
        };
        let client = Arc::new(ApiClient::new(&settings).expect("Failed to build API client"));

        Self { server, client }
    }

    pub fn settings(&self) -> ApiSettings {
        ApiSettings {
            base_url: self.client.base_url().to_string(),
            poll_interval_ms: 50,
            ready_delay_ms: 20,
            request_timeout_secs: 5,
        }
    }
}

/// Polling fast enough for real-time tests.
pub fn fast_poll() -> PollSettings {
    PollSettings {
        interval: Duration::from_millis(50),
        ready_delay: Duration::from_millis(20),
    }
}

/// Base URL of a local port with nothing listening on it.
pub fn unused_base_url() -> String {
    let listener =
        std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind a local port");
    let addr = listener.local_addr().expect("Failed to read local address");
    drop(listener);
    format!("http://{}{}", addr, API_PREFIX)
}

/// Settings for a server that refuses every connection.
pub fn unreachable_settings() -> ApiSettings {
    ApiSettings {
        base_url: unused_base_url(),
        request_timeout_secs: 2,
        ..Default::default()
    }
}

pub fn api_path(path: &str) -> String {
    format!("{}{}", API_PREFIX, path)
}

/// Terminal output shared between the session under test and the scripted
/// user typing into it.
#[derive(Clone, Default)]
pub struct SharedOutput {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl SharedOutput {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock().unwrap()).into_owned()
    }

    /// Wait until `text` has been written. Panics after a minute of
    /// (possibly paused) time.
    pub async fn wait_for(&self, text: &str) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(60);
        while !self.contents().contains(text) {
            if tokio::time::Instant::now() > deadline {
                panic!("timed out waiting for {:?}; output was:\n{}", text, self.contents());
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }
}

impl Write for SharedOutput {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Write `content` to a fresh file in the temp directory.
pub fn temp_document(name: &str, content: &[u8]) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("docuchat-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).expect("Failed to create temp directory");
    let path = dir.join(name);
    std::fs::write(&path, content).expect("Failed to write temp document");
    path
}
