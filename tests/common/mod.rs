#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use patrol_api::auth::Authenticator;
use reqwest::StatusCode;
use serde_json::Value;

pub const TEST_SECRET: &str = "integration-test-secret";

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // In-memory store keeps the suite independent of a running database
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_patrol-api"));
        cmd.env("APP_ENV", "development")
            .env("PATROL_API_PORT", port.to_string())
            .env("STORE_BACKEND", "memory")
            .env("JWT_SECRET", TEST_SECRET)
            .env("LOG_FILTER", "warn")
            .env_remove("RUST_LOG")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// Bearer token signed with the secret the test server runs with
pub fn token() -> Result<String> {
    Authenticator::new(TEST_SECRET, 1)
        .issue("integration", "admin", None)
        .map_err(|e| anyhow::anyhow!("failed to issue token: {}", e))
}

/// Create a client and return its document
pub async fn create_client(server: &TestServer, body: Value) -> Result<Value> {
    let res = reqwest::Client::new()
        .post(server.url("/api/clients"))
        .bearer_auth(token()?)
        .json(&body)
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::CREATED, "create failed with {}", res.status());

    let body = res.json::<Value>().await?;
    Ok(body["data"].clone())
}

pub fn id_of(value: &Value) -> String {
    value["_id"].as_str().unwrap_or_default().to_string()
}
