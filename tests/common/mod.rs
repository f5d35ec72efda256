#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use auditor_api::auth::{generate_jwt, Role};
use auditor_api::config::{AppConfig, Environment, SecurityConfig};
use reqwest::StatusCode;
use uuid::Uuid;

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub const JWT_SECRET: &str = "integration-test-secret";

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

        // Cargo builds the server binary before integration tests run
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_auditor-api"));
        cmd.env("AUDITOR_API_PORT", port.to_string())
            .env("AUDITOR_JWT_SECRET", JWT_SECRET)
            .env("DATABASE_CONNECTION_TIMEOUT", "1")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        // Keep whatever DATABASE_URL the environment provides; the pool is lazy,
        // so the server starts (and /health answers 503) without a database
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
            let url = format!("{}/", self.base_url);
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
    // Use stable get_or_init and convert init errors into a panic with context.
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

fn security() -> SecurityConfig {
    let mut security = AppConfig::for_environment(Environment::Development).security;
    security.jwt_secret = JWT_SECRET.to_string();
    security
}

/// Token the spawned server accepts.
pub fn token(role: Role) -> String {
    generate_jwt(&security(), Uuid::new_v4(), role).expect("sign token")
}
