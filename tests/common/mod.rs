#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use project_dashboard::database::MemoryStore;
use project_dashboard::{app, AppState};

pub const PASSWORD: &str = "s3cure-pass";

/// The router wired to a fresh in-memory store, driven without a socket
pub struct TestApp {
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let state = AppState::new(Arc::new(MemoryStore::new()));
        Self { router: app(state) }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&body)?))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .with_context(|| format!("non-JSON body: {}", String::from_utf8_lossy(&bytes)))?
        };
        Ok((status, value))
    }

    pub async fn get(&self, uri: &str, token: &str) -> Result<(StatusCode, Value)> {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.request(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.request(Method::PATCH, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> Result<(StatusCode, Value)> {
        self.request(Method::DELETE, uri, Some(token), None).await
    }

    pub async fn login(&self, username: &str) -> Result<String> {
        let (status, body) = self
            .request(
                Method::POST,
                "/api/login",
                None,
                Some(json!({ "username": username, "password": PASSWORD })),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::OK, "login failed: {status} {body}");
        Ok(body["data"]["access"].as_str().context("missing access token")?.to_string())
    }

    /// Bootstrap an admin through public registration and log in
    pub async fn admin(&self, username: &str) -> Result<String> {
        let (status, body) = self
            .request(
                Method::POST,
                "/api/register",
                None,
                Some(registration(username, Some("admin"))),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "admin bootstrap failed: {status} {body}");
        self.login(username).await
    }

    /// Create an account through an admin and log it in; returns (id, token)
    pub async fn account(&self, admin_token: &str, username: &str, role: &str) -> Result<(String, String)> {
        let (status, body) = self
            .post("/api/users/create", admin_token, registration(username, Some(role)))
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "account creation failed: {status} {body}");
        let id = body["data"]["id"].as_str().context("missing id")?.to_string();
        Ok((id, self.login(username).await?))
    }

    pub async fn project(&self, token: &str, name: &str) -> Result<String> {
        let (status, body) = self
            .post(
                "/api/projects",
                token,
                json!({
                    "name": name,
                    "description": "",
                    "start_date": "2025-01-01",
                    "end_date": "2025-12-31"
                }),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "project creation failed: {status} {body}");
        Ok(body["data"]["id"].as_str().context("missing id")?.to_string())
    }

    pub async fn milestone(&self, token: &str, project_id: &str) -> Result<String> {
        let (status, body) = self
            .post(
                "/api/milestones",
                token,
                json!({ "title": "Milestone", "due_date": "2025-06-30", "project": project_id }),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "milestone creation failed: {status} {body}");
        Ok(body["data"]["id"].as_str().context("missing id")?.to_string())
    }

    pub async fn task(&self, token: &str, milestone_id: &str, status_value: &str) -> Result<String> {
        let (status, body) = self
            .post(
                "/api/tasks",
                token,
                json!({ "title": "Task", "milestone": milestone_id, "status": status_value }),
            )
            .await?;
        anyhow::ensure!(status == StatusCode::CREATED, "task creation failed: {status} {body}");
        Ok(body["data"]["id"].as_str().context("missing id")?.to_string())
    }
}

pub fn registration(username: &str, role: Option<&str>) -> Value {
    let mut body = json!({
        "username": username,
        "email": format!("{username}@example.com"),
        "password": PASSWORD,
        "password2": PASSWORD,
    });
    if let Some(role) = role {
        body["role"] = json!(role);
    }
    body
}

static SERVER: OnceLock<TestServer> = OnceLock::new();

/// The real binary, started once per test process on a free port
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut cmd = Command::new(env!("CARGO_BIN_EXE_project-dashboard"));
        cmd.arg("serve")
            .env("API_PORT", port.to_string())
            .env("STORAGE_BACKEND", "memory")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == reqwest::StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}
