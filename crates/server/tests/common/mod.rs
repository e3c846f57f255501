//! # Common Test Utilities
//!
//! This module centralizes the test harness used across the
//! `syncscript-server` integration tests. `TestApp` spawns the real router on
//! a random port against a temporary SQLite file, with the citation model
//! pointed at an `httpmock::MockServer`.

// Not every test file uses every helper.
#![allow(unused)]

use anyhow::Result;
use axum::serve;
use httpmock::MockServer;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{json, Value};
use std::{fs::File, io::Write, net::SocketAddr, path::PathBuf};
use syncscript_server::{
    config, router,
    state::{build_app_state, AppState},
};
use tempfile::{tempdir, NamedTempFile, TempDir};
use tokio::{net::TcpListener, task::JoinHandle};

pub const TEST_JWT_SECRET: &str = "integration-test-secret";
pub const TEST_PASSWORD: &str = "correct horse battery";

/// A registered user and their session token.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: String,
    pub email: String,
    pub token: String,
}

/// A harness for end-to-end testing of the Axum server.
pub struct TestApp {
    pub address: String,
    pub client: Client,
    pub mock_server: MockServer,
    pub db_path: PathBuf,
    pub app_state: AppState,
    _db_file: NamedTempFile,
    _config_dir: TempDir,
    _server_handle: JoinHandle<()>,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestApp {
    /// Spawns the application server and returns a `TestApp` instance.
    pub async fn spawn() -> Result<Self> {
        dotenvy::dotenv().ok();
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .compact()
            .try_init();

        let mock_server = MockServer::start();
        let db_file = NamedTempFile::new()?;
        let db_path = db_file.path().to_path_buf();

        let config_dir = tempdir()?;
        let config_path = config_dir.path().join("config.yml");
        let config_content = format!(
            r#"
port: 0
db_url: "{}"
jwt_secret: "{}"
jwt_ttl_secs: 3600
uploads:
  max_bytes: 1048576
  allowed_content_types: ["application/pdf"]
citation:
  api_url: "{}"
  api_key: "test-key"
  model: "mock-citation-model"
"#,
            db_path.display(),
            TEST_JWT_SECRET,
            mock_server.url("/v1/chat/completions")
        );
        let mut file = File::create(&config_path)?;
        file.write_all(config_content.as_bytes())?;

        let config = config::get_config(Some(config_path.to_str().unwrap()))?;
        let app_state = build_app_state(config).await?;
        let app_state_for_harness = app_state.clone();

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr: SocketAddr = listener.local_addr()?;
        let address = format!("http://{addr}");

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
        let server_handle = tokio::spawn(async move {
            let app = router::create_router(app_state);
            let server = serve(listener, app).with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            });
            if let Err(e) = server.await {
                tracing::error!("[TestApp] Server error: {}", e);
            }
        });

        Ok(Self {
            address,
            client: Client::new(),
            mock_server,
            db_path,
            app_state: app_state_for_harness,
            _db_file: db_file,
            _config_dir: config_dir,
            _server_handle: server_handle,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub fn get(&self, path: &str, user: Option<&TestUser>) -> RequestBuilder {
        with_token(self.client.get(self.url(path)), user)
    }

    pub fn post(&self, path: &str, user: Option<&TestUser>) -> RequestBuilder {
        with_token(self.client.post(self.url(path)), user)
    }

    pub fn patch(&self, path: &str, user: Option<&TestUser>) -> RequestBuilder {
        with_token(self.client.patch(self.url(path)), user)
    }

    pub fn delete(&self, path: &str, user: Option<&TestUser>) -> RequestBuilder {
        with_token(self.client.delete(self.url(path)), user)
    }

    /// Registers a password account through the API.
    pub async fn register(&self, name: &str, email: &str) -> Result<TestUser> {
        let response = self
            .post("/auth/register", None)
            .json(&json!({ "name": name, "email": email, "password": TEST_PASSWORD }))
            .send()
            .await?;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body: Value = response.json().await?;
        Ok(TestUser {
            id: body["result"]["user"]["id"].as_str().unwrap().to_string(),
            email: email.to_string(),
            token: body["result"]["token"].as_str().unwrap().to_string(),
        })
    }

    /// Creates a vault owned by `owner` and returns its id.
    pub async fn create_vault(&self, owner: &TestUser, title: &str) -> Result<String> {
        let response = self
            .post("/vaults", Some(owner))
            .json(&json!({ "title": title }))
            .send()
            .await?;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body: Value = response.json().await?;
        Ok(body["result"]["id"].as_str().unwrap().to_string())
    }

    /// Adds `user` to the vault with `role`, acting as `owner`.
    pub async fn add_member(
        &self,
        owner: &TestUser,
        vault_id: &str,
        user: &TestUser,
        role: &str,
    ) -> Result<()> {
        let response = self
            .post(&format!("/vaults/{vault_id}/members"), Some(owner))
            .json(&json!({ "email": user.email, "role": role }))
            .send()
            .await?;
        assert_eq!(response.status(), StatusCode::CREATED);
        Ok(())
    }

    /// Adds a source as `user` and returns its id.
    pub async fn create_source(&self, user: &TestUser, vault_id: &str, title: &str) -> Result<String> {
        let response = self
            .post(&format!("/vaults/{vault_id}/sources"), Some(user))
            .json(&json!({ "title": title, "url": "https://example.com/paper" }))
            .send()
            .await?;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body: Value = response.json().await?;
        Ok(body["result"]["id"].as_str().unwrap().to_string())
    }

    /// Adds an annotation as `user` and returns its id.
    pub async fn create_annotation(
        &self,
        user: &TestUser,
        vault_id: &str,
        source_id: &str,
        content: &str,
    ) -> Result<String> {
        let response = self
            .post(
                &format!("/vaults/{vault_id}/sources/{source_id}/annotations"),
                Some(user),
            )
            .json(&json!({ "content": content }))
            .send()
            .await?;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body: Value = response.json().await?;
        Ok(body["result"]["id"].as_str().unwrap().to_string())
    }

    /// Sets up the usual cast: Alice owns the vault, Bob contributes and
    /// Carol views.
    pub async fn seeded_vault(&self) -> Result<(String, TestUser, TestUser, TestUser)> {
        let alice = self.register("Alice", "alice@example.com").await?;
        let bob = self.register("Bob", "bob@example.com").await?;
        let carol = self.register("Carol", "carol@example.com").await?;
        let vault_id = self.create_vault(&alice, "Thesis research").await?;
        self.add_member(&alice, &vault_id, &bob, "CONTRIBUTOR").await?;
        self.add_member(&alice, &vault_id, &carol, "VIEWER").await?;
        Ok((vault_id, alice, bob, carol))
    }
}

fn with_token(builder: RequestBuilder, user: Option<&TestUser>) -> RequestBuilder {
    match user {
        Some(user) => builder.bearer_auth(&user.token),
        None => builder,
    }
}

/// Asserts the status and the error `code` of a failed request.
pub async fn assert_error(response: reqwest::Response, status: StatusCode, code: &str) -> Value {
    assert_eq!(response.status(), status);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], code, "unexpected error body: {body}");
    body
}

impl Drop for TestApp {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}
