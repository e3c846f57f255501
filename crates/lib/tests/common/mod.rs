#![allow(dead_code)]
//! # Common Test Utilities
//!
//! Shared setup for the library's integration tests: tracing, an in-memory
//! provider seeded with users, and a scripted AI provider.

use async_trait::async_trait;
use dotenvy::dotenv;
use std::sync::{Arc, Once, RwLock};
use syncscript::{
    errors::CitationError, providers::ai::AiProvider, providers::db::sqlite::SqliteProvider,
};

static INIT: Once = Once::new();

/// Initializes the tracing subscriber and loads .env for tests.
pub fn setup_tracing() {
    INIT.call_once(|| {
        dotenv().ok();
        tracing_subscriber::fmt::init();
    });
}

/// An isolated in-memory database with the schema applied.
pub async fn provider() -> SqliteProvider {
    let provider = SqliteProvider::new(":memory:")
        .await
        .expect("Failed to create SqliteProvider");
    provider
        .initialize_schema()
        .await
        .expect("Failed to initialize schema");
    provider
}

/// Creates a user and returns its id.
pub async fn user(provider: &SqliteProvider, email: &str) -> String {
    core_access::get_or_create_user(&provider.db, email, None)
        .await
        .expect("Failed to create user")
        .id
}

// --- Mock AI Provider ---
#[derive(Clone, Debug)]
pub struct MockAiProvider {
    pub call_history: Arc<RwLock<Vec<(String, String)>>>,
    pub responses: Arc<RwLock<Vec<Result<String, String>>>>,
}

impl MockAiProvider {
    pub fn new(responses: Vec<Result<String, String>>) -> Self {
        Self {
            call_history: Arc::new(RwLock::new(Vec::new())),
            responses: Arc::new(RwLock::new(responses.into_iter().rev().collect())),
        }
    }
}

#[async_trait]
impl AiProvider for MockAiProvider {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, CitationError> {
        self.call_history
            .write()
            .unwrap()
            .push((system_prompt.to_string(), user_prompt.to_string()));

        match self.responses.write().unwrap().pop() {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(CitationError::AiApi(message)),
            None => Err(CitationError::EmptyResponse),
        }
    }
}
