use crate::{errors::CitationError, providers::ai::AiProvider};
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use tracing::debug;

// --- OpenAI-compatible request and response structures ---

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    temperature: f32,
    max_tokens: i32,
    stream: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize, Debug)]
struct ChatChoice {
    message: ChatMessage,
}

/// Sampling settings used for citation requests.
const CITATION_TEMPERATURE: f32 = 0.3;
const CITATION_MAX_TOKENS: i32 = 200;

/// A provider for any OpenAI-compatible chat completions endpoint
/// (OpenRouter, a local server, or OpenAI itself).
#[derive(Clone, Debug)]
pub struct ChatCompletionsProvider {
    client: ReqwestClient,
    api_url: String,
    api_key: Option<String>,
    model: Option<String>,
    referer: Option<String>,
}

impl ChatCompletionsProvider {
    pub fn new(
        api_url: String,
        api_key: Option<String>,
        model: Option<String>,
    ) -> Result<Self, CitationError> {
        let client = ReqwestClient::builder()
            .build()
            .map_err(CitationError::ReqwestClientBuild)?;
        Ok(Self {
            client,
            api_url,
            api_key,
            model,
            referer: None,
        })
    }

    /// Sends an `HTTP-Referer` header with every request, as OpenRouter expects.
    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self
    }
}

#[async_trait]
impl AiProvider for ChatCompletionsProvider {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, CitationError> {
        let request_body = ChatRequest {
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_prompt.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user_prompt.to_string(),
                },
            ],
            model: self.model.as_deref(),
            temperature: CITATION_TEMPERATURE,
            max_tokens: CITATION_MAX_TOKENS,
            stream: false,
        };

        let mut request_builder = self.client.post(&self.api_url);
        if let Some(key) = &self.api_key {
            request_builder = request_builder.bearer_auth(key);
        }
        if let Some(referer) = &self.referer {
            request_builder = request_builder.header("HTTP-Referer", referer);
        }

        debug!(url = %self.api_url, "--> Sending citation request");
        let response = request_builder
            .json(&request_body)
            .send()
            .await
            .map_err(CitationError::AiRequest)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(CitationError::AiApi(format!("{status}: {error_text}")));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(CitationError::AiDeserialization)?;

        let content = chat_response
            .choices
            .first()
            .map(|c| c.message.content.trim().to_string())
            .unwrap_or_default();

        if content.is_empty() {
            return Err(CitationError::EmptyResponse);
        }
        Ok(content)
    }
}
