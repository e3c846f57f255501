//! # Citation Tests
//!
//! Verifies the OpenAI-compatible provider against a mock HTTP server, and
//! that `generate_citation` degrades to the fallback format on failure.

mod common;

use crate::common::{setup_tracing, MockAiProvider};
use httpmock::prelude::*;
use serde_json::json;
use syncscript::{
    citation::CITATION_SYSTEM_PROMPT,
    errors::CitationError,
    generate_citation,
    providers::ai::{chat::ChatCompletionsProvider, AiProvider},
    CitationOrigin, CitationRequest,
};

fn full_request() -> CitationRequest {
    CitationRequest {
        title: Some("Deep Work".to_string()),
        author: Some("Newport, C.".to_string()),
        year: Some("2016".to_string()),
        text: None,
    }
}

#[tokio::test]
async fn test_chat_provider_sends_citation_request() {
    setup_tracing();
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/chat/completions")
            .header("authorization", "Bearer test-key")
            .header("http-referer", "https://syncscript.app")
            .body_contains("expert academic citation assistant")
            .json_body_partial(
                json!({
                    "model": "test-model",
                    "max_tokens": 200,
                    "temperature": 0.3
                })
                .to_string(),
            );
        then.status(200).json_body(json!({
            "choices": [{"message": {"role": "assistant", "content": "  Newport, C. (2016). Deep work. Grand Central.  "}}]
        }));
    });

    let provider = ChatCompletionsProvider::new(
        server.url("/v1/chat/completions"),
        Some("test-key".to_string()),
        Some("test-model".to_string()),
    )
    .unwrap()
    .with_referer("https://syncscript.app");

    let generated = generate_citation(Some(&provider), &full_request())
        .await
        .unwrap();

    mock.assert();
    assert_eq!(generated.source, CitationOrigin::Ai);
    assert_eq!(generated.citation, "Newport, C. (2016). Deep work. Grand Central.");
}

#[tokio::test]
async fn test_chat_provider_reports_api_errors() {
    setup_tracing();
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1/chat/completions");
        then.status(500).body("upstream exploded");
    });

    let provider =
        ChatCompletionsProvider::new(server.url("/v1/chat/completions"), None, None).unwrap();
    let err = provider.generate("system", "user").await.unwrap_err();
    assert!(matches!(err, CitationError::AiApi(ref msg) if msg.contains("upstream exploded")));

    let generated = generate_citation(Some(&provider), &full_request())
        .await
        .unwrap();
    assert_eq!(generated.source, CitationOrigin::Fallback);
    assert_eq!(
        generated.citation,
        "Newport, C. (2016). Deep Work. [PDF Document]."
    );
}

#[tokio::test]
async fn test_empty_model_answer_falls_back() {
    setup_tracing();
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/v1/chat/completions");
        then.status(200)
            .json_body(json!({"choices": [{"message": {"role": "assistant", "content": "   "}}]}));
    });

    let provider =
        ChatCompletionsProvider::new(server.url("/v1/chat/completions"), None, None).unwrap();
    let generated = generate_citation(Some(&provider), &full_request())
        .await
        .unwrap();
    assert_eq!(generated.source, CitationOrigin::Fallback);
}

#[tokio::test]
async fn test_text_only_request_uses_extraction_prompt() {
    setup_tracing();
    let mock = MockAiProvider::new(vec![Ok("Hopper, G. (1952). Compilers.".to_string())]);
    let request = CitationRequest {
        text: Some(
            "The Education of a Computer\nby Grace Hopper and colleagues\nPresented 1952\n"
                .to_string(),
        ),
        ..Default::default()
    };

    let generated = generate_citation(Some(&mock), &request).await.unwrap();
    assert_eq!(generated.source, CitationOrigin::Ai);
    assert_eq!(
        generated.metadata.title.as_deref(),
        Some("The Education of a Computer")
    );
    assert_eq!(generated.metadata.author.as_deref(), Some("Grace Hopper"));
    assert_eq!(generated.metadata.year.as_deref(), Some("1952"));

    let calls = mock.call_history.read().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, CITATION_SYSTEM_PROMPT);
    assert!(calls[0].1.starts_with("Based on the following text"));
}

#[tokio::test]
async fn test_fallback_fills_gaps_from_text() {
    setup_tracing();
    let mock = MockAiProvider::new(vec![Err("rate limited".to_string())]);
    let request = CitationRequest {
        title: Some("My Custom Title".to_string()),
        text: Some("Ignored header line\nPublished 2019 by Ada Lovelace\n".to_string()),
        ..Default::default()
    };

    let generated = generate_citation(Some(&mock), &request).await.unwrap();
    assert_eq!(generated.source, CitationOrigin::Fallback);
    assert_eq!(
        generated.citation,
        "Ada Lovelace (2019). My Custom Title. [PDF Document]."
    );

    let calls = mock.call_history.read().unwrap();
    assert!(calls[0].1.contains("following available information"));
}

#[tokio::test]
async fn test_nothing_to_cite_is_an_error() {
    let mock = MockAiProvider::new(vec![]);
    let err = generate_citation(Some(&mock), &CitationRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, CitationError::NothingToCite));
    assert!(mock.call_history.read().unwrap().is_empty());
}
