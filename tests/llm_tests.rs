//! LLM client tests
//!
//! Provider selection plus the Ollama client against a wiremock server, and
//! the retry policy wrapped around a flaky client.

use research_panel::llm::{LLMClient, Provider, RetryPolicy};
use research_panel::types::AppError;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn ollama_chat_response(content: &str) -> serde_json::Value {
    json!({
        "model": "llama3.2",
        "created_at": "2024-01-01T00:00:00Z",
        "message": {
            "role": "assistant",
            "content": content
        },
        "done": true,
        "total_duration": 1000,
        "load_duration": 100,
        "prompt_eval_count": 10,
        "prompt_eval_duration": 200,
        "eval_count": 5,
        "eval_duration": 300
    })
}

#[test]
fn test_provider_reports_model_and_name() {
    let provider = Provider::Ollama {
        base_url: "http://localhost:11434".to_string(),
        model: "llama3.2".to_string(),
    };
    assert_eq!(provider.name(), "Ollama");
    assert_eq!(provider.model(), "llama3.2");
}

#[cfg(feature = "openai")]
#[tokio::test]
async fn test_openai_without_key_is_configuration_error() {
    let provider = Provider::OpenAI {
        api_key: String::new(),
        api_base: "https://api.openai.com/v1".to_string(),
        model: "gpt-4o".to_string(),
    };
    let err = provider.create_client().await.err().unwrap();
    assert!(matches!(err, AppError::Configuration(_)));
    assert!(err.is_fatal());
}

#[cfg(feature = "ollama")]
#[tokio::test]
async fn test_ollama_invalid_base_url() {
    let provider = Provider::Ollama {
        base_url: "not a url".to_string(),
        model: "llama3.2".to_string(),
    };
    let err = provider.create_client().await.err().unwrap();
    assert!(matches!(err, AppError::Configuration(_)));
}

#[cfg(feature = "ollama")]
#[tokio::test]
async fn test_ollama_complete_sends_system_and_history() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({ "model": "llama3.2" })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(ollama_chat_response("Storage costs fell [1].")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = Provider::Ollama {
        base_url: mock_server.uri(),
        model: "llama3.2".to_string(),
    }
    .create_client()
    .await
    .unwrap();

    let answer = client
        .complete(
            "You are an expert being interviewed.",
            &[
                ("user".to_string(), "What changed?".to_string()),
                ("assistant".to_string(), "Prices.".to_string()),
                ("user".to_string(), "By how much?".to_string()),
            ],
        )
        .await
        .unwrap();

    assert_eq!(answer, "Storage costs fell [1].");
    assert_eq!(client.model_name(), "llama3.2");
}

#[cfg(feature = "ollama")]
#[tokio::test]
async fn test_ollama_server_error_is_transport() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model crashed"))
        .mount(&mock_server)
        .await;

    let client = Provider::Ollama {
        base_url: mock_server.uri(),
        model: "llama3.2".to_string(),
    }
    .create_client()
    .await
    .unwrap();

    let err = client.generate("Hello").await.unwrap_err();
    assert!(matches!(err, AppError::Transport(_)));
    assert!(err.is_retryable());
}

#[cfg(feature = "ollama")]
#[tokio::test]
async fn test_retry_policy_recovers_from_transient_ollama_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ollama_chat_response("recovered")))
        .mount(&mock_server)
        .await;

    let client = Provider::Ollama {
        base_url: mock_server.uri(),
        model: "llama3.2".to_string(),
    }
    .create_client()
    .await
    .unwrap();

    let attempts = AtomicUsize::new(0);
    let policy = RetryPolicy::default().with_max_retries(2).without_backoff();
    let client = &client;
    let counter = &attempts;
    let text = policy
        .run("ollama", None, move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            client.generate("Hello").await
        })
        .await
        .unwrap();

    assert_eq!(text, "recovered");
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}
