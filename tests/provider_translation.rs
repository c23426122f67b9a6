//! Wire-level tests for each synchronous provider adapter
//!
//! Every test stands up a wiremock server as the provider and checks the
//! translated request body, the auth headers, and the normalized response.

use llm_proxy::chat::{ChatRequest, FinishReason};
use llm_proxy::providers::{
    AdapterCredential, AnthropicAdapter, ChatAdapter, CohereAdapter, GroqAdapter,
    HuggingFaceAdapter, OllamaAdapter, OpenAiAdapter, ProviderError, TogetherAdapter,
};
use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn credential(server: &MockServer, key: &str) -> AdapterCredential {
    AdapterCredential::new(key, server.uri())
}

fn openai_style_body(model: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-123",
        "object": "chat.completion",
        "created": 1700000000,
        "model": model,
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": "Hello there"},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 9, "completion_tokens": 3, "total_tokens": 12}
    })
}

fn conversation(model: &str) -> ChatRequest {
    ChatRequest::builder()
        .model(model)
        .system_message("Be brief")
        .user_message("Hi")
        .assistant_message("Hello")
        .user_message("How are you?")
        .temperature(0.3)
        .max_tokens(64)
        .build()
        .unwrap()
}

// ─────────────────────────────────────────────────────────────────────────────
// OpenAI-compatible providers
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_openai_passthrough_is_identity() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_json(json!({
            "model": "gpt-4o",
            "messages": [
                {"role": "system", "content": "Be brief"},
                {"role": "user", "content": "Hi"},
                {"role": "assistant", "content": "Hello"},
                {"role": "user", "content": "How are you?"}
            ],
            "temperature": 0.3,
            "max_tokens": 64,
            "stream": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(openai_style_body("gpt-4o")))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = OpenAiAdapter::new(credential(&server, "sk-test"), reqwest::Client::new());
    let response = adapter.chat(&conversation("gpt-4o")).await.unwrap();

    assert_eq!(response.id, "chatcmpl-123");
    assert_eq!(response.created, 1700000000);
    assert_eq!(response.model, "gpt-4o");
    assert_eq!(response.content(), "Hello there");
    assert_eq!(response.finish_reason(), FinishReason::Stop);
    assert_eq!(response.usage.total_tokens(), 12);
}

#[tokio::test]
async fn test_groq_and_together_share_passthrough_wire_format() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({"stream": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(openai_style_body("m")))
        .expect(2)
        .mount(&server)
        .await;

    let groq = GroqAdapter::new(credential(&server, "gsk"), reqwest::Client::new());
    let together = TogetherAdapter::new(credential(&server, "tgt"), reqwest::Client::new());

    let request = conversation("llama-3.1-8b-instant");
    assert_eq!(groq.chat(&request).await.unwrap().content(), "Hello there");
    assert_eq!(together.chat(&request).await.unwrap().content(), "Hello there");
}

#[tokio::test]
async fn test_upstream_error_message_is_extracted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}
        })))
        .mount(&server)
        .await;

    let adapter = OpenAiAdapter::new(credential(&server, "bad"), reqwest::Client::new());
    let err = adapter.chat(&conversation("gpt-4o")).await.unwrap_err();
    match err {
        ProviderError::Api { status, message } => {
            assert_eq!(status, 401);
            assert_eq!(message, "Incorrect API key provided");
        }
        other => panic!("expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_success_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let adapter = OpenAiAdapter::new(credential(&server, "sk"), reqwest::Client::new());
    let err = adapter.chat(&conversation("gpt-4o")).await.unwrap_err();
    assert!(matches!(err, ProviderError::Decode(_)), "got {:?}", err);
}

// ─────────────────────────────────────────────────────────────────────────────
// Anthropic
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_anthropic_isolates_system_and_sends_version_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/messages"))
        .and(header("x-api-key", "ant-key"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_json(json!({
            "model": "claude-3-haiku-20240307",
            "messages": [
                {"role": "user", "content": "Hi"},
                {"role": "assistant", "content": "Hello"},
                {"role": "user", "content": "How are you?"}
            ],
            "max_tokens": 64,
            "system": "Be brief",
            "temperature": 0.3
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "msg_01",
            "model": "claude-3-haiku-20240307",
            "content": [{"type": "text", "text": "Doing well"}],
            "stop_reason": "max_tokens",
            "usage": {"input_tokens": 20, "output_tokens": 5}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = AnthropicAdapter::new(credential(&server, "ant-key"), reqwest::Client::new());
    let response = adapter
        .chat(&conversation("claude-3-haiku-20240307"))
        .await
        .unwrap();

    assert_eq!(response.id, "msg_01");
    assert_eq!(response.content(), "Doing well");
    assert_eq!(response.finish_reason(), FinishReason::Length);
    assert_eq!(response.usage.prompt_tokens(), 20);
    assert_eq!(response.usage.completion_tokens(), 5);
    assert_eq!(response.usage.total_tokens(), 25);
}

// ─────────────────────────────────────────────────────────────────────────────
// Cohere
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_cohere_splits_history_preamble_and_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .and(header("authorization", "Bearer co-key"))
        .and(body_partial_json(json!({
            "model": "command",
            "message": "How are you?",
            "chat_history": [
                {"role": "USER", "message": "Hi"},
                {"role": "CHATBOT", "message": "Hello"}
            ],
            "preamble": "Be brief",
            "max_tokens": 64
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "text": "  Fine, thanks  ",
            "generation_id": "gen-1",
            "finish_reason": "COMPLETE",
            "meta": {"billed_units": {"input_tokens": 11, "output_tokens": 4}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = CohereAdapter::new(credential(&server, "co-key"), reqwest::Client::new());
    let response = adapter.chat(&conversation("command")).await.unwrap();

    assert_eq!(response.id, "gen-1");
    assert_eq!(response.content(), "Fine, thanks");
    assert_eq!(response.finish_reason(), FinishReason::Stop);
    assert_eq!(response.usage.total_tokens(), 15);
}

#[tokio::test]
async fn test_cohere_system_only_conversation_is_rejected_without_a_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let request = ChatRequest::builder()
        .model("command")
        .system_message("Only instructions")
        .build()
        .unwrap();
    let adapter = CohereAdapter::new(credential(&server, "co-key"), reqwest::Client::new());
    let err = adapter.chat(&request).await.unwrap_err();
    assert!(matches!(err, ProviderError::InvalidRequest(_)), "got {:?}", err);
}

// ─────────────────────────────────────────────────────────────────────────────
// Hugging Face
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_huggingface_posts_transcript_to_model_path() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/google/flan-t5-base"))
        .and(header("authorization", "Bearer hf_key"))
        .and(body_partial_json(json!({
            "inputs": "Assistant: Be brief\nHuman: Hi\nAssistant: Hello\nHuman: How are you?\nAssistant:",
            "parameters": {"max_new_tokens": 64, "return_full_text": false}
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"generated_text": " I am fine. "}])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let adapter = HuggingFaceAdapter::new(credential(&server, "hf_key"), reqwest::Client::new());
    let response = adapter.chat(&conversation("google/flan-t5-base")).await.unwrap();

    assert!(response.id.starts_with("hf-"));
    assert_eq!(response.content(), "I am fine.");
    assert_eq!(response.usage.total_tokens(), 0);
}

// ─────────────────────────────────────────────────────────────────────────────
// Ollama
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_ollama_sends_no_auth_and_reports_eval_counts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({
            "model": "llama2",
            "stream": false,
            "options": {"num_predict": 64}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "llama2",
            "message": {"role": "assistant", "content": "Hey"},
            "done": true,
            "prompt_eval_count": 30,
            "eval_count": 2
        })))
        .expect(1)
        .mount(&server)
        .await;

    let adapter = OllamaAdapter::new(credential(&server, ""), reqwest::Client::new());
    let response = adapter.chat(&conversation("llama2")).await.unwrap();

    let received: Vec<Request> = server.received_requests().await.unwrap();
    assert!(!received[0].headers.contains_key("authorization"));

    assert!(response.id.starts_with("ollama-"));
    assert_eq!(response.content(), "Hey");
    assert_eq!(response.usage.prompt_tokens(), 30);
    assert_eq!(response.usage.total_tokens(), 32);
}
