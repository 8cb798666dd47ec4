use std::sync::Arc;
use std::time::Duration;

use monologue::audio::{AssetStore, DurationProbe};
use monologue::error::{ErrorCategory, MonologueError, Result};
use monologue::generation::{OpenAiChatClient, TextGenerator};
use monologue::speech::{
    AudioFormat, OpenAiSpeechProvider, SpeechProvider, SpeechRequest, SpeechSynthesisClient,
    SpeechSynthesizer,
};
use monologue::types::{HistoryEntry, Voice};
use monologue::util::retry::RetryPolicy;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{body_json, body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_retry_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(1),
        multiplier: 1.0,
    }
}

fn chat_client(server: &MockServer) -> OpenAiChatClient {
    OpenAiChatClient::new_with_base_url("test-key".to_string(), server.uri())
        .with_retry_policy(test_retry_policy(1))
}

fn speech_provider(server: &MockServer) -> OpenAiSpeechProvider {
    OpenAiSpeechProvider::new_with_base_url("test-key".to_string(), server.uri())
        .with_retry_policy(test_retry_policy(1))
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [
            {"index": 0, "message": {"role": "assistant", "content": content}, "finish_reason": "stop"}
        ]
    })
}

struct FixedProbe(Duration);

impl DurationProbe for FixedProbe {
    fn probe(&self, _path: &std::path::Path) -> Result<Duration> {
        Ok(self.0)
    }
}

#[tokio::test]
async fn chat_sends_system_history_and_prompt() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_json(json!({
            "model": "gpt-3.5-turbo",
            "max_tokens": 4096,
            "messages": [
                {"role": "system", "content": "You are a helpful assistant"},
                {"role": "user", "content": "first prompt"},
                {"role": "assistant", "content": "first reply"},
                {"role": "user", "content": "next prompt"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("second reply")))
        .expect(1)
        .mount(&server)
        .await;

    let history = vec![
        HistoryEntry::user("first prompt"),
        HistoryEntry::assistant("first reply"),
    ];
    let text = chat_client(&server)
        .generate("next prompt", &history)
        .await
        .expect("generation should succeed");

    assert_eq!(text, "second reply");
}

#[tokio::test]
async fn chat_bad_status_carries_api_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = chat_client(&server).generate("hello", &[]).await.unwrap_err();

    assert_eq!(err.category(), ErrorCategory::BadStatus);
    match err {
        MonologueError::Api { status, message } => {
            assert_eq!(status, 401);
            assert!(message.contains("Incorrect API key"));
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn chat_without_choices_is_a_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let err = chat_client(&server).generate("hello", &[]).await.unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Decode);
}

#[tokio::test]
async fn chat_schema_mismatch_is_a_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;

    let err = chat_client(&server).generate("hello", &[]).await.unwrap_err();
    assert!(matches!(err, MonologueError::Decode(_)));
}

#[tokio::test]
async fn chat_retries_server_errors_when_allowed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("recovered")))
        .expect(1)
        .mount(&server)
        .await;

    let client = OpenAiChatClient::new_with_base_url("test-key".to_string(), server.uri())
        .with_retry_policy(test_retry_policy(2));
    let text = client.generate("hello", &[]).await.unwrap();
    assert_eq!(text, "recovered");
}

#[tokio::test]
async fn chat_times_out_when_configured() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(completion("late"))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let err = chat_client(&server)
        .with_timeout(Some(Duration::from_millis(50)))
        .generate("hello", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, MonologueError::Timeout(50)));
}

#[tokio::test]
async fn speech_returns_audio_bytes() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/audio/speech"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({
            "model": "tts-1-hd",
            "input": "hello world",
            "voice": "onyx",
            "response_format": "mp3"
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "audio/mpeg")
                .set_body_bytes(vec![0xFF, 0xFB, 0x90, 0x00]),
        )
        .expect(1)
        .mount(&server)
        .await;

    let request = SpeechRequest::new("hello world", Voice::Onyx, AudioFormat::Mp3);
    let audio = speech_provider(&server)
        .generate_speech(&request)
        .await
        .expect("speech should succeed");

    assert_eq!(audio, vec![0xFF, 0xFB, 0x90, 0x00]);
}

#[tokio::test]
async fn speech_json_body_is_a_decode_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/audio/speech"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;

    let request = SpeechRequest::new("hello", Voice::Alloy, AudioFormat::Mp3);
    let err = speech_provider(&server)
        .generate_speech(&request)
        .await
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Decode);
}

#[tokio::test]
async fn speech_rejects_empty_text_without_calling_endpoint() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/audio/speech"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let request = SpeechRequest::new("   ", Voice::Alloy, AudioFormat::Mp3);
    let err = speech_provider(&server)
        .generate_speech(&request)
        .await
        .unwrap_err();
    assert!(matches!(err, MonologueError::InvalidArgument(_)));
}

#[tokio::test]
async fn synthesis_writes_clip_at_index_path() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/audio/speech"))
        .and(body_partial_json(json!({"voice": "nova"})))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "audio/mpeg")
                .set_body_bytes(b"fake-mp3".to_vec()),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let store = AssetStore::new(dir.path(), AudioFormat::Mp3);
    let client = SpeechSynthesisClient::new(
        Arc::new(speech_provider(&server)),
        Arc::new(FixedProbe(Duration::from_secs(42))),
    );

    let asset = client
        .synthesize(&store, 3, "some words", Voice::Nova)
        .await
        .unwrap();

    assert_eq!(asset.index, 3);
    assert_eq!(asset.path, dir.path().join("segment-3.mp3"));
    assert_eq!(asset.duration, Duration::from_secs(42));
    assert_eq!(std::fs::read(&asset.path).unwrap(), b"fake-mp3");
}

#[tokio::test]
async fn synthesis_bad_status_writes_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/audio/speech"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": {"message": "internal error"}
        })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let store = AssetStore::new(dir.path(), AudioFormat::Mp3);
    let client = SpeechSynthesisClient::new(
        Arc::new(speech_provider(&server)),
        Arc::new(FixedProbe(Duration::from_secs(1))),
    );

    let err = client
        .synthesize(&store, 0, "some words", Voice::Alloy)
        .await
        .unwrap_err();

    assert_eq!(err.category(), ErrorCategory::BadStatus);
    assert!(!store.contains(0));
}
