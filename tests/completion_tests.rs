use chatbox::{
    Aggregator, ApiKey, Completion, CompletionProvider, Fragment, LlmError, OpenAiClient,
    HttpClientConfig, OpenAiConfig, Snapshot, UpdateState, aggregate,
};
use futures::StreamExt;
use serde_json::json;
use std::time::Duration;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, method, path},
};

fn client(server: &MockServer) -> OpenAiClient {
    let config = OpenAiConfig::new(ApiKey::Custom("sk-test".to_string())).with_base_url(server.uri());
    OpenAiClient::new(config).expect("client")
}

fn keyless_client(server: &MockServer) -> OpenAiClient {
    let config = OpenAiConfig::new(ApiKey::Custom(String::new())).with_base_url(server.uri());
    OpenAiClient::new(config).expect("client")
}

async fn mount_body(server: &MockServer, status: u16, body: &str) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

async fn mount_stream(server: &MockServer, lines: &[&str]) {
    let body = lines.iter().map(|l| format!("{l}\n\n")).collect::<String>();
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(server)
        .await;
}

const LINE_A: &str = r#"data: {"choices":[{"delta":{"content":"A"}}]}"#;
const LINE_B: &str = r#"data: {"choices":[{"delta":{"content":"B"}}]}"#;

#[tokio::test]
async fn missing_credential_is_reported_without_network_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = keyless_client(&server);

    let (text, refs) = client.chat("hello").await.into_parts();
    assert!(text.contains("OPENAI_API_KEY"), "got {text}");
    assert!(refs.is_empty());

    let items: Vec<_> = client.chat_stream("hello").await.unwrap().collect().await;
    assert_eq!(items.len(), 1);
    let fragment = items.into_iter().next().unwrap().unwrap();
    assert!(fragment.text.contains("OPENAI_API_KEY"));
    assert!(fragment.references.is_empty());
}

#[tokio::test]
async fn sync_answer_is_first_choice_content() {
    let server = MockServer::start().await;
    mount_body(&server, 200, r#"{"choices":[{"message":{"content":"hello"}}]}"#).await;

    let result = client(&server).chat("hi").await.into_parts();
    assert_eq!(result, ("hello".to_string(), vec![]));
}

#[tokio::test]
async fn sync_provider_error_surfaces_message() {
    let server = MockServer::start().await;
    mount_body(&server, 401, r#"{"error":{"message":"bad key"}}"#).await;

    let result = client(&server).chat("hi").await.into_parts();
    assert_eq!(result, ("API Error: bad key".to_string(), vec![]));
}

#[tokio::test]
async fn sync_non_json_body_is_previewed() {
    let server = MockServer::start().await;
    let long_body = format!("not-json{}", "x".repeat(1000));
    mount_body(&server, 200, &long_body).await;

    let (text, refs) = client(&server).chat("hi").await.into_parts();
    assert!(text.starts_with("⚠️ Non-JSON response:"));
    let expected: String = long_body.chars().take(500).collect();
    assert!(text.ends_with(&expected));
    assert_eq!(text.len(), "⚠️ Non-JSON response: ".len() + 500);
    assert!(refs.is_empty());
}

#[tokio::test]
async fn sync_unexpected_shape_is_described() {
    let server = MockServer::start().await;
    mount_body(&server, 200, r#"{"object":"list"}"#).await;

    let completion = client(&server).chat("hi").await;
    assert!(matches!(completion, Completion::Shape { .. }));
    assert!(completion.to_string().starts_with("Unexpected response:"));
}

#[tokio::test]
async fn streamed_fragments_aggregate_in_order() {
    let server = MockServer::start().await;
    mount_stream(&server, &[LINE_A, LINE_B, "data: [DONE]"]).await;

    let stream = client(&server).chat_stream("hi").await.unwrap();
    let mut updates: Vec<Snapshot> = Vec::new();
    let last = aggregate(stream, |s| updates.push(s.clone())).await.unwrap();

    let seen: Vec<(&str, UpdateState)> = updates.iter().map(|s| (s.text.as_str(), s.state)).collect();
    assert_eq!(
        seen,
        vec![
            ("A", UpdateState::InProgress),
            ("AB", UpdateState::InProgress),
            ("AB", UpdateState::Complete),
        ]
    );
    assert_eq!(last.text, "AB");
    assert_eq!(last.references, "");
    assert!(updates.iter().all(|s| s.references.is_empty()));
}

#[tokio::test]
async fn malformed_line_is_skipped_without_ending_stream() {
    let server = MockServer::start().await;
    mount_stream(
        &server,
        &[LINE_A, "data: {\"choices\": [", ": keep-alive", LINE_B, "data: [DONE]"],
    )
    .await;

    let stream = client(&server).chat_stream("hi").await.unwrap();
    let last = aggregate(stream, |_| {}).await.unwrap();
    assert_eq!(last.text, "AB");
    assert_eq!(last.state, UpdateState::Complete);
}

#[tokio::test]
async fn stream_without_done_marker_ends_at_body_end() {
    let server = MockServer::start().await;
    mount_stream(&server, &[LINE_A, LINE_B]).await;

    let stream = client(&server).chat_stream("hi").await.unwrap();
    let fragments: Vec<Fragment> = stream.map(|f| f.unwrap()).collect().await;
    assert_eq!(fragments, vec![Fragment::new("A"), Fragment::new("B")]);
}

#[tokio::test]
async fn connection_failure_propagates_on_stream_path() {
    // Nothing listens on port 1.
    let config =
        OpenAiConfig::new(ApiKey::Custom("sk-test".to_string())).with_base_url("http://127.0.0.1:1");
    let client = OpenAiClient::new(config).unwrap();

    assert!(matches!(
        client.chat_stream("hi").await,
        Err(LlmError::Network { .. })
    ));
    let completion = client.chat("hi").await;
    assert!(matches!(completion, Completion::Transport { .. }));
    let text = completion.to_string();
    assert_eq!(text.matches("Request failed").count(), 1, "got {text}");
}

#[tokio::test]
async fn slow_provider_times_out_blocking_but_not_streaming() {
    let server = MockServer::start().await;
    let stream_body = format!(
        "{}\n\ndata: [DONE]\n\n",
        r#"data: {"choices":[{"delta":{"content":"late"}}]}"#
    );
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({"stream": true})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(stream_body, "text/event-stream")
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{"choices":[{"message":{"content":"late"}}]}"#)
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let config = OpenAiConfig::new(ApiKey::Custom("sk-test".to_string()))
        .with_base_url(server.uri())
        .with_http_config(HttpClientConfig {
            timeout: Duration::from_millis(50),
        });
    let client = OpenAiClient::new(config).unwrap();

    let stream = client.chat_stream("hi").await.unwrap();
    let last = aggregate(stream, |_| {}).await.unwrap();
    assert_eq!(last.text, "late");
    assert_eq!(last.state, UpdateState::Complete);

    let completion = client.chat("hi").await;
    assert!(
        matches!(completion, Completion::Transport { .. }),
        "got {completion}"
    );
}

#[test]
fn completion_signal_is_idempotent() {
    let mut aggregator = Aggregator::new();
    aggregator.push(Fragment::new("A"));
    aggregator.push(Fragment::new("B"));

    let first = aggregator.finish();
    let second = aggregator.finish();
    assert_eq!(first, second);
    assert_eq!(aggregator.text(), "AB");
    assert!(aggregator.is_complete());
    assert_eq!(first.references, "");
}
