//! Integration tests for the HTTP gateway
//!
//! Drives the full router against a wiremock ChatKit upstream: request
//! translation, streamed and aggregated responses, and error mapping.

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::{Mock, MockServer, ResponseTemplate, matchers};

use ossgate::config::Config;
use ossgate::proxy::{AppState, create_router};

// =============================================================================
// Test Fixtures
// =============================================================================

/// ChatKit body with reasoning, two deltas, a thread id and a finish event
fn upstream_sse() -> String {
    [
        r#"data: {"type":"thread.created","thread":{"id":"thr_abc"}}"#,
        r#"data: {"type":"thread.item_updated","update":{"type":"cot.entry_added","entry":{"content":"Thinking about it"}}}"#,
        r#"data: {"type":"thread.item_updated","update":{"type":"cot.entry_added","entry":{"content":"done"}}}"#,
        r#"data: {"type":"assistant_message.content_part.text_delta","delta":"Hello"}"#,
        r#"data: {"type":"assistant_message.content_part.text_delta","delta":" world"}"#,
        r#"data: {"type":"thread.item_done","item":{"type":"assistant_message"}}"#,
        "data: [DONE]",
    ]
    .iter()
    .map(|line| format!("{line}\n\n"))
    .collect()
}

fn create_test_app(upstream_url: &str, drain_after_finish: bool) -> Router {
    let mut config = Config::default();
    config.upstream.url = upstream_url.to_string();
    config.upstream.drain_after_finish = drain_after_finish;
    create_router(Arc::new(AppState::new(config).unwrap()))
}

async fn mount_upstream(server: &MockServer, body: String) {
    Mock::given(matchers::method("POST"))
        .and(matchers::path("/chatkit"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(server)
        .await;
}

fn chat_request(body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/v1/chat/completions")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

// =============================================================================
// Non-streaming Tests
// =============================================================================

mod completion_tests {
    use super::*;

    #[tokio::test]
    async fn test_aggregated_completion() {
        let server = MockServer::start().await;
        mount_upstream(&server, upstream_sse()).await;
        let app = create_test_app(&format!("{}/chatkit", server.uri()), false);

        let response = app
            .oneshot(chat_request(json!({
                "model": "gpt-oss-20b",
                "messages": [{"role": "user", "content": "Hi"}]
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");

        let json: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json["object"], "chat.completion");
        assert_eq!(json["model"], "gpt-oss-20b");
        assert!(json["id"].as_str().unwrap().starts_with("chatcmpl_"));
        assert_eq!(json["choices"][0]["message"]["role"], "assistant");
        assert_eq!(json["choices"][0]["message"]["content"], "Hello world");
        assert_eq!(json["choices"][0]["finish_reason"], "stop");
        assert!(json["usage"]["total_tokens"].is_null());

        let fingerprint: Value =
            serde_json::from_str(json["system_fingerprint"].as_str().unwrap()).unwrap();
        assert_eq!(fingerprint["gptoss_thread_id"], "thr_abc");
        assert_eq!(fingerprint["reasoning_joined"], "Thinking about it");
    }

    #[tokio::test]
    async fn test_default_model_is_used_when_absent() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::header("x-selected-model", "gpt-oss-120b"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(upstream_sse(), "text/event-stream"),
            )
            .expect(1)
            .mount(&server)
            .await;
        let app = create_test_app(&format!("{}/chatkit", server.uri()), false);

        let response = app
            .oneshot(chat_request(json!({"messages": [{"role": "user", "content": "Hi"}]})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json["model"], "gpt-oss-120b");
    }

    #[tokio::test]
    async fn test_upstream_error_status_maps_to_bad_gateway() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;
        let app = create_test_app(&format!("{}/chatkit", server.uri()), false);

        let response = app
            .oneshot(chat_request(json!({"messages": [{"role": "user", "content": "Hi"}]})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
        let json: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json, json!({"error": "Upstream 500"}));
    }

    #[tokio::test]
    async fn test_unsupported_model_never_reaches_upstream() {
        let server = MockServer::start().await;
        Mock::given(matchers::any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let app = create_test_app(&format!("{}/chatkit", server.uri()), false);

        let response = app
            .oneshot(chat_request(json!({"model": "gpt-4o", "messages": []})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json: Value = serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(json["error"]["message"], "Unsupported model: gpt-4o");
        assert_eq!(json["error"]["supported"], json!(["gpt-oss-120b", "gpt-oss-20b"]));
    }

    #[tokio::test]
    async fn test_non_json_body_uses_defaults() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::body_partial_json(json!({
                "op": "threads.create",
                "params": {"input": {"text": ""}}
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(upstream_sse(), "text/event-stream"),
            )
            .expect(1)
            .mount(&server)
            .await;
        let app = create_test_app(&format!("{}/chatkit", server.uri()), false);

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/v1/chat/completions")
                    .body(Body::from("not json at all"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}

// =============================================================================
// Streaming Tests
// =============================================================================

mod streaming_tests {
    use super::*;

    fn data_payloads(body: &str) -> Vec<String> {
        body.split("\n\n")
            .filter(|frame| !frame.is_empty())
            .map(|frame| frame.strip_prefix("data: ").unwrap().to_string())
            .collect()
    }

    async fn streamed(drain_after_finish: bool) -> (StatusCode, axum::http::HeaderMap, String) {
        let server = MockServer::start().await;
        mount_upstream(&server, upstream_sse()).await;
        let app = create_test_app(&format!("{}/chatkit", server.uri()), drain_after_finish);

        let response = app
            .oneshot(chat_request(json!({
                "model": "gpt-oss-120b",
                "stream": true,
                "messages": [{"role": "user", "content": "Hi"}]
            })))
            .await
            .unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        (status, headers, body_string(response).await)
    }

    #[tokio::test]
    async fn test_streamed_response_headers() {
        let (status, headers, _) = streamed(false).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers["content-type"], "text/event-stream; charset=utf-8");
        assert_eq!(headers["cache-control"], "no-cache, no-transform");
        assert_eq!(headers["x-accel-buffering"], "no");
        assert_eq!(headers["access-control-allow-origin"], "*");
    }

    #[tokio::test]
    async fn test_streamed_chunks() {
        let (_, _, body) = streamed(false).await;
        let payloads = data_payloads(&body);

        assert_eq!(payloads.len(), 6);
        let chunks: Vec<Value> = payloads[..5]
            .iter()
            .map(|p| serde_json::from_str(p).unwrap())
            .collect();
        assert_eq!(chunks[0]["choices"][0]["delta"], json!({}));
        assert_eq!(
            chunks[1]["choices"][0]["delta"],
            json!({"reasoning_content": "Thinking about it"})
        );
        assert_eq!(chunks[2]["choices"][0]["delta"], json!({"content": "Hello"}));
        assert_eq!(chunks[3]["choices"][0]["delta"], json!({"content": " world"}));
        assert_eq!(chunks[4]["choices"][0]["finish_reason"], "stop");
        assert_eq!(payloads[5], "[DONE]");
    }

    #[tokio::test]
    async fn test_drain_setting_does_not_change_output() {
        let strip_ids = |body: &str| -> Vec<Value> {
            data_payloads(body)
                .iter()
                .map(|p| match serde_json::from_str::<Value>(p) {
                    Ok(chunk) => chunk["choices"].clone(),
                    Err(_) => Value::String(p.clone()),
                })
                .collect()
        };

        let (_, _, closed) = streamed(false).await;
        let (_, _, drained) = streamed(true).await;

        assert_eq!(strip_ids(&closed), strip_ids(&drained));
    }
}

// =============================================================================
// Upstream Request Tests
// =============================================================================

mod upstream_request_tests {
    use super::*;

    #[tokio::test]
    async fn test_new_thread_request() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::path("/chatkit"))
            .and(matchers::header("x-selected-model", "gpt-oss-20b"))
            .and(matchers::header("x-reasoning-effort", "medium"))
            .and(matchers::header("x-show-reasoning", "true"))
            .and(matchers::body_json(json!({
                "op": "threads.create",
                "params": {
                    "input": {
                        "text": "second question",
                        "content": [{"type": "input_text", "text": "second question"}],
                        "quoted_text": "",
                        "attachments": []
                    },
                    "threadId": null
                }
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(upstream_sse(), "text/event-stream"),
            )
            .expect(1)
            .mount(&server)
            .await;
        let app = create_test_app(&format!("{}/chatkit", server.uri()), false);

        let response = app
            .oneshot(chat_request(json!({
                "model": "gpt-oss-20b",
                "messages": [
                    {"role": "user", "content": "first question"},
                    {"role": "assistant", "content": "an answer"},
                    {"role": "user", "content": "second question"}
                ]
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_thread_continuation_and_options_from_headers() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::header("x-reasoning-effort", "high"))
            .and(matchers::header("x-show-reasoning", "false"))
            .and(matchers::header("cookie", "user_id=usr_42"))
            .and(matchers::body_partial_json(json!({
                "op": "threads.addMessage",
                "params": {"threadId": "thr_prev"}
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(upstream_sse(), "text/event-stream"),
            )
            .expect(1)
            .mount(&server)
            .await;
        let app = create_test_app(&format!("{}/chatkit", server.uri()), false);

        let request = Request::builder()
            .method(Method::POST)
            .uri("/v1/chat/completions")
            .header("x-reasoning-effort", "HIGH")
            .header("x-show-reasoning", "no")
            .header("x-gptoss-thread-id", "thr_prev")
            .header("x-gptoss-user-id", "usr_42")
            .body(Body::from(
                json!({"messages": [{"role": "user", "content": "again"}]}).to_string(),
            ))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_options_from_metadata() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::header("x-reasoning-effort", "low"))
            .and(matchers::header("x-show-reasoning", "false"))
            .and(matchers::body_partial_json(json!({
                "op": "threads.addMessage",
                "params": {"threadId": "thr_meta"}
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(upstream_sse(), "text/event-stream"),
            )
            .expect(1)
            .mount(&server)
            .await;
        let app = create_test_app(&format!("{}/chatkit", server.uri()), false);

        let response = app
            .oneshot(chat_request(json!({
                "messages": [{"role": "user", "content": "hello"}],
                "metadata": {
                    "reasoning_effort": "low",
                    "show_reasoning": false,
                    "gptoss_thread_id": "thr_meta"
                }
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_configured_base_headers_are_sent() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .and(matchers::header("x-custom-client", "ossgate-test"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(upstream_sse(), "text/event-stream"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let mut config = Config::default();
        config.upstream.url = format!("{}/chatkit", server.uri());
        config
            .upstream
            .headers
            .insert("x-custom-client".to_string(), "ossgate-test".to_string());
        let app = create_router(Arc::new(AppState::new(config).unwrap()));

        let response = app
            .oneshot(chat_request(json!({"messages": []})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
