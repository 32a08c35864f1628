use async_trait::async_trait;
use log::{ info, warn };
use reqwest::StatusCode;
use serde::{ Deserialize, Serialize };
use std::error::Error as StdError;
use url::Url;

use super::{ ChatClient, CompletionError, CompletionResponse };
use crate::llm::{ LlmConfig, DEFAULT_BASE_URL };

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
/// Reply used when the service answers successfully but without text.
pub const FALLBACK_REPLY: &str = "Sorry, I couldn't process that request.";
/// Rejection message used when the service gives no reason.
pub const REJECTED_FALLBACK: &str = "Failed to get response from the completion service";

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Deserialize)]
struct GoogleResponse {
    #[serde(default)]
    candidates: Vec<GoogleCandidate>,
    error: Option<GoogleError>,
}

#[derive(Deserialize)]
struct GoogleCandidate {
    content: Option<GoogleContent>,
}

#[derive(Deserialize)]
struct GoogleContent {
    #[serde(default)]
    parts: Vec<GooglePart>,
}

#[derive(Deserialize)]
struct GooglePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct GoogleError {
    message: Option<String>,
}

impl GoogleResponse {
    fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content.as_ref()?
            .parts.first()?
            .text.as_deref()
            .filter(|t| !t.is_empty())
    }

    fn error_message(&self) -> Option<&str> {
        self.error
            .as_ref()?
            .message.as_deref()
            .filter(|m| !m.is_empty())
    }
}

/// Maps a finished HTTP exchange onto the completion contract.
fn interpret_response(status: StatusCode, body: &str) -> Result<CompletionResponse, CompletionError> {
    let parsed: GoogleResponse = serde_json
        ::from_str(body)
        .map_err(|e| CompletionError::TransportError(format!("malformed response body: {}", e)))?;

    if !status.is_success() {
        let message = parsed.error_message().unwrap_or(REJECTED_FALLBACK).to_string();
        return Err(CompletionError::RemoteRejected(message));
    }

    let text = parsed.first_text().unwrap_or(FALLBACK_REPLY).to_string();
    Ok(CompletionResponse { response: text })
}

pub struct GeminiChatClient {
    http: reqwest::Client,
    endpoint: Url,
    model: String,
}

impl GeminiChatClient {
    pub fn new(
        api_key: String,
        model: Option<String>,
        base_url: Option<String>
    ) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let chat_model = model.unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let base = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let mut endpoint = Url::parse(
            &format!("{}/models/{}:generateContent", base.trim_end_matches('/'), chat_model)
        )?;
        endpoint.query_pairs_mut().append_pair("key", &api_key);

        Ok(Self {
            http: reqwest::Client::new(),
            endpoint,
            model: chat_model,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, Box<dyn StdError + Send + Sync>> {
        let api_key = config.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| "An API key (CHAT_API_KEY) is required for GeminiChatClient".to_string())?;

        Self::new(api_key, config.completion_model.clone(), config.base_url.clone())
    }
}

#[async_trait]
impl ChatClient for GeminiChatClient {
    async fn complete(&self, prompt: &str) -> Result<CompletionResponse, CompletionError> {
        info!(
            "GeminiChatClient::complete() → model={} prompt_chars={}",
            self.model,
            prompt.chars().count()
        );
        let payload = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
        };

        let resp = self.http
            .post(self.endpoint.clone())
            .json(&payload)
            .send().await
            .map_err(|e| CompletionError::TransportError(e.to_string()))?;
        let status = resp.status();
        let body = resp
            .text().await
            .map_err(|e| CompletionError::TransportError(e.to_string()))?;

        let result = interpret_response(status, &body);
        if let Err(e) = &result {
            warn!("GeminiChatClient::complete() failed with status {}: {}", status, e);
        }
        result
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{ Path, Query };
    use axum::http::StatusCode as AxumStatus;
    use axum::routing::post;
    use axum::{ Json, Router };
    use serde_json::{ json, Value };
    use std::collections::HashMap;

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn echo(
        Path(call): Path<String>,
        Query(query): Query<HashMap<String, String>>,
        Json(body): Json<Value>
    ) -> Json<Value> {
        let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap_or("").to_string();
        let reply = format!(
            "{}|{}|{}|{}",
            call,
            query.get("key").cloned().unwrap_or_default(),
            body["contents"].as_array().map(|c| c.len()).unwrap_or(0),
            prompt
        );
        Json(json!({ "candidates": [{ "content": { "parts": [{ "text": reply }] } }] }))
    }

    async fn reject() -> (AxumStatus, Json<Value>) {
        (AxumStatus::BAD_REQUEST, Json(json!({ "error": { "message": "API key not valid" } })))
    }

    #[test]
    fn test_extracts_first_candidate_text() {
        let body =
            r#"{"candidates":[{"content":{"parts":[{"text":"Hi!"},{"text":"ignored"}]}},{"content":{"parts":[{"text":"second"}]}}]}"#;
        let resp = interpret_response(StatusCode::OK, body).unwrap();
        assert_eq!(resp.response, "Hi!");
    }

    #[test]
    fn test_missing_or_empty_text_uses_fallback() {
        for body in [
            r#"{}"#,
            r#"{"candidates":[]}"#,
            r#"{"candidates":[{}]}"#,
            r#"{"candidates":[{"content":{"parts":[]}}]}"#,
            r#"{"candidates":[{"content":{"parts":[{"text":""}]}}]}"#,
        ] {
            let resp = interpret_response(StatusCode::OK, body).unwrap();
            assert_eq!(resp.response, FALLBACK_REPLY, "body: {}", body);
        }
    }

    #[test]
    fn test_error_status_carries_service_message() {
        let err = interpret_response(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error":{"code":429,"message":"Quota exceeded"}}"#
        ).unwrap_err();
        assert_eq!(err, CompletionError::RemoteRejected("Quota exceeded".to_string()));
    }

    #[test]
    fn test_error_status_without_message_uses_generic_label() {
        for body in [r#"{"error":{}}"#, r#"{"error":{"message":""}}"#, r#"{}"#] {
            let err = interpret_response(StatusCode::BAD_GATEWAY, body).unwrap_err();
            assert_eq!(err, CompletionError::RemoteRejected(REJECTED_FALLBACK.to_string()));
        }
    }

    #[test]
    fn test_error_status_with_unreadable_body_is_transport_error() {
        for body in ["", "<html>bad gateway</html>"] {
            let err = interpret_response(StatusCode::BAD_GATEWAY, body).unwrap_err();
            assert!(matches!(err, CompletionError::TransportError(_)), "body: {}", body);
        }
    }

    #[test]
    fn test_whitespace_service_message_is_kept() {
        let err = interpret_response(
            StatusCode::BAD_REQUEST,
            r#"{"error":{"message":"  "}}"#
        ).unwrap_err();
        assert_eq!(err, CompletionError::RemoteRejected("  ".to_string()));
    }

    #[test]
    fn test_malformed_success_body_is_transport_error() {
        let err = interpret_response(StatusCode::OK, "not json").unwrap_err();
        assert!(matches!(err, CompletionError::TransportError(_)));
    }

    #[test]
    fn test_from_config_requires_api_key() {
        let config = LlmConfig::default();
        assert!(GeminiChatClient::from_config(&config).is_err());
        let config = LlmConfig { api_key: Some(String::new()), ..LlmConfig::default() };
        assert!(GeminiChatClient::from_config(&config).is_err());
    }

    #[test]
    fn test_endpoint_embeds_model_and_encoded_key() {
        let client = GeminiChatClient::new(
            "a b&c".to_string(),
            Some("gemini-test".to_string()),
            Some("https://example.com/v1beta/".to_string())
        ).unwrap();
        assert_eq!(
            client.endpoint.as_str(),
            "https://example.com/v1beta/models/gemini-test:generateContent?key=a+b%26c"
        );
        assert_eq!(client.get_model(), "gemini-test");
    }

    #[tokio::test]
    async fn test_complete_round_trip_against_local_server() {
        let base = serve(Router::new().route("/models/{call}", post(echo))).await;
        let client = GeminiChatClient::new(
            "secret".to_string(),
            Some("gemini-test".to_string()),
            Some(base)
        ).unwrap();

        let resp = client.complete("Hello world").await.unwrap();
        assert_eq!(resp.response, "gemini-test:generateContent|secret|1|Hello world");
    }

    #[tokio::test]
    async fn test_complete_surfaces_rejection() {
        let base = serve(Router::new().route("/models/{call}", post(reject))).await;
        let client = GeminiChatClient::new("bad".to_string(), None, Some(base)).unwrap();

        let err = client.complete("Hello").await.unwrap_err();
        assert_eq!(err, CompletionError::RemoteRejected("API key not valid".to_string()));
    }

    #[tokio::test]
    async fn test_complete_surfaces_connection_failure() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = GeminiChatClient::new(
            "key".to_string(),
            None,
            Some(format!("http://{}", addr))
        ).unwrap();
        let err = client.complete("Hello").await.unwrap_err();
        assert!(matches!(err, CompletionError::TransportError(_)));
    }
}
