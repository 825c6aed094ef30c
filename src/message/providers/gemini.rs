//! Gemini (Google) text generation backend.

use crate::error::{parse_retry_after, sanitize_error_message, CardError, Result};
use crate::message::provider::{ContentRequest, MessageModel};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Builder for [`GeminiClient`].
#[derive(Debug, Clone, Default)]
pub struct GeminiClientBuilder {
    base_url: Option<String>,
    client: Option<reqwest::Client>,
}

impl GeminiClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the API base URL (useful for proxies).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Uses an existing HTTP client.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    /// Builds the client.
    pub fn build(self) -> GeminiClient {
        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        GeminiClient {
            client: self.client.unwrap_or_default(),
            base_url,
        }
    }
}

/// Gemini `generateContent` client.
///
/// The API key is supplied per call, so one client can serve any
/// credentials.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
}

impl Default for GeminiClient {
    fn default() -> Self {
        GeminiClientBuilder::new().build()
    }
}

impl GeminiClient {
    /// Creates a new `GeminiClientBuilder`.
    pub fn builder() -> GeminiClientBuilder {
        GeminiClientBuilder::new()
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }

    async fn generate_impl(
        &self,
        api_key: &str,
        model: &str,
        request: &ContentRequest,
    ) -> Result<String> {
        let body = GeminiRequest::from_content_request(request);

        let response = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let text = response.text().await.unwrap_or_default();
            return Err(classify_error(model, status.as_u16(), &text, &headers));
        }

        let gemini_response: GeminiResponse = response.json().await?;
        gemini_response.into_text()
    }
}

#[async_trait]
impl MessageModel for GeminiClient {
    async fn generate_content(
        &self,
        api_key: &str,
        model: &str,
        request: &ContentRequest,
    ) -> Result<String> {
        self.generate_impl(api_key, model, request).await
    }

    fn name(&self) -> &str {
        "Gemini (Google)"
    }
}

/// Maps a non-success Gemini response onto the error taxonomy.
///
/// An unknown model is reported either as HTTP 404 or with
/// `error.status == "NOT_FOUND"`; both become [`CardError::ModelNotFound`].
fn classify_error(
    model: &str,
    status: u16,
    text: &str,
    headers: &reqwest::header::HeaderMap,
) -> CardError {
    let parsed: Option<GeminiErrorBody> = serde_json::from_str(text).ok();
    let upstream_status = parsed.as_ref().and_then(|b| b.error.status.clone());
    let message = parsed
        .and_then(|b| b.error.message)
        .map(|m| sanitize_error_message(&m))
        .unwrap_or_else(|| sanitize_error_message(text));

    if status == 404 || upstream_status.as_deref() == Some("NOT_FOUND") {
        return CardError::ModelNotFound {
            model: model.to_string(),
            message,
        };
    }
    if status == 429 {
        let retry_after = parse_retry_after(headers).map(std::time::Duration::from_secs);
        return CardError::RateLimited { retry_after };
    }
    if status == 401 || status == 403 {
        return CardError::Auth(message);
    }
    CardError::Api { status, message }
}

// Request/Response types
#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiRequestPart>,
}

/// A part in a Gemini request - can be text or inline image data.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum GeminiRequestPart {
    Text { text: String },
    InlineData { inline_data: GeminiInlineData },
}

#[derive(Debug, Serialize)]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

impl GeminiRequest {
    fn from_content_request(req: &ContentRequest) -> Self {
        Self {
            contents: vec![GeminiContent {
                parts: vec![
                    GeminiRequestPart::Text {
                        text: req.prompt.clone(),
                    },
                    GeminiRequestPart::InlineData {
                        inline_data: GeminiInlineData {
                            mime_type: req.mime_type.clone(),
                            data: req.image_base64.clone(),
                        },
                    },
                ],
            }],
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContentResponse>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
    #[serde(default)]
    block_reason_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResponse {
    #[serde(default)]
    parts: Vec<GeminiPartResponse>,
}

#[derive(Debug, Deserialize)]
struct GeminiPartResponse {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    error: GeminiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

impl GeminiResponse {
    fn into_text(self) -> Result<String> {
        // Blocks on the prompt itself still come back as HTTP 200
        if let Some(ref feedback) = self.prompt_feedback {
            if let Some(ref reason) = feedback.block_reason {
                let msg = feedback
                    .block_reason_message
                    .clone()
                    .unwrap_or_else(|| format!("Prompt blocked: {}", reason));
                return Err(CardError::ContentBlocked(msg));
            }
        }

        let candidate = self.candidates.into_iter().next().ok_or_else(|| {
            CardError::UnexpectedResponse("No candidates in Gemini response".into())
        })?;

        if let Some(ref finish_reason) = candidate.finish_reason {
            match finish_reason.as_str() {
                "SAFETY" | "RECITATION" | "PROHIBITED_CONTENT" | "BLOCKLIST" | "SPII" => {
                    return Err(CardError::ContentBlocked(format!(
                        "Content blocked by Gemini safety filter: {}",
                        finish_reason
                    )));
                }
                _ => {} // STOP, MAX_TOKENS, etc. are normal
            }
        }

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        let text = text.trim();
        if text.is_empty() {
            return Err(CardError::UnexpectedResponse(
                "No text in Gemini response".into(),
            ));
        }
        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::UploadedImage;
    use crate::message::testing::photo;
    use crate::message::{MessageGenerator, DEFAULT_FALLBACK_MODEL, DEFAULT_PRIMARY_MODEL};
    use crate::stub_server::StubServer;

    fn request() -> ContentRequest {
        let image = UploadedImage::new(vec![0xFF, 0xD8, 0xFF], "image/jpeg");
        ContentRequest::new("Write a greeting", &image)
    }

    #[test]
    fn test_builder_defaults() {
        let client = GeminiClient::builder().build();
        assert_eq!(
            client.endpoint("gemini-2.5-flash"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_builder_base_url_trailing_slash() {
        let client = GeminiClient::builder()
            .base_url("http://localhost:8080/")
            .build();
        assert_eq!(
            client.endpoint("m"),
            "http://localhost:8080/v1beta/models/m:generateContent"
        );
    }

    #[test]
    fn test_request_serialization() {
        let body = GeminiRequest::from_content_request(&request());
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "contents": [{
                    "parts": [
                        { "text": "Write a greeting" },
                        { "inline_data": { "mime_type": "image/jpeg", "data": "/9j/" } }
                    ]
                }]
            })
        );
    }

    #[test]
    fn test_response_text_is_joined_and_trimmed() {
        let json = r#"{
            "candidates": [{
                "content": {
                    "parts": [{ "text": "Merry Christmas! " }, { "text": "Stay cozy.\n" }]
                },
                "finishReason": "STOP"
            }]
        }"#;
        let resp: GeminiResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.into_text().unwrap(), "Merry Christmas! Stay cozy.");
    }

    #[test]
    fn test_response_without_text() {
        let json = r#"{ "candidates": [{ "content": { "parts": [{}] } }] }"#;
        let resp: GeminiResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(
            resp.into_text(),
            Err(CardError::UnexpectedResponse(_))
        ));

        let resp: GeminiResponse = serde_json::from_str("{}").unwrap();
        assert!(matches!(
            resp.into_text(),
            Err(CardError::UnexpectedResponse(_))
        ));
    }

    #[test]
    fn test_response_with_prompt_feedback_block() {
        let json = r#"{
            "candidates": [],
            "promptFeedback": {
                "blockReason": "SAFETY",
                "blockReasonMessage": "Prompt was blocked due to safety"
            }
        }"#;
        let resp: GeminiResponse = serde_json::from_str(json).unwrap();
        match resp.into_text() {
            Err(CardError::ContentBlocked(msg)) => {
                assert_eq!(msg, "Prompt was blocked due to safety")
            }
            other => panic!("expected ContentBlocked, got {other:?}"),
        }
    }

    #[test]
    fn test_response_safety_finish_reason() {
        let json = r#"{ "candidates": [{ "finishReason": "SAFETY" }] }"#;
        let resp: GeminiResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(resp.into_text(), Err(CardError::ContentBlocked(_))));
    }

    #[test]
    fn test_classify_404_as_model_not_found() {
        let body = r#"{
            "error": {
                "code": 404,
                "message": "models/gemini-2.5-flash is not found for API version v1beta",
                "status": "NOT_FOUND"
            }
        }"#;
        let err = classify_error("gemini-2.5-flash", 404, body, &Default::default());
        match err {
            CardError::ModelNotFound { model, message } => {
                assert_eq!(model, "gemini-2.5-flash");
                assert!(message.starts_with("models/gemini-2.5-flash is not found"));
            }
            other => panic!("expected ModelNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_classify_not_found_status_field() {
        let body =
            r#"{ "error": { "code": 400, "message": "unknown model", "status": "NOT_FOUND" } }"#;
        let err = classify_error("m", 400, body, &Default::default());
        assert!(err.is_model_not_found());
    }

    #[test]
    fn test_classify_other_statuses() {
        let body = r#"{
            "error": { "code": 403, "message": "API key not valid", "status": "PERMISSION_DENIED" }
        }"#;
        let err = classify_error("m", 403, body, &Default::default());
        assert!(matches!(err, CardError::Auth(ref m) if m == "API key not valid"));

        let err = classify_error("m", 429, "", &Default::default());
        assert!(matches!(err, CardError::RateLimited { retry_after: None }));

        // A body mentioning "not found" is not enough on its own.
        let err = classify_error("m", 500, "upstream not found", &Default::default());
        match err {
            CardError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "upstream not found");
            }
            other => panic!("expected Api, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_http_404_is_model_not_found() {
        let server = StubServer::start(vec![(404, "Not Found")]).await;
        let client = GeminiClient::builder().base_url(server.url()).build();

        let err = client
            .generate_content("gemini-key", "gemini-9-flash", &request())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CardError::ModelNotFound { ref model, .. } if model == "gemini-9-flash"
        ));

        let requests = server.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "POST");
        assert_eq!(requests[0].path, "/v1beta/models/gemini-9-flash:generateContent");
        assert_eq!(requests[0].header("x-goog-api-key"), Some("gemini-key"));
    }

    #[tokio::test]
    async fn test_unknown_primary_model_falls_back_once() {
        let server = StubServer::start(vec![
            (
                404,
                r#"{"error":{"code":404,"message":"model not found","status":"NOT_FOUND"}}"#,
            ),
            (
                200,
                r#"{"candidates":[{"content":{"parts":[{"text":"Merry Christmas!"}]}}]}"#,
            ),
        ])
        .await;
        let client = GeminiClient::builder().base_url(server.url()).build();
        let generator = MessageGenerator::new(client);

        let text = generator
            .generate("gemini-key", &photo(), Some("mention the snow"))
            .await
            .unwrap();
        assert_eq!(text, "Merry Christmas!");

        let requests = server.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(
            requests[0].path,
            format!("/v1beta/models/{DEFAULT_PRIMARY_MODEL}:generateContent")
        );
        assert_eq!(
            requests[1].path,
            format!("/v1beta/models/{DEFAULT_FALLBACK_MODEL}:generateContent")
        );
        for request in &requests {
            assert_eq!(request.header("x-goog-api-key"), Some("gemini-key"));
            assert_eq!(request.header("content-type"), Some("application/json"));
        }

        let body = requests[0].json();
        assert_eq!(body, requests[1].json());
        let parts = &body["contents"][0]["parts"];
        assert!(parts[0]["text"].as_str().unwrap().contains("mention the snow"));
        assert_eq!(parts[1]["inline_data"]["mime_type"], "image/jpeg");
        assert_eq!(parts[1]["inline_data"]["data"], photo().to_base64());
    }
}
