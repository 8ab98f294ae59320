//! services/studio/src/adapters/gemini.rs
//!
//! This module contains the adapter for the Google Generative Language API.
//! One struct implements the `ImageGenerationService`, `ProductSuggestionService`,
//! and `ChatAssistantService` ports from the `core` crate over plain REST
//! (`generateContent`), so the whole model boundary shares a single HTTP client
//! and a single set of credentials.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use design_consultant_core::domain::{Intent, RoomImage, ShoppingItem};
use design_consultant_core::ports::{
    ChatAssistantService, GatewayError, GatewayResult, ImageGenerationService,
    ProductSuggestionService,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

/// Prompt template for structured product suggestions.
const SUGGESTION_PROMPT: &str = "Based on the following request, suggest 3 fictional but \
    realistic-looking products with a name, a short description, and a fake URL for an \
    online store. Request: \"{request}\"";

/// Prompt template for the single-word intent classifier.
const CLASSIFY_PROMPT: &str = "Classify the user's intent. Is it a 'visual' request to \
    change the image, a 'shopping' request for product ideas, or a 'general' question? \
    Respond with only one word. User prompt: \"{prompt}\"";

/// Longest error-body excerpt carried into a user-facing message.
const ERROR_BODY_LIMIT: usize = 300;

//=========================================================================================
// The Adapter
//=========================================================================================

/// An adapter that speaks the Gemini REST API. Image operations go to the
/// image-capable model, text operations (classification, suggestions, replies)
/// to the text model.
#[derive(Clone)]
pub struct GeminiGateway {
    client: reqwest::Client,
    api_key: Option<String>,
    api_base: String,
    image_model: String,
    text_model: String,
}

impl GeminiGateway {
    /// Creates a new `GeminiGateway`. A missing API key is accepted here and
    /// reported as a configuration error on the first call instead.
    pub fn new(
        client: reqwest::Client,
        api_key: Option<String>,
        api_base: String,
        image_model: String,
        text_model: String,
    ) -> Self {
        Self {
            client,
            api_key,
            api_base,
            image_model,
            text_model,
        }
    }

    fn api_key(&self) -> GatewayResult<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| GatewayError::Configuration("GEMINI_API_KEY is not set".to_string()))
    }

    /// POSTs one `generateContent` request. Transport and API failures come
    /// back as a plain human-readable message for the caller to wrap in the
    /// operation-specific error variant.
    async fn send_request(
        &self,
        api_key: &str,
        model: &str,
        body: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, String> {
        let url = format!(
            "{}/{model}:generateContent?key={api_key}",
            self.api_base,
            model = model,
            api_key = api_key
        );

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|err| format!("request failed: {err}"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "failed to read the error body".to_string());
            return Err(format_api_error(status, &body_text));
        }

        response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|err| format!("unexpected response: {err}"))
    }
}

//=========================================================================================
// Port Implementations
//=========================================================================================

#[async_trait]
impl ImageGenerationService for GeminiGateway {
    async fn edit_image(&self, base: &RoomImage, instruction: &str) -> GatewayResult<RoomImage> {
        let api_key = self.api_key()?;
        let request = image_request(edit_parts(base, instruction));
        let response = self
            .send_request(api_key, &self.image_model, &request)
            .await
            .map_err(GatewayError::GenerationFailed)?;

        extract_image(response).ok_or_else(no_image_error)
    }

    async fn generate_from_text(&self, description: &str) -> GatewayResult<RoomImage> {
        let api_key = self.api_key()?;
        let request = image_request(vec![Part::Text {
            text: description.to_string(),
        }]);
        let response = self
            .send_request(api_key, &self.image_model, &request)
            .await
            .map_err(GatewayError::GenerationFailed)?;

        extract_image(response).ok_or_else(no_image_error)
    }
}

#[async_trait]
impl ProductSuggestionService for GeminiGateway {
    async fn suggest_products(&self, request: &str) -> GatewayResult<Vec<ShoppingItem>> {
        let api_key = self.api_key()?;
        let prompt = SUGGESTION_PROMPT.replace("{request}", request);
        let body = suggestion_request(&prompt);
        let response = self
            .send_request(api_key, &self.text_model, &body)
            .await
            .map_err(GatewayError::SuggestionFailed)?;

        let payload = extract_text(response).ok_or_else(|| {
            GatewayError::SuggestionFailed("the model returned no structured output".to_string())
        })?;
        serde_json::from_str::<Vec<ShoppingItem>>(payload.trim())
            .map_err(|err| GatewayError::SuggestionFailed(format!("malformed product data: {err}")))
    }
}

#[async_trait]
impl ChatAssistantService for GeminiGateway {
    async fn classify_intent(&self, text: &str) -> GatewayResult<Intent> {
        let api_key = self.api_key()?;
        let prompt = CLASSIFY_PROMPT.replace("{prompt}", text);
        let response = self
            .send_request(api_key, &self.text_model, &text_request(&prompt))
            .await
            .map_err(GatewayError::ChatFailed)?;

        let label = extract_text(response).unwrap_or_default();
        debug!("Classifier replied '{}'", label.trim());
        Ok(intent_from_label(&label))
    }

    async fn general_reply(&self, text: &str) -> GatewayResult<String> {
        let api_key = self.api_key()?;
        let response = self
            .send_request(api_key, &self.text_model, &text_request(text))
            .await
            .map_err(GatewayError::ChatFailed)?;

        extract_text(response)
            .ok_or_else(|| GatewayError::ChatFailed("the model returned an empty reply".to_string()))
    }
}

//=========================================================================================
// Request Builders
//=========================================================================================

fn user_contents(parts: Vec<Part>) -> Vec<Content> {
    vec![Content {
        role: "user".to_string(),
        parts,
    }]
}

/// Plain text request, no generation config.
fn text_request(prompt: &str) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: user_contents(vec![Part::Text {
            text: prompt.to_string(),
        }]),
        generation_config: None,
    }
}

/// Request whose response must be an image.
fn image_request(parts: Vec<Part>) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: user_contents(parts),
        generation_config: Some(GenerationConfig {
            response_modalities: Some(vec!["IMAGE".to_string()]),
            response_mime_type: None,
            response_schema: None,
        }),
    }
}

/// The base image followed by the edit instruction, in that order.
fn edit_parts(base: &RoomImage, instruction: &str) -> Vec<Part> {
    vec![
        Part::InlineData {
            inline_data: InlineData {
                mime_type: base.media_type.clone(),
                data: BASE64_STANDARD.encode(&base.data),
            },
        },
        Part::Text {
            text: instruction.to_string(),
        },
    ]
}

/// Request constrained to the product-suggestion JSON schema.
fn suggestion_request(prompt: &str) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: user_contents(vec![Part::Text {
            text: prompt.to_string(),
        }]),
        generation_config: Some(GenerationConfig {
            response_modalities: None,
            response_mime_type: Some("application/json".to_string()),
            response_schema: Some(suggestion_schema()),
        }),
    }
}

/// Schema the suggestion response must satisfy: an array of products with
/// required name/description/url strings.
fn suggestion_schema() -> serde_json::Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "name": {
                    "type": "STRING",
                    "description": "The name of the product.",
                },
                "description": {
                    "type": "STRING",
                    "description": "A brief, compelling description of the product.",
                },
                "url": {
                    "type": "STRING",
                    "description": "A fictional but realistic-looking URL to a product page.",
                },
            },
            "required": ["name", "description", "url"],
        },
    })
}

//=========================================================================================
// Response Handling
//=========================================================================================

fn no_image_error() -> GatewayError {
    GatewayError::GenerationFailed(
        "the model returned no image content; it may have refused the prompt".to_string(),
    )
}

/// Pulls the first decodable inline image out of the response candidates.
fn extract_image(response: GenerateContentResponse) -> Option<RoomImage> {
    for candidate in response.candidates.unwrap_or_default() {
        let parts = candidate
            .content
            .and_then(|content| content.parts)
            .unwrap_or_default();
        for part in parts {
            if let Some(inline) = part.inline_data {
                if let Ok(data) = BASE64_STANDARD.decode(inline.data.as_bytes()) {
                    let media_type = inline.mime_type.unwrap_or_else(|| "image/png".to_string());
                    return Some(RoomImage::new(data, media_type));
                }
            }
        }
    }
    None
}

/// Concatenates the text parts of the first candidate.
fn extract_text(response: GenerateContentResponse) -> Option<String> {
    let candidate = response.candidates.unwrap_or_default().into_iter().next()?;
    let parts = candidate.content?.parts?;
    let fragments: Vec<String> = parts.into_iter().filter_map(|part| part.text).collect();
    if fragments.is_empty() {
        None
    } else {
        Some(fragments.concat())
    }
}

/// Maps the classifier's reply onto an `Intent` by substring match, so minor
/// decoration ("Visual.", "it is visual") still lands on the right path.
/// Anything unrecognized falls back to `General`.
fn intent_from_label(label: &str) -> Intent {
    let normalized = label.trim().to_lowercase();
    if normalized.contains("visual") {
        Intent::Visual
    } else if normalized.contains("shopping") {
        Intent::Shopping
    } else {
        Intent::General
    }
}

/// Flattens an API error body into one line, preferring the structured
/// `status: message` form when the body parses.
fn format_api_error(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorWrapper>(body) {
        Ok(wrapper) => {
            let message = wrapper
                .error
                .message
                .unwrap_or_else(|| truncate_chars(body, ERROR_BODY_LIMIT));
            match wrapper.error.status {
                Some(code) if !code.is_empty() => format!("{code}: {message}"),
                _ => message,
            }
        }
        Err(_) => format!("HTTP {status}: {}", truncate_chars(body, ERROR_BODY_LIMIT)),
    }
}

fn truncate_chars(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        text.to_string()
    } else {
        let mut excerpt: String = text.chars().take(limit).collect();
        excerpt.push_str("...");
        excerpt
    }
}

//=========================================================================================
// Wire Types (generateContent)
//=========================================================================================

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    // Absent when generation stopped before producing anything (e.g. safety).
    parts: Option<Vec<ResponsePart>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    text: Option<String>,
    inline_data: Option<InlineDataResponse>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineDataResponse {
    mime_type: Option<String>,
    data: String,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}
