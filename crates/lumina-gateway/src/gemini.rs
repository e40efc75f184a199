//! Google Gemini gateway
//!
//! https://ai.google.dev/api/generate-content

use std::time::Duration;

use async_trait::async_trait;
use lumina_schema::{Concept, ImageData, DEFAULT_IMAGE_MIME};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::error::{GatewayError, GatewayResult, TransportKind};
use crate::{prompts, schema, ConceptGateway, GatewayConfig};

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";

const ERROR_BODY_LIMIT: usize = 512;

#[derive(Debug, Clone)]
pub struct GeminiGateway {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
    text_model: String,
    image_model: String,
}

impl GeminiGateway {
    pub fn new(api_key: impl Into<String>, api_base: impl Into<String>) -> Self {
        Self::with_timeout(api_key, api_base, Duration::from_secs(120))
    }

    pub fn with_timeout(
        api_key: impl Into<String>,
        api_base: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
        }
    }

    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::with_timeout(
            config.api_key.clone().unwrap_or_default(),
            config.api_base.clone(),
            config.timeout,
        )
        .with_models(config.text_model.clone(), config.image_model.clone())
    }

    pub fn with_models(mut self, text_model: impl Into<String>, image_model: impl Into<String>) -> Self {
        self.text_model = text_model.into();
        self.image_model = image_model.into();
        self
    }

    pub fn text_model(&self) -> &str {
        &self.text_model
    }

    pub fn image_model(&self) -> &str {
        &self.image_model
    }

    fn structured_request(prompt: String, response_schema: serde_json::Value) -> GeminiRequest {
        GeminiRequest {
            contents: vec![GeminiContent::user(vec![GeminiPart::Text { text: prompt }])],
            system_instruction: Some(GeminiContent {
                role: None,
                parts: vec![GeminiPart::Text {
                    text: prompts::CONCEPT_SYSTEM_INSTRUCTION.to_string(),
                }],
            }),
            generation_config: Some(GeminiGenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                response_schema: Some(response_schema),
                image_config: None,
            }),
        }
    }

    fn concepts_request(business_name: &str, industry: &str, style: &str) -> GeminiRequest {
        Self::structured_request(
            prompts::concept_prompt(business_name, industry, style),
            schema::concept_list_schema(),
        )
    }

    fn refine_request(concept: &Concept, feedback: &str) -> GeminiRequest {
        Self::structured_request(
            prompts::refine_prompt(concept, feedback),
            schema::concept_schema(),
        )
    }

    fn image_request(visual_description: &str) -> GeminiRequest {
        GeminiRequest {
            contents: vec![GeminiContent::user(vec![GeminiPart::Text {
                text: prompts::image_prompt(visual_description),
            }])],
            system_instruction: None,
            generation_config: Some(GeminiGenerationConfig {
                response_mime_type: None,
                response_schema: None,
                image_config: Some(GeminiImageConfig {
                    aspect_ratio: "1:1".to_string(),
                }),
            }),
        }
    }

    fn edit_request(image: &ImageData, instruction: &str) -> GeminiRequest {
        GeminiRequest {
            contents: vec![GeminiContent::user(vec![
                GeminiPart::InlineData {
                    inline_data: GeminiBlob {
                        mime_type: image.mime_type.clone(),
                        data: image.data.clone(),
                    },
                },
                GeminiPart::Text {
                    text: prompts::edit_prompt(instruction),
                },
            ])],
            system_instruction: None,
            generation_config: None,
        }
    }

    async fn generate_content(
        &self,
        model: &str,
        payload: &GeminiRequest,
    ) -> GatewayResult<GeminiResponse> {
        let url = format!("{}/models/{}:generateContent", self.api_base, model);
        tracing::debug!(model, "sending gemini generateContent request");

        let resp = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .header("content-type", "application/json")
            .json(payload)
            .send()
            .await?;

        let status = resp.status();
        if status != StatusCode::OK {
            let text = resp.text().await.unwrap_or_default();
            return Err(format_api_error(status, &text));
        }

        let body = resp.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| GatewayError::malformed(format!("invalid generateContent body: {e}")))
    }
}

#[async_trait]
impl ConceptGateway for GeminiGateway {
    async fn generate_concepts(
        &self,
        business_name: &str,
        industry: &str,
        style: &str,
    ) -> GatewayResult<Vec<Concept>> {
        let payload = Self::concepts_request(business_name, industry, style);
        let body = self.generate_content(&self.text_model, &payload).await?;
        let text = response_text(&body)?;
        parse_concepts(&text)
    }

    async fn refine_concept(&self, concept: &Concept, feedback: &str) -> GatewayResult<Concept> {
        let payload = Self::refine_request(concept, feedback);
        let body = self.generate_content(&self.text_model, &payload).await?;
        let text = response_text(&body)?;
        parse_concept(&text)
    }

    async fn generate_image(&self, visual_description: &str) -> GatewayResult<ImageData> {
        let payload = Self::image_request(visual_description);
        let body = self.generate_content(&self.image_model, &payload).await?;
        extract_image(&body)
    }

    async fn edit_image(&self, image: &ImageData, instruction: &str) -> GatewayResult<ImageData> {
        let payload = Self::edit_request(image, instruction);
        let body = self.generate_content(&self.image_model, &payload).await?;
        extract_image(&body)
    }
}

fn response_text(body: &GeminiResponse) -> GatewayResult<String> {
    let candidate = body
        .candidates
        .first()
        .ok_or_else(|| GatewayError::malformed("empty candidates"))?;

    let text: String = candidate
        .content
        .iter()
        .flat_map(|c| c.parts.iter())
        .filter_map(|part| match part {
            GeminiPart::Text { text } => Some(text.as_str()),
            _ => None,
        })
        .collect();

    if text.trim().is_empty() {
        let reason = candidate.finish_reason.as_deref().unwrap_or("unknown");
        return Err(GatewayError::malformed(format!(
            "no text returned (finish reason: {reason})"
        )));
    }
    Ok(text)
}

/// Some models wrap structured output in a markdown fence despite the mime type.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

pub(crate) fn parse_concepts(text: &str) -> GatewayResult<Vec<Concept>> {
    let concepts: Vec<Concept> = serde_json::from_str(strip_code_fence(text))
        .map_err(|e| GatewayError::malformed(format!("concept list: {e}")))?;
    for concept in &concepts {
        concept
            .validate()
            .map_err(|e| GatewayError::malformed(e.to_string()))?;
    }
    Ok(concepts)
}

pub(crate) fn parse_concept(text: &str) -> GatewayResult<Concept> {
    let concept: Concept = serde_json::from_str(strip_code_fence(text))
        .map_err(|e| GatewayError::malformed(format!("concept: {e}")))?;
    concept
        .validate()
        .map_err(|e| GatewayError::malformed(e.to_string()))?;
    Ok(concept)
}

/// First inline image part across all candidates; parts are not assumed to be ordered.
fn extract_image(body: &GeminiResponse) -> GatewayResult<ImageData> {
    body.candidates
        .iter()
        .filter_map(|c| c.content.as_ref())
        .flat_map(|c| c.parts.iter())
        .find_map(|part| match part {
            GeminiPart::InlineData { inline_data } if !inline_data.data.is_empty() => {
                let mime = if inline_data.mime_type.is_empty() {
                    DEFAULT_IMAGE_MIME.to_string()
                } else {
                    inline_data.mime_type.clone()
                };
                Some(ImageData::new(mime, inline_data.data.clone()))
            }
            _ => None,
        })
        .ok_or(GatewayError::MissingImageData)
}

fn format_api_error(status: StatusCode, text: &str) -> GatewayError {
    let kind = TransportKind::from_status(status);
    let body: String = text.chars().take(ERROR_BODY_LIMIT).collect();
    tracing::warn!(%status, ?kind, "gemini api returned an error");
    GatewayError::transport(kind, format!("gemini api error ({status}): {body}"))
}

// ============================================================
// Gemini API Types
// ============================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

impl GeminiContent {
    fn user(parts: Vec<GeminiPart>) -> Self {
        Self {
            role: Some("user".to_string()),
            parts,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum GeminiPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: GeminiBlob,
    },
    Other(serde_json::Value),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiBlob {
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    data: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image_config: Option<GeminiImageConfig>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiImageConfig {
    aspect_ratio: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}
