pub mod error;
pub mod gemini;
pub mod prompts;
pub mod schema;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use lumina_schema::{ColorSwatch, Concept, ImageData, SwatchRole, DEFAULT_IMAGE_MIME};
use serde::{Deserialize, Serialize};

pub use error::{GatewayError, GatewayResult, TransportKind};
pub use gemini::{GeminiGateway, DEFAULT_IMAGE_MODEL, DEFAULT_TEXT_MODEL, GEMINI_API_BASE};
pub use prompts::CONCEPT_COUNT;

/// The generative-AI service boundary: structured concept text plus image
/// generation and editing.
#[async_trait]
pub trait ConceptGateway: Send + Sync {
    /// Asks for [`CONCEPT_COUNT`] concepts; callers must accept any count.
    async fn generate_concepts(
        &self,
        business_name: &str,
        industry: &str,
        style: &str,
    ) -> GatewayResult<Vec<Concept>>;

    /// Returns a complete replacement concept, never a patch.
    async fn refine_concept(&self, concept: &Concept, feedback: &str) -> GatewayResult<Concept>;

    /// Square image for a concept's visual description.
    async fn generate_image(&self, visual_description: &str) -> GatewayResult<ImageData>;

    async fn edit_image(&self, image: &ImageData, instruction: &str) -> GatewayResult<ImageData>;
}

// ============================================================
// Gateway Configuration
// ============================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    Gemini,
    /// Deterministic offline gateway
    Stub,
}

/// Everything needed to build the one gateway client of a process.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub provider: ProviderType,
    pub api_key: Option<String>,
    pub api_base: String,
    pub text_model: String,
    pub image_model: String,
    pub timeout: Duration,
}

impl GatewayConfig {
    pub fn gemini(api_key: impl Into<String>) -> Self {
        Self {
            provider: ProviderType::Gemini,
            api_key: Some(api_key.into()),
            api_base: GEMINI_API_BASE.to_string(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            timeout: Duration::from_secs(120),
        }
    }

    pub fn stub() -> Self {
        Self {
            provider: ProviderType::Stub,
            api_key: None,
            ..Self::gemini("")
        }
    }
}

pub fn create_gateway(config: &GatewayConfig) -> Result<Arc<dyn ConceptGateway>> {
    let gateway: Arc<dyn ConceptGateway> = match config.provider {
        ProviderType::Gemini => {
            let has_key = config
                .api_key
                .as_deref()
                .is_some_and(|key| !key.trim().is_empty());
            if !has_key {
                return Err(anyhow!("gemini gateway requires api_key"));
            }
            tracing::info!(
                text_model = %config.text_model,
                image_model = %config.image_model,
                "using gemini gateway"
            );
            Arc::new(GeminiGateway::from_config(config))
        }
        ProviderType::Stub => {
            tracing::info!("using offline stub gateway");
            Arc::new(StubGateway)
        }
    };
    Ok(gateway)
}

// ============================================================
// Stub Gateway
// ============================================================

/// 1x1 PNG.
pub const STUB_PNG_BASE64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mNkYAAAAAYAAjCB0C8AAAAASUVORK5CYII=";

pub struct StubGateway;

#[async_trait]
impl ConceptGateway for StubGateway {
    async fn generate_concepts(
        &self,
        business_name: &str,
        industry: &str,
        style: &str,
    ) -> GatewayResult<Vec<Concept>> {
        let business = business_name.trim();
        let industry = industry.trim();
        let variants = [
            ("Mark", "a bold monogram carved out of negative space", "#4F46E5"),
            ("Orbit", "a thin ring circling a single spark", "#0EA5E9"),
            ("Crest", "a stacked geometric crest with a hidden initial", "#16A34A"),
        ];
        Ok(variants
            .iter()
            .map(|(suffix, shape, primary)| Concept {
                name: format!("{business} {suffix}"),
                visual_description: format!("{shape}, styled {style}, for {industry}"),
                rationale: format!("[stub] {business} in {industry}, expressed as {style}"),
                palette: vec![
                    ColorSwatch::new(SwatchRole::Primary, "Signature", *primary),
                    ColorSwatch::new(SwatchRole::Secondary, "Graphite", "#1F2937"),
                    ColorSwatch::new(SwatchRole::Accent, "Spark", "#F59E0B"),
                ],
            })
            .collect())
    }

    async fn refine_concept(&self, concept: &Concept, feedback: &str) -> GatewayResult<Concept> {
        let mut refined = concept.clone();
        refined.visual_description = format!("{} (revised: {})", concept.visual_description, feedback.trim());
        refined.rationale = format!("{} [refined: {}]", concept.rationale, feedback.trim());
        Ok(refined)
    }

    async fn generate_image(&self, _visual_description: &str) -> GatewayResult<ImageData> {
        Ok(ImageData::new(DEFAULT_IMAGE_MIME, STUB_PNG_BASE64))
    }

    async fn edit_image(&self, _image: &ImageData, _instruction: &str) -> GatewayResult<ImageData> {
        Ok(ImageData::new(DEFAULT_IMAGE_MIME, STUB_PNG_BASE64))
    }
}
