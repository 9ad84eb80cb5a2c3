pub mod gemini;
pub mod mock;

use anyhow::Result;
use async_trait::async_trait;

/// A single text-generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRequest {
    pub model: String,
    pub prompt: String,
    pub temperature: Option<f32>,
    /// When set, the provider must answer with JSON matching this schema.
    pub schema: Option<serde_json::Value>,
}

impl TextRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            temperature: None,
            schema: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_schema(mut self, schema: serde_json::Value) -> Self {
        self.schema = Some(schema);
        self
    }
}

/// A single image-generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRequest {
    pub model: String,
    pub prompt: String,
    pub count: u32,
    pub mime_type: String,
    pub aspect_ratio: String,
}

/// One image returned by the provider, already decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// The remote generation service. Could be Gemini, a local model, or a test script.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn generate_text(&self, request: &TextRequest) -> Result<String>;

    /// May legitimately return an empty list (e.g. a safety refusal).
    async fn generate_images(&self, request: &ImageRequest) -> Result<Vec<GeneratedImage>>;
}
