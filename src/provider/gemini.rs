use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Config;

use super::{GeneratedImage, ImageRequest, Provider, TextRequest};

/// A provider that calls the Gemini REST API (text via `generateContent`,
/// images via Imagen's `predict`).
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, model, method)
    }

    async fn post<B: Serialize + ?Sized, R: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<R> {
        let resp = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            bail!("Gemini API error ({}): {}", status, text);
        }

        Ok(resp.json().await?)
    }

    fn build_content_request(request: &TextRequest) -> ContentRequest<'_> {
        let generation_config = if request.temperature.is_some() || request.schema.is_some() {
            Some(GenerationConfig {
                temperature: request.temperature,
                response_mime_type: request.schema.as_ref().map(|_| "application/json"),
                response_schema: request.schema.as_ref(),
            })
        } else {
            None
        };

        ContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part {
                    text: &request.prompt,
                }],
            }],
            generation_config,
        }
    }

    fn parse_content_response(resp: ContentResponse) -> Result<String> {
        if let Some(usage) = &resp.usage_metadata {
            debug!(
                input = usage.prompt_token_count,
                output = usage.candidates_token_count,
                "token usage"
            );
        }

        let Some(candidate) = resp.candidates.into_iter().next() else {
            match resp.prompt_feedback.and_then(|f| f.block_reason) {
                Some(reason) => bail!("Gemini blocked the prompt: {}", reason),
                None => bail!("Gemini returned no candidates"),
            }
        };

        let text: String = candidate
            .content
            .map(|c| c.parts)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|p| p.text)
            .collect();

        Ok(text)
    }

    fn build_predict_request(request: &ImageRequest) -> PredictRequest<'_> {
        PredictRequest {
            instances: vec![Instance {
                prompt: &request.prompt,
            }],
            parameters: Parameters {
                sample_count: request.count,
                aspect_ratio: &request.aspect_ratio,
                output_options: OutputOptions {
                    mime_type: &request.mime_type,
                },
            },
        }
    }

    fn parse_predict_response(
        resp: PredictResponse,
        fallback_mime: &str,
    ) -> Result<Vec<GeneratedImage>> {
        resp.predictions
            .into_iter()
            .filter_map(|p| {
                // Filtered predictions carry a reason instead of bytes.
                if let Some(reason) = &p.rai_filtered_reason {
                    debug!(reason = %reason, "image filtered");
                }
                p.bytes_base64_encoded.map(|b64| (b64, p.mime_type))
            })
            .map(|(b64, mime)| -> Result<GeneratedImage> {
                let bytes = STANDARD
                    .decode(b64.as_bytes())
                    .context("image payload is not valid base64")?;
                Ok(GeneratedImage {
                    bytes,
                    mime_type: mime
                        .map(|m| m.trim().to_string())
                        .filter(|m| !m.is_empty())
                        .unwrap_or_else(|| fallback_mime.to_string()),
                })
            })
            .collect()
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    async fn generate_text(&self, request: &TextRequest) -> Result<String> {
        debug!(model = %request.model, structured = request.schema.is_some(), "generateContent");
        let url = self.endpoint(&request.model, "generateContent");
        let body = Self::build_content_request(request);
        let resp: ContentResponse = self.post(&url, &body).await?;
        Self::parse_content_response(resp)
    }

    async fn generate_images(&self, request: &ImageRequest) -> Result<Vec<GeneratedImage>> {
        debug!(model = %request.model, count = request.count, "predict");
        let url = self.endpoint(&request.model, "predict");
        let body = Self::build_predict_request(request);
        let resp: PredictResponse = self.post(&url, &body).await?;
        Self::parse_predict_response(resp, &request.mime_type)
    }
}

// --- API types ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<&'a serde_json::Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
}

#[derive(Serialize)]
struct PredictRequest<'a> {
    instances: Vec<Instance<'a>>,
    parameters: Parameters<'a>,
}

#[derive(Serialize)]
struct Instance<'a> {
    prompt: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Parameters<'a> {
    sample_count: u32,
    aspect_ratio: &'a str,
    output_options: OutputOptions<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OutputOptions<'a> {
    mime_type: &'a str,
}

#[derive(Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    bytes_base64_encoded: Option<String>,
    mime_type: Option<String>,
    rai_filtered_reason: Option<String>,
}
