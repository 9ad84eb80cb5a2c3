//! The story pipeline: idea → narrative → illustration.

use std::sync::Arc;

use tracing::debug;

use crate::consts::{DEFAULT_IMAGE_MODEL, DEFAULT_TEXT_MODEL};
use crate::error::{Result, StoryError};
use crate::prompts::story::{idea_prompt, idea_schema, image_prompt, narrative_prompt};
use crate::provider::{ImageRequest, Provider, TextRequest};
use crate::story::{GenerationIdea, StoryResult, to_data_uri};

pub struct StoryConfig {
    pub text_model: String,
    pub image_model: String,
    /// Sampling temperature for the narrative stage.
    pub narrative_temperature: f32,
    pub image_mime_type: String,
    pub aspect_ratio: String,
}

impl Default for StoryConfig {
    fn default() -> Self {
        Self {
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
            narrative_temperature: 0.8,
            image_mime_type: "image/jpeg".to_string(),
            aspect_ratio: "16:9".to_string(),
        }
    }
}

/// Pipeline stages, in the order they report progress. The later stages
/// carry the subject's name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage<'a> {
    Searching,
    Writing(&'a str),
    Illustrating(&'a str),
}

impl Stage<'_> {
    /// The user-facing progress text for this stage.
    pub fn message(&self) -> String {
        match self {
            Stage::Searching => "Đang tìm một doanh nhân truyền cảm hứng...".to_string(),
            Stage::Writing(name) => format!("Đang viết câu chuyện về {name}..."),
            Stage::Illustrating(name) => {
                format!("Đang tạo hình minh họa cho câu chuyện của {name}...")
            }
        }
    }
}

/// Runs the three dependent provider calls in sequence. Holds no state
/// between runs; a failure at any stage discards the whole run.
pub struct StoryEngine {
    provider: Arc<dyn Provider>,
    config: StoryConfig,
}

impl StoryEngine {
    pub fn new(provider: Arc<dyn Provider>, config: StoryConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &StoryConfig {
        &self.config
    }

    /// Generate one story package.
    ///
    /// `on_progress` is called synchronously once per stage, before that
    /// stage's provider call, and must not block. Errors from the provider
    /// come back unchanged as [`StoryError::Upstream`].
    pub async fn generate<F>(&self, mut on_progress: F) -> Result<StoryResult>
    where
        F: FnMut(&str) + Send,
    {
        on_progress(&Stage::Searching.message());
        let idea = self.find_idea().await?;
        debug!(name = %idea.name, "idea ready");

        on_progress(&Stage::Writing(&idea.name).message());
        let narrative = self.write_narrative(&idea).await?;
        debug!(chars = narrative.chars().count(), "narrative ready");

        on_progress(&Stage::Illustrating(&idea.name).message());
        let image_url = self.illustrate(&idea).await?;
        debug!(bytes = image_url.len(), "illustration ready");

        Ok(StoryResult {
            subject_name: idea.name,
            narrative,
            image_url,
        })
    }

    async fn find_idea(&self) -> Result<GenerationIdea> {
        let request =
            TextRequest::new(&self.config.text_model, idea_prompt()).with_schema(idea_schema());
        let text = self.provider.generate_text(&request).await?;
        GenerationIdea::parse(&text)
    }

    async fn write_narrative(&self, idea: &GenerationIdea) -> Result<String> {
        let request = TextRequest::new(
            &self.config.text_model,
            narrative_prompt(&idea.name, &idea.story_idea),
        )
        .with_temperature(self.config.narrative_temperature);
        let text = self.provider.generate_text(&request).await?;

        let narrative = text.trim();
        if narrative.is_empty() {
            return Err(StoryError::EmptyNarrative);
        }
        Ok(narrative.to_string())
    }

    async fn illustrate(&self, idea: &GenerationIdea) -> Result<String> {
        let request = ImageRequest {
            model: self.config.image_model.clone(),
            prompt: image_prompt(&idea.image_prompt_description, &idea.name),
            count: 1,
            mime_type: self.config.image_mime_type.clone(),
            aspect_ratio: self.config.aspect_ratio.clone(),
        };
        let images = self.provider.generate_images(&request).await?;

        let image = images
            .into_iter()
            .find(|img| !img.bytes.is_empty())
            .ok_or(StoryError::ImageGenerationFailed)?;
        Ok(to_data_uri(&image.mime_type, &image.bytes))
    }
}
