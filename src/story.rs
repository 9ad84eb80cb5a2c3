//! The data that flows through a story run.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::error::{Result, StoryError};

/// What the idea stage hands to the later stages. Never outlives a run.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationIdea {
    pub name: String,
    pub story_idea: String,
    pub image_prompt_description: String,
}

impl GenerationIdea {
    /// Parse the idea stage's structured reply.
    ///
    /// Every field must be present, must be a string, and must not be blank.
    /// Code fences around the JSON are tolerated.
    pub fn parse(text: &str) -> Result<Self> {
        let idea: GenerationIdea = serde_json::from_str(extract_json(text))
            .map_err(|e| StoryError::MalformedResponse(e.to_string()))?;

        for (field, value) in [
            ("name", &idea.name),
            ("storyIdea", &idea.story_idea),
            ("imagePromptDescription", &idea.image_prompt_description),
        ] {
            if value.trim().is_empty() {
                return Err(StoryError::MalformedResponse(format!("field `{field}` is blank")));
            }
        }

        Ok(GenerationIdea {
            name: idea.name.trim().to_string(),
            story_idea: idea.story_idea.trim().to_string(),
            image_prompt_description: idea.image_prompt_description.trim().to_string(),
        })
    }
}

/// The finished package shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryResult {
    pub subject_name: String,
    pub narrative: String,
    /// Self-contained `data:` URI, displayable without another fetch.
    pub image_url: String,
}

impl StoryResult {
    /// File name for downloading the image, e.g. `Marie_Curie_inspiration.jpeg`.
    pub fn download_file_name(&self) -> String {
        let stem = self
            .subject_name
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("_")
            .replace(['/', '\\'], "_");
        let extension = parse_data_uri(&self.image_url)
            .map(|(mime, _)| extension_for(&mime))
            .unwrap_or("jpeg");
        format!("{stem}_inspiration.{extension}")
    }

    /// Decoded image bytes.
    pub fn image_bytes(&self) -> anyhow::Result<Vec<u8>> {
        let (_, bytes) = parse_data_uri(&self.image_url)?;
        Ok(bytes)
    }
}

/// Encode bytes as `data:<mime>;base64,<payload>`.
pub fn to_data_uri(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
}

/// Split a base64 `data:` URI into its MIME type and decoded bytes.
pub fn parse_data_uri(uri: &str) -> anyhow::Result<(String, Vec<u8>)> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| anyhow::anyhow!("not a data URI"))?;
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| anyhow::anyhow!("data URI has no payload"))?;
    let mime = meta
        .strip_suffix(";base64")
        .ok_or_else(|| anyhow::anyhow!("data URI is not base64-encoded"))?;
    if mime.is_empty() {
        anyhow::bail!("data URI has no MIME type");
    }
    let bytes = STANDARD.decode(payload)?;
    Ok((mime.to_string(), bytes))
}

fn extension_for(mime: &str) -> &'static str {
    match mime {
        "image/png" => "png",
        "image/webp" => "webp",
        _ => "jpeg",
    }
}

/// Extract JSON from text that may be wrapped in markdown code fences.
fn extract_json(text: &str) -> &str {
    let trimmed = text.trim();

    if let Some(after) = trimmed.strip_prefix("```json")
        && let Some(json) = after.strip_suffix("```")
    {
        return json.trim();
    }
    if let Some(after) = trimmed.strip_prefix("```")
        && let Some(json) = after.strip_suffix("```")
    {
        return json.trim();
    }

    trimmed
}
