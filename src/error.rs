use thiserror::Error;

/// Everything that can end a story run.
///
/// Provider and transport failures are carried as [`StoryError::Upstream`]
/// without further classification.
#[derive(Debug, Error)]
pub enum StoryError {
    /// Missing or unusable credentials. Fatal at startup.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The idea stage returned something that is not the expected object.
    #[error("malformed idea response: {0}")]
    MalformedResponse(String),

    /// The narrative stage returned blank text.
    #[error("narrative generation returned empty text")]
    EmptyNarrative,

    /// The image stage returned no usable image.
    #[error(
        "image generation failed. The model may have refused to generate the image for safety reasons"
    )]
    ImageGenerationFailed,

    #[error(transparent)]
    Upstream(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, StoryError>;
