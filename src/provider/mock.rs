use anyhow::Result;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use super::{GeneratedImage, ImageRequest, Provider, TextRequest};

/// A request the mock has seen, in call order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Text(TextRequest),
    Image(ImageRequest),
}

/// A scripted provider for tests. Returns queued replies in order and
/// records every request it receives.
#[derive(Default)]
pub struct MockProvider {
    texts: Mutex<VecDeque<Result<String>>>,
    images: Mutex<VecDeque<Result<Vec<GeneratedImage>>>>,
    calls: Mutex<Vec<Call>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.texts.lock().unwrap().push_back(Ok(text.into()));
        self
    }

    pub fn with_text_error(self, message: &str) -> Self {
        self.texts
            .lock()
            .unwrap()
            .push_back(Err(anyhow::anyhow!(message.to_string())));
        self
    }

    pub fn with_images(self, images: Vec<GeneratedImage>) -> Self {
        self.images.lock().unwrap().push_back(Ok(images));
        self
    }

    pub fn with_image_error(self, message: &str) -> Self {
        self.images
            .lock()
            .unwrap()
            .push_back(Err(anyhow::anyhow!(message.to_string())));
        self
    }

    /// Every request received so far.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn text_calls(&self) -> Vec<TextRequest> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Text(r) => Some(r),
                Call::Image(_) => None,
            })
            .collect()
    }

    pub fn image_calls(&self) -> Vec<ImageRequest> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Image(r) => Some(r),
                Call::Text(_) => None,
            })
            .collect()
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn generate_text(&self, request: &TextRequest) -> Result<String> {
        self.calls.lock().unwrap().push(Call::Text(request.clone()));
        let n = self.text_calls().len();
        self.texts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(anyhow::anyhow!(
                    "MockProvider: no more texts (called {} times)",
                    n
                ))
            })
    }

    async fn generate_images(&self, request: &ImageRequest) -> Result<Vec<GeneratedImage>> {
        self.calls.lock().unwrap().push(Call::Image(request.clone()));
        let n = self.image_calls().len();
        self.images
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(anyhow::anyhow!(
                    "MockProvider: no more images (called {} times)",
                    n
                ))
            })
    }
}
