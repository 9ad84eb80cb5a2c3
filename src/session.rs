//! Front-end state around the story engine.
//!
//! A [`Session`] owns what the screen shows: the current story, the latest
//! progress message, the error banner, and the "copied" acknowledgement.
//! [`Session::generate`] takes `&mut self`, so a second run cannot start
//! while one is in flight.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing::{error, info};

use crate::engine::StoryEngine;
use crate::story::StoryResult;

/// The only failure text users ever see.
pub const GENERIC_ERROR: &str = "Đã xảy ra lỗi khi tạo câu chuyện. Vui lòng thử lại.";

/// How long the "copied" acknowledgement stays up.
pub const COPY_ACK: Duration = Duration::from_secs(2);

pub const COPY_LABEL: &str = "Sao Chép";
pub const COPIED_LABEL: &str = "Đã chép!";

pub struct Session {
    engine: StoryEngine,
    progress: watch::Sender<String>,
    story: Option<StoryResult>,
    error: Option<String>,
    copied_at: Option<Instant>,
    generated: u64,
}

impl Session {
    pub fn new(engine: StoryEngine) -> Self {
        let (progress, _) = watch::channel(String::new());
        Self {
            engine,
            progress,
            story: None,
            error: None,
            copied_at: None,
            generated: 0,
        }
    }

    /// Follow the progress message. Empty means no run is in flight.
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.progress.subscribe()
    }

    pub fn progress(&self) -> String {
        self.progress.borrow().clone()
    }

    pub fn story(&self) -> Option<&StoryResult> {
        self.story.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Number of successful runs in this session.
    pub fn generated(&self) -> u64 {
        self.generated
    }

    /// Run the pipeline once. The previous story and error are cleared up
    /// front; on failure the error is logged and replaced by [`GENERIC_ERROR`].
    /// The progress message is empty again when this returns.
    pub async fn generate(&mut self) -> Option<&StoryResult> {
        self.story = None;
        self.error = None;
        self.copied_at = None;

        let progress = &self.progress;
        let outcome = self
            .engine
            .generate(|message| {
                progress.send_replace(message.to_string());
            })
            .await;
        self.progress.send_replace(String::new());

        match outcome {
            Ok(story) => {
                info!(subject = %story.subject_name, "story generated");
                self.generated += 1;
                self.story = Some(story);
            }
            Err(e) => {
                error!(error = %e, "story generation failed");
                self.error = Some(GENERIC_ERROR.to_string());
            }
        }

        self.story.as_ref()
    }

    /// Clear the progress message after an in-flight run was dropped.
    /// Story and error stay empty, as [`Session::generate`] left them.
    pub fn reset_progress(&self) {
        self.progress.send_replace(String::new());
    }

    /// Hand out the narrative for copying and start the acknowledgement window.
    pub fn copy_story(&mut self) -> Option<&str> {
        let story = self.story.as_ref()?;
        self.copied_at = Some(Instant::now());
        Some(&story.narrative)
    }

    pub fn is_copied(&self) -> bool {
        self.is_copied_at(Instant::now())
    }

    fn is_copied_at(&self, now: Instant) -> bool {
        self.copied_at
            .is_some_and(|at| now.saturating_duration_since(at) < COPY_ACK)
    }

    pub fn copy_label(&self) -> &'static str {
        if self.is_copied() { COPIED_LABEL } else { COPY_LABEL }
    }

    /// Write the current image into `dir` under the story's download name.
    pub async fn download_image(&self, dir: &Path) -> Result<PathBuf> {
        let story = self
            .story
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("no story to download yet"))?;
        let bytes = story.image_bytes().context("story image is unreadable")?;

        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("failed to create {}", dir.display()))?;
        let path = dir.join(story.download_file_name());
        tokio::fs::write(&path, &bytes)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;

        info!(path = %path.display(), bytes = bytes.len(), "image saved");
        Ok(path)
    }
}
