//! In-process fake providers for generator and route tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::error::AiError;
use super::providers::{ImageProvider, TextProvider, VideoProvider};
use super::types::{GeneratedVideo, ImageSize, PromptPair, VideoRequest};

fn upstream(provider: &str) -> AiError {
    AiError::Upstream {
        provider: provider.to_string(),
        status: 500,
        body: "boom".to_string(),
    }
}

pub struct FakeText {
    name: String,
    reply: Option<String>,
    delay: Duration,
    calls: AtomicUsize,
}

impl FakeText {
    pub fn ok(name: &str, reply: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            reply: Some(reply.to_string()),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        })
    }

    /// Answers after `delay_ms`, so it settles after faster providers.
    pub fn slow(name: &str, reply: &str, delay_ms: u64) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            reply: Some(reply.to_string()),
            delay: Duration::from_millis(delay_ms),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(name: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            reply: None,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextProvider for FakeText {
    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        "alpha-model"
    }

    async fn complete(&self, _prompt: &PromptPair, _max_tokens: u32) -> Result<String, AiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.reply.clone().ok_or_else(|| upstream(&self.name))
    }
}

#[derive(Clone, Copy)]
enum ImageMode {
    Ok,
    EveryOther,
    Failing,
}

pub struct FakeImage {
    name: String,
    mode: ImageMode,
    calls: AtomicUsize,
}

impl FakeImage {
    fn build(name: &str, mode: ImageMode) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            mode,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn ok(name: &str) -> Arc<Self> {
        Self::build(name, ImageMode::Ok)
    }

    /// Even-numbered calls fail.
    pub fn every_other(name: &str) -> Arc<Self> {
        Self::build(name, ImageMode::EveryOther)
    }

    pub fn failing(name: &str) -> Arc<Self> {
        Self::build(name, ImageMode::Failing)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageProvider for FakeImage {
    fn name(&self) -> &str {
        &self.name
    }

    fn model(&self) -> &str {
        "painter-model"
    }

    async fn generate(&self, _prompt: &str, _size: ImageSize, seed: u64) -> Result<String, AiError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        match self.mode {
            ImageMode::Ok => Ok(format!("https://images.test/{call}-{seed}.png")),
            ImageMode::EveryOther if call % 2 == 1 => {
                Ok(format!("https://images.test/{call}-{seed}.png"))
            }
            ImageMode::EveryOther | ImageMode::Failing => Err(upstream(&self.name)),
        }
    }
}

pub struct FakeVideo;

#[async_trait]
impl VideoProvider for FakeVideo {
    fn name(&self) -> &str {
        "reel"
    }

    fn model(&self) -> &str {
        "reel-model"
    }

    async fn generate(&self, request: &VideoRequest) -> Result<GeneratedVideo, AiError> {
        Ok(GeneratedVideo {
            url: "https://videos.test/clip.mp4".to_string(),
            provider: self.name().to_string(),
            model: self.model().to_string(),
            prompt: request.prompt.clone(),
            duration: request.duration.unwrap_or(5),
            request_id: "job-1".to_string(),
        })
    }
}
