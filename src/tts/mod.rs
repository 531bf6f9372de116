//! Speech synthesis against an OpenAI-compatible TTS server.

mod client;
mod segmenter;
mod synthesizer;

pub use client::OpenAiSpeechClient;
pub use segmenter::{segment_text, TextSegment};
pub use synthesizer::{AudioSynthesizer, SynthesisOptions};

use crate::audio::AudioFormat;
use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// One synthesis request.
#[derive(Debug, Clone)]
pub struct SpeechRequest {
    pub input: String,
    pub voice: String,
    pub format: AudioFormat,
    pub timeout: Duration,
}

/// A text-to-speech backend.
#[async_trait]
pub trait SpeechClient: Send + Sync {
    /// Synthesize `request.input`, returning encoded audio.
    async fn synthesize(&self, request: &SpeechRequest) -> Result<Vec<u8>>;

    /// Base URL, used in error reports.
    fn server_url(&self) -> &str;

    /// Check if the server answers.
    async fn health_check(&self) -> bool;
}
