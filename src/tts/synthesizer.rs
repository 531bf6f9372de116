//! Segment-wise synthesis with ordered reassembly and chapter timing.

use super::{segment_text, SpeechClient, SpeechRequest, TextSegment};
use crate::audio::{
    assemble, resolve_chapter_marks, segment_duration_ms, AudioFormat, AudioMetadata, AudioResult, ChapterSeed,
    SegmentTiming,
};
use crate::config::Settings;
use crate::error::{Result, WikiVoxError};
use crate::retry::RetryPolicy;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

#[derive(Debug, Clone)]
pub struct SynthesisOptions {
    pub voice: String,
    pub format: AudioFormat,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Upper bound on characters per request.
    pub max_segment_chars: usize,
    /// Requests in flight at once. 1 is strictly sequential.
    pub max_concurrent: usize,
    pub metadata: Option<AudioMetadata>,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            voice: "af_sky+af_bella".to_string(),
            format: AudioFormat::Mp3,
            timeout: Duration::from_secs(120),
            max_segment_chars: 4000,
            max_concurrent: 1,
            metadata: None,
        }
    }
}

impl SynthesisOptions {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self {
            voice: settings.tts.voice.clone(),
            format: settings.tts.audio_format()?,
            timeout: settings.tts_timeout(),
            max_segment_chars: settings.tts.max_segment_chars,
            max_concurrent: settings.tts.max_concurrent,
            metadata: None,
        })
    }
}

/// Turns speech text into one audio file.
pub struct AudioSynthesizer {
    client: Arc<dyn SpeechClient>,
    retry: RetryPolicy,
}

impl AudioSynthesizer {
    pub fn new(client: Arc<dyn SpeechClient>, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    /// Synthesize `tts_text` and, when seeds are given, place chapter marks.
    ///
    /// Segments may be requested concurrently but are always reassembled in
    /// text order before durations are accumulated. If any segment still
    /// fails after its retries the whole call fails with `TtsUnavailable`;
    /// partial audio is never returned.
    #[instrument(skip_all, fields(chars = tts_text.chars().count(), format = %options.format))]
    pub async fn synthesize(
        &self,
        tts_text: &str,
        chapter_seed: Option<&[ChapterSeed]>,
        options: &SynthesisOptions,
    ) -> Result<AudioResult> {
        let segments = segment_text(tts_text, options.max_segment_chars);
        if segments.is_empty() {
            return Err(WikiVoxError::InvalidInput("Nothing to synthesize".to_string()));
        }
        info!("Synthesizing {} segment(s)", segments.len());

        let mut audio: Vec<(usize, Vec<u8>)> = stream::iter(&segments)
            .map(|segment| async move {
                self.synthesize_segment(segment, options)
                    .await
                    .map(|bytes| (segment.index, bytes))
            })
            .buffer_unordered(options.max_concurrent.max(1))
            .try_collect()
            .await?;

        // Restore text order before measuring cumulative duration.
        audio.sort_by_key(|(index, _)| *index);

        let request_format = options.format.request_format();
        let timings: Vec<SegmentTiming> = segments
            .iter()
            .zip(&audio)
            .map(|(segment, (_, bytes))| SegmentTiming {
                char_start: segment.char_start,
                char_len: segment.char_len(),
                duration_ms: segment_duration_ms(bytes, request_format, segment.char_len()),
            })
            .collect();
        let duration_ms = timings.iter().map(|t| t.duration_ms).sum();

        let chapters = chapter_seed
            .map(|seeds| resolve_chapter_marks(seeds, &timings))
            .unwrap_or_default();

        let parts: Vec<Vec<u8>> = audio.into_iter().map(|(_, bytes)| bytes).collect();
        let bytes = assemble(&parts, options.format, &chapters, duration_ms, options.metadata.as_ref()).await?;

        info!(
            "Synthesized {} bytes of {} ({} ms, {} chapters)",
            bytes.len(),
            options.format,
            duration_ms,
            chapters.len()
        );

        Ok(AudioResult {
            bytes,
            format: options.format,
            chapters,
            duration_ms,
        })
    }

    async fn synthesize_segment(&self, segment: &TextSegment, options: &SynthesisOptions) -> Result<Vec<u8>> {
        let request = SpeechRequest {
            input: segment.text.clone(),
            voice: options.voice.clone(),
            format: options.format.request_format(),
            timeout: options.timeout,
        };
        let client = &self.client;
        let request = &request;

        let label = format!("speech segment {}", segment.index);
        self.retry
            .run(&label, move |_| client.synthesize(request))
            .await
            .map_err(|e| self.unavailable(segment.index, e))
    }

    fn unavailable(&self, segment: usize, err: WikiVoxError) -> WikiVoxError {
        let attempts = match &err {
            WikiVoxError::Network { attempts, .. } => *attempts,
            _ => 1,
        };
        WikiVoxError::TtsUnavailable {
            server_url: self.client.server_url().to_string(),
            segment,
            attempts,
            last_error: err.to_string(),
        }
    }
}
