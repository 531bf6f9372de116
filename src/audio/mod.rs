//! Audio containers, chapter marks and duration measurement.

mod chapters;
mod duration;
mod mux;
mod wav;

pub use chapters::{map_headings, render_ffmetadata, resolve_chapter_marks, ChapterMark, ChapterSeed, SegmentTiming};
pub use duration::{estimate_duration_ms, measure_duration_ms, segment_duration_ms, CHARS_PER_SECOND};
pub use mux::{concat_mp3, mux_m4b};
pub use wav::{concat_wav, encode_wav, parse_wav, WavFormat};

use crate::error::{Result, WikiVoxError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Final audio container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    #[default]
    Mp3,
    Wav,
    M4b,
}

impl AudioFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Wav => "wav",
            AudioFormat::M4b => "m4b",
        }
    }

    /// Format asked of the speech server. m4b is built from mp3 segments.
    pub fn request_format(&self) -> AudioFormat {
        match self {
            AudioFormat::M4b => AudioFormat::Mp3,
            other => *other,
        }
    }

    /// Whether the container carries chapter marks.
    pub fn supports_chapters(&self) -> bool {
        matches!(self, AudioFormat::M4b)
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for AudioFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mp3" => Ok(AudioFormat::Mp3),
            "wav" => Ok(AudioFormat::Wav),
            "m4b" => Ok(AudioFormat::M4b),
            other => Err(format!("Unsupported audio format '{}' (expected mp3, wav or m4b)", other)),
        }
    }
}

/// Tags written into containers that support them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioMetadata {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub genre: String,
    pub website: Option<String>,
    pub date: Option<String>,
}

impl AudioMetadata {
    pub fn for_article(title: impl Into<String>, website: Option<String>) -> Self {
        Self {
            title: title.into(),
            artist: "Wikivox".to_string(),
            album: "Wikivox Articles".to_string(),
            genre: "Speech".to_string(),
            website,
            date: Some(chrono::Local::now().format("%Y").to_string()),
        }
    }
}

/// Synthesized audio and its chapter table.
#[derive(Debug, Clone)]
pub struct AudioResult {
    pub bytes: Vec<u8>,
    pub format: AudioFormat,
    /// Empty unless chapters were requested.
    pub chapters: Vec<ChapterMark>,
    pub duration_ms: u64,
}

/// Merge ordered segments into one container.
///
/// `segments` must already be in the server's request format for `format`.
pub async fn assemble(
    segments: &[Vec<u8>],
    format: AudioFormat,
    chapters: &[ChapterMark],
    duration_ms: u64,
    metadata: Option<&AudioMetadata>,
) -> Result<Vec<u8>> {
    if segments.is_empty() {
        return Err(WikiVoxError::Audio("No audio segments to assemble".to_string()));
    }
    match format {
        AudioFormat::Mp3 => Ok(concat_mp3(segments)),
        AudioFormat::Wav => concat_wav(segments),
        AudioFormat::M4b => {
            let mp3 = concat_mp3(segments);
            mux_m4b(&mp3, chapters, duration_ms, metadata).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_format() {
        assert_eq!("mp3".parse::<AudioFormat>().unwrap(), AudioFormat::Mp3);
        assert_eq!(" WAV ".parse::<AudioFormat>().unwrap(), AudioFormat::Wav);
        assert_eq!("m4b".parse::<AudioFormat>().unwrap(), AudioFormat::M4b);
        assert!("ogg".parse::<AudioFormat>().is_err());
    }

    #[test]
    fn test_request_format() {
        assert_eq!(AudioFormat::M4b.request_format(), AudioFormat::Mp3);
        assert_eq!(AudioFormat::Wav.request_format(), AudioFormat::Wav);
        assert!(AudioFormat::M4b.supports_chapters());
        assert!(!AudioFormat::Mp3.supports_chapters());
    }

    #[test]
    fn test_display_round_trips() {
        for format in [AudioFormat::Mp3, AudioFormat::Wav, AudioFormat::M4b] {
            assert_eq!(format.to_string().parse::<AudioFormat>().unwrap(), format);
        }
    }

    #[tokio::test]
    async fn test_assemble_rejects_empty() {
        let err = assemble(&[], AudioFormat::Mp3, &[], 0, None).await.unwrap_err();
        assert!(matches!(err, WikiVoxError::Audio(_)));
    }

    #[tokio::test]
    async fn test_assemble_wav_merges() {
        let format = WavFormat::pcm16(16_000, 1);
        let a = encode_wav(&format, &[1, 0, 2, 0]);
        let b = encode_wav(&format, &[3, 0]);
        let merged = assemble(&[a, b], AudioFormat::Wav, &[], 0, None).await.unwrap();
        let (_, data) = parse_wav(&merged).unwrap();
        assert_eq!(data, &[1, 0, 2, 0, 3, 0]);
    }
}
