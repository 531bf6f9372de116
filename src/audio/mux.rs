//! Joining mp3 segments and muxing chaptered m4b files with ffmpeg.

use super::{render_ffmetadata, AudioMetadata, ChapterMark};
use crate::error::{Result, WikiVoxError};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument};

/// Size of a leading ID3v2 tag, header and footer included.
fn id3v2_len(data: &[u8]) -> usize {
    if data.len() < 10 || &data[0..3] != b"ID3" {
        return 0;
    }
    let size = data[6..10]
        .iter()
        .fold(0usize, |acc, &b| (acc << 7) | (b & 0x7f) as usize);
    let footer = if data[5] & 0x10 != 0 { 10 } else { 0 };
    (10 + size + footer).min(data.len())
}

/// Concatenate mp3 segments frame-wise.
///
/// Only the first segment keeps its ID3 tag; later tags would be decoded as
/// garbage frames in the middle of the stream.
pub fn concat_mp3(segments: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::with_capacity(segments.iter().map(Vec::len).sum());
    for (i, segment) in segments.iter().enumerate() {
        let skip = if i == 0 { 0 } else { id3v2_len(segment) };
        out.extend_from_slice(&segment[skip..]);
    }
    out
}

/// Re-encode mp3 audio as AAC in an m4b container with chapters and tags.
#[instrument(skip_all, fields(chapters = chapters.len(), bytes = mp3.len()))]
pub async fn mux_m4b(
    mp3: &[u8],
    chapters: &[ChapterMark],
    total_ms: u64,
    metadata: Option<&AudioMetadata>,
) -> Result<Vec<u8>> {
    let workdir = tempfile::tempdir()?;
    let input = workdir.path().join("input.mp3");
    let meta_path = workdir.path().join("chapters.txt");
    let output = workdir.path().join("output.m4b");

    tokio::fs::write(&input, mp3).await?;
    tokio::fs::write(&meta_path, render_ffmetadata(chapters, total_ms, metadata)).await?;

    debug!("Muxing m4b in {:?}", workdir.path());

    let result = Command::new("ffmpeg")
        .arg("-y")
        .arg("-loglevel").arg("error")
        .arg("-i").arg(&input)
        .arg("-i").arg(&meta_path)
        .arg("-map_metadata").arg("1")
        .arg("-map_chapters").arg("1")
        .arg("-map").arg("0:a")
        .arg("-c:a").arg("aac")
        .arg("-b:a").arg("64k")
        .arg("-f").arg("mp4")
        .arg(&output)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await;

    match result {
        Ok(out) if out.status.success() => {}
        Ok(out) => {
            let err = String::from_utf8_lossy(&out.stderr);
            return Err(WikiVoxError::ToolFailed(format!("ffmpeg: {}", err.trim())));
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(WikiVoxError::ToolNotFound("ffmpeg".into()));
        }
        Err(e) => return Err(WikiVoxError::Audio(format!("ffmpeg error: {e}"))),
    }

    let bytes = tokio::fs::read(&output).await?;
    info!("Muxed m4b with {} chapters ({} bytes)", chapters.len(), bytes.len());
    Ok(bytes)
}
