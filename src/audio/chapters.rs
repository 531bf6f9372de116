//! Chapter seeds from heading offsets, and chapter marks from segment timings.

use super::AudioMetadata;
use crate::text::HeadingOffset;
use crate::wiki::LEAD_HEADING;
use serde::{Deserialize, Serialize};

/// A heading to be turned into a chapter once audio timings are known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterSeed {
    pub title: String,
    pub char_offset: usize,
}

/// A navigable position in the final audio.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterMark {
    pub title: String,
    pub start_time_ms: u64,
}

/// Where a synthesized segment sits in the speech text, and how long it plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentTiming {
    pub char_start: usize,
    pub char_len: usize,
    pub duration_ms: u64,
}

/// Chapter seeds for `tts_text`.
///
/// Offsets outside the text or out of order are skipped. When the first
/// heading does not start the text, an introduction seed at 0 is added so the
/// opening audio belongs to a chapter.
pub fn map_headings(tts_text: &str, heading_offsets: &[HeadingOffset]) -> Vec<ChapterSeed> {
    let text_len = tts_text.chars().count();
    let mut seeds: Vec<ChapterSeed> = Vec::with_capacity(heading_offsets.len() + 1);

    for heading in heading_offsets {
        if heading.char_offset >= text_len {
            continue;
        }
        if seeds.last().is_some_and(|last| heading.char_offset <= last.char_offset) {
            continue;
        }
        seeds.push(ChapterSeed {
            title: heading.heading_text.clone(),
            char_offset: heading.char_offset,
        });
    }

    if text_len > 0 && seeds.first().map_or(true, |first| first.char_offset > 0) {
        seeds.insert(
            0,
            ChapterSeed {
                title: LEAD_HEADING.to_string(),
                char_offset: 0,
            },
        );
    }
    seeds
}

/// Resolve seeds to start times using per-segment durations.
///
/// A seed inside a segment is placed proportionally by character count within
/// that segment. Seeds in the gap between two segments take the start of the
/// next one. The result starts at 0 and is strictly increasing; marks that
/// would collide are nudged forward by a millisecond.
pub fn resolve_chapter_marks(seeds: &[ChapterSeed], timings: &[SegmentTiming]) -> Vec<ChapterMark> {
    let total_ms: u64 = timings.iter().map(|t| t.duration_ms).sum();
    let mut marks: Vec<ChapterMark> = Vec::with_capacity(seeds.len());

    for seed in seeds {
        let mut start = locate(seed.char_offset, timings).unwrap_or(total_ms);
        match marks.last() {
            None => start = 0,
            Some(prev) if start <= prev.start_time_ms => start = prev.start_time_ms + 1,
            Some(_) => {}
        }
        marks.push(ChapterMark {
            title: seed.title.clone(),
            start_time_ms: start,
        });
    }
    marks
}

fn locate(char_offset: usize, timings: &[SegmentTiming]) -> Option<u64> {
    let mut elapsed = 0u64;
    for timing in timings {
        if char_offset < timing.char_start {
            return Some(elapsed);
        }
        if char_offset < timing.char_start + timing.char_len {
            let into = (char_offset - timing.char_start) as f64 / timing.char_len as f64;
            return Some(elapsed + (into * timing.duration_ms as f64).round() as u64);
        }
        elapsed += timing.duration_ms;
    }
    None
}

fn escape_ffmetadata(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '=' | ';' | '#' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            '\n' | '\r' => out.push(' '),
            c => out.push(c),
        }
    }
    out
}

/// ffmpeg metadata file with global tags and one `[CHAPTER]` per mark.
pub fn render_ffmetadata(chapters: &[ChapterMark], total_ms: u64, metadata: Option<&AudioMetadata>) -> String {
    let mut out = String::from(";FFMETADATA1\n");

    if let Some(meta) = metadata {
        let tags = [
            ("title", Some(meta.title.as_str())),
            ("artist", Some(meta.artist.as_str())),
            ("album", Some(meta.album.as_str())),
            ("genre", Some(meta.genre.as_str())),
            ("comment", meta.website.as_deref()),
            ("date", meta.date.as_deref()),
        ];
        for (key, value) in tags {
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                out.push_str(&format!("{}={}\n", key, escape_ffmetadata(value)));
            }
        }
    }

    for (i, chapter) in chapters.iter().enumerate() {
        let end = chapters
            .get(i + 1)
            .map(|next| next.start_time_ms)
            .unwrap_or(total_ms)
            .max(chapter.start_time_ms + 1);
        out.push_str("\n[CHAPTER]\nTIMEBASE=1/1000\n");
        out.push_str(&format!("START={}\nEND={}\n", chapter.start_time_ms, end));
        out.push_str(&format!("title={}\n", escape_ffmetadata(&chapter.title)));
    }
    out
}
