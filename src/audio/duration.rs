//! Measuring how long a piece of audio plays.

use super::AudioFormat;
use crate::error::{Result, WikiVoxError};
use std::io::Cursor;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::units::TimeBase;
use tracing::warn;

/// Speaking rate assumed when audio cannot be decoded.
pub const CHARS_PER_SECOND: f64 = 15.0;

/// Duration in milliseconds, read from the container without decoding samples.
pub fn measure_duration_ms(bytes: &[u8], format: AudioFormat) -> Result<u64> {
    let cursor = Cursor::new(bytes.to_vec());
    let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

    let mut hint = Hint::new();
    hint.with_extension(format.request_format().extension());

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| WikiVoxError::Audio(format!("Probe failed: {}", e)))?;
    let mut reader = probed.format;

    let track = reader
        .default_track()
        .ok_or_else(|| WikiVoxError::Audio("No audio track found".to_string()))?;
    let track_id = track.id;
    let params = track.codec_params.clone();

    if let (Some(frames), Some(rate)) = (params.n_frames, params.sample_rate) {
        if rate > 0 && frames > 0 {
            return Ok(frames * 1000 / rate as u64);
        }
    }

    let time_base = params
        .time_base
        .or_else(|| params.sample_rate.map(|rate| TimeBase::new(1, rate)))
        .ok_or_else(|| WikiVoxError::Audio("Unknown time base".to_string()))?;

    let mut total = 0u64;
    loop {
        match reader.next_packet() {
            Ok(packet) if packet.track_id() == track_id => total += packet.dur,
            Ok(_) => continue,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(WikiVoxError::Audio(format!("Packet read failed: {}", e))),
        }
    }

    if total == 0 {
        return Err(WikiVoxError::Audio("Audio contains no packets".to_string()));
    }
    let time = time_base.calc_time(total);
    Ok(time.seconds * 1000 + (time.frac * 1000.0).round() as u64)
}

/// Duration guessed from the amount of text spoken.
pub fn estimate_duration_ms(char_count: usize) -> u64 {
    (char_count as f64 / CHARS_PER_SECOND * 1000.0).round() as u64
}

/// Measured duration, or the text estimate when the audio cannot be read.
pub fn segment_duration_ms(bytes: &[u8], format: AudioFormat, char_count: usize) -> u64 {
    match measure_duration_ms(bytes, format) {
        Ok(ms) => ms,
        Err(e) => {
            let estimate = estimate_duration_ms(char_count);
            warn!("Could not measure segment duration ({}), estimating {}ms", e, estimate);
            estimate
        }
    }
}
