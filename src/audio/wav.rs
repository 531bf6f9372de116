//! RIFF/WAVE parsing and merging.

use crate::error::{Result, WikiVoxError};

/// `fmt ` chunk fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavFormat {
    pub audio_format: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
}

impl WavFormat {
    /// 16-bit PCM.
    pub fn pcm16(sample_rate: u32, channels: u16) -> Self {
        let block_align = channels * 2;
        Self {
            audio_format: 1,
            channels,
            sample_rate,
            byte_rate: sample_rate * block_align as u32,
            block_align,
            bits_per_sample: 16,
        }
    }
}

fn invalid(msg: &str) -> WikiVoxError {
    WikiVoxError::Audio(format!("Invalid WAV: {}", msg))
}

fn u16_at(data: &[u8], pos: usize) -> u16 {
    u16::from_le_bytes([data[pos], data[pos + 1]])
}

fn u32_at(data: &[u8], pos: usize) -> u32 {
    u32::from_le_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]])
}

/// Parse a WAV file into its format and PCM data.
///
/// Streaming servers often write a placeholder data size (`0xFFFFFFFF` or 0);
/// the data chunk then runs to the end of the buffer.
pub fn parse_wav(data: &[u8]) -> Result<(WavFormat, &[u8])> {
    if data.len() < 12 {
        return Err(invalid("data too short"));
    }
    if &data[0..4] != b"RIFF" {
        return Err(invalid("missing RIFF header"));
    }
    if &data[8..12] != b"WAVE" {
        return Err(invalid("missing WAVE identifier"));
    }

    let mut pos = 12;
    let mut format = None;

    while pos + 8 <= data.len() {
        let chunk_id = &data[pos..pos + 4];
        let chunk_size = u32_at(data, pos + 4) as usize;
        let body = pos + 8;

        match chunk_id {
            b"fmt " => {
                if chunk_size < 16 || body + 16 > data.len() {
                    return Err(invalid("fmt chunk too short"));
                }
                format = Some(WavFormat {
                    audio_format: u16_at(data, body),
                    channels: u16_at(data, body + 2),
                    sample_rate: u32_at(data, body + 4),
                    byte_rate: u32_at(data, body + 8),
                    block_align: u16_at(data, body + 12),
                    bits_per_sample: u16_at(data, body + 14),
                });
            }
            b"data" => {
                let format = format.ok_or_else(|| invalid("data chunk before fmt chunk"))?;
                let available = data.len() - body;
                let size = if chunk_size == 0 || chunk_size > available {
                    available
                } else {
                    chunk_size
                };
                return Ok((format, &data[body..body + size]));
            }
            _ => {}
        }

        // Chunks are word aligned.
        pos = body.saturating_add(chunk_size).saturating_add(chunk_size % 2);
    }

    Err(invalid("no data chunk"))
}

/// Build a canonical 44-byte-header WAV file.
pub fn encode_wav(format: &WavFormat, pcm: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(44 + pcm.len());
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + pcm.len() as u32).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&format.audio_format.to_le_bytes());
    out.extend_from_slice(&format.channels.to_le_bytes());
    out.extend_from_slice(&format.sample_rate.to_le_bytes());
    out.extend_from_slice(&format.byte_rate.to_le_bytes());
    out.extend_from_slice(&format.block_align.to_le_bytes());
    out.extend_from_slice(&format.bits_per_sample.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&(pcm.len() as u32).to_le_bytes());
    out.extend_from_slice(pcm);
    out
}

/// Concatenate the PCM data of several WAV files under one header.
///
/// All parts must share the same sample format.
pub fn concat_wav(parts: &[Vec<u8>]) -> Result<Vec<u8>> {
    let mut format: Option<WavFormat> = None;
    let mut pcm = Vec::new();

    for (index, part) in parts.iter().enumerate() {
        let (part_format, data) = parse_wav(part)?;
        match format {
            None => format = Some(part_format),
            Some(first) if first != part_format => {
                return Err(WikiVoxError::Audio(format!(
                    "WAV segment {} has format {:?}, expected {:?}",
                    index, part_format, first
                )));
            }
            Some(_) => {}
        }
        pcm.extend_from_slice(data);
    }

    let format = format.ok_or_else(|| WikiVoxError::Audio("No WAV segments to merge".to_string()))?;
    Ok(encode_wav(&format, &pcm))
}
