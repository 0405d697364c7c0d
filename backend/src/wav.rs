//! RIFF/WAVE wrapping for the raw PCM the TTS model returns.

use thiserror::Error;

pub const DEFAULT_SAMPLE_RATE: u32 = 24_000;
const HEADER_LEN: usize = 44;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
}

impl Default for PcmFormat {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            channels: 1,
            bits_per_sample: 16,
        }
    }
}

impl PcmFormat {
    fn block_align(&self) -> u16 {
        self.channels * (self.bits_per_sample / 8)
    }

    fn byte_rate(&self) -> u32 {
        self.sample_rate * u32::from(self.block_align())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WavError {
    #[error("PCM payload of {0} bytes does not fit in a WAV container")]
    TooLarge(usize),
}

/// Parses a MIME type such as `audio/L16;codec=pcm;rate=24000`.
///
/// Returns `None` for anything that is not raw linear PCM (for example
/// `audio/wav` or `audio/mpeg`), which the browser can already play.
pub fn pcm_format_from_mime(mime: &str) -> Option<PcmFormat> {
    let mut params = mime.split(';').map(str::trim);
    let essence = params.next()?.to_ascii_lowercase();
    let bits_per_sample = match essence.as_str() {
        "audio/l16" | "audio/pcm" => 16,
        "audio/l8" => 8,
        _ => return None,
    };

    let mut format = PcmFormat {
        bits_per_sample,
        ..PcmFormat::default()
    };
    for param in params {
        let Some((key, value)) = param.split_once('=') else {
            continue;
        };
        match key.trim().to_ascii_lowercase().as_str() {
            "rate" => {
                if let Ok(rate) = value.trim().parse() {
                    format.sample_rate = rate;
                }
            }
            "channels" => {
                if let Ok(channels) = value.trim().parse() {
                    format.channels = channels;
                }
            }
            _ => {}
        }
    }
    Some(format)
}

pub fn wrap_pcm(pcm: &[u8], format: PcmFormat) -> Result<Vec<u8>, WavError> {
    let data_len = u32::try_from(pcm.len())
        .ok()
        .filter(|len| len.checked_add(HEADER_LEN as u32).is_some())
        .ok_or(WavError::TooLarge(pcm.len()))?;

    let mut out = Vec::with_capacity(HEADER_LEN + pcm.len());
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&format.channels.to_le_bytes());
    out.extend_from_slice(&format.sample_rate.to_le_bytes());
    out.extend_from_slice(&format.byte_rate().to_le_bytes());
    out.extend_from_slice(&format.block_align().to_le_bytes());
    out.extend_from_slice(&format.bits_per_sample.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    out.extend_from_slice(pcm);
    Ok(out)
}
