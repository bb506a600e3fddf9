//! Codec collaborator boundary
//!
//! Container encoding, decoding, resampling and filtering live behind
//! this trait. The pipeline never byte-appends across sample rates:
//! any non-canonical provider output is routed through
//! [`Codec::resample`] before it enters a track. A reference WAV
//! implementation ships in-crate; heavier formats plug in from
//! outside.

use std::io::Cursor;

use serde::{Deserialize, Serialize};

use crate::core::error::{CodecOperation, RenderError, Result};

use super::pcm::{PcmBuffer, CANONICAL_SAMPLE_RATE};

/// Target container formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContainerFormat {
    #[default]
    Wav,
    Mp3,
    Aac,
}

/// A filtering request forwarded to the codec collaborator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterSpec {
    /// One-pole high-pass at the given cutoff
    HighPass { cutoff_hz: f32 },
    /// One-pole low-pass at the given cutoff
    LowPass { cutoff_hz: f32 },
    /// Spectral tilt; positive brightens, negative darkens
    EqTilt { db: f32 },
    /// Mute samples below the threshold
    NoiseGate { threshold_db: f32 },
}

/// Codec collaborator contract
pub trait Codec: Send + Sync {
    /// Collaborator name
    fn name(&self) -> &str;

    /// Encode PCM into a container
    fn encode(&self, pcm: &PcmBuffer, format: ContainerFormat) -> Result<Vec<u8>>;

    /// Decode container bytes into PCM
    fn decode(&self, bytes: &[u8]) -> Result<PcmBuffer>;

    /// Resample to a target rate, preserving channel count
    fn resample(&self, pcm: &PcmBuffer, target_rate: u32) -> Result<PcmBuffer>;

    /// Apply a filter. The reference implementation covers the
    /// [`FilterSpec`] variants with first-order sections.
    fn filter(&self, pcm: &PcmBuffer, filter: &FilterSpec) -> Result<PcmBuffer>;

    /// Bring a buffer to the canonical rate and stereo layout
    fn canonicalize(&self, pcm: PcmBuffer) -> Result<PcmBuffer> {
        let pcm = if pcm.sample_rate() != CANONICAL_SAMPLE_RATE {
            self.resample(&pcm, CANONICAL_SAMPLE_RATE)?
        } else {
            pcm
        };
        Ok(pcm.upmix_to_stereo())
    }
}

/// Reference codec: WAV container, linear-interpolation resampling,
/// first-order filters.
#[derive(Debug, Clone, Copy, Default)]
pub struct WavCodec;

impl WavCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Codec for WavCodec {
    fn name(&self) -> &str {
        "wav"
    }

    fn encode(&self, pcm: &PcmBuffer, format: ContainerFormat) -> Result<Vec<u8>> {
        if format != ContainerFormat::Wav {
            return Err(RenderError::Codec {
                message: format!("wav codec cannot encode {:?}", format),
                operation: CodecOperation::Encoding,
            });
        }
        let spec = hound::WavSpec {
            channels: pcm.channels(),
            sample_rate: pcm.sample_rate(),
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer =
                hound::WavWriter::new(&mut cursor, spec).map_err(|e| RenderError::Codec {
                    message: format!("failed to create WAV writer: {}", e),
                    operation: CodecOperation::Encoding,
                })?;
            for &sample in pcm.samples() {
                writer.write_sample(sample).map_err(|e| RenderError::Codec {
                    message: format!("failed to write sample: {}", e),
                    operation: CodecOperation::Encoding,
                })?;
            }
            writer.finalize().map_err(|e| RenderError::Codec {
                message: format!("failed to finalize WAV: {}", e),
                operation: CodecOperation::Encoding,
            })?;
        }
        Ok(cursor.into_inner())
    }

    fn decode(&self, bytes: &[u8]) -> Result<PcmBuffer> {
        let mut reader =
            hound::WavReader::new(Cursor::new(bytes)).map_err(|e| RenderError::Codec {
                message: format!("failed to read WAV: {}", e),
                operation: CodecOperation::Decoding,
            })?;
        let spec = reader.spec();
        if spec.bits_per_sample != 16 || spec.sample_format != hound::SampleFormat::Int {
            return Err(RenderError::Codec {
                message: format!(
                    "unsupported WAV sample format: {} bit {:?}",
                    spec.bits_per_sample, spec.sample_format
                ),
                operation: CodecOperation::Decoding,
            });
        }
        let samples: std::result::Result<Vec<i16>, _> = reader.samples::<i16>().collect();
        let samples = samples.map_err(|e| RenderError::Codec {
            message: format!("failed to read samples: {}", e),
            operation: CodecOperation::Decoding,
        })?;
        Ok(PcmBuffer::new(samples, spec.sample_rate, spec.channels))
    }

    fn resample(&self, pcm: &PcmBuffer, target_rate: u32) -> Result<PcmBuffer> {
        if target_rate == 0 {
            return Err(RenderError::Codec {
                message: "target rate must be positive".to_string(),
                operation: CodecOperation::Resampling,
            });
        }
        if pcm.sample_rate() == target_rate || pcm.is_empty() {
            return Ok(PcmBuffer::new(
                pcm.samples().to_vec(),
                target_rate,
                pcm.channels(),
            ));
        }
        let channels = pcm.channels() as usize;
        let src_frames = pcm.frames();
        let ratio = pcm.sample_rate() as f64 / target_rate as f64;
        let dst_frames =
            ((src_frames as f64) * target_rate as f64 / pcm.sample_rate() as f64).round()
                as usize;
        let src = pcm.samples();
        let mut out = Vec::with_capacity(dst_frames * channels);
        for frame in 0..dst_frames {
            let position = frame as f64 * ratio;
            let left = position.floor() as usize;
            let right = (left + 1).min(src_frames - 1);
            let fraction = (position - left as f64) as f32;
            for channel in 0..channels {
                let a = src[left * channels + channel] as f32;
                let b = src[right * channels + channel] as f32;
                out.push((a + (b - a) * fraction).round() as i16);
            }
        }
        Ok(PcmBuffer::new(out, target_rate, pcm.channels()))
    }

    fn filter(&self, pcm: &PcmBuffer, filter: &FilterSpec) -> Result<PcmBuffer> {
        let channels = pcm.channels() as usize;
        let rate = pcm.sample_rate() as f32;
        let mut samples = pcm.samples().to_vec();
        match *filter {
            FilterSpec::LowPass { cutoff_hz } => {
                one_pole_low_pass(&mut samples, channels, rate, cutoff_hz)?;
            }
            FilterSpec::HighPass { cutoff_hz } => {
                let mut low = samples.clone();
                one_pole_low_pass(&mut low, channels, rate, cutoff_hz)?;
                for (sample, smoothed) in samples.iter_mut().zip(low) {
                    *sample = (*sample as i32 - smoothed as i32).clamp(-32768, 32767) as i16;
                }
            }
            FilterSpec::EqTilt { db } => {
                // shelving approximation: blend the signal with its
                // low-passed form, weighted by the tilt
                let mut low = samples.clone();
                one_pole_low_pass(&mut low, channels, rate, 2000.0)?;
                let tilt = (db / 12.0).clamp(-1.0, 1.0);
                for (sample, smoothed) in samples.iter_mut().zip(low) {
                    let high = *sample as f32 - smoothed as f32;
                    let mixed = smoothed as f32 * (1.0 - tilt) + high * (1.0 + tilt);
                    *sample = mixed.round().clamp(-32768.0, 32767.0) as i16;
                }
            }
            FilterSpec::NoiseGate { threshold_db } => {
                let threshold = 32767.0 * 10f32.powf(threshold_db / 20.0);
                for sample in samples.iter_mut() {
                    if (*sample as f32).abs() < threshold {
                        *sample = 0;
                    }
                }
            }
        }
        Ok(PcmBuffer::new(samples, pcm.sample_rate(), pcm.channels()))
    }
}

/// In-place per-channel one-pole low-pass
fn one_pole_low_pass(
    samples: &mut [i16],
    channels: usize,
    rate: f32,
    cutoff_hz: f32,
) -> Result<()> {
    if cutoff_hz <= 0.0 || cutoff_hz >= rate / 2.0 {
        return Err(RenderError::Codec {
            message: format!("cutoff {} Hz out of range for {} Hz audio", cutoff_hz, rate),
            operation: CodecOperation::Filtering,
        });
    }
    let alpha = {
        let rc = 1.0 / (2.0 * std::f32::consts::PI * cutoff_hz);
        let dt = 1.0 / rate;
        dt / (rc + dt)
    };
    let mut state = vec![0f32; channels];
    for frame in samples.chunks_mut(channels) {
        for (channel, sample) in frame.iter_mut().enumerate() {
            state[channel] += alpha * (*sample as f32 - state[channel]);
            *sample = state[channel].round().clamp(-32768.0, 32767.0) as i16;
        }
    }
    Ok(())
}
