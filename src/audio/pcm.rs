//! PCM buffers
//!
//! The canonical interchange format: interleaved signed 16-bit
//! little-endian samples at 44100 Hz, 2 channels. Mono buffers are
//! up-mixed by sample duplication; other sample rates go through the
//! codec collaborator before entering a track.

use serde::{Deserialize, Serialize};

/// Canonical sample rate
pub const CANONICAL_SAMPLE_RATE: u32 = 44_100;
/// Canonical channel count
pub const CANONICAL_CHANNELS: u16 = 2;

/// Owned interleaved i16 PCM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PcmBuffer {
    samples: Vec<i16>,
    sample_rate: u32,
    channels: u16,
}

impl PcmBuffer {
    /// Wrap interleaved samples. `samples.len()` must be a multiple of
    /// `channels`; a ragged tail is truncated.
    pub fn new(mut samples: Vec<i16>, sample_rate: u32, channels: u16) -> Self {
        let channels = channels.clamp(1, 2);
        let rem = samples.len() % channels as usize;
        if rem != 0 {
            samples.truncate(samples.len() - rem);
        }
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    /// Empty canonical buffer
    pub fn empty() -> Self {
        Self {
            samples: Vec::new(),
            sample_rate: CANONICAL_SAMPLE_RATE,
            channels: CANONICAL_CHANNELS,
        }
    }

    /// Zero-filled canonical buffer of the given duration
    pub fn silence(duration_ms: u64) -> Self {
        let frames = ms_to_frames(duration_ms, CANONICAL_SAMPLE_RATE);
        Self {
            samples: vec![0; frames * CANONICAL_CHANNELS as usize],
            sample_rate: CANONICAL_SAMPLE_RATE,
            channels: CANONICAL_CHANNELS,
        }
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn samples_mut(&mut self) -> &mut [i16] {
        &mut self.samples
    }

    pub fn into_samples(self) -> Vec<i16> {
        self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Interleaved sample count
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Frame count (one frame spans all channels)
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    /// Playback duration in milliseconds
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        self.frames() as u64 * 1000 / self.sample_rate as u64
    }

    /// True when the buffer is already in the canonical format
    pub fn is_canonical(&self) -> bool {
        self.sample_rate == CANONICAL_SAMPLE_RATE && self.channels == CANONICAL_CHANNELS
    }

    /// Up-mix mono to stereo by duplicating each sample. Stereo buffers
    /// pass through unchanged.
    pub fn upmix_to_stereo(self) -> Self {
        if self.channels == 2 {
            return self;
        }
        let mut samples = Vec::with_capacity(self.samples.len() * 2);
        for &sample in &self.samples {
            samples.push(sample);
            samples.push(sample);
        }
        Self {
            samples,
            sample_rate: self.sample_rate,
            channels: 2,
        }
    }

    /// Append another buffer. Both must share rate and channel count;
    /// byte-append across formats is never performed.
    pub fn append(&mut self, other: &PcmBuffer) {
        debug_assert_eq!(self.sample_rate, other.sample_rate);
        debug_assert_eq!(self.channels, other.channels);
        self.samples.extend_from_slice(&other.samples);
    }

    /// Append zero frames
    pub fn push_silence(&mut self, duration_ms: u64) {
        let frames = ms_to_frames(duration_ms, self.sample_rate);
        self.samples
            .extend(std::iter::repeat(0).take(frames * self.channels as usize));
    }

    /// Interleaved samples as little-endian bytes
    pub fn to_le_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.samples.len() * 2);
        for &sample in &self.samples {
            bytes.extend_from_slice(&sample.to_le_bytes());
        }
        bytes
    }

    /// Parse little-endian bytes; an odd trailing byte is dropped
    pub fn from_le_bytes(bytes: &[u8], sample_rate: u32, channels: u16) -> Self {
        let samples = bytes
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        Self::new(samples, sample_rate, channels)
    }

    /// Peak absolute sample value
    pub fn peak(&self) -> i32 {
        self.samples
            .iter()
            .map(|s| (*s as i32).abs())
            .max()
            .unwrap_or(0)
    }
}

/// Frames covering `duration_ms` at `sample_rate`, rounding up
pub fn ms_to_frames(duration_ms: u64, sample_rate: u32) -> usize {
    ((duration_ms as f64 / 1000.0 * sample_rate as f64).ceil()) as usize
}

/// Frame index at `time_ms`, rounding down
pub fn ms_to_frame_floor(time_ms: u64, sample_rate: u32) -> usize {
    ((time_ms as f64 / 1000.0 * sample_rate as f64).floor()) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_duration() {
        let buffer = PcmBuffer::silence(1000);
        assert_eq!(buffer.frames(), 44_100);
        assert_eq!(buffer.len(), 88_200);
        assert_eq!(buffer.duration_ms(), 1000);
        assert!(buffer.is_canonical());
    }

    #[test]
    fn test_upmix_duplicates_samples() {
        let mono = PcmBuffer::new(vec![1, 2, 3], 44_100, 1);
        let stereo = mono.upmix_to_stereo();
        assert_eq!(stereo.channels(), 2);
        assert_eq!(stereo.samples(), &[1, 1, 2, 2, 3, 3]);
    }

    #[test]
    fn test_append_concatenates() {
        let mut a = PcmBuffer::new(vec![1, 2], 44_100, 2);
        let b = PcmBuffer::new(vec![3, 4], 44_100, 2);
        a.append(&b);
        assert_eq!(a.samples(), &[1, 2, 3, 4]);
    }

    #[test]
    fn test_byte_round_trip() {
        let buffer = PcmBuffer::new(vec![-32768, -1, 0, 32767], 44_100, 2);
        let bytes = buffer.to_le_bytes();
        let back = PcmBuffer::from_le_bytes(&bytes, 44_100, 2);
        assert_eq!(back, buffer);
    }

    #[test]
    fn test_ragged_tail_truncated() {
        let buffer = PcmBuffer::new(vec![1, 2, 3], 44_100, 2);
        assert_eq!(buffer.len(), 2);
    }

    #[test]
    fn test_peak() {
        let buffer = PcmBuffer::new(vec![10, -32768, 5, 0], 44_100, 2);
        assert_eq!(buffer.peak(), 32768);
        assert_eq!(PcmBuffer::empty().peak(), 0);
    }

    #[test]
    fn test_frame_math_rounds() {
        assert_eq!(ms_to_frames(1, 44_100), 45);
        assert_eq!(ms_to_frame_floor(1, 44_100), 44);
    }
}
