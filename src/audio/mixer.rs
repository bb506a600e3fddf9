//! Sample-accurate mixing
//!
//! Sums character tracks onto a zeroed master at their timeline
//! positions with saturating 16-bit arithmetic, then normalizes,
//! compresses and crossfades. The mixer is a pure function of its
//! inputs: identical inputs produce bit-identical output.

use serde::{Deserialize, Serialize};

use crate::core::error::{RenderError, Result};

use super::pcm::{
    ms_to_frame_floor, ms_to_frames, PcmBuffer, CANONICAL_CHANNELS, CANONICAL_SAMPLE_RATE,
};
use super::track::CharacterTrack;

/// Peak target after normalization, as a fraction of full scale
const NORMALIZE_CEILING: f32 = 0.95;

/// Recognized mixer options. Unknown fields are a validation error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MixerOptions {
    /// Scale the master so its peak hits 95% of full scale
    #[serde(default = "default_normalize")]
    pub normalize: bool,
    /// Compression amount in (0,1]; 0 disables
    #[serde(default)]
    pub compression_level: f32,
    /// Crossfade half-window at speaker changes; 0 disables
    #[serde(default)]
    pub crossfade_ms: u32,
    /// Alternate characters slightly left/right in the stereo field
    #[serde(default)]
    pub spatial: bool,
}

fn default_normalize() -> bool {
    true
}

impl Default for MixerOptions {
    fn default() -> Self {
        Self {
            normalize: default_normalize(),
            compression_level: 0.0,
            crossfade_ms: 0,
            spatial: false,
        }
    }
}

impl MixerOptions {
    /// Range-check the options
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.compression_level) {
            return Err(RenderError::Validation {
                message: format!(
                    "compression_level {} outside [0, 1]",
                    self.compression_level
                ),
                field: Some("compression_level".to_string()),
            });
        }
        Ok(())
    }
}

/// A window during which one character's samples are attenuated
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlapWindow {
    /// Character whose samples are attenuated (the overlap target)
    pub character_id: String,
    pub start_ms: u64,
    pub end_ms: u64,
    /// Attenuation amount in [0,1]; applied as gain `1 − amount`
    pub attenuation: f32,
}

/// A speaker change on the master timeline, for crossfading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeakerChange {
    /// Transition instant: the boundary between the two lines
    pub time_ms: u64,
}

/// Everything the mixer needs besides the tracks themselves
#[derive(Debug, Clone)]
pub struct MixContext {
    /// Master length; the buffer is sized from this
    pub total_ms: u64,
    /// Attenuation windows from overlap events
    pub overlaps: Vec<OverlapWindow>,
    /// Speaker-change instants for crossfades
    pub speaker_changes: Vec<SpeakerChange>,
    /// Master gain in [0,2]
    pub master_volume: f32,
}

impl Default for MixContext {
    fn default() -> Self {
        Self {
            total_ms: 0,
            overlaps: Vec::new(),
            speaker_changes: Vec::new(),
            master_volume: 1.0,
        }
    }
}

/// The mixer. Stateless; all per-render scratch lives on the stack of
/// [`Mixer::mix`].
#[derive(Debug, Clone, Default)]
pub struct Mixer {
    options: MixerOptions,
}

impl Mixer {
    pub fn new(options: MixerOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self { options })
    }

    pub fn options(&self) -> &MixerOptions {
        &self.options
    }

    /// Mix tracks onto a master buffer.
    ///
    /// Every input buffer must already be canonical (44100 Hz stereo);
    /// non-canonical input is rejected rather than silently resampled.
    pub fn mix(&self, tracks: &[CharacterTrack], context: &MixContext) -> Result<PcmBuffer> {
        for track in tracks {
            for segment in &track.segments {
                if !segment.audio.is_canonical() && !segment.audio.is_empty() {
                    return Err(RenderError::Validation {
                        message: format!(
                            "segment for line '{}' is not in canonical format ({} Hz, {} ch)",
                            segment.line_id,
                            segment.audio.sample_rate(),
                            segment.audio.channels()
                        ),
                        field: None,
                    });
                }
            }
        }

        let frames = ms_to_frames(context.total_ms, CANONICAL_SAMPLE_RATE);
        let mut master = vec![0i16; frames * CANONICAL_CHANNELS as usize];

        for (track_index, track) in tracks.iter().enumerate() {
            let pan = self.pan_gains(track_index);
            for segment in &track.segments {
                self.place_segment(&mut master, frames, segment, context, pan);
            }
        }

        if context.master_volume != 1.0 {
            let gain = context.master_volume.clamp(0.0, 2.0);
            scale_in_place(&mut master, gain);
        }

        if self.options.normalize {
            normalize_in_place(&mut master);
        }

        if self.options.compression_level > 0.0 {
            compress_in_place(&mut master, self.options.compression_level);
        }

        if self.options.crossfade_ms > 0 {
            for change in &context.speaker_changes {
                apply_crossfade_dip(
                    &mut master,
                    change.time_ms,
                    self.options.crossfade_ms as u64,
                );
            }
        }

        Ok(PcmBuffer::new(
            master,
            CANONICAL_SAMPLE_RATE,
            CANONICAL_CHANNELS,
        ))
    }

    /// Stereo gains for a track: mild alternating pan when spatial
    /// placement is enabled, unity otherwise.
    fn pan_gains(&self, track_index: usize) -> (f32, f32) {
        if !self.options.spatial {
            return (1.0, 1.0);
        }
        // -3 dB-ish tilt, alternating sides by registration order
        if track_index % 2 == 0 {
            (1.0, 0.75)
        } else {
            (0.75, 1.0)
        }
    }

    /// Sum one segment into the master with saturating arithmetic,
    /// applying segment gain, overlap attenuation and pan.
    fn place_segment(
        &self,
        master: &mut [i16],
        master_frames: usize,
        segment: &crate::audio::track::AudioSegment,
        context: &MixContext,
        pan: (f32, f32),
    ) {
        let start_frame = ms_to_frame_floor(segment.start_ms, CANONICAL_SAMPLE_RATE);
        if start_frame >= master_frames {
            return;
        }
        let samples = segment.audio.samples();
        let segment_frames = segment.audio.frames();
        let copy_frames = segment_frames.min(master_frames - start_frame);
        let base_gain = db_to_gain(segment.gain_db);

        let windows: Vec<&OverlapWindow> = context
            .overlaps
            .iter()
            .filter(|w| {
                w.character_id == segment.character_id
                    && w.start_ms < segment.end_ms()
                    && w.end_ms > segment.start_ms
            })
            .collect();

        for frame in 0..copy_frames {
            let frame_ms =
                segment.start_ms + (frame as u64 * 1000 / CANONICAL_SAMPLE_RATE as u64);
            let mut gain = base_gain;
            for window in &windows {
                if frame_ms >= window.start_ms && frame_ms < window.end_ms {
                    gain *= 1.0 - window.attenuation.clamp(0.0, 1.0);
                }
            }
            for channel in 0..CANONICAL_CHANNELS as usize {
                let channel_gain = if channel == 0 { pan.0 } else { pan.1 };
                let idx = (start_frame + frame) * CANONICAL_CHANNELS as usize + channel;
                let sample = samples[frame * CANONICAL_CHANNELS as usize + channel];
                let mixed = master[idx] as i32
                    + (sample as f32 * gain * channel_gain).round() as i32;
                master[idx] = clamp_i16(mixed);
            }
        }
    }
}

/// Saturate to the i16 range
fn clamp_i16(value: i32) -> i16 {
    value.clamp(-32768, 32767) as i16
}

/// Decibels to linear gain
fn db_to_gain(db: f32) -> f32 {
    10f32.powf(db / 20.0)
}

/// Multiply every sample by `gain`, saturating
fn scale_in_place(master: &mut [i16], gain: f32) {
    for sample in master.iter_mut() {
        *sample = clamp_i16((*sample as f32 * gain).round() as i32);
    }
}

/// Scale so the peak lands at 95% of full scale; quiet masters are
/// never amplified above unity.
fn normalize_in_place(master: &mut [i16]) {
    let peak = master.iter().map(|s| (*s as i32).abs()).max().unwrap_or(0);
    if peak == 0 {
        return;
    }
    let factor = (32767.0 * NORMALIZE_CEILING / peak as f32).min(1.0);
    if (factor - 1.0).abs() < f32::EPSILON {
        return;
    }
    scale_in_place(master, factor);
}

/// Soft-knee-free compression: samples above the threshold are pulled
/// toward it by the ratio.
fn compress_in_place(master: &mut [i16], level: f32) {
    let level = level.clamp(0.0, 1.0);
    let threshold = 32767.0 * (1.0 - level);
    let ratio = 1.0 + 3.0 * level;
    for sample in master.iter_mut() {
        let value = *sample as f32;
        let magnitude = value.abs();
        if magnitude > threshold {
            let compressed = threshold + (magnitude - threshold) / ratio;
            *sample = clamp_i16((compressed.copysign(value)).round() as i32);
        }
    }
}

/// Raised-cosine dip centered on a speaker change: unity at the window
/// edges, silence at the transition instant, symmetric over twice the
/// half-window.
fn apply_crossfade_dip(master: &mut [i16], center_ms: u64, half_window_ms: u64) {
    if half_window_ms == 0 {
        return;
    }
    let center = ms_to_frame_floor(center_ms, CANONICAL_SAMPLE_RATE) as i64;
    let half = ms_to_frames(half_window_ms, CANONICAL_SAMPLE_RATE) as i64;
    let frames = master.len() as i64 / CANONICAL_CHANNELS as i64;

    let first = (center - half).max(0);
    let last = (center + half).min(frames);
    for frame in first..last {
        let progress = 1.0 - ((frame - center).abs() as f32 / half as f32);
        let envelope = 0.5 + 0.5 * (std::f32::consts::PI * progress).cos();
        for channel in 0..CANONICAL_CHANNELS as i64 {
            let idx = (frame * CANONICAL_CHANNELS as i64 + channel) as usize;
            master[idx] = clamp_i16((master[idx] as f32 * envelope).round() as i32);
        }
    }
}
