//! Audio: PCM buffers, tracks, mixing, and the codec boundary
//!
//! Everything audible flows through the canonical PCM form (44100 Hz,
//! stereo, i16 LE). The mixer is deterministic; the codec collaborator
//! owns container formats, resampling and filters.

pub mod codec;
pub mod mixer;
pub mod pcm;
pub mod track;

pub use codec::{Codec, ContainerFormat, FilterSpec, WavCodec};
pub use mixer::{MixContext, Mixer, MixerOptions, OverlapWindow, SpeakerChange};
pub use pcm::{PcmBuffer, CANONICAL_CHANNELS, CANONICAL_SAMPLE_RATE};
pub use track::{AudioSegment, CharacterTrack};
