//! Audio segments and per-character tracks
//!
//! A segment owns the PCM for one line and records where it sits on
//! the master timeline. A character track owns the sorted segments for
//! one character plus a contiguous concatenation of their PCM with no
//! inter-line silence; spatial placement is the mixer's job.

use serde::{Deserialize, Serialize};

use super::pcm::PcmBuffer;

/// One line's audio, positioned on the master timeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioSegment {
    /// Line this segment was synthesized from
    pub line_id: String,
    /// Speaking character
    pub character_id: String,
    /// Master-timeline start
    pub start_ms: u64,
    /// Owned PCM
    pub audio: PcmBuffer,
    /// Per-segment gain applied at mix time, in decibels
    #[serde(default)]
    pub gain_db: f32,
    /// True when synthesis failed and this is a zero-filled substitute
    #[serde(default)]
    pub fallback: bool,
}

impl AudioSegment {
    /// Master-timeline end implied by the buffer length
    pub fn end_ms(&self) -> u64 {
        self.start_ms + self.audio.duration_ms()
    }
}

/// All of one character's segments plus their concatenated PCM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CharacterTrack {
    pub character_id: String,
    /// Sorted by start time
    pub segments: Vec<AudioSegment>,
    /// Contiguous concatenation of segment PCM, no inter-line silence
    pub buffer: PcmBuffer,
}

impl CharacterTrack {
    /// Assemble a track from segments, sorting by start time and
    /// concatenating PCM in that order.
    pub fn from_segments(character_id: impl Into<String>, mut segments: Vec<AudioSegment>) -> Self {
        segments.sort_by_key(|s| s.start_ms);
        let mut buffer = PcmBuffer::empty();
        for segment in &segments {
            buffer.append(&segment.audio);
        }
        Self {
            character_id: character_id.into(),
            segments,
            buffer,
        }
    }

    /// Total spoken duration (sum of segment durations)
    pub fn duration_ms(&self) -> u64 {
        self.buffer.duration_ms()
    }

    /// Count of zero-filled substitute segments
    pub fn fallback_count(&self) -> usize {
        self.segments.iter().filter(|s| s.fallback).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(line: &str, start_ms: u64, duration_ms: u64) -> AudioSegment {
        AudioSegment {
            line_id: line.to_string(),
            character_id: "alice".to_string(),
            start_ms,
            audio: PcmBuffer::silence(duration_ms),
            gain_db: 0.0,
            fallback: false,
        }
    }

    #[test]
    fn test_track_sample_count_is_sum_of_segments() {
        let track = CharacterTrack::from_segments(
            "alice",
            vec![segment("l1", 0, 400), segment("l2", 1000, 250)],
        );
        let segment_frames: usize = track.segments.iter().map(|s| s.audio.frames()).sum();
        assert_eq!(track.buffer.frames(), segment_frames);
    }

    #[test]
    fn test_segments_sorted_on_assembly() {
        let track = CharacterTrack::from_segments(
            "alice",
            vec![segment("l2", 1000, 100), segment("l1", 0, 100)],
        );
        let ids: Vec<&str> = track.segments.iter().map(|s| s.line_id.as_str()).collect();
        assert_eq!(ids, vec!["l1", "l2"]);
    }

    #[test]
    fn test_segment_end() {
        let s = segment("l1", 500, 250);
        assert_eq!(s.end_ms(), 750);
    }
}
