//! Conversation timeline
//!
//! A time-sorted event log for one render: line boundaries, emotion
//! changes and overlap windows, plus cumulative speaking time per
//! character. Events sort by `(time_ms, kind priority)` with the fixed
//! priority line_start < overlap_start < emotion_change < overlap_end
//! < line_end.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::audio::mixer::{OverlapWindow, SpeakerChange};
use crate::emotion::EmotionKind;

/// Event kinds in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineEventKind {
    LineStart,
    OverlapStart,
    EmotionChange,
    OverlapEnd,
    LineEnd,
}

impl TimelineEventKind {
    /// Tie-break priority at equal times
    pub fn priority(&self) -> u8 {
        match self {
            TimelineEventKind::LineStart => 0,
            TimelineEventKind::OverlapStart => 1,
            TimelineEventKind::EmotionChange => 2,
            TimelineEventKind::OverlapEnd => 3,
            TimelineEventKind::LineEnd => 4,
        }
    }
}

/// One event on the conversation timeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub time_ms: u64,
    pub kind: TimelineEventKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_id: Option<String>,
    /// Set on emotion_change events
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion: Option<EmotionKind>,
    /// Set on overlap_start events
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attenuation: Option<f32>,
    /// Free-form annotation (synthesis fallbacks, warnings)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl TimelineEvent {
    pub fn new(time_ms: u64, kind: TimelineEventKind) -> Self {
        Self {
            time_ms,
            kind,
            line_id: None,
            character_id: None,
            emotion: None,
            attenuation: None,
            note: None,
        }
    }

    pub fn line(mut self, line_id: impl Into<String>) -> Self {
        self.line_id = Some(line_id.into());
        self
    }

    pub fn character(mut self, character_id: impl Into<String>) -> Self {
        self.character_id = Some(character_id.into());
        self
    }

    pub fn emotion(mut self, kind: EmotionKind) -> Self {
        self.emotion = Some(kind);
        self
    }

    pub fn attenuation(mut self, amount: f32) -> Self {
        self.attenuation = Some(amount);
        self
    }

    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// Sorted event log plus aggregates for one conversation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationTimeline {
    events: Vec<TimelineEvent>,
    /// Master length
    pub total_ms: u64,
    /// Cumulative speaking time per character
    pub speaking_time_ms: HashMap<String, u64>,
    /// Attenuation windows, for the mixer
    pub overlaps: Vec<OverlapWindow>,
}

impl ConversationTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event; ordering is restored on [`Self::finish`]
    pub fn push(&mut self, event: TimelineEvent) {
        self.events.push(event);
    }

    /// Sort events by `(time, priority)`
    pub fn finish(&mut self) {
        self.events
            .sort_by_key(|e| (e.time_ms, e.kind.priority()));
    }

    /// Events in timeline order
    pub fn events(&self) -> &[TimelineEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events of one kind, in order
    pub fn events_of(&self, kind: TimelineEventKind) -> impl Iterator<Item = &TimelineEvent> {
        self.events.iter().filter(move |e| e.kind == kind)
    }

    /// Speaker-change instants: the boundary between consecutive lines
    /// spoken by different characters, placed midway between the
    /// outgoing line's end and the incoming line's start.
    pub fn speaker_changes(&self) -> Vec<SpeakerChange> {
        let mut starts: Vec<(&TimelineEvent, u64)> = Vec::new();
        for event in self
            .events
            .iter()
            .filter(|e| e.kind == TimelineEventKind::LineStart)
        {
            starts.push((event, event.time_ms));
        }
        starts.sort_by_key(|(_, t)| *t);

        let mut ends: HashMap<&str, u64> = HashMap::new();
        for event in self
            .events
            .iter()
            .filter(|e| e.kind == TimelineEventKind::LineEnd)
        {
            if let Some(ref id) = event.line_id {
                ends.insert(id.as_str(), event.time_ms);
            }
        }

        let mut changes = Vec::new();
        for pair in starts.windows(2) {
            let (previous, _) = pair[0];
            let (next, next_start) = pair[1];
            if previous.character_id == next.character_id {
                continue;
            }
            let Some(prev_end) = previous.line_id.as_deref().and_then(|id| ends.get(id))
            else {
                continue;
            };
            // overlapping lines have no clean boundary to fade at
            if *prev_end > next_start {
                continue;
            }
            changes.push(SpeakerChange {
                time_ms: (prev_end + next_start) / 2,
            });
        }
        changes
    }
}
