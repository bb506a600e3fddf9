//! Emotion timeline compilation
//!
//! Turns a line's default emotion plus its ordered transitions into a
//! keyframe timeline and a per-token sequence of emotion segments. The
//! first keyframe is always at t=0 with the line's default emotion;
//! keyframes are sorted by time with ties broken by insertion order.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::curves::lerp;
use super::profile::EmotionProfile;
use super::transition::{EmotionTransition, TransitionLimits, CHARS_PER_SECOND};

/// Words per minute used for line-level duration estimation. Distinct
/// from [`CHARS_PER_SECOND`], which positions triggers and tokens.
pub const WORDS_PER_MINUTE: u64 = 180;

/// A time-stamped emotion on the timeline. `transition` indexes into
/// the accepted-transition list when this keyframe opens a transition
/// window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyframe {
    pub time_ms: u64,
    pub emotion: EmotionProfile,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition: Option<usize>,
}

/// Ordered keyframe sequence for one line
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmotionTimeline {
    pub keyframes: Vec<Keyframe>,
}

impl EmotionTimeline {
    /// Keyframe in force at `time_ms`: the last keyframe at or before it
    pub fn keyframe_at(&self, time_ms: u64) -> Option<&Keyframe> {
        self.keyframes
            .iter()
            .rev()
            .find(|kf| kf.time_ms <= time_ms)
    }

    /// Number of keyframes
    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    /// True when no keyframes exist
    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }
}

/// A time-sliced piece of text with its effective emotion state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionSegment {
    /// Closed-open interval start
    pub start_ms: u64,
    /// Closed-open interval end
    pub end_ms: u64,
    /// Text fragment (one whitespace token)
    pub text: String,
    /// Effective emotion for synthesis
    pub emotion: EmotionProfile,
    /// Whether the interval lies inside a transition window
    pub is_transition: bool,
    /// Progress through the transition window, in [0,1]; 0 outside one
    pub progress: f32,
}

/// Result of compiling one line
#[derive(Debug, Clone)]
pub struct CompiledTimeline {
    pub timeline: EmotionTimeline,
    pub segments: Vec<EmotionSegment>,
    /// 180 wpm estimate; used only when no external timing is supplied
    pub total_duration_ms: u64,
    /// Count of transitions that survived validation
    pub transition_count: usize,
}

/// Compiles transitions and default emotions into segment sequences
#[derive(Debug, Clone, Default)]
pub struct TimelineEngine {
    limits: TransitionLimits,
}

impl TimelineEngine {
    pub fn new(limits: TransitionLimits) -> Self {
        Self { limits }
    }

    /// Estimate spoken duration of `text` at 180 wpm
    pub fn estimate_duration_ms(text: &str) -> u64 {
        let words = text.split_whitespace().count() as u64;
        (words as f64 * 60_000.0 / WORDS_PER_MINUTE as f64).round() as u64
    }

    /// Compile a line into its timeline and segments.
    ///
    /// Transitions failing validation or whose trigger does not occur in
    /// the text are dropped with a warning; the rest are positioned on
    /// the line's time axis and the text is sliced into one segment per
    /// whitespace token.
    pub fn compile(
        &self,
        text: &str,
        default_emotion: &EmotionProfile,
        transitions: &[EmotionTransition],
    ) -> CompiledTimeline {
        let mut accepted: Vec<(u64, EmotionTransition)> = Vec::new();
        for transition in transitions {
            if let Err(err) = self.limits.validate(transition) {
                warn!("dropping transition: {}", err);
                continue;
            }
            match transition.trigger.resolve_ms(text) {
                Some(t) => accepted.push((t, transition.clone())),
                None => {
                    warn!(
                        "dropping transition: trigger {:?} not found in text",
                        transition.trigger
                    );
                }
            }
        }

        let mut timeline = EmotionTimeline {
            keyframes: vec![Keyframe {
                time_ms: 0,
                emotion: default_emotion.clone(),
                transition: None,
            }],
        };
        for (idx, (start, transition)) in accepted.iter().enumerate() {
            timeline.keyframes.push(Keyframe {
                time_ms: *start,
                emotion: transition.from.clone(),
                transition: Some(idx),
            });
            timeline.keyframes.push(Keyframe {
                time_ms: start + transition.duration_ms,
                emotion: transition.to.clone(),
                transition: None,
            });
        }
        // stable: ties keep insertion order
        timeline.keyframes.sort_by_key(|kf| kf.time_ms);

        let total_duration_ms = Self::estimate_duration_ms(text);
        let segments = self.segment(text, &timeline, &accepted, total_duration_ms);

        CompiledTimeline {
            timeline,
            segments,
            total_duration_ms,
            transition_count: accepted.len(),
        }
    }

    /// Slice text into per-token segments carrying the emotion in force
    /// at each token's nominal time.
    fn segment(
        &self,
        text: &str,
        timeline: &EmotionTimeline,
        accepted: &[(u64, EmotionTransition)],
        total_duration_ms: u64,
    ) -> Vec<EmotionSegment> {
        let tokens = tokenize_with_offsets(text);
        if tokens.is_empty() {
            return Vec::new();
        }

        let times: Vec<u64> = tokens
            .iter()
            .map(|(offset, _)| (*offset as u64) * 1000 / CHARS_PER_SECOND)
            .collect();

        let mut segments = Vec::with_capacity(tokens.len());
        for (i, (_, token)) in tokens.iter().enumerate() {
            let start_ms = times[i];
            let end_ms = if i + 1 < times.len() {
                times[i + 1]
            } else {
                total_duration_ms.max(start_ms + 1)
            };

            let (emotion, is_transition, progress) =
                self.state_at(timeline, accepted, start_ms);

            segments.push(EmotionSegment {
                start_ms,
                end_ms,
                text: token.clone(),
                emotion,
                is_transition,
                progress,
            });
        }
        segments
    }

    /// Emotion state at a nominal time: the left keyframe's state, or an
    /// interpolated state when the time falls inside the keyframe's
    /// transition window.
    fn state_at(
        &self,
        timeline: &EmotionTimeline,
        accepted: &[(u64, EmotionTransition)],
        time_ms: u64,
    ) -> (EmotionProfile, bool, f32) {
        let keyframe = match timeline.keyframe_at(time_ms) {
            Some(kf) => kf,
            None => return (EmotionProfile::neutral(), false, 0.0),
        };

        if let Some(idx) = keyframe.transition {
            let (start, transition) = &accepted[idx];
            let end = start + transition.duration_ms;
            if time_ms >= *start && time_ms <= end {
                let progress =
                    (time_ms - start) as f32 / transition.duration_ms as f32;
                let eased = transition.ease(progress);
                let kind = if progress >= 0.5 {
                    transition.to.kind
                } else {
                    transition.from.kind
                };
                let intensity =
                    lerp(transition.from.intensity, transition.to.intensity, eased);
                return (EmotionProfile::new(kind, intensity), true, progress);
            }
        }
        (keyframe.emotion.clone(), false, 0.0)
    }
}

/// Whitespace tokens with their character offsets
fn tokenize_with_offsets(text: &str) -> Vec<(usize, String)> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut start = 0usize;
    for (idx, ch) in text.chars().enumerate() {
        if ch.is_whitespace() {
            if !current.is_empty() {
                tokens.push((start, std::mem::take(&mut current)));
            }
        } else {
            if current.is_empty() {
                start = idx;
            }
            current.push(ch);
        }
    }
    if !current.is_empty() {
        tokens.push((start, current));
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emotion::curves::TransitionCurve;
    use crate::emotion::profile::EmotionKind;
    use crate::emotion::transition::Trigger;

    fn engine() -> TimelineEngine {
        TimelineEngine::new(TransitionLimits::default())
    }

    #[test]
    fn test_first_keyframe_at_zero() {
        let compiled = engine().compile("hello world", &EmotionProfile::neutral(), &[]);
        assert_eq!(compiled.timeline.keyframes[0].time_ms, 0);
        assert_eq!(
            compiled.timeline.keyframes[0].emotion.kind,
            EmotionKind::Neutral
        );
    }

    #[test]
    fn test_keyframes_sorted() {
        let text = "I was calm, but then I became really excited!";
        let transitions = vec![EmotionTransition::new(
            EmotionProfile::new(EmotionKind::Calm, 0.6),
            EmotionProfile::new(EmotionKind::Excited, 0.9),
            1500,
            Trigger::Word("excited".to_string()),
        )
        .with_curve(TransitionCurve::EaseInOut)];

        let default = EmotionProfile::neutral();
        let compiled = engine().compile(text, &default, &transitions);

        assert!(compiled.timeline.len() >= 3);
        assert_eq!(compiled.transition_count, 1);
        let times: Vec<u64> = compiled
            .timeline
            .keyframes
            .iter()
            .map(|kf| kf.time_ms)
            .collect();
        let mut sorted = times.clone();
        sorted.sort_unstable();
        assert_eq!(times, sorted);

        let t_word = 37 * 1000 / 15;
        assert!(compiled
            .timeline
            .keyframes
            .iter()
            .any(|kf| kf.time_ms == t_word && kf.emotion.kind == EmotionKind::Calm));
        assert!(compiled.timeline.keyframes.iter().any(|kf| {
            kf.time_ms == t_word + 1500 && kf.emotion.kind == EmotionKind::Excited
        }));
    }

    #[test]
    fn test_segment_count_matches_token_count() {
        let text = "I was calm, but then I became really excited!";
        let compiled = engine().compile(text, &EmotionProfile::neutral(), &[]);
        assert_eq!(compiled.segments.len(), text.split_whitespace().count());
    }

    #[test]
    fn test_single_word_line() {
        let compiled = engine().compile("Hello", &EmotionProfile::neutral(), &[]);
        assert_eq!(compiled.segments.len(), 1);
        assert_eq!(compiled.segments[0].emotion.kind, EmotionKind::Neutral);
        // one word at 180 wpm is a third of a second
        assert_eq!(compiled.total_duration_ms, 333);
    }

    #[test]
    fn test_transition_segment_progress_in_bounds() {
        let text = "I was calm, but then I became really excited!";
        let transitions = vec![EmotionTransition::new(
            EmotionProfile::new(EmotionKind::Calm, 0.6),
            EmotionProfile::new(EmotionKind::Excited, 0.9),
            1500,
            Trigger::Word("then".to_string()),
        )];
        let compiled = engine().compile(text, &EmotionProfile::neutral(), &transitions);

        let inside: Vec<&EmotionSegment> = compiled
            .segments
            .iter()
            .filter(|s| s.is_transition)
            .collect();
        assert!(!inside.is_empty());
        for segment in inside {
            assert!(segment.progress >= 0.0 && segment.progress <= 1.0);
            assert!(segment.emotion.intensity >= 0.0 && segment.emotion.intensity <= 1.0);
        }
    }

    #[test]
    fn test_kind_switches_at_half_progress() {
        // transition positioned at t=0 spanning the whole line
        let text = "one two three four five six seven eight nine";
        let transitions = vec![EmotionTransition::new(
            EmotionProfile::new(EmotionKind::Calm, 0.2),
            EmotionProfile::new(EmotionKind::Angry, 0.9),
            3000,
            Trigger::TimeMs(0),
        )];
        let compiled = engine().compile(text, &EmotionProfile::neutral(), &transitions);

        for segment in &compiled.segments {
            if !segment.is_transition {
                continue;
            }
            if segment.progress < 0.5 {
                assert_eq!(segment.emotion.kind, EmotionKind::Calm);
            } else {
                assert_eq!(segment.emotion.kind, EmotionKind::Angry);
            }
        }
    }

    #[test]
    fn test_invalid_transition_dropped() {
        let text = "short line here";
        let transitions = vec![EmotionTransition::new(
            EmotionProfile::new(EmotionKind::Calm, 0.5),
            EmotionProfile::new(EmotionKind::Excited, 0.55),
            1000,
            Trigger::TimeMs(0),
        )];
        let compiled = engine().compile(text, &EmotionProfile::neutral(), &transitions);
        assert_eq!(compiled.transition_count, 0);
        assert_eq!(compiled.timeline.len(), 1);
    }

    #[test]
    fn test_missing_trigger_word_dropped() {
        let transitions = vec![EmotionTransition::new(
            EmotionProfile::new(EmotionKind::Calm, 0.2),
            EmotionProfile::new(EmotionKind::Excited, 0.9),
            1000,
            Trigger::Word("absent".to_string()),
        )];
        let compiled =
            engine().compile("nothing matches", &EmotionProfile::neutral(), &transitions);
        assert_eq!(compiled.transition_count, 0);
    }

    #[test]
    fn test_duration_estimate_180_wpm() {
        // 12 words -> 4 seconds
        let text = "a b c d e f g h i j k l";
        assert_eq!(TimelineEngine::estimate_duration_ms(text), 4000);
    }
}
