//! Conversation scheduling
//!
//! Turns a validated render plan into per-character tracks, a sorted
//! conversation timeline, statistics, and optionally a mixed master.
//! Line timing is computed up front; synthesis failures substitute
//! silence and are recorded, never fatal. The scheduler borrows the
//! voice engine and character registry for the duration of one render;
//! neither owns the other.

use std::collections::HashMap;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::audio::codec::FilterSpec;
use crate::audio::mixer::{MixContext, Mixer, MixerOptions, OverlapWindow};
use crate::audio::pcm::PcmBuffer;
use crate::audio::track::{AudioSegment, CharacterTrack};
use crate::core::cancel::CancelToken;
use crate::core::error::{FailureKind, RenderError, Result};
use crate::emotion::TimelineEngine;
use crate::plan::{CharacterRegistry, Line, RenderPlan};
use crate::scene::{SceneContext, SceneHints, SceneRecommender};

use super::timeline::{ConversationTimeline, TimelineEvent, TimelineEventKind};
use super::voice_engine::VoiceEngine;

/// Per-render options beyond the plan itself
#[derive(Debug, Clone, Default)]
pub struct RenderOptions {
    /// Mix a master buffer in addition to the per-character tracks
    pub build_master: bool,
    /// Mixer configuration; a zero crossfade inherits the plan's
    /// `crossfade_ms`
    pub mixer: MixerOptions,
    /// Scene to adapt delivery to
    pub scene: Option<SceneContext>,
}

impl RenderOptions {
    pub fn with_master() -> Self {
        Self {
            build_master: true,
            ..Default::default()
        }
    }
}

/// Render statistics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenderStatistics {
    pub total_lines: usize,
    pub total_characters: usize,
    pub total_duration_ms: u64,
    /// Sum of (end − start) per character
    pub speaking_time_ms: HashMap<String, u64>,
    /// Line count per emotion kind name
    pub emotion_distribution: HashMap<String, usize>,
    /// Lines carrying an overlap directive
    pub overlapping_lines: usize,
    /// max(0, total − Σ speaking time)
    pub silence_ms: u64,
    /// Segments substituted with silence
    pub failed_segments: usize,
    /// Failure counts by kind name
    pub failures_by_kind: HashMap<String, usize>,
    /// Wall-clock processing time
    pub processing_ms: u64,
}

/// Everything a completed render produces
#[derive(Debug, Clone)]
pub struct RenderResult {
    pub tracks: Vec<CharacterTrack>,
    pub timeline: ConversationTimeline,
    pub statistics: RenderStatistics,
    /// Present when a master was requested
    pub master: Option<PcmBuffer>,
    /// Scene hints that shaped the render
    pub scene_hints: Option<SceneHints>,
}

/// Outcome distinguishing cancellation from completion. Cancellation
/// is neither success nor error: partial buffers are dropped.
#[derive(Debug)]
pub enum RenderOutcome {
    Completed(Box<RenderResult>),
    Cancelled,
}

impl RenderOutcome {
    /// Unwrap a completed render, panicking on cancellation. Test
    /// convenience.
    pub fn expect_completed(self) -> RenderResult {
        match self {
            RenderOutcome::Completed(result) => *result,
            RenderOutcome::Cancelled => panic!("render was cancelled"),
        }
    }
}

/// One line placed on the master timeline
#[derive(Debug, Clone)]
struct ScheduledLine {
    index: usize,
    start_ms: u64,
    end_ms: u64,
}

/// Schedules and renders one conversation at a time. Borrows its
/// collaborators; construct per render call.
pub struct ConversationScheduler<'a> {
    engine: &'a VoiceEngine,
    registry: &'a CharacterRegistry,
}

impl<'a> ConversationScheduler<'a> {
    pub fn new(engine: &'a VoiceEngine, registry: &'a CharacterRegistry) -> Self {
        Self { engine, registry }
    }

    /// Render a plan to tracks, timeline and statistics. Cancellable at
    /// every provider call.
    pub async fn render(
        &self,
        plan: &RenderPlan,
        options: &RenderOptions,
        cancel: &CancelToken,
    ) -> Result<RenderOutcome> {
        let started = Instant::now();
        plan.validate()?;
        if self.engine.registry().is_empty() {
            return Err(RenderError::NoProviderAvailable);
        }
        for line in &plan.lines {
            if !self.registry.contains(&line.character_id) {
                return Err(RenderError::InvalidPlan {
                    reason: format!(
                        "registry is missing character '{}'",
                        line.character_id
                    ),
                });
            }
        }

        let schedule = self.compute_timings(plan);
        let scene_hints = options.scene.as_ref().map(SceneRecommender::recommend);

        let mut timeline = ConversationTimeline::new();
        let mut segments: Vec<AudioSegment> = Vec::new();
        let mut statistics = RenderStatistics {
            total_lines: plan.lines.len(),
            total_characters: self.registry.len(),
            ..Default::default()
        };

        for scheduled in &schedule {
            if cancel.is_cancelled() {
                info!("render cancelled, dropping partial buffers");
                return Ok(RenderOutcome::Cancelled);
            }
            let line = &plan.lines[scheduled.index];
            let character = self
                .registry
                .get(&line.character_id)
                .expect("validated above");

            let synthesis = tokio::select! {
                _ = cancel.cancelled() => {
                    info!("render cancelled mid-synthesis, dropping partial buffers");
                    return Ok(RenderOutcome::Cancelled);
                }
                result = self.engine.synthesize_line(character, line, scene_hints.as_ref()) => result,
            };

            let duration = scheduled.end_ms.saturating_sub(scheduled.start_ms);
            let (audio, failures, full_fallback) = match synthesis {
                Ok(synthesis) => {
                    let full = !synthesis.compiled.segments.is_empty()
                        && synthesis.failures.len() == synthesis.compiled.segments.len();
                    self.push_emotion_events(
                        &mut timeline,
                        scheduled,
                        line,
                        &synthesis.compiled,
                    );
                    (synthesis.audio, synthesis.failures, full)
                }
                Err(err) => {
                    warn!(line = %line.id, error = %err, "line synthesis failed, substituting silence");
                    (
                        PcmBuffer::silence(duration),
                        vec![FailureKind::Backend],
                        true,
                    )
                }
            };

            statistics.failed_segments += failures.len();
            for kind in &failures {
                *statistics
                    .failures_by_kind
                    .entry(kind.name().to_string())
                    .or_insert(0) += 1;
            }

            let mut start_event = TimelineEvent::new(
                scheduled.start_ms,
                TimelineEventKind::LineStart,
            )
            .line(&line.id)
            .character(&line.character_id);
            if full_fallback {
                start_event = start_event.note("synthesis fallback: zero-filled buffer");
            }
            timeline.push(start_event);
            timeline.push(
                TimelineEvent::new(scheduled.end_ms, TimelineEventKind::LineEnd)
                    .line(&line.id)
                    .character(&line.character_id),
            );

            *statistics
                .speaking_time_ms
                .entry(line.character_id.clone())
                .or_insert(0) += duration;

            let emotion_kind = line
                .emotion
                .as_ref()
                .map(|e| e.kind)
                .unwrap_or(character.default_emotion.kind);
            *statistics
                .emotion_distribution
                .entry(emotion_kind.name().to_string())
                .or_insert(0) += 1;

            segments.push(AudioSegment {
                line_id: line.id.clone(),
                character_id: line.character_id.clone(),
                start_ms: scheduled.start_ms,
                audio,
                gain_db: line.effects.as_ref().map(|e| e.gain_db).unwrap_or(0.0),
                fallback: full_fallback,
            });
        }

        self.push_overlap_events(&mut timeline, plan, &schedule, &mut statistics);

        let total_ms = schedule.iter().map(|s| s.end_ms).max().unwrap_or(0);
        timeline.total_ms = total_ms;
        timeline.speaking_time_ms = statistics.speaking_time_ms.clone();
        timeline.finish();

        statistics.total_duration_ms = total_ms;
        let spoken: u64 = statistics.speaking_time_ms.values().sum();
        statistics.silence_ms = total_ms.saturating_sub(spoken);

        // group segments by character, preserving plan character order
        let mut tracks = Vec::new();
        for character in self.registry.iter() {
            let own: Vec<AudioSegment> = segments
                .iter()
                .filter(|s| s.character_id == character.id)
                .cloned()
                .collect();
            if !own.is_empty() {
                tracks.push(CharacterTrack::from_segments(character.id.clone(), own));
            }
        }

        let master = if options.build_master {
            Some(self.mix_master(plan, options, &tracks, &timeline, scene_hints.as_ref())?)
        } else {
            None
        };

        statistics.processing_ms = started.elapsed().as_millis() as u64;
        info!(
            lines = statistics.total_lines,
            duration_ms = statistics.total_duration_ms,
            failed_segments = statistics.failed_segments,
            "render complete"
        );

        Ok(RenderOutcome::Completed(Box::new(RenderResult {
            tracks,
            timeline,
            statistics,
            master,
            scene_hints,
        })))
    }

    /// Compute line placement per the timing rules: text-estimated
    /// durations, pause defaults, explicit overrides, and overlap
    /// anchoring with the cursor advancing from the non-overlapping
    /// end.
    fn compute_timings(&self, plan: &RenderPlan) -> Vec<ScheduledLine> {
        let mut schedule: Vec<ScheduledLine> = Vec::with_capacity(plan.lines.len());
        let mut by_id: HashMap<&str, usize> = HashMap::new();
        let mut cursor: u64 = 0;

        for (index, line) in plan.lines.iter().enumerate() {
            let natural_ms = TimelineEngine::estimate_duration_ms(&line.text);
            if !plan.settings.natural_timing && line.timing.end_ms.is_none() {
                warn!(
                    line = %line.id,
                    "natural timing disabled but line has no explicit end, estimating anyway"
                );
            }
            let speed = line.timing.speed_multiplier.unwrap_or(1.0) as f64;
            let duration = (natural_ms as f64 / speed).round() as u64;

            let pause_before = line.timing.pause_before_ms.unwrap_or(if index == 0 {
                0
            } else {
                plan.settings.pause_between_lines_ms
            });
            let default_start = cursor + pause_before;
            let mut start = line.timing.start_ms.unwrap_or(default_start);
            let mut overlapped = false;

            if let Some(ref overlap) = line.timing.overlap {
                if let Some(&target_index) = by_id.get(overlap.target_line_id.as_str()) {
                    let target = &schedule[target_index];
                    let anchored = target.start_ms + overlap.offset_into_target_ms;
                    let legacy = target.end_ms + overlap.offset_into_target_ms;
                    if legacy != anchored {
                        warn!(
                            line = %line.id,
                            target = %overlap.target_line_id,
                            start_anchored = anchored,
                            end_anchored = legacy,
                            "overlap interpretations differ, anchoring to the target's start"
                        );
                    }
                    start = anchored;
                    overlapped = true;
                } else {
                    warn!(
                        line = %line.id,
                        target = %overlap.target_line_id,
                        "overlap target is scheduled later, keeping computed start"
                    );
                }
            }

            let end = line.timing.end_ms.unwrap_or(start + duration);

            // overlap overrides placement but not the cursor, which
            // advances from where the line would otherwise have ended
            let cursor_end = if overlapped {
                line.timing.end_ms.unwrap_or(default_start + duration)
            } else {
                end
            };
            cursor = cursor_end + line.timing.pause_after_ms;

            by_id.insert(line.id.as_str(), index);
            schedule.push(ScheduledLine {
                index,
                start_ms: start,
                end_ms: end,
            });
        }
        schedule
    }

    /// Emit emotion_change events for keyframes past the line start
    fn push_emotion_events(
        &self,
        timeline: &mut ConversationTimeline,
        scheduled: &ScheduledLine,
        line: &Line,
        compiled: &crate::emotion::CompiledTimeline,
    ) {
        let window = scheduled.end_ms.saturating_sub(scheduled.start_ms);
        for keyframe in &compiled.timeline.keyframes {
            if keyframe.time_ms == 0 || keyframe.time_ms > window {
                continue;
            }
            timeline.push(
                TimelineEvent::new(
                    scheduled.start_ms + keyframe.time_ms,
                    TimelineEventKind::EmotionChange,
                )
                .line(&line.id)
                .character(&line.character_id)
                .emotion(keyframe.emotion.kind),
            );
        }
    }

    /// Emit overlap events and collect attenuation windows targeting
    /// the overlapped character
    fn push_overlap_events(
        &self,
        timeline: &mut ConversationTimeline,
        plan: &RenderPlan,
        schedule: &[ScheduledLine],
        statistics: &mut RenderStatistics,
    ) {
        let mut by_id: HashMap<&str, usize> = HashMap::new();
        for scheduled in schedule {
            by_id.insert(plan.lines[scheduled.index].id.as_str(), scheduled.index);
        }

        for scheduled in schedule {
            let line = &plan.lines[scheduled.index];
            let Some(ref overlap) = line.timing.overlap else {
                continue;
            };
            statistics.overlapping_lines += 1;
            let Some(&target_index) = by_id.get(overlap.target_line_id.as_str()) else {
                continue;
            };
            let target_line = &plan.lines[target_index];
            let target = schedule
                .iter()
                .find(|s| s.index == target_index)
                .expect("schedule covers all lines");

            let window_start = target.start_ms + overlap.offset_into_target_ms;
            let window_end = window_start + overlap.overlap_duration_ms;

            timeline.push(
                TimelineEvent::new(window_start, TimelineEventKind::OverlapStart)
                    .line(&line.id)
                    .character(&target_line.character_id)
                    .attenuation(overlap.volume_attenuation),
            );
            timeline.push(
                TimelineEvent::new(window_end, TimelineEventKind::OverlapEnd)
                    .line(&line.id)
                    .character(&target_line.character_id),
            );
            timeline.overlaps.push(OverlapWindow {
                character_id: target_line.character_id.clone(),
                start_ms: window_start,
                end_ms: window_end,
                attenuation: overlap.volume_attenuation,
            });
        }
    }

    /// Mix the master and apply scene EQ through the codec collaborator
    fn mix_master(
        &self,
        plan: &RenderPlan,
        options: &RenderOptions,
        tracks: &[CharacterTrack],
        timeline: &ConversationTimeline,
        scene_hints: Option<&SceneHints>,
    ) -> Result<PcmBuffer> {
        let mut mixer_options = options.mixer.clone();
        if mixer_options.crossfade_ms == 0 {
            mixer_options.crossfade_ms = plan.settings.crossfade_ms as u32;
        }
        let crossfade = mixer_options.crossfade_ms;
        let mixer = Mixer::new(mixer_options)?;

        let context = MixContext {
            total_ms: timeline.total_ms,
            overlaps: timeline.overlaps.clone(),
            speaker_changes: if crossfade > 0 {
                timeline.speaker_changes()
            } else {
                Vec::new()
            },
            master_volume: plan.settings.master_volume,
        };
        let mut master = mixer.mix(tracks, &context)?;

        if let Some(hints) = scene_hints {
            if hints.eq_tilt_db.abs() > 0.05 && !master.is_empty() {
                master = self
                    .engine
                    .codec()
                    .filter(&master, &FilterSpec::EqTilt { db: hints.eq_tilt_db })?;
            }
        }
        Ok(master)
    }
}
