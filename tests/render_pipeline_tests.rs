//! Integration tests for the full render pipeline
//!
//! Exercises the documented end-to-end scenarios against an in-process
//! provider: prompt parsing, emotion timelines, multi-character
//! scheduling, overlaps, failure fallback, cancellation and mixer
//! determinism. No network is touched.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use voicestage::audio::pcm::ms_to_frame_floor;
use voicestage::engine::{
    ConversationScheduler, RenderOptions, RenderOutcome, TimelineEventKind, VoiceEngine,
};
use voicestage::plan::{Character, GlobalSettings, Line, LineTiming, Overlap};
use voicestage::provider::{
    ProviderRegistry, SpeechProvider, SynthesisRequest, VoiceDescriptor,
};
use voicestage::{
    CancelSource, CancelToken, EmotionKind, EmotionProfile, EmotionTransition, FailureKind,
    PcmBuffer, PromptInterpreter, RenderError, RenderPlan, Result, TransitionCurve, Trigger,
    WavCodec, CANONICAL_SAMPLE_RATE,
};

/// In-process provider: one third of a second of constant-amplitude
/// stereo audio per word, optional scripted failure, call counting.
struct HarnessProvider {
    name: String,
    emotive: bool,
    fail_on: Option<String>,
    delay_ms: u64,
    calls: Arc<AtomicUsize>,
}

impl HarnessProvider {
    fn boxed(name: &str, emotive: bool) -> Box<dyn SpeechProvider> {
        Box::new(Self {
            name: name.to_string(),
            emotive,
            fail_on: None,
            delay_ms: 0,
            calls: Arc::new(AtomicUsize::new(0)),
        })
    }

    fn failing_on(name: &str, needle: &str) -> Box<dyn SpeechProvider> {
        Box::new(Self {
            name: name.to_string(),
            emotive: true,
            fail_on: Some(needle.to_string()),
            delay_ms: 0,
            calls: Arc::new(AtomicUsize::new(0)),
        })
    }

    fn slow(name: &str, delay_ms: u64) -> Box<dyn SpeechProvider> {
        Box::new(Self {
            name: name.to_string(),
            emotive: true,
            fail_on: None,
            delay_ms,
            calls: Arc::new(AtomicUsize::new(0)),
        })
    }
}

#[async_trait]
impl SpeechProvider for HarnessProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn initialize(&mut self) -> Result<()> {
        Ok(())
    }

    async fn list_voices(&self) -> Result<Vec<VoiceDescriptor>> {
        Ok(vec![])
    }

    fn supports_emotions(&self) -> bool {
        self.emotive
    }

    fn supports_voice_cloning(&self) -> bool {
        false
    }

    fn supports_ssml(&self) -> bool {
        self.emotive
    }

    async fn synthesize(&self, request: &SynthesisRequest) -> Result<PcmBuffer> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
        }
        if let Some(ref needle) = self.fail_on {
            if request.text.contains(needle.as_str()) {
                return Err(RenderError::SynthesisFailed {
                    provider: self.name.clone(),
                    kind: FailureKind::Backend,
                    message: "scripted failure".to_string(),
                });
            }
        }
        let words = request.text.split_whitespace().count().max(1);
        let frames = words * CANONICAL_SAMPLE_RATE as usize / 3;
        Ok(PcmBuffer::new(
            vec![8000; frames * 2],
            CANONICAL_SAMPLE_RATE,
            2,
        ))
    }
}

async fn engine_with(providers: Vec<Box<dyn SpeechProvider>>) -> VoiceEngine {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let mut builder = ProviderRegistry::builder();
    for provider in providers {
        builder = builder.register(provider);
    }
    VoiceEngine::new(Arc::new(builder.build().await), Arc::new(WavCodec::new()))
}

fn words(n: usize) -> String {
    vec!["word"; n].join(" ")
}

// ==================== Prompt Parsing ====================

#[test]
fn prompt_parses_reference_description() {
    let spec =
        PromptInterpreter::parse("Young British female voice, cheerful and energetic, high pitch");
    assert_eq!(spec.gender, voicestage::Gender::Female);
    assert_eq!(spec.age, voicestage::AgeRange::Young);
    assert_eq!(spec.accent, voicestage::Accent::British);
    assert_eq!(spec.timbre, voicestage::Timbre::High);
    assert_eq!(spec.pace, voicestage::Pace::Normal);
    assert_eq!(
        spec.personality,
        vec![
            voicestage::PersonalityTag::Cheerful,
            voicestage::PersonalityTag::Energetic
        ]
    );
    assert_eq!(spec.default_emotion.kind, EmotionKind::Happy);
    assert!((spec.default_emotion.intensity - 0.5).abs() < f32::EPSILON);
}

// ==================== Emotion Timeline ====================

#[test]
fn single_transition_builds_expected_timeline() {
    let text = "I was calm, but then I became really excited!";
    let engine = voicestage::TimelineEngine::default();
    let transitions = vec![EmotionTransition::new(
        EmotionProfile::new(EmotionKind::Calm, 0.6),
        EmotionProfile::new(EmotionKind::Excited, 0.9),
        1500,
        Trigger::Word("excited".to_string()),
    )
    .with_curve(TransitionCurve::EaseInOut)];

    let compiled = engine.compile(text, &EmotionProfile::neutral(), &transitions);

    assert!(compiled.timeline.len() >= 3);
    assert_eq!(compiled.transition_count, 1);
    assert_eq!(compiled.segments.len(), text.split_whitespace().count());
    assert_eq!(compiled.timeline.keyframes[0].time_ms, 0);

    let t_word = 37 * 1000 / 15;
    let times: Vec<u64> = compiled.timeline.keyframes.iter().map(|k| k.time_ms).collect();
    assert!(times.contains(&t_word));
    assert!(times.contains(&(t_word + 1500)));

    for segment in &compiled.segments {
        assert!(segment.emotion.intensity >= 0.0 && segment.emotion.intensity <= 1.0);
        if segment.is_transition {
            assert!(segment.progress >= 0.0 && segment.progress <= 1.0);
        }
    }
}

// ==================== Scheduler ====================

fn three_line_plan() -> RenderPlan {
    RenderPlan::new()
        .with_character(Character::new("a", "Alice"))
        .with_character(Character::new("b", "Bob"))
        .with_line(Line::new("a1", "a", words(12)))
        .with_line(Line::new("b1", "b", words(8)))
        .with_line(Line::new("a2", "a", words(5)))
        .with_settings(GlobalSettings {
            pause_between_lines_ms: 500,
            ..Default::default()
        })
}

#[tokio::test]
async fn scheduler_places_alternating_speakers() {
    let engine = engine_with(vec![HarnessProvider::boxed("emo", true)]).await;
    let plan = three_line_plan();
    let registry = plan.registry();
    let scheduler = ConversationScheduler::new(&engine, &registry);
    let result = scheduler
        .render(&plan, &RenderOptions::default(), &CancelToken::never())
        .await
        .unwrap()
        .expect_completed();

    let starts: HashMap<String, u64> = result
        .timeline
        .events_of(TimelineEventKind::LineStart)
        .map(|e| (e.line_id.clone().unwrap(), e.time_ms))
        .collect();
    assert_eq!(starts["a1"], 0);
    assert_eq!(starts["b1"], 4500);
    assert_eq!(starts["a2"], 4500 + 2667 + 500);

    // every event references known ids
    for event in result.timeline.events() {
        if let Some(ref line_id) = event.line_id {
            assert!(plan.lines.iter().any(|l| &l.id == line_id));
        }
        if let Some(ref character_id) = event.character_id {
            assert!(plan.characters.iter().any(|c| &c.id == character_id));
        }
    }

    // track sample counts equal the sum of their segments
    for track in &result.tracks {
        let segment_frames: usize = track.segments.iter().map(|s| s.audio.frames()).sum();
        assert_eq!(track.buffer.frames(), segment_frames);
    }

    let a_duration: u64 = result.tracks[0].duration_ms();
    assert!((a_duration as i64 - (4000 + 1667)).abs() <= 2);
}

#[tokio::test]
async fn overlap_attenuates_target_on_master() {
    let engine = engine_with(vec![HarnessProvider::boxed("emo", true)]).await;
    let mut plan = three_line_plan();
    plan.lines[1].timing = LineTiming::default().with_overlap(Overlap {
        target_line_id: "a1".to_string(),
        offset_into_target_ms: 1000,
        overlap_duration_ms: 2000,
        volume_attenuation: 0.3,
    });
    let registry = plan.registry();
    let scheduler = ConversationScheduler::new(&engine, &registry);
    let result = scheduler
        .render(&plan, &RenderOptions::with_master(), &CancelToken::never())
        .await
        .unwrap()
        .expect_completed();

    let overlap_start = result
        .timeline
        .events_of(TimelineEventKind::OverlapStart)
        .next()
        .unwrap();
    assert_eq!(overlap_start.time_ms, 1000);
    assert_eq!(overlap_start.attenuation, Some(0.3));
    assert_eq!(
        result
            .timeline
            .events_of(TimelineEventKind::OverlapEnd)
            .next()
            .unwrap()
            .time_ms,
        3000
    );

    let master = result.master.unwrap();
    let sample_at = |ms: u64| master.samples()[ms_to_frame_floor(ms, CANONICAL_SAMPLE_RATE) * 2];
    // before the window: A alone at full amplitude
    assert_eq!(sample_at(500), 8000);
    // inside the window: A attenuated to 0.7 plus B at full amplitude
    assert_eq!(sample_at(2000), (8000f32 * 0.7) as i16 + 8000);
    // no sample escapes the clamp
    assert!(master.samples().iter().all(|&s| (-32768..=32767).contains(&(s as i32))));
}

// ==================== Failure Fallback ====================

#[tokio::test]
async fn failed_line_region_is_silent_and_counted() {
    let engine = engine_with(vec![HarnessProvider::failing_on("emo", "doomed")]).await;
    let plan = RenderPlan::new()
        .with_character(Character::new("a", "Alice"))
        .with_line(Line::new("ok", "a", "all is well here"))
        .with_line(Line::new("bad", "a", "doomed doomed doomed"));
    let registry = plan.registry();
    let scheduler = ConversationScheduler::new(&engine, &registry);
    let result = scheduler
        .render(&plan, &RenderOptions::with_master(), &CancelToken::never())
        .await
        .unwrap()
        .expect_completed();

    assert!(result.statistics.failed_segments >= 1);
    assert!(result.statistics.failures_by_kind.contains_key("backend"));

    let master = result.master.unwrap();
    assert_eq!(master.duration_ms(), result.statistics.total_duration_ms);

    let bad_start = result
        .timeline
        .events_of(TimelineEventKind::LineStart)
        .find(|e| e.line_id.as_deref() == Some("bad"))
        .unwrap()
        .time_ms;
    let idx = ms_to_frame_floor(bad_start + 100, CANONICAL_SAMPLE_RATE) * 2;
    assert_eq!(master.samples()[idx], 0);
}

#[tokio::test]
async fn no_provider_is_fatal_before_synthesis() {
    let engine = engine_with(vec![]).await;
    let plan = three_line_plan();
    let registry = plan.registry();
    let scheduler = ConversationScheduler::new(&engine, &registry);
    let err = scheduler
        .render(&plan, &RenderOptions::default(), &CancelToken::never())
        .await
        .unwrap_err();
    assert!(matches!(err, RenderError::NoProviderAvailable));
}

#[tokio::test]
async fn invalid_plan_is_fatal() {
    let engine = engine_with(vec![HarnessProvider::boxed("emo", true)]).await;
    let plan = RenderPlan::new()
        .with_character(Character::new("a", "Alice"))
        .with_line(Line::new("l1", "ghost", "who speaks?"));
    let registry = plan.registry();
    let scheduler = ConversationScheduler::new(&engine, &registry);
    let err = scheduler
        .render(&plan, &RenderOptions::default(), &CancelToken::never())
        .await
        .unwrap_err();
    assert!(matches!(err, RenderError::InvalidPlan { .. }));
}

// ==================== Empty Plan ====================

#[tokio::test]
async fn empty_plan_returns_zero_duration_master() {
    let engine = engine_with(vec![HarnessProvider::boxed("emo", true)]).await;
    let plan = RenderPlan::new().with_character(Character::new("a", "Alice"));
    let registry = plan.registry();
    let scheduler = ConversationScheduler::new(&engine, &registry);
    let result = scheduler
        .render(&plan, &RenderOptions::with_master(), &CancelToken::never())
        .await
        .unwrap()
        .expect_completed();
    assert_eq!(result.statistics.total_duration_ms, 0);
    assert_eq!(result.master.unwrap().duration_ms(), 0);
    assert!(result.tracks.is_empty());
}

// ==================== Cancellation ====================

#[tokio::test]
async fn cancellation_yields_distinct_outcome() {
    let engine = engine_with(vec![HarnessProvider::slow("emo", 40)]).await;
    let plan = three_line_plan();
    let registry = plan.registry();
    let scheduler = ConversationScheduler::new(&engine, &registry);
    let source = CancelSource::new();
    let token = source.token();

    let render_options = RenderOptions::default();
    let render = scheduler.render(&plan, &render_options, &token);
    tokio::pin!(render);
    tokio::time::sleep(std::time::Duration::from_millis(15)).await;
    source.cancel();
    let outcome = render.await.unwrap();
    assert!(matches!(outcome, RenderOutcome::Cancelled));
}

// ==================== Determinism ====================

#[tokio::test]
async fn rendering_twice_is_bit_identical() {
    let plan = three_line_plan();

    let mut masters = Vec::new();
    for _ in 0..2 {
        let engine = engine_with(vec![HarnessProvider::boxed("emo", true)]).await;
        let registry = plan.registry();
        let scheduler = ConversationScheduler::new(&engine, &registry);
        let result = scheduler
            .render(&plan, &RenderOptions::with_master(), &CancelToken::never())
            .await
            .unwrap()
            .expect_completed();
        masters.push(result.master.unwrap());
    }
    assert_eq!(masters[0], masters[1]);
}

// ==================== Batch ====================

#[tokio::test]
async fn batch_failures_align_with_inputs() {
    let engine = engine_with(vec![HarnessProvider::failing_on("emo", "doomed")]).await;
    let requests = vec![
        voicestage::SpeakRequest::new("fine here"),
        voicestage::SpeakRequest::new("doomed words"),
        voicestage::SpeakRequest::new("fine again"),
    ];
    let results = engine.speak_batch(&requests).await;
    assert_eq!(results.len(), 3);
    assert!(!results[0].is_empty());
    assert!(results[1].is_empty());
    assert!(!results[2].is_empty());
}
