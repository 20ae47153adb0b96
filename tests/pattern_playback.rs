//! Stored pattern documents played and rendered end to end.

use beatcoach::render::bounce;
use beatcoach::sequencer::{ManualClock, MemorySink, Scheduler};
use beatcoach::pattern::MAX_HIT_OFFSET_SECONDS;
use beatcoach::{BeatPattern, DrumVoice, PatternDocument, SampleCache};
use std::sync::Arc;
use std::time::Duration;

const SAMPLE_RATE: u32 = 8000;

#[test]
fn test_legacy_document_plays_table_volumes() {
    let pattern = PatternDocument::from_json(r#"{"name": "classic", "bpm": 150, "pattern": [0, 1, 2, 3]}"#)
        .unwrap()
        .into_pattern()
        .unwrap();

    let clock = ManualClock::new();
    let sink = MemorySink::with_clock(clock.clone());
    let cache = Arc::new(SampleCache::new());
    cache.pregenerate_all(SAMPLE_RATE).unwrap();
    let mut scheduler = Scheduler::new(clock.clone(), sink.clone(), Arc::clone(&cache), SAMPLE_RATE);

    scheduler.start(pattern);
    // 150 BPM sixteenths are 100 ms apart
    for _ in 0..3 {
        assert_eq!(scheduler.poll(), Some(Duration::from_millis(100)));
        clock.advance(Duration::from_millis(100));
        scheduler.poll();
    }

    let gains: Vec<f32> = sink.played().iter().map(|hit| hit.gain).collect();
    assert_eq!(gains, vec![1.0, 0.45, 0.8, 0.4]);

    let hihat = cache.get(DrumVoice::Hihat, 127, SAMPLE_RATE).unwrap();
    assert!(Arc::ptr_eq(&sink.played()[1].buffer, &hihat));
}

#[test]
fn test_edited_document_round_trips_into_playback() {
    let mut pattern = BeatPattern::empty(100.0, 8).unwrap().with_swing(40.0);
    pattern.toggle(0, DrumVoice::Kick, 0.9).unwrap();
    pattern.toggle(4, DrumVoice::Snare, 0.7).unwrap();
    let mut doc = PatternDocument::from_pattern(&pattern, "coach groove");

    pattern.toggle(6, DrumVoice::OpenHihat, 0.5).unwrap();
    doc.update(&pattern);
    let stored = doc.to_json().unwrap();

    let loaded = PatternDocument::from_json(&stored).unwrap().into_pattern().unwrap();
    assert_eq!(loaded, pattern);
    assert!(loaded.step(6).unwrap().hit(DrumVoice::OpenHihat).is_some());
}

#[test]
fn test_bounce_of_loaded_document() {
    let pattern = PatternDocument::from_json(r#"{"bpm": 120, "pattern": [0, -1, 2, -1], "length": 4}"#)
        .unwrap()
        .into_pattern()
        .unwrap();
    let cache = SampleCache::new();
    let mix = bounce(&pattern, &cache, SAMPLE_RATE, 4).unwrap();

    // Four half-second loops plus the kick's tail
    assert_eq!(mix.len(), 4 * 4000 + 3200);
    assert!(mix.peak() > 0.0 && mix.peak() <= 1.0);
    // Only the layers the two voices needed were synthesized
    assert_eq!(cache.len(), 2);
}

#[test]
fn test_out_of_range_offsets_play_and_render() {
    let mut pattern = PatternDocument::from_json(
        r#"{"bpm": 120, "pattern": [
            [{"type": "kick", "volume": 1.0, "timeOffset": 1e300}],
            [{"type": "snare", "volume": 0.8, "timeOffset": -0.25}],
            [{"type": "hihat", "volume": 0.5}],
            []
        ]}"#,
    )
    .unwrap()
    .into_pattern()
    .unwrap();
    assert_eq!(
        pattern.step(0).unwrap().hit(DrumVoice::Kick).unwrap().time_offset(),
        Some(MAX_HIT_OFFSET_SECONDS)
    );
    assert_eq!(pattern.step(1).unwrap().hit(DrumVoice::Snare).unwrap().time_offset(), None);

    // Editor writes go through the same clamping
    assert!(pattern.set_offset(2, DrumVoice::Hihat, f64::NAN).unwrap());
    assert_eq!(pattern.step(2).unwrap().hit(DrumVoice::Hihat).unwrap().time_offset(), None);

    let clock = ManualClock::new();
    let sink = MemorySink::with_clock(clock.clone());
    let cache = Arc::new(SampleCache::new());
    let mut scheduler = Scheduler::new(clock.clone(), sink.clone(), Arc::clone(&cache), SAMPLE_RATE);
    scheduler.start(pattern.clone());
    for _ in 0..3 {
        let wait = scheduler.poll().unwrap();
        clock.advance(wait);
        scheduler.poll();
    }

    let offsets: Vec<Duration> = sink.played().iter().map(|hit| hit.offset).collect();
    assert_eq!(offsets, vec![Duration::from_secs(2), Duration::ZERO, Duration::ZERO]);

    // The capped kick starts two seconds in, well past the half-second loop
    let mix = bounce(&pattern, &cache, SAMPLE_RATE, 1).unwrap();
    let kick = cache.get(DrumVoice::Kick, 127, SAMPLE_RATE).unwrap();
    assert_eq!(mix.len(), 2 * SAMPLE_RATE as usize + kick.len());
    assert!(mix.samples()[2 * SAMPLE_RATE as usize..].iter().any(|&s| s != 0.0));
    assert!(mix.peak() > 0.0 && mix.peak() <= 1.0);
}
