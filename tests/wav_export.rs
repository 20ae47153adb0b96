#![cfg(feature = "wav-export")]

use beatcoach::render::bounce;
use beatcoach::{BeatPattern, DrumVoice, PatternStep, SampleCache};

#[test]
fn test_bounced_pattern_writes_readable_wav() {
    let mut pattern = BeatPattern::empty(120.0, 4).unwrap();
    pattern
        .set_step(0, PatternStep::of(&[(DrumVoice::Kick, 1.0), (DrumVoice::Hihat, 0.5)]))
        .unwrap();
    let mix = bounce(&pattern, &SampleCache::new(), 22050, 1).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("groove.wav");
    mix.write_wav(&path).unwrap();

    let mut reader = hound::WavReader::open(&path).unwrap();
    let spec = reader.spec();
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.sample_rate, 22050);
    let samples: Vec<f32> = reader.samples::<f32>().map(Result::unwrap).collect();
    assert_eq!(samples, mix.samples());
}
