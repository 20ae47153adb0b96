//! Offline rendering of a pattern into one buffer.

use crate::buffer::SampleBuffer;
use crate::cache::SampleCache;
use crate::error::SynthError;
use crate::pattern::BeatPattern;
use std::sync::Arc;

/// Mixes `loops` passes of `pattern` into a single buffer.
///
/// Each hit is placed at its grid time plus swing and its own offset, using
/// the velocity layer `SampleCache::layer_for_volume` picks for it. The
/// buffer runs one loop length per pass plus the longest hit's ring-out,
/// stretched further if an offset hit ends later, and is peak-limited to 1.0.
///
/// # Errors
///
/// `InvalidSampleRate` when `sample_rate` cannot be synthesized.
///
/// # Examples
///
/// ```
/// use beatcoach::render::bounce;
/// use beatcoach::{BeatPattern, DrumVoice, PatternStep, SampleCache};
///
/// let mut pattern = BeatPattern::empty(120.0, 4).unwrap();
/// pattern.set_step(0, PatternStep::of(&[(DrumVoice::Kick, 0.8)])).unwrap();
///
/// let mix = bounce(&pattern, &SampleCache::new(), 8000, 2).unwrap();
/// // Two half-second loops plus the kick's 0.4 s tail
/// assert_eq!(mix.len(), 8000 + 3200);
/// assert!(mix.peak() <= 1.0);
/// ```
pub fn bounce(
    pattern: &BeatPattern,
    cache: &SampleCache,
    sample_rate: u32,
    loops: usize,
) -> Result<SampleBuffer, SynthError> {
    let rate = f64::from(sample_rate);
    let interval = pattern.step_interval().as_secs_f64();

    let mut placed: Vec<(Arc<SampleBuffer>, usize, f32)> = Vec::new();
    for pass in 0..loops {
        for (index, step) in pattern.steps().iter().enumerate() {
            let grid = (pass * pattern.len() + index) as f64 * interval;
            let swing = pattern.swing_offset(index).as_secs_f64();
            for hit in step.audible() {
                let (velocity, gain) = cache.layer_for_volume(hit.volume());
                let buffer = cache.pregenerate(hit.voice(), u32::from(velocity), sample_rate)?;
                let start = ((grid + swing + hit.offset_seconds()) * rate).round() as usize;
                placed.push((buffer, start, gain));
            }
        }
    }

    let body = (pattern.loop_duration().as_secs_f64() * loops as f64 * rate).round() as usize;
    let tail = placed.iter().map(|(b, _, _)| b.len()).max().unwrap_or(0);
    let last_end = placed.iter().map(|(b, start, _)| start + b.len()).max().unwrap_or(0);
    let len = if loops == 0 { 0 } else { (body + tail).max(last_end) };

    let mut mix = SampleBuffer::silence(len, sample_rate);
    for (buffer, start, gain) in &placed {
        mix.mix_in(buffer.samples(), *start, *gain);
    }
    mix.limit_peak();
    log::debug!(
        "bounced {} hits over {} loops into {:.2} s",
        placed.len(),
        loops,
        mix.duration_seconds()
    );
    Ok(mix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::{DrumHit, PatternStep};
    use crate::voices::DrumVoice;

    const SAMPLE_RATE: u32 = 8000;

    #[test]
    fn test_zero_loops_is_empty() {
        let pattern = BeatPattern::empty(120.0, 4).unwrap();
        let mix = bounce(&pattern, &SampleCache::new(), SAMPLE_RATE, 0).unwrap();
        assert!(mix.is_empty());
    }

    #[test]
    fn test_rests_render_silence() {
        let pattern = BeatPattern::empty(120.0, 8).unwrap();
        let mix = bounce(&pattern, &SampleCache::new(), SAMPLE_RATE, 1).unwrap();
        assert_eq!(mix.len(), 8000);
        assert_eq!(mix.peak(), 0.0);
    }

    #[test]
    fn test_hit_lands_on_its_step() {
        let mut pattern = BeatPattern::empty(120.0, 4).unwrap();
        pattern
            .set_step(2, PatternStep::of(&[(DrumVoice::Snare, 1.0)]))
            .unwrap();
        let mix = bounce(&pattern, &SampleCache::new(), SAMPLE_RATE, 1).unwrap();

        // Step 2 starts at 250 ms = sample 2000
        let samples = mix.samples();
        assert!(samples[..2000].iter().all(|&s| s == 0.0));
        assert!(samples[2000..2400].iter().any(|&s| s != 0.0));
    }

    #[test]
    fn test_swing_and_offset_shift_hits() {
        let mut pattern = BeatPattern::empty(120.0, 4).unwrap().with_swing(100.0);
        let late = DrumHit::new(DrumVoice::Rimshot, 1.0).with_offset(0.01);
        pattern.set_step(1, PatternStep::from_hits([late])).unwrap();
        let mix = bounce(&pattern, &SampleCache::new(), SAMPLE_RATE, 1).unwrap();

        // 125 ms grid + 37.5 ms swing + 10 ms offset = 172.5 ms = sample 1380
        let first = mix.samples().iter().position(|&s| s != 0.0).unwrap();
        assert!((1380..1400).contains(&first), "first sound at {}", first);
    }

    #[test]
    fn test_invalid_rate_is_reported() {
        let mut pattern = BeatPattern::empty(120.0, 4).unwrap();
        pattern
            .set_step(0, PatternStep::of(&[(DrumVoice::Kick, 1.0)]))
            .unwrap();
        let result = bounce(&pattern, &SampleCache::new(), 0, 1);
        assert!(matches!(result, Err(SynthError::InvalidSampleRate(0))));
    }
}
