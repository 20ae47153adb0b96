//! Tom: a single decaying sine.

use super::common::VoiceContext;
use crate::envelopes::ExpDecay;
use crate::oscillators::SineOscillator;
use crate::Signal;

pub(crate) fn render(ctx: &VoiceContext) -> Vec<f64> {
    let mut osc = SineOscillator::new(ctx.fundamental, ctx.sample_rate);
    // -60 dB at the end of the buffer regardless of its length
    let seconds = ctx.len as f64 / ctx.sample_rate;
    let mut env = ExpDecay::reaching(0.001, seconds, ctx.sample_rate);

    (0..ctx.len)
        .map(|_| osc.next_sample() * env.next_sample())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise::NoiseBank;
    use crate::voices::{DrumVoice, SynthesisParams};

    #[test]
    fn test_pure_tone_at_fundamental() {
        let bank = NoiseBank::default();
        let params = SynthesisParams::for_voice(DrumVoice::Tom, 127, 48000)
            .unwrap()
            .with_fundamental(100.0)
            .unwrap();
        let samples = render(&VoiceContext::new(DrumVoice::Tom, &params, &bank));

        // 100 Hz over 0.25 s is 25 cycles, 50 sign changes
        let crossings = samples
            .windows(2)
            .filter(|w| w[0] < 0.0 && w[1] >= 0.0 || w[0] >= 0.0 && w[1] < 0.0)
            .count();
        assert!((48..=51).contains(&crossings), "crossings {crossings}");
    }
}
