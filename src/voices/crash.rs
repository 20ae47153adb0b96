//! Crash cymbal: long pink-noise wash over a downward-sweeping FM tone.

use super::common::VoiceContext;
use crate::envelopes::ExpDecay;
use crate::filters::OnePole;
use crate::oscillators::{FmOperator, Oscillator, SineOscillator};
use crate::Signal;

/// Inharmonic modulator ratio for the bell-like FM partials.
const FM_RATIO: f64 = 1.47;
/// The FM tone ends this fraction below where it started.
const SWEEP_DEPTH: f64 = 0.3;

pub(crate) fn render(ctx: &VoiceContext) -> Vec<f64> {
    let sr = ctx.sample_rate;
    let len = ctx.len as f64;
    let f = ctx.fundamental;

    let mut wash = ctx.pink(1);
    let mut wash_env = ExpDecay::new(4.0, sr);

    let mut tone = FmOperator::new(f, FM_RATIO, 2.0 + ctx.intensity, sr);
    let mut tone_env = ExpDecay::new(3.0, sr);

    let mut sizzle = ctx.white(2);
    let mut sizzle_filter = OnePole::new(8000.0, sr);
    let mut sizzle_env = ExpDecay::new(8.0, sr);
    let sizzle_gain = 0.2 + 0.3 * ctx.intensity;

    let mut body = SineOscillator::new(f * 0.5, sr);
    let mut body_env = ExpDecay::new(12.0, sr);

    (0..ctx.len)
        .map(|i| {
            tone.set_frequency(f * (1.0 - SWEEP_DEPTH * i as f64 / len));
            let wash = wash.next_sample() * 2.0 * wash_env.next_sample();
            let tone = tone.next_sample() * 0.3 * tone_env.next_sample();
            let sizzle =
                sizzle_filter.highpass(sizzle.next_sample()) * sizzle_gain * sizzle_env.next_sample();
            let body = body.next_sample() * 0.2 * body_env.next_sample();
            wash + tone + sizzle + body
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise::NoiseBank;
    use crate::voices::{DrumVoice, SynthesisParams};

    #[test]
    fn test_long_tail() {
        let bank = NoiseBank::default();
        let params = SynthesisParams::for_voice(DrumVoice::Crash, 127, 22050).unwrap();
        let samples = render(&VoiceContext::new(DrumVoice::Crash, &params, &bank));
        assert_eq!(samples.len(), 22050);

        // Still clearly ringing half way through
        let rms = |s: &[f64]| (s.iter().map(|x| x * x).sum::<f64>() / s.len() as f64).sqrt();
        let head = rms(&samples[..2205]);
        let middle = rms(&samples[11025..13230]);
        assert!(middle > head * 0.05);
        assert!(middle < head);
    }
}
