//! Closed and open hi-hats: filtered pink noise with shimmer.

use super::common::VoiceContext;
use crate::envelopes::ExpDecay;
use crate::filters::Biquad;
use crate::oscillators::SineOscillator;
use crate::Signal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Hat {
    Closed,
    Open,
}

impl Hat {
    /// Amplitude decay rate; harder hits choke faster on the closed hat and
    /// ring slightly shorter on the open one.
    fn decay_rate(self, intensity: f64) -> f64 {
        match self {
            Hat::Closed => 40.0 + 30.0 * intensity,
            Hat::Open => 6.0 + 4.0 * intensity,
        }
    }
}

pub(crate) fn render(ctx: &VoiceContext, hat: Hat) -> Vec<f64> {
    let sr = ctx.sample_rate;

    let mut noise = ctx.pink(1);
    let mut highpass = Biquad::highpass(ctx.tuned(6000.0), 0.707, sr);
    let mut env = ExpDecay::new(hat.decay_rate(ctx.intensity), sr);

    let mut warmth = SineOscillator::new(ctx.fundamental, sr);

    // Slow amplitude wobble, 5-15 Hz
    let mut shimmer = SineOscillator::new(5.0 + 10.0 * ctx.intensity, sr);

    (0..ctx.len)
        .map(|_| {
            let hiss = highpass.process(noise.next_sample()) * 4.0;
            let body = warmth.next_sample() * 0.08;
            let wobble = 1.0 - 0.25 * (0.5 + 0.5 * shimmer.next_sample());
            (hiss + body) * env.next_sample() * wobble
        })
        .collect()
}
