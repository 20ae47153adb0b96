//! Rimshot: a very short noise crack plus a tuned tone and its octave.

use super::common::VoiceContext;
use crate::envelopes::{Adsr, Curve, ExpDecay};
use crate::oscillators::SineOscillator;
use crate::Signal;

pub(crate) fn render(ctx: &VoiceContext) -> Vec<f64> {
    let sr = ctx.sample_rate;
    let f = ctx.fundamental;

    let mut crack = ctx.white(1);
    let mut crack_env = ExpDecay::reaching(0.001, 0.008, sr);

    let mut tone = SineOscillator::new(f, sr);
    let mut octave = SineOscillator::new(ctx.tuned(f * 2.0), sr);

    // Near-instant attack, then gone within about 40 ms
    let mut env = Adsr::new(0.0002, 0.035, 0.0, 0.005, sr)
        .with_hold(0.04)
        .with_decay_curve(Curve::Logarithmic(3.0));
    env.note_on();

    let crack_gain = 0.5 + 0.3 * ctx.intensity;

    (0..ctx.len)
        .map(|_| {
            let crack = crack.next_sample() * crack_env.next_sample() * crack_gain;
            let tone = (tone.next_sample() + 0.5 * octave.next_sample()) * env.next_sample();
            crack + tone
        })
        .collect()
}
