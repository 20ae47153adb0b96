//! Kick drum: pitch-dropping sine, beater click, sub layer and soft saturation.

use super::common::VoiceContext;
use crate::envelopes::ExpDecay;
use crate::oscillators::{Oscillator, SineOscillator};
use crate::Signal;

/// The body starts this many times above the fundamental (150 Hz for 45 Hz).
const SWEEP_RATIO: f64 = 150.0 / 45.0;
/// Pitch envelope rate; the drop settles within a few tens of milliseconds.
const SWEEP_RATE: f64 = 30.0;

pub(crate) fn render(ctx: &VoiceContext) -> Vec<f64> {
    let sr = ctx.sample_rate;
    let start = ctx.tuned(ctx.fundamental * SWEEP_RATIO);
    let end = ctx.fundamental;

    let mut body = SineOscillator::new(start, sr);
    let mut sweep = ExpDecay::new(SWEEP_RATE, sr);
    let mut body_env = ExpDecay::new(7.0, sr);

    let mut sub = SineOscillator::new(end, sr);
    let mut sub_env = ExpDecay::new(5.0, sr);

    let mut click = ctx.bank_noise();
    let mut click_env = ExpDecay::reaching(0.001, 0.008, sr);
    let click_gain = 0.15 + 0.25 * ctx.intensity;

    // Harder hits drive the saturator harder
    let drive = 1.5 + 1.5 * ctx.intensity;
    let makeup = 1.0 / drive.tanh();

    (0..ctx.len)
        .map(|_| {
            body.set_frequency(end + (start - end) * sweep.next_sample());
            let thud = body.next_sample() * body_env.next_sample();
            let weight = sub.next_sample() * sub_env.next_sample() * 0.4;
            let beater = click.next_sample() * click_env.next_sample() * click_gain;
            (drive * (thud + weight + beater)).tanh() * makeup
        })
        .collect()
}
