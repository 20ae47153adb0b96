//! Ride cymbal: band-passed noise over a high sine ping.

use super::common::VoiceContext;
use crate::envelopes::ExpDecay;
use crate::filters::Biquad;
use crate::oscillators::SineOscillator;
use crate::Signal;

pub(crate) fn render(ctx: &VoiceContext) -> Vec<f64> {
    let sr = ctx.sample_rate;

    let mut noise = ctx.bank_noise();
    let mut band = Biquad::bandpass(ctx.fundamental, 1.5, sr);
    let mut ping = SineOscillator::new(ctx.fundamental, sr);
    let mut env = ExpDecay::new(9.0, sr);
    let ping_gain = 0.3 + 0.2 * ctx.intensity;

    (0..ctx.len)
        .map(|_| {
            let wash = band.process(noise.next_sample()) * 1.5;
            let ping = ping.next_sample() * ping_gain;
            (wash + ping) * env.next_sample()
        })
        .collect()
}
