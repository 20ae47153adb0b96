//! Snare drum: harmonic tone, noise snap, wire rattle and a metallic transient.

use super::common::VoiceContext;
use crate::envelopes::ExpDecay;
use crate::filters::Biquad;
use crate::oscillators::SineOscillator;
use crate::Signal;

/// The snap burst is gone (-60 dB) after this long.
const SNAP_SECONDS: f64 = 0.01;

pub(crate) fn render(ctx: &VoiceContext) -> Vec<f64> {
    let sr = ctx.sample_rate;
    let f = ctx.fundamental;

    let mut partials = [
        (SineOscillator::new(f, sr), 1.0),
        (SineOscillator::new(ctx.tuned(f * 2.0), sr), 0.5),
        (SineOscillator::new(ctx.tuned(f * 3.0), sr), 0.25),
    ];
    let mut tone_env = ExpDecay::new(25.0, sr);

    let mut snap = ctx.white(1);
    let mut snap_env = ExpDecay::reaching(0.001, SNAP_SECONDS, sr);

    // Wires ring a little longer and a little darker than the snap
    let mut wires = ctx.white(2);
    let mut wire_filter = Biquad::highpass(ctx.tuned(1500.0), 0.707, sr);
    let mut wire_env = ExpDecay::new(30.0, sr);
    let wire_gain = 0.25 + 0.2 * ctx.intensity;

    // Metallic ping somewhere in 4-4.7 kHz depending on how hard it was hit
    let mut metal = SineOscillator::new(ctx.tuned(4000.0 + 700.0 * ctx.intensity), sr);
    let mut metal_env = ExpDecay::reaching(0.001, 0.005, sr);

    (0..ctx.len)
        .map(|_| {
            let tone: f64 = partials
                .iter_mut()
                .map(|(osc, gain)| osc.next_sample() * *gain)
                .sum::<f64>()
                * tone_env.next_sample()
                * 0.5;
            let snap = snap.next_sample() * snap_env.next_sample() * 0.8;
            let wires = wire_filter.process(wires.next_sample()) * wire_env.next_sample() * wire_gain;
            let metal = metal.next_sample() * metal_env.next_sample() * 0.3;
            tone + snap + wires + metal
        })
        .collect()
}
