//! Renders a stored pattern document to a WAV file.
//!
//! Usage: `cargo run --example bounce_wav --features wav-export [pattern.json] [out.wav]`
//!
//! Without arguments a built-in legacy-format pattern is rendered to
//! `groove.wav`.

use anyhow::Result;
use beatcoach::render::bounce;
use beatcoach::{EffectChainConfig, PatternDocument, SampleCache};
use std::env;
use std::fs;

const SAMPLE_RATE: u32 = 44100;
const LOOPS: usize = 4;

const BUILT_IN: &str = r#"{
    "name": "four on the floor",
    "bpm": 124,
    "swing": 20,
    "pattern": [0, 1, 3, 1, 2, 1, 3, 1, 0, 1, 3, 1, 2, 1, 3, 1]
}"#;

fn main() -> Result<()> {
    let mut args = env::args().skip(1);
    let json = match args.next() {
        Some(path) => fs::read_to_string(path)?,
        None => BUILT_IN.to_string(),
    };
    let out = args.next().unwrap_or_else(|| "groove.wav".into());

    let doc = PatternDocument::from_json(&json)?;
    let name = doc.name.clone();
    let pattern = doc.into_pattern()?;

    let cache = SampleCache::new().with_effects(EffectChainConfig::punchy());
    let mix = bounce(&pattern, &cache, SAMPLE_RATE, LOOPS)?;
    mix.write_wav(&out)?;

    println!(
        "rendered '{}' ({} steps at {} BPM) to {}: {:.2} s, peak {:.3}",
        name,
        pattern.len(),
        pattern.bpm(),
        out,
        mix.duration_seconds(),
        mix.peak()
    );
    Ok(())
}
