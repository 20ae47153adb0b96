//! Plays a drum groove on the default output device.
//!
//! ## Controls
//!
//! - Space: pause / resume
//! - `+` / `-`: tempo up / down by 5 BPM
//! - `s`: cycle swing (0%, 25%, 50%, 75%)
//! - `e`: toggle the punchy effect chain
//! - Q or ESC: Quit

mod common;

use anyhow::Result;
use beatcoach::sequencer::TransportState;
use beatcoach::{BeatEngine, BeatPattern, DrumVoice, EffectChainConfig, EngineConfig, PatternStep};
use common::{KeyAction, is_quit_key, open_output, run_terminal};
use crossterm::{ExecutableCommand, cursor, event::KeyCode, terminal};
use std::cell::RefCell;
use std::io::{Write, stdout};

fn groove() -> Result<BeatPattern> {
    let mut pattern = BeatPattern::empty(100.0, 16)?;
    for step in 0..16 {
        let mut hits = vec![(DrumVoice::Hihat, if step % 2 == 0 { 0.5 } else { 0.3 })];
        if step % 8 == 0 || step == 10 {
            hits.push((DrumVoice::Kick, 1.0));
        }
        if step % 8 == 4 {
            hits.push((DrumVoice::Snare, 0.85));
        }
        pattern.set_step(step, PatternStep::of(&hits))?;
    }
    pattern.set_step(15, PatternStep::of(&[(DrumVoice::OpenHihat, 0.4), (DrumVoice::Rimshot, 0.3)]))?;
    Ok(pattern)
}

fn main() -> Result<()> {
    let (_stream, sink) = open_output()?;
    let config = EngineConfig::default().with_sample_rate(sink.sample_rate());
    let engine = RefCell::new(BeatEngine::new(config, sink)?);
    let pattern = RefCell::new(groove()?);
    let punchy = RefCell::new(false);

    engine.borrow().play(pattern.borrow().clone());

    let redraw = || -> Result<()> {
        let engine = engine.borrow();
        let pattern = pattern.borrow();
        let mut out = stdout();
        out.execute(terminal::Clear(terminal::ClearType::All))?;
        out.execute(cursor::MoveTo(0, 0))?;
        write!(out, "beatcoach drum machine\r\n\r\n")?;
        write!(out, "  tempo   {:.0} BPM\r\n", pattern.bpm())?;
        write!(out, "  swing   {:.0}%\r\n", pattern.swing_percent())?;
        write!(out, "  effects {}\r\n", if *punchy.borrow() { "punchy" } else { "dry" })?;
        let state = match engine.state() {
            TransportState::Playing => "playing",
            TransportState::Paused => "paused",
            TransportState::Stopped => "stopped",
        };
        write!(out, "  state   {}\r\n\r\n", state)?;
        write!(out, "space pause/resume, +/- tempo, s swing, e effects, q quit\r\n")?;
        out.flush()?;
        Ok(())
    };

    run_terminal(redraw, |key| {
        if is_quit_key(key.code) {
            return Ok(KeyAction::Exit);
        }
        let mut pattern = pattern.borrow_mut();
        match key.code {
            KeyCode::Char(' ') => {
                let engine = engine.borrow();
                if engine.state() == TransportState::Paused {
                    engine.resume();
                } else {
                    engine.pause();
                }
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                let bpm = (pattern.bpm() + 5.0).min(beatcoach::pattern::MAX_BPM);
                pattern.set_bpm(bpm)?;
                engine.borrow().update_pattern(pattern.clone());
            }
            KeyCode::Char('-') => {
                let bpm = (pattern.bpm() - 5.0).max(beatcoach::pattern::MIN_BPM);
                pattern.set_bpm(bpm)?;
                engine.borrow().update_pattern(pattern.clone());
            }
            KeyCode::Char('s') => {
                let swing = (pattern.swing_percent() + 25.0) % 100.0;
                pattern.set_swing(swing);
                engine.borrow().update_pattern(pattern.clone());
            }
            KeyCode::Char('e') => {
                let mut punchy = punchy.borrow_mut();
                *punchy = !*punchy;
                let effects = if *punchy {
                    EffectChainConfig::punchy()
                } else {
                    EffectChainConfig::dry()
                };
                engine.borrow_mut().set_effects(effects)?;
            }
            _ => {}
        }
        Ok(KeyAction::Continue)
    })?;

    engine.borrow().stop();
    Ok(())
}
