//! Plays each drum voice on a key press.
//!
//! ## Controls
//!
//! - 1-8: kick, snare, hihat, open hihat, crash, tom, ride, rimshot
//! - Shift+1-8 (`!@#$%^&*`): the same voice at the softest velocity layer
//! - Q or ESC: Quit

mod common;

use anyhow::Result;
use beatcoach::sequencer::AudioSink;
use beatcoach::{DrumVoice, SampleCache};
use common::{KeyAction, is_quit_key, open_output, run_terminal};
use crossterm::{ExecutableCommand, cursor, event::KeyCode, terminal};
use std::cell::RefCell;
use std::io::{Write, stdout};
use std::time::Duration;

const SOFT_KEYS: [char; 8] = ['!', '@', '#', '$', '%', '^', '&', '*'];

fn main() -> Result<()> {
    let (_stream, sink) = open_output()?;
    let sample_rate = sink.sample_rate();
    let cache = SampleCache::new();
    let buffers = cache.pregenerate_all(sample_rate)?;
    let sink = RefCell::new(sink);
    let last = RefCell::new(String::from("-"));

    let redraw = || -> Result<()> {
        let mut out = stdout();
        out.execute(terminal::Clear(terminal::ClearType::All))?;
        out.execute(cursor::MoveTo(0, 0))?;
        write!(out, "{} buffers ready at {} Hz\r\n\r\n", buffers, sample_rate)?;
        for (i, voice) in DrumVoice::ALL.iter().enumerate() {
            write!(out, "  {}  {}\r\n", i + 1, voice)?;
        }
        write!(out, "\r\nlast: {}\r\n", last.borrow())?;
        out.flush()?;
        Ok(())
    };

    run_terminal(redraw, |key| {
        if is_quit_key(key.code) {
            return Ok(KeyAction::Exit);
        }
        let KeyCode::Char(c) = key.code else {
            return Ok(KeyAction::Continue);
        };
        let choice = match c.to_digit(10) {
            Some(d @ 1..=8) => Some((d as usize - 1, cache.top_layer())),
            _ => SOFT_KEYS
                .iter()
                .position(|&k| k == c)
                .map(|i| (i, cache.velocity_layers()[0])),
        };
        if let Some((index, velocity)) = choice {
            let voice = DrumVoice::ALL[index];
            let buffer = cache.pregenerate(voice, u32::from(velocity), sample_rate)?;
            sink.borrow_mut().play(buffer, 1.0, Duration::ZERO)?;
            *last.borrow_mut() = format!("{} at velocity {}", voice, velocity);
        }
        Ok(KeyAction::Continue)
    })
}
