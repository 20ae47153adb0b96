//! Common utilities for the demos: a cpal-backed sink and a terminal loop.

use anyhow::Result;
use beatcoach::SampleBuffer;
use beatcoach::error::SinkError;
use beatcoach::sequencer::AudioSink;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, StreamConfig};
use crossterm::{
    ExecutableCommand,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use std::io::stdout;
use std::panic;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A buffer being played by the mixer.
struct ActiveHit {
    buffer: Arc<SampleBuffer>,
    gain: f32,
    /// Samples to wait before the buffer starts.
    delay: usize,
    position: usize,
}

/// Sums every active hit into the output stream.
#[derive(Default)]
pub struct Mixer {
    hits: Vec<ActiveHit>,
}

impl Mixer {
    fn next_sample(&mut self) -> f32 {
        let mut sum = 0.0;
        for hit in &mut self.hits {
            if hit.delay > 0 {
                hit.delay -= 1;
                continue;
            }
            sum += hit.buffer.samples()[hit.position] * hit.gain;
            hit.position += 1;
        }
        self.hits.retain(|h| h.position < h.buffer.len());
        sum.clamp(-1.0, 1.0)
    }
}

/// Feeds triggered drum buffers into the default output device.
///
/// Cloneable and `Send`; the cpal stream itself stays with the caller.
#[derive(Clone)]
pub struct CpalSink {
    mixer: Arc<Mutex<Mixer>>,
    sample_rate: u32,
}

impl CpalSink {
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

impl AudioSink for CpalSink {
    fn play(&mut self, buffer: Arc<SampleBuffer>, gain: f32, offset: Duration) -> Result<(), SinkError> {
        if buffer.is_empty() {
            return Ok(());
        }
        let delay = (offset.as_secs_f64() * f64::from(self.sample_rate)).round() as usize;
        self.mixer
            .lock()
            .map_err(|_| SinkError::Device("mixer lock poisoned".into()))?
            .hits
            .push(ActiveHit {
                buffer,
                gain,
                delay,
                position: 0,
            });
        Ok(())
    }
}

/// Opens the default output device.
///
/// The returned stream must be kept alive for as long as sound should play.
pub fn open_output() -> Result<(cpal::Stream, CpalSink)> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| anyhow::anyhow!("No output device available"))?;

    let config = device.default_output_config()?;
    let sample_rate = config.sample_rate().0;
    let mixer = Arc::new(Mutex::new(Mixer::default()));

    let stream = match config.sample_format() {
        SampleFormat::F32 => create_audio_stream::<f32>(&device, &config.into(), mixer.clone())?,
        SampleFormat::I16 => create_audio_stream::<i16>(&device, &config.into(), mixer.clone())?,
        SampleFormat::U16 => create_audio_stream::<u16>(&device, &config.into(), mixer.clone())?,
        sample_format => {
            return Err(anyhow::anyhow!(
                "Unsupported sample format: {}",
                sample_format
            ));
        }
    };

    Ok((stream, CpalSink { mixer, sample_rate }))
}

fn create_audio_stream<T>(
    device: &cpal::Device,
    config: &StreamConfig,
    mixer: Arc<Mutex<Mixer>>,
) -> Result<cpal::Stream>
where
    T: Sample + FromSample<f32> + cpal::SizedSample,
{
    let channels = config.channels as usize;

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            let mut mixer = mixer.lock().unwrap();
            for frame in data.chunks_mut(channels) {
                let value: T = T::from_sample(mixer.next_sample());
                for s in frame.iter_mut() {
                    *s = value;
                }
            }
        },
        |err| eprintln!("Audio stream error: {}", err),
        None,
    )?;

    stream.play()?;
    Ok(stream)
}

/// Key handling result that controls the event loop
pub enum KeyAction {
    Continue,
    Exit,
}

/// Runs a raw-mode terminal loop until the handler asks to exit.
///
/// `redraw` is called once up front and again after every handled key.
pub fn run_terminal<D, K>(mut redraw: D, mut key_handler: K) -> Result<()>
where
    D: FnMut() -> Result<()>,
    K: FnMut(&KeyEvent) -> Result<KeyAction>,
{
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    stdout().execute(crossterm::cursor::Hide)?;

    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        cleanup_terminal();
        original_hook(panic_info);
    }));

    redraw()?;
    loop {
        if event::poll(Duration::from_millis(50))?
            && let Event::Key(key_event) = event::read()?
            && key_event.kind == KeyEventKind::Press
        {
            match key_handler(&key_event)? {
                KeyAction::Continue => redraw()?,
                KeyAction::Exit => break,
            }
        }
    }

    cleanup_terminal();
    Ok(())
}

fn cleanup_terminal() {
    let _ = stdout().execute(crossterm::cursor::Show);
    let _ = stdout().execute(LeaveAlternateScreen);
    let _ = disable_raw_mode();
}

/// Helper to check if a key code is a quit key (Q, ESC).
pub fn is_quit_key(code: KeyCode) -> bool {
    matches!(code, KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc)
}
