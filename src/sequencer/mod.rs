//! Real-time pattern playback.
//!
//! A `Scheduler` holds the transport state machine and decides when each
//! step is due; a `Transport` runs one on a background thread; an
//! `AudioSink` turns triggered buffers into sound; a `BeatTracker` lets other
//! threads see where playback is.

mod clock;
mod scheduler;
mod sink;
mod tracker;
mod transport;

pub use clock::{Clock, ManualClock, SystemClock};
pub use scheduler::{MAX_CATCH_UP_STEPS, Scheduler, StepEvent, StepListener, TransportState};
pub use sink::{AudioSink, MemorySink, PlayedHit};
pub use tracker::{BeatPosition, BeatTracker};
pub use transport::Transport;
