//! Runs a `Scheduler` on its own thread against the system clock.

use super::{AudioSink, BeatTracker, Scheduler, StepEvent, SystemClock, TransportState};
use crate::pattern::BeatPattern;
use std::io;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

struct Shared<S: AudioSink> {
    scheduler: Mutex<Scheduler<SystemClock, S>>,
    wake: Condvar,
    shutdown: Mutex<bool>,
}

impl<S: AudioSink> Shared<S> {
    fn lock(&self) -> MutexGuard<'_, Scheduler<SystemClock, S>> {
        self.scheduler.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_shut_down(&self) -> bool {
        *self.shutdown.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle to the playback thread.
///
/// Every control method takes the scheduler lock, and the worker only fires
/// while holding it, so once `stop` or `pause` returns no further step
/// fires. The worker sleeps on a condition variable until the next deadline
/// and is woken early by any control call.
///
/// The step listener runs on the worker thread with the lock held and must
/// not call back into the `Transport`.
pub struct Transport<S: AudioSink + 'static> {
    shared: Arc<Shared<S>>,
    tracker: BeatTracker,
    worker: Option<JoinHandle<()>>,
}

impl<S: AudioSink + 'static> Transport<S> {
    /// Moves `scheduler` onto a new thread named `beatcoach-transport`.
    pub fn spawn(scheduler: Scheduler<SystemClock, S>) -> io::Result<Self> {
        let tracker = scheduler.tracker().clone();
        let shared = Arc::new(Shared {
            scheduler: Mutex::new(scheduler),
            wake: Condvar::new(),
            shutdown: Mutex::new(false),
        });

        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name("beatcoach-transport".into())
            .spawn(move || run(&worker_shared))?;
        log::debug!("transport thread started");

        Ok(Self {
            shared,
            tracker,
            worker: Some(worker),
        })
    }

    pub fn start(&self, pattern: BeatPattern) {
        self.control(|s| s.start(pattern));
    }

    pub fn stop(&self) {
        self.control(Scheduler::stop);
    }

    pub fn pause(&self) {
        self.control(Scheduler::pause);
    }

    pub fn resume(&self) {
        self.control(Scheduler::resume);
    }

    pub fn update_pattern(&self, pattern: BeatPattern) {
        self.control(|s| s.update_pattern(pattern));
    }

    pub fn set_step_listener(&self, listener: impl FnMut(&StepEvent) + Send + 'static) {
        self.shared.lock().set_step_listener(listener);
    }

    pub fn state(&self) -> TransportState {
        self.shared.lock().state()
    }

    pub fn current_step(&self) -> usize {
        self.shared.lock().current_step()
    }

    pub fn pattern(&self) -> Option<BeatPattern> {
        self.shared.lock().pattern().cloned()
    }

    pub fn tracker(&self) -> &BeatTracker {
        &self.tracker
    }

    /// Runs `f` with exclusive access to the scheduler, then wakes the worker.
    pub fn with_scheduler<R>(&self, f: impl FnOnce(&mut Scheduler<SystemClock, S>) -> R) -> R {
        self.control(f)
    }

    fn control<R>(&self, f: impl FnOnce(&mut Scheduler<SystemClock, S>) -> R) -> R {
        let mut scheduler = self.shared.lock();
        let result = f(&mut *scheduler);
        drop(scheduler);
        self.shared.wake.notify_all();
        result
    }
}

impl<S: AudioSink + 'static> Drop for Transport<S> {
    fn drop(&mut self) {
        {
            // Set under the scheduler lock so the worker cannot miss the wakeup
            let _scheduler = self.shared.lock();
            *self.shared.shutdown.lock().unwrap_or_else(PoisonError::into_inner) = true;
            self.shared.wake.notify_all();
        }
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("transport thread panicked");
            }
        }
    }
}

fn run<S: AudioSink>(shared: &Shared<S>) {
    let mut scheduler = shared.lock();
    loop {
        if shared.is_shut_down() {
            break;
        }
        scheduler = match scheduler.poll() {
            Some(wait) => {
                shared
                    .wake
                    .wait_timeout(scheduler, wait)
                    .unwrap_or_else(PoisonError::into_inner)
                    .0
            }
            None => shared
                .wake
                .wait(scheduler)
                .unwrap_or_else(PoisonError::into_inner),
        };
    }
    scheduler.stop();
    log::debug!("transport thread exiting");
}
