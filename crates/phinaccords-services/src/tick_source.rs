//! Time sources that drive the playback clock

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// What a time source reports on each poll
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tick {
    /// Nothing to apply
    Idle,
    /// Seconds elapsed since the previous poll
    Elapsed(f64),
    /// Absolute playback position in seconds from an external clock
    Position(f64),
}

/// Swappable time source for a practice engine
pub trait TickSource: Send {
    fn poll(&mut self) -> Tick;
}

/// Wall-clock timer for chord-only practice without audio
pub struct SyntheticTimer {
    last: Instant,
}

impl SyntheticTimer {
    pub fn new() -> Self {
        Self { last: Instant::now() }
    }
}

impl Default for SyntheticTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl TickSource for SyntheticTimer {
    fn poll(&mut self) -> Tick {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last);
        self.last = now;
        Tick::Elapsed(elapsed.as_secs_f64())
    }
}

/// Manually stepped timer. Clones share the pending time, so a handle kept
/// outside the engine can feed it.
#[derive(Clone, Default)]
pub struct ManualTimer {
    pending_raw: Arc<AtomicU64>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `seconds` to be reported on the next poll
    pub fn step(&self, seconds: f64) {
        let _ = self
            .pending_raw
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |raw| {
                Some((f64::from_bits(raw) + seconds).to_bits())
            });
    }

    pub fn pending(&self) -> f64 {
        f64::from_bits(self.pending_raw.load(Ordering::SeqCst))
    }
}

impl TickSource for ManualTimer {
    fn poll(&mut self) -> Tick {
        let pending = f64::from_bits(self.pending_raw.swap(0.0f64.to_bits(), Ordering::SeqCst));
        if pending > 0.0 {
            Tick::Elapsed(pending)
        } else {
            Tick::Idle
        }
    }
}

/// Mirrors an audio player's position. The callback returns the current
/// playback position in seconds, or `None` while no audio is loaded.
pub struct AudioPositionSource<F> {
    position: F,
}

impl<F> AudioPositionSource<F>
where
    F: FnMut() -> Option<f64> + Send,
{
    pub fn new(position: F) -> Self {
        Self { position }
    }
}

impl<F> TickSource for AudioPositionSource<F>
where
    F: FnMut() -> Option<f64> + Send,
{
    fn poll(&mut self) -> Tick {
        match (self.position)() {
            Some(seconds) => Tick::Position(seconds),
            None => Tick::Idle,
        }
    }
}
