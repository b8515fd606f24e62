//! Practice engine: hosts one song session and drives its clock

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, bounded, select, tick, unbounded};
use phinaccords_core::{
    Chord, ClockStep, PhinError, SessionView, SongId, SongSession, StripChord, TransportState,
    TransposeOffset,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalog::{CatalogError, SongCatalog};
use crate::config::PracticeConfig;
use crate::tick_source::{Tick, TickSource};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Session error: {0}")]
    Session(#[from] PhinError),
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("Ticker already running")]
    AlreadyRunning,
    #[error("Ticker not running")]
    NotRunning,
    #[error("Failed to spawn ticker thread: {0}")]
    Spawn(std::io::Error),
}

/// Published whenever the rendered chord changes
#[derive(Debug, Clone, PartialEq)]
pub struct ChordChange {
    pub chord: Option<Chord>,
    pub index: Option<usize>,
    pub position_beat: f64,
    pub state: TransportState,
}

/// Session plus its time source; only ever touched under the engine lock
struct EngineInner {
    session: SongSession,
    source: Box<dyn TickSource>,
    last_published: Option<(Option<usize>, Option<Chord>)>,
    subscribers: Vec<Sender<ChordChange>>,
}

impl EngineInner {
    /// Apply whatever time has passed on the tick source
    fn settle(&mut self) -> ClockStep {
        let step = match self.source.poll() {
            Tick::Idle => ClockStep::Idle,
            Tick::Elapsed(seconds) => self.session.advance(seconds),
            Tick::Position(seconds) => self.session.sync_to_seconds(seconds),
        };
        match step {
            ClockStep::Finished => info!("Practice pass finished"),
            ClockStep::Wrapped => debug!("Looped back to start"),
            _ => {}
        }
        step
    }

    fn publish(&mut self) {
        let index = self.session.current_index();
        let chord = self.session.current_chord();
        if self.last_published == Some((index, chord)) {
            return;
        }
        self.last_published = Some((index, chord));

        let change = ChordChange {
            chord,
            index,
            position_beat: self.session.position_beat(),
            state: self.session.clock().state(),
        };
        self.subscribers
            .retain(|subscriber| subscriber.send(change.clone()).is_ok());
    }
}

struct Ticker {
    shutdown: Sender<()>,
    handle: JoinHandle<()>,
}

/// Hosts one [`SongSession`] for a practice view.
///
/// Commands and ticks share one lock. Every command first settles the
/// clock against the tick source, then applies the transition, so a tick
/// never observes a half-applied command and time spent stopped or paused
/// is never credited to the position.
pub struct PracticeEngine {
    inner: Arc<Mutex<EngineInner>>,
    ticker: Option<Ticker>,
    /// Tempo stepper increment
    bpm_step: f64,
}

impl PracticeEngine {
    pub fn new(session: SongSession, source: Box<dyn TickSource>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(EngineInner {
                session,
                source,
                last_published: None,
                subscribers: Vec::new(),
            })),
            ticker: None,
            bpm_step: PracticeConfig::default().bpm_step,
        }
    }

    /// Load `id` from `catalog` into a fresh session. Tempo comes from the
    /// song's suggested BPM, else the configured default.
    pub fn open(
        catalog: &dyn SongCatalog,
        id: &SongId,
        config: &PracticeConfig,
        source: Box<dyn TickSource>,
    ) -> Result<Self, EngineError> {
        let info = catalog.song(id)?;
        let chart = catalog.fetch_chart(id)?;
        let bpm = info.bpm.unwrap_or(config.default_bpm);

        let mut session = SongSession::new(chart, bpm)?.with_info(info);
        session.set_looping(config.looping);
        info!(
            "Opened practice session for {} at {} BPM ({} chords)",
            id,
            bpm,
            session.chart().len()
        );
        let mut engine = Self::new(session, source);
        engine.bpm_step = config.bpm_step;
        Ok(engine)
    }

    fn lock(&self) -> MutexGuard<'_, EngineInner> {
        lock_inner(&self.inner)
    }

    /// Settle, apply `command`, then notify subscribers
    fn command<R>(&self, command: impl FnOnce(&mut SongSession) -> R) -> R {
        let mut inner = self.lock();
        inner.settle();
        let result = command(&mut inner.session);
        inner.publish();
        result
    }

    /// Read the session after settling, without notifying
    fn query<R>(&self, query: impl FnOnce(&SongSession) -> R) -> R {
        let mut inner = self.lock();
        inner.settle();
        query(&inner.session)
    }

    // ------------------------------------------------------------------------
    // Ticker
    // ------------------------------------------------------------------------

    /// Spawn a thread that ticks the session every `interval`
    pub fn start_ticker(&mut self, interval: Duration) -> Result<(), EngineError> {
        if self.ticker.is_some() {
            return Err(EngineError::AlreadyRunning);
        }

        let (shutdown, shutdown_rx) = bounded::<()>(1);
        let ticks = tick(interval);
        let inner = self.inner.clone();

        let handle = thread::Builder::new()
            .name("phinaccords-ticker".into())
            .spawn(move || {
                loop {
                    select! {
                        recv(ticks) -> _ => {
                            step(&inner);
                        }
                        recv(shutdown_rx) -> _ => break,
                    }
                }
            })
            .map_err(EngineError::Spawn)?;

        self.ticker = Some(Ticker { shutdown, handle });
        info!("Practice ticker started ({:?} interval)", interval);
        Ok(())
    }

    pub fn stop_ticker(&mut self) -> Result<(), EngineError> {
        let ticker = self.ticker.take().ok_or(EngineError::NotRunning)?;
        let _ = ticker.shutdown.send(());
        if ticker.handle.join().is_err() {
            warn!("Practice ticker thread panicked");
        }
        info!("Practice ticker stopped");
        Ok(())
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker.is_some()
    }

    /// Apply one tick by hand
    pub fn tick(&self) -> ClockStep {
        step(&self.inner)
    }

    /// Receive a [`ChordChange`] each time the rendered chord changes
    pub fn subscribe(&self) -> Receiver<ChordChange> {
        let (tx, rx) = unbounded();
        self.lock().subscribers.push(tx);
        rx
    }

    // ------------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------------

    pub fn play(&self) {
        self.command(|s| s.start());
        debug!("Play");
    }

    pub fn pause(&self) {
        self.command(|s| s.pause());
        debug!("Pause");
    }

    pub fn toggle_play(&self) -> TransportState {
        self.command(|s| {
            s.toggle_play();
            s.clock().state()
        })
    }

    pub fn stop(&self) {
        self.command(|s| s.stop());
        debug!("Stop");
    }

    pub fn seek(&self, beat: f64) {
        let position = self.command(|s| {
            s.seek(beat);
            s.position_beat()
        });
        debug!("Seek to beat {} (requested {})", position, beat);
    }

    pub fn set_tempo(&self, bpm: f64) -> Result<(), EngineError> {
        self.command(|s| s.set_tempo(bpm))?;
        info!("Tempo set to {} BPM", bpm);
        Ok(())
    }

    pub fn nudge_tempo(&self, delta: f64) -> Result<f64, EngineError> {
        let bpm = self.command(|s| s.nudge_tempo(delta))?;
        debug!("Tempo nudged to {} BPM", bpm);
        Ok(bpm)
    }

    /// Tempo stepper "+": one configured step faster
    pub fn tempo_up(&self) -> Result<f64, EngineError> {
        self.nudge_tempo(self.bpm_step)
    }

    /// Tempo stepper "-": one configured step slower
    pub fn tempo_down(&self) -> Result<f64, EngineError> {
        self.nudge_tempo(-self.bpm_step)
    }

    pub fn set_looping(&self, looping: bool) {
        self.command(|s| s.set_looping(looping));
    }

    pub fn set_transpose_offset(&self, offset: impl Into<TransposeOffset>) {
        let offset = offset.into();
        self.command(|s| s.set_transpose_offset(offset));
        info!("Transpose offset set to {}", offset);
    }

    pub fn transpose_up(&self) -> TransposeOffset {
        self.command(|s| s.transpose_up())
    }

    pub fn transpose_down(&self) -> TransposeOffset {
        self.command(|s| s.transpose_down())
    }

    pub fn skip_next(&self) -> bool {
        self.command(|s| s.skip_next())
    }

    pub fn skip_previous(&self) {
        self.command(|s| s.skip_previous());
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    pub fn snapshot(&self) -> SessionView {
        self.query(|s| s.snapshot())
    }

    pub fn current_chord(&self) -> Option<Chord> {
        self.query(|s| s.current_chord())
    }

    pub fn position_beat(&self) -> f64 {
        self.query(|s| s.position_beat())
    }

    pub fn state(&self) -> TransportState {
        self.query(|s| s.clock().state())
    }

    pub fn chord_strip(&self, before: usize, after: usize) -> Vec<StripChord> {
        self.query(|s| s.chord_strip(before, after))
    }
}

impl Drop for PracticeEngine {
    fn drop(&mut self) {
        if self.ticker.is_some() {
            let _ = self.stop_ticker();
        }
    }
}

fn lock_inner(inner: &Mutex<EngineInner>) -> MutexGuard<'_, EngineInner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One tick: state is re-read under the lock every time
fn step(inner: &Mutex<EngineInner>) -> ClockStep {
    let mut inner = lock_inner(inner);
    let step = inner.settle();
    inner.publish();
    step
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use phinaccords_core::ChordChart;

    use super::*;
    use crate::tick_source::ManualTimer;

    fn engine() -> (PracticeEngine, ManualTimer) {
        let chart = ChordChart::from_symbols(&[("C", 0.0), ("G", 4.0), ("Am", 8.0)], 12.0).unwrap();
        let session = SongSession::new(Arc::new(chart), 60.0).unwrap();
        let timer = ManualTimer::new();
        (PracticeEngine::new(session, Box::new(timer.clone())), timer)
    }

    #[test]
    fn test_ticks_advance_only_while_playing() {
        let (engine, timer) = engine();
        timer.step(2.0);
        assert_eq!(engine.tick(), ClockStep::Idle);
        assert_eq!(engine.position_beat(), 0.0);

        engine.play();
        timer.step(1.5);
        assert_eq!(engine.tick(), ClockStep::Advanced);
        assert_eq!(engine.position_beat(), 1.5);
    }

    #[test]
    fn test_stop_discards_pending_tick() {
        let (engine, timer) = engine();
        engine.play();
        timer.step(3.0);
        engine.stop();
        // Time queued before the stop was settled before resetting
        assert_eq!(engine.position_beat(), 0.0);
        assert_eq!(engine.tick(), ClockStep::Idle);
        assert_eq!(engine.position_beat(), 0.0);
        assert_eq!(engine.state(), TransportState::Stopped);
    }

    #[test]
    fn test_pause_settles_elapsed_time_first() {
        let (engine, timer) = engine();
        engine.play();
        timer.step(2.0);
        engine.pause();
        assert_eq!(engine.position_beat(), 2.0);

        timer.step(10.0);
        engine.play();
        // Time spent paused is not credited
        assert_eq!(engine.position_beat(), 2.0);
    }

    #[test]
    fn test_invalid_tempo() {
        let (engine, _timer) = engine();
        let err = engine.set_tempo(-10.0).unwrap_err();
        assert!(matches!(err, EngineError::Session(PhinError::InvalidTempo(_))));
        assert_eq!(engine.snapshot().bpm, 60.0);
        assert_eq!(engine.nudge_tempo(6.0).unwrap(), 66.0);
    }

    #[test]
    fn test_tempo_stepper() {
        let (engine, _timer) = engine();
        assert_eq!(engine.tempo_up().unwrap(), 61.0);
        assert_eq!(engine.tempo_down().unwrap(), 60.0);
        assert_eq!(engine.tempo_down().unwrap(), 59.0);
        assert_eq!(engine.snapshot().bpm, 59.0);
    }

    #[test]
    fn test_subscribers_see_chord_changes() {
        let (engine, timer) = engine();
        let changes = engine.subscribe();

        engine.play();
        let first = changes.try_recv().unwrap();
        assert_eq!(first.chord.map(|c| c.to_string()), Some("C".into()));
        assert_eq!(first.index, Some(0));

        timer.step(1.0);
        engine.tick();
        assert!(changes.try_recv().is_err());

        timer.step(3.5);
        engine.tick();
        let change = changes.try_recv().unwrap();
        assert_eq!(change.chord.map(|c| c.to_string()), Some("G".into()));
        assert_eq!(change.position_beat, 4.5);

        engine.set_transpose_offset(2);
        let change = changes.try_recv().unwrap();
        assert_eq!(change.chord.map(|c| c.to_string()), Some("A".into()));
        assert_eq!(change.index, Some(1));
    }

    #[test]
    fn test_dropped_subscribers_are_pruned() {
        let (engine, _timer) = engine();
        drop(engine.subscribe());
        let live = engine.subscribe();
        engine.play();
        assert!(live.try_recv().is_ok());
        assert_eq!(engine.lock().subscribers.len(), 1);
    }

    #[test]
    fn test_ticker_lifecycle() {
        let (mut engine, _timer) = engine();
        engine.start_ticker(Duration::from_millis(5)).unwrap();
        assert!(engine.is_ticking());
        assert!(matches!(
            engine.start_ticker(Duration::from_millis(5)),
            Err(EngineError::AlreadyRunning)
        ));
        engine.stop_ticker().unwrap();
        assert!(!engine.is_ticking());
        assert!(matches!(engine.stop_ticker(), Err(EngineError::NotRunning)));
    }
}
