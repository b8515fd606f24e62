//! Song session: chart + clock + transpose offset, as a practice screen sees it

use std::sync::Arc;

use serde::Serialize;

use crate::chart::ChordChart;
use crate::chord::Chord;
use crate::error::Result;
use crate::pitch::{Key, PitchClass};
use crate::song::SongInfo;
use crate::transport::{ClockStep, PlaybackClock, TransportState, format_secs};
use crate::transpose::{TransposeOffset, home_key, transpose_in_chart};

/// Beats into a chord after which "previous" restarts the chord instead
/// of jumping to the one before it
const RESTART_THRESHOLD_BEATS: f64 = 1.0;

/// One entry of the chord strip
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StripChord {
    pub index: usize,
    pub chord: Chord,
    pub start_beat: f64,
    pub current: bool,
}

/// Render-ready state of a session
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionView {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub state: TransportState,
    pub position_beat: f64,
    pub total_beats: f64,
    pub bpm: f64,
    pub looping: bool,
    pub transpose: TransposeOffset,
    pub key: Option<Key>,
    pub current_chord: Option<Chord>,
    pub elapsed: String,
    pub duration: String,
    pub progress: f64,
}

/// Practice session over one chart.
///
/// The chart is shared read-only; transposition is a view parameter and
/// every chord is derived on demand.
#[derive(Debug, Clone)]
pub struct SongSession {
    chart: Arc<ChordChart>,
    info: Option<SongInfo>,
    offset: TransposeOffset,
    clock: PlaybackClock,
}

impl SongSession {
    pub fn new(chart: Arc<ChordChart>, bpm: f64) -> Result<Self> {
        let clock = PlaybackClock::new(chart.total_beats(), bpm)?;
        Ok(Self {
            chart,
            info: None,
            offset: TransposeOffset::ZERO,
            clock,
        })
    }

    pub fn with_info(mut self, info: SongInfo) -> Self {
        self.info = Some(info);
        self
    }

    pub fn chart(&self) -> &Arc<ChordChart> {
        &self.chart
    }

    pub fn info(&self) -> Option<&SongInfo> {
        self.info.as_ref()
    }

    pub fn clock(&self) -> &PlaybackClock {
        &self.clock
    }

    pub fn transpose_offset(&self) -> TransposeOffset {
        self.offset
    }

    pub fn position_beat(&self) -> f64 {
        self.clock.position_beat()
    }

    // ------------------------------------------------------------------------
    // Derived view
    // ------------------------------------------------------------------------

    /// Chord at the clock position, transposed by the current offset
    pub fn current_chord(&self) -> Option<Chord> {
        self.chart
            .chord_at(self.clock.position_beat())
            .map(|chord| self.render(chord))
    }

    pub fn current_index(&self) -> Option<usize> {
        self.chart.event_index_at(self.clock.position_beat())
    }

    /// Pitch classes to highlight on the keyboard
    pub fn current_tones(&self) -> Vec<PitchClass> {
        self.current_chord().map(|c| c.tones()).unwrap_or_default()
    }

    /// Key the chart is being read in after transposition
    pub fn display_key(&self) -> Option<Key> {
        home_key(&self.chart).map(|key| key.transpose(self.offset.semitones()))
    }

    /// Transposed chords around the current one: up to `before` earlier
    /// and `after` later events. Before the first chord the window starts
    /// at the top of the chart.
    pub fn chord_strip(&self, before: usize, after: usize) -> Vec<StripChord> {
        let current = self.current_index();
        let anchor = current.unwrap_or(0);
        let start = anchor.saturating_sub(before);
        let end = (anchor + after + 1).min(self.chart.len());

        self.chart.events()[start.min(end)..end]
            .iter()
            .enumerate()
            .map(|(offset, event)| {
                let index = start + offset;
                StripChord {
                    index,
                    chord: self.render(&event.chord),
                    start_beat: event.start_beat,
                    current: current == Some(index),
                }
            })
            .collect()
    }

    pub fn snapshot(&self) -> SessionView {
        SessionView {
            title: self.info.as_ref().map(|i| i.title.clone()),
            artist: self.info.as_ref().map(|i| i.artist.clone()),
            state: self.clock.state(),
            position_beat: self.clock.position_beat(),
            total_beats: self.clock.total_beats(),
            bpm: self.clock.bpm(),
            looping: self.clock.looping(),
            transpose: self.offset,
            key: self.display_key(),
            current_chord: self.current_chord(),
            elapsed: self.clock.format_time(),
            duration: format_secs(self.clock.duration_secs()),
            progress: self.clock.progress(),
        }
    }

    fn render(&self, chord: &Chord) -> Chord {
        transpose_in_chart(&self.chart, chord, self.offset)
    }

    // ------------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------------

    pub fn start(&mut self) {
        self.clock.start();
    }

    pub fn pause(&mut self) {
        self.clock.pause();
    }

    /// Play button: pause while playing, otherwise start
    pub fn toggle_play(&mut self) {
        if self.clock.is_playing() {
            self.clock.pause();
        } else {
            self.clock.start();
        }
    }

    pub fn stop(&mut self) {
        self.clock.stop();
    }

    pub fn seek(&mut self, beat: f64) {
        self.clock.seek(beat);
    }

    pub fn set_tempo(&mut self, bpm: f64) -> Result<()> {
        self.clock.set_tempo(bpm)
    }

    pub fn nudge_tempo(&mut self, delta: f64) -> Result<f64> {
        self.clock.nudge_tempo(delta)
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.clock.set_looping(looping);
    }

    pub fn set_transpose_offset(&mut self, offset: impl Into<TransposeOffset>) {
        self.offset = offset.into();
    }

    pub fn transpose_up(&mut self) -> TransposeOffset {
        self.offset = self.offset.step_up();
        self.offset
    }

    pub fn transpose_down(&mut self) -> TransposeOffset {
        self.offset = self.offset.step_down();
        self.offset
    }

    /// Jump to the next chord change. Returns false on the last chord.
    pub fn skip_next(&mut self) -> bool {
        match self.chart.next_change_after(self.clock.position_beat()) {
            Some(event) => {
                self.clock.seek(event.start_beat);
                true
            }
            None => false,
        }
    }

    /// Restart the current chord, or jump to the previous one when
    /// already near its start
    pub fn skip_previous(&mut self) {
        let position = self.clock.position_beat();
        let events = self.chart.events();
        let target = match self.current_index() {
            Some(idx) if position - events[idx].start_beat > RESTART_THRESHOLD_BEATS => {
                events[idx].start_beat
            }
            Some(idx) if idx > 0 => events[idx - 1].start_beat,
            _ => 0.0,
        };
        self.clock.seek(target);
    }

    /// Synthetic tick
    pub fn advance(&mut self, seconds: f64) -> ClockStep {
        self.clock.advance(seconds)
    }

    /// Audio-driven tick
    pub fn sync_to_seconds(&mut self, seconds: f64) -> ClockStep {
        self.clock.sync_to_seconds(seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PhinError;

    fn session() -> SongSession {
        let chart = ChordChart::from_symbols(&[("C", 0.0), ("G", 4.0), ("Am", 8.0)], 12.0).unwrap();
        SongSession::new(Arc::new(chart), 60.0).unwrap()
    }

    fn current(session: &SongSession) -> Option<String> {
        session.current_chord().map(|c| c.to_string())
    }

    #[test]
    fn test_current_chord_follows_clock() {
        let mut s = session();
        assert_eq!(current(&s), Some("C".into()));

        s.start();
        s.advance(4.5);
        assert_eq!(current(&s), Some("G".into()));
        s.advance(4.0);
        assert_eq!(current(&s), Some("Am".into()));
    }

    #[test]
    fn test_offset_applies_without_moving() {
        let mut s = session();
        s.seek(5.0);
        s.set_transpose_offset(2);
        assert_eq!(current(&s), Some("A".into()));
        assert_eq!(s.position_beat(), 5.0);

        s.set_transpose_offset(-14);
        assert_eq!(s.transpose_offset().semitones(), -2);
        assert_eq!(current(&s), Some("F".into()));

        // The shared chart never changes
        assert_eq!(s.chart().events()[1].chord.to_string(), "G");
    }

    #[test]
    fn test_transpose_stepper_and_key_label() {
        let mut s = session();
        assert_eq!(s.display_key().map(|k| k.to_string()), Some("C".into()));
        s.transpose_up();
        s.transpose_up();
        assert_eq!(s.display_key().map(|k| k.to_string()), Some("D".into()));
        s.transpose_down();
        assert_eq!(s.transpose_offset().semitones(), 1);
        assert_eq!(current(&s), Some("Db".into()));
    }

    #[test]
    fn test_invalid_tempo_is_rejected() {
        let mut s = session();
        assert_eq!(s.set_tempo(-10.0), Err(PhinError::InvalidTempo(-10.0)));
        assert_eq!(s.clock().bpm(), 60.0);
    }

    #[test]
    fn test_skip_buttons() {
        let mut s = session();
        assert!(s.skip_next());
        assert_eq!(s.position_beat(), 4.0);
        assert!(s.skip_next());
        assert_eq!(s.position_beat(), 8.0);
        assert!(!s.skip_next());
        assert_eq!(s.position_beat(), 8.0);

        s.seek(10.0);
        s.skip_previous();
        assert_eq!(s.position_beat(), 8.0);
        s.skip_previous();
        assert_eq!(s.position_beat(), 4.0);
        s.seek(4.5);
        s.skip_previous();
        assert_eq!(s.position_beat(), 0.0);
        s.skip_previous();
        assert_eq!(s.position_beat(), 0.0);
    }

    #[test]
    fn test_chord_strip() {
        let mut s = session();
        s.seek(5.0);
        s.set_transpose_offset(2);
        let strip = s.chord_strip(1, 5);
        let labels: Vec<(String, bool)> = strip
            .iter()
            .map(|c| (c.chord.to_string(), c.current))
            .collect();
        assert_eq!(
            labels,
            vec![("D".into(), false), ("A".into(), true), ("Bm".into(), false)]
        );

        let empty = SongSession::new(Arc::new(ChordChart::new(Vec::new(), 4.0).unwrap()), 60.0).unwrap();
        assert!(empty.chord_strip(2, 2).is_empty());
        assert!(empty.current_chord().is_none());
    }

    #[test]
    fn test_snapshot() {
        let mut s = session().with_info(SongInfo::new("demo", "Yahweh Sabaoth", "Nathaniel Bassey"));
        s.set_looping(true);
        s.start();
        s.advance(6.0);
        let view = s.snapshot();
        assert_eq!(view.title.as_deref(), Some("Yahweh Sabaoth"));
        assert_eq!(view.state, TransportState::Playing);
        assert_eq!(view.position_beat, 6.0);
        assert_eq!(view.current_chord.map(|c| c.to_string()), Some("G".into()));
        assert_eq!(view.elapsed, "0:06");
        assert_eq!(view.duration, "0:12");
        assert_eq!(view.progress, 0.5);
        assert!(view.looping);
    }

    #[test]
    fn test_toggle_play() {
        let mut s = session();
        s.toggle_play();
        assert_eq!(s.clock().state(), TransportState::Playing);
        s.toggle_play();
        assert_eq!(s.clock().state(), TransportState::Paused);
        s.stop();
        assert_eq!(s.clock().state(), TransportState::Stopped);
    }

    #[test]
    fn test_current_tones() {
        let mut s = session();
        s.seek(8.0);
        let tones: Vec<u8> = s.current_tones().iter().map(|p| p.value()).collect();
        assert_eq!(tones, vec![9, 0, 4]);
    }
}
