//! Playback clock: tempo-driven beat cursor over a chart

use serde::{Deserialize, Serialize};

use crate::error::{PhinError, Result};

/// Transport playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TransportState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// Outcome of moving the clock forward
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockStep {
    /// Not playing; position untouched
    Idle,
    Advanced,
    /// Looped back past the start
    Wrapped,
    /// Reached the end of the chart and stopped
    Finished,
}

pub const DEFAULT_BPM: f64 = 120.0;

/// Beat cursor driven by tempo.
///
/// The clock never reads wall time itself: callers feed it elapsed seconds
/// through [`PlaybackClock::advance`] or an external position through
/// [`PlaybackClock::sync_to_seconds`].
#[derive(Debug, Clone, Serialize)]
pub struct PlaybackClock {
    state: TransportState,
    position_beat: f64,
    bpm: f64,
    looping: bool,
    total_beats: f64,
}

impl PlaybackClock {
    /// `total_beats` must be finite and positive
    pub fn new(total_beats: f64, bpm: f64) -> Result<Self> {
        if !(total_beats.is_finite() && total_beats > 0.0) {
            return Err(PhinError::InvalidChart(format!(
                "total beats must be positive, got {total_beats}"
            )));
        }
        validate_bpm(bpm)?;
        Ok(Self {
            state: TransportState::Stopped,
            position_beat: 0.0,
            bpm,
            looping: false,
            total_beats,
        })
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == TransportState::Playing
    }

    pub fn position_beat(&self) -> f64 {
        self.position_beat
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    pub fn looping(&self) -> bool {
        self.looping
    }

    pub fn total_beats(&self) -> f64 {
        self.total_beats
    }

    /// Stopped/Paused -> Playing. A finished pass restarts from the top.
    pub fn start(&mut self) {
        if self.state == TransportState::Stopped && self.position_beat >= self.total_beats {
            self.position_beat = 0.0;
        }
        self.state = TransportState::Playing;
    }

    /// Playing -> Paused; no effect otherwise
    pub fn pause(&mut self) {
        if self.state == TransportState::Playing {
            self.state = TransportState::Paused;
        }
    }

    pub fn stop(&mut self) {
        self.state = TransportState::Stopped;
        self.position_beat = 0.0;
    }

    /// Move to `beat`, clamped to `[0, total_beats)`
    pub fn seek(&mut self, beat: f64) {
        self.position_beat = if beat.is_nan() {
            0.0
        } else {
            beat.clamp(0.0, self.last_beat())
        };
    }

    /// Rejects non-positive or non-finite tempo, keeping the previous one
    pub fn set_tempo(&mut self, bpm: f64) -> Result<()> {
        validate_bpm(bpm)?;
        self.bpm = bpm;
        Ok(())
    }

    /// Tempo stepper: shift the current tempo by `delta` BPM
    pub fn nudge_tempo(&mut self, delta: f64) -> Result<f64> {
        self.set_tempo(self.bpm + delta)?;
        Ok(self.bpm)
    }

    pub fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }

    /// Advance by `seconds` of elapsed time while playing
    pub fn advance(&mut self, seconds: f64) -> ClockStep {
        if self.state != TransportState::Playing || !(seconds > 0.0) {
            return ClockStep::Idle;
        }
        let target = self.position_beat + self.seconds_to_beats(seconds);
        self.land_at(target)
    }

    /// Mirror an external clock (e.g. audio playback position) while playing
    pub fn sync_to_seconds(&mut self, seconds: f64) -> ClockStep {
        if self.state != TransportState::Playing || seconds.is_nan() {
            return ClockStep::Idle;
        }
        let target = self.seconds_to_beats(seconds.max(0.0));
        self.land_at(target)
    }

    fn land_at(&mut self, target: f64) -> ClockStep {
        if target < self.total_beats {
            self.position_beat = target;
            return ClockStep::Advanced;
        }

        if self.looping {
            self.position_beat = target % self.total_beats;
            ClockStep::Wrapped
        } else {
            self.position_beat = self.total_beats;
            self.state = TransportState::Stopped;
            ClockStep::Finished
        }
    }

    /// Largest position `seek` may land on
    fn last_beat(&self) -> f64 {
        // Next representable f64 below a positive finite total
        f64::from_bits(self.total_beats.to_bits() - 1)
    }

    pub fn seconds_to_beats(&self, seconds: f64) -> f64 {
        seconds * self.bpm / 60.0
    }

    pub fn beats_to_seconds(&self, beats: f64) -> f64 {
        beats * 60.0 / self.bpm
    }

    /// Position in seconds at the current tempo
    pub fn position_secs(&self) -> f64 {
        self.beats_to_seconds(self.position_beat)
    }

    /// Chart length in seconds at the current tempo
    pub fn duration_secs(&self) -> f64 {
        self.beats_to_seconds(self.total_beats)
    }

    /// Fraction of the chart played, 0.0-1.0
    pub fn progress(&self) -> f64 {
        (self.position_beat / self.total_beats).clamp(0.0, 1.0)
    }

    /// Format position as M:SS
    pub fn format_time(&self) -> String {
        format_secs(self.position_secs())
    }
}

/// Format seconds as M:SS
pub fn format_secs(secs: f64) -> String {
    let whole = secs.max(0.0) as u64;
    format!("{}:{:02}", whole / 60, whole % 60)
}

fn validate_bpm(bpm: f64) -> Result<()> {
    if bpm.is_finite() && bpm > 0.0 {
        Ok(())
    } else {
        Err(PhinError::InvalidTempo(bpm))
    }
}
