//! Chord charts: the ordered timeline of chords for one song

use serde::{Deserialize, Serialize};

use crate::chord::Chord;
use crate::error::{PhinError, Result};
use crate::pitch::Key;

/// A chord placed on the song timeline
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChordEvent {
    pub chord: Chord,
    /// Start position in beats
    #[serde(rename = "beat")]
    pub start_beat: f64,
}

impl ChordEvent {
    pub fn new(chord: Chord, start_beat: f64) -> Self {
        Self { chord, start_beat }
    }
}

/// Immutable chord timeline.
///
/// Events are strictly increasing by start beat and all start before
/// `total_beats`. Construct with [`ChordChart::new`], which enforces both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawChart")]
pub struct ChordChart {
    #[serde(skip_serializing_if = "Option::is_none")]
    key: Option<Key>,
    events: Vec<ChordEvent>,
    total_beats: f64,
}

#[derive(Deserialize)]
struct RawChart {
    #[serde(default)]
    key: Option<Key>,
    #[serde(default)]
    events: Vec<ChordEvent>,
    total_beats: f64,
}

impl TryFrom<RawChart> for ChordChart {
    type Error = PhinError;

    fn try_from(raw: RawChart) -> Result<Self> {
        Ok(Self::new(raw.events, raw.total_beats)?.with_key(raw.key))
    }
}

impl ChordChart {
    pub fn new(events: Vec<ChordEvent>, total_beats: f64) -> Result<Self> {
        if !(total_beats.is_finite() && total_beats > 0.0) {
            return Err(PhinError::InvalidChart(format!(
                "total beats must be positive, got {total_beats}"
            )));
        }

        for (idx, event) in events.iter().enumerate() {
            if !(event.start_beat.is_finite() && event.start_beat >= 0.0) {
                return Err(PhinError::InvalidChart(format!(
                    "event {idx} ({}) starts at invalid beat {}",
                    event.chord, event.start_beat
                )));
            }
            if event.start_beat >= total_beats {
                return Err(PhinError::InvalidChart(format!(
                    "event {idx} ({}) starts at beat {} past the chart end ({total_beats})",
                    event.chord, event.start_beat
                )));
            }
        }

        if let Some(idx) = events
            .windows(2)
            .position(|pair| pair[1].start_beat <= pair[0].start_beat)
        {
            return Err(PhinError::InvalidChart(format!(
                "event {} at beat {} does not follow beat {}",
                idx + 1,
                events[idx + 1].start_beat,
                events[idx].start_beat
            )));
        }

        Ok(Self {
            key: None,
            events,
            total_beats,
        })
    }

    /// Build from chord text and start beats, e.g. `[("C", 0.0), ("G", 4.0)]`
    pub fn from_symbols(symbols: &[(&str, f64)], total_beats: f64) -> Result<Self> {
        let events = symbols
            .iter()
            .map(|&(text, beat)| Ok(ChordEvent::new(Chord::parse(text)?, beat)))
            .collect::<Result<Vec<_>>>()?;
        Self::new(events, total_beats)
    }

    pub fn with_key(mut self, key: Option<Key>) -> Self {
        self.key = key;
        self
    }

    pub fn key(&self) -> Option<Key> {
        self.key
    }

    pub fn events(&self) -> &[ChordEvent] {
        &self.events
    }

    pub fn total_beats(&self) -> f64 {
        self.total_beats
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Index of the event sounding at `position_beat`: the last event
    /// starting at or before it. `None` before the first event.
    pub fn event_index_at(&self, position_beat: f64) -> Option<usize> {
        let after = self
            .events
            .partition_point(|event| event.start_beat <= position_beat);
        after.checked_sub(1)
    }

    /// Chord sounding at `position_beat`
    pub fn chord_at(&self, position_beat: f64) -> Option<&Chord> {
        self.event_index_at(position_beat)
            .map(|idx| &self.events[idx].chord)
    }

    /// First chord change strictly after `position_beat`
    pub fn next_change_after(&self, position_beat: f64) -> Option<&ChordEvent> {
        let idx = self
            .events
            .partition_point(|event| event.start_beat <= position_beat);
        self.events.get(idx)
    }

    /// Last chord change strictly before `position_beat`
    pub fn previous_change_before(&self, position_beat: f64) -> Option<&ChordEvent> {
        let idx = self
            .events
            .partition_point(|event| event.start_beat < position_beat);
        idx.checked_sub(1).map(|idx| &self.events[idx])
    }

    /// Same timeline with every chord replaced by `map`
    pub(crate) fn map_chords(&self, key: Option<Key>, map: impl Fn(&Chord) -> Chord) -> Self {
        Self {
            key,
            events: self
                .events
                .iter()
                .map(|event| ChordEvent::new(map(&event.chord), event.start_beat))
                .collect(),
            total_beats: self.total_beats,
        }
    }
}
