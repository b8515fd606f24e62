//! Chart transposition with consistent enharmonic spelling

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::chart::ChordChart;
use crate::chord::Chord;
use crate::pitch::{Accidental, Key};

/// Semitone shift applied at render time, kept in [-11, 11]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub struct TransposeOffset(i8);

impl TransposeOffset {
    pub const ZERO: Self = Self(0);

    /// Any integer, reduced by truncated remainder: 13 -> 1, -13 -> -1, 12 -> 0
    pub fn new(semitones: i32) -> Self {
        Self((semitones % 12) as i8)
    }

    pub fn semitones(self) -> i32 {
        self.0 as i32
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn step_up(self) -> Self {
        Self::new(self.semitones() + 1)
    }

    pub fn step_down(self) -> Self {
        Self::new(self.semitones() - 1)
    }

    /// Offset equivalent to applying `self` then `other`
    pub fn combine(self, other: TransposeOffset) -> Self {
        Self::new(self.semitones() + other.semitones())
    }
}

impl From<i32> for TransposeOffset {
    fn from(semitones: i32) -> Self {
        Self::new(semitones)
    }
}

impl From<TransposeOffset> for i32 {
    fn from(offset: TransposeOffset) -> Self {
        offset.semitones()
    }
}

impl fmt::Display for TransposeOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 > 0 {
            write!(f, "+{}", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Key a chart is read in: its declared key, else the key its first chord implies
pub fn home_key(chart: &ChordChart) -> Option<Key> {
    chart
        .key()
        .or_else(|| chart.events().first().map(|event| event.chord.implied_key()))
}

/// Accidental every chord of `chart` uses once shifted by `offset`
pub fn target_spelling(chart: &ChordChart, offset: TransposeOffset) -> Option<Accidental> {
    home_key(chart).map(|key| key.transpose(offset.semitones()).preferred_accidental())
}

/// Transpose one chord as it appears in `chart`, spelled consistently with
/// the rest of the transposed chart. A zero offset keeps the chart's spelling.
pub fn transpose_in_chart(chart: &ChordChart, chord: &Chord, offset: TransposeOffset) -> Chord {
    if offset.is_zero() {
        return *chord;
    }
    match target_spelling(chart, offset) {
        Some(prefer) => chord.transpose_with(offset.semitones(), prefer),
        None => chord.transpose(offset.semitones()),
    }
}

/// Shift every chord of `chart` by `semitones`, keeping beats and ordering.
/// The chart key, when declared, moves with it.
pub fn transpose_chart(chart: &ChordChart, semitones: i32) -> ChordChart {
    let offset = TransposeOffset::new(semitones);
    if offset.is_zero() {
        return chart.clone();
    }

    let key = chart.key().map(|key| key.transpose(offset.semitones()));
    chart.map_chords(key, |chord| transpose_in_chart(chart, chord, offset))
}
