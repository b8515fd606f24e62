//! Pitch classes, spellings and keys

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PhinError, Result};

const SHARP_NAMES: [&str; 12] = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];
const FLAT_NAMES: [&str; 12] = ["C", "Db", "D", "Eb", "E", "F", "Gb", "G", "Ab", "A", "Bb", "B"];

/// Semitone index from C (0-11), independent of octave
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(from = "i32")]
pub struct PitchClass(u8);

impl PitchClass {
    pub const C: Self = Self(0);
    pub const D: Self = Self(2);
    pub const E: Self = Self(4);
    pub const F: Self = Self(5);
    pub const G: Self = Self(7);
    pub const A: Self = Self(9);
    pub const B: Self = Self(11);

    /// Any integer, reduced modulo 12
    pub fn new(semitones: i32) -> Self {
        Self(semitones.rem_euclid(12) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn transpose(self, semitones: i32) -> Self {
        Self::new(self.0 as i32 + semitones.rem_euclid(12))
    }

    /// White-key pitch classes have a single conventional spelling
    pub fn is_natural(self) -> bool {
        matches!(self.0, 0 | 2 | 4 | 5 | 7 | 9 | 11)
    }

}

impl From<i32> for PitchClass {
    fn from(semitones: i32) -> Self {
        Self::new(semitones)
    }
}

/// Accidental used when spelling a pitch class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accidental {
    #[default]
    Natural,
    Sharp,
    Flat,
}

/// A pitch class paired with its display spelling.
///
/// Natural pitch classes are always spelled `Natural`; black keys are
/// `Sharp` or `Flat`. `E#` and `Cb` therefore read back as `F` and `B`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SpelledPitch {
    class: PitchClass,
    accidental: Accidental,
}

impl SpelledPitch {
    pub fn new(class: PitchClass, prefer: Accidental) -> Self {
        let accidental = if class.is_natural() {
            Accidental::Natural
        } else if prefer == Accidental::Flat {
            Accidental::Flat
        } else {
            Accidental::Sharp
        };
        Self { class, accidental }
    }

    pub fn class(&self) -> PitchClass {
        self.class
    }

    pub fn accidental(&self) -> Accidental {
        self.accidental
    }

    pub fn name(&self) -> &'static str {
        let idx = self.class.value() as usize;
        match self.accidental {
            Accidental::Flat => FLAT_NAMES[idx],
            _ => SHARP_NAMES[idx],
        }
    }

    /// Shift by `semitones`, respelled with `prefer`
    pub fn transpose(self, semitones: i32, prefer: Accidental) -> Self {
        Self::new(self.class.transpose(semitones), prefer)
    }

    /// Parse a note name at the start of `text` (`C`, `F#`, `Bb`, `E♭`).
    /// Returns the pitch and the unconsumed remainder.
    pub(crate) fn parse_prefix(text: &str) -> Option<(Self, &str)> {
        let mut chars = text.chars();
        let base: i32 = match chars.next()? {
            'C' => 0,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            'B' => 11,
            _ => return None,
        };
        let rest = chars.as_str();

        let mut accidental_chars = rest.chars();
        let (offset, accidental) = match accidental_chars.next() {
            Some('#') | Some('♯') => (1, Accidental::Sharp),
            Some('b') | Some('♭') => (-1, Accidental::Flat),
            _ => (0, Accidental::Natural),
        };
        let rest = if accidental == Accidental::Natural {
            rest
        } else {
            accidental_chars.as_str()
        };

        Some((Self::new(PitchClass::new(base + offset), accidental), rest))
    }
}

impl fmt::Display for SpelledPitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SpelledPitch {
    type Err = PhinError;

    fn from_str(s: &str) -> Result<Self> {
        match Self::parse_prefix(s.trim()) {
            Some((pitch, "")) => Ok(pitch),
            _ => Err(PhinError::InvalidKey(s.to_string())),
        }
    }
}

impl TryFrom<String> for SpelledPitch {
    type Error = PhinError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<SpelledPitch> for String {
    fn from(pitch: SpelledPitch) -> Self {
        pitch.name().to_string()
    }
}

/// Key mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Major,
    Minor,
}

/// A key, used to pick a consistent spelling for transposed chords
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Key {
    tonic: PitchClass,
    mode: Mode,
}

impl Key {
    pub fn new(tonic: PitchClass, mode: Mode) -> Self {
        Self { tonic, mode }
    }

    pub fn major(tonic: PitchClass) -> Self {
        Self::new(tonic, Mode::Major)
    }

    pub fn minor(tonic: PitchClass) -> Self {
        Self::new(tonic, Mode::Minor)
    }

    pub fn tonic(&self) -> PitchClass {
        self.tonic
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn relative_major(&self) -> PitchClass {
        match self.mode {
            Mode::Major => self.tonic,
            Mode::Minor => self.tonic.transpose(3),
        }
    }

    /// Position on the circle of fifths: sharps positive, flats negative.
    /// F#/Gb major resolves to six sharps.
    pub fn fifths(&self) -> i8 {
        let v = (self.relative_major().value() as i32 * 7).rem_euclid(12) as i8;
        if v > 6 { v - 12 } else { v }
    }

    /// Sharp keys spell black keys with sharps; flat keys and C major / A minor with flats
    pub fn preferred_accidental(&self) -> Accidental {
        if self.fifths() > 0 {
            Accidental::Sharp
        } else {
            Accidental::Flat
        }
    }

    pub fn tonic_spelled(&self) -> SpelledPitch {
        SpelledPitch::new(self.tonic, self.preferred_accidental())
    }

    pub fn transpose(self, semitones: i32) -> Self {
        Self::new(self.tonic.transpose(semitones), self.mode)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mode {
            Mode::Major => write!(f, "{}", self.tonic_spelled()),
            Mode::Minor => write!(f, "{}m", self.tonic_spelled()),
        }
    }
}

impl FromStr for Key {
    type Err = PhinError;

    fn from_str(s: &str) -> Result<Self> {
        let (tonic, rest) = SpelledPitch::parse_prefix(s.trim())
            .ok_or_else(|| PhinError::InvalidKey(s.to_string()))?;
        let mode = match rest.trim() {
            "" | "maj" | "major" => Mode::Major,
            "m" | "min" | "minor" => Mode::Minor,
            _ => return Err(PhinError::InvalidKey(s.to_string())),
        };
        Ok(Self::new(tonic.class(), mode))
    }
}

impl TryFrom<String> for Key {
    type Error = PhinError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Key> for String {
    fn from(key: Key) -> Self {
        key.to_string()
    }
}
