//! Chord symbols: parsing, formatting and transposition

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PhinError, Result};
use crate::pitch::{Accidental, Key, Mode, PitchClass, SpelledPitch};

// ============================================================================
// Chord Quality
// ============================================================================

/// Chord quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChordQuality {
    Major,
    Minor,
    Diminished,
    Augmented,
    Major7,
    Minor7,
    Dominant7,
    Diminished7,
    HalfDiminished7,
    Sus2,
    Sus4,
    Dominant7Sus4,
    Add9,
    Major6,
    Minor6,
    Dominant9,
    Major9,
    Minor9,
    Dominant11,
    Minor11,
    Dominant13,
}

impl ChordQuality {
    pub const ALL: [ChordQuality; 21] = [
        Self::Major,
        Self::Minor,
        Self::Diminished,
        Self::Augmented,
        Self::Major7,
        Self::Minor7,
        Self::Dominant7,
        Self::Diminished7,
        Self::HalfDiminished7,
        Self::Sus2,
        Self::Sus4,
        Self::Dominant7Sus4,
        Self::Add9,
        Self::Major6,
        Self::Minor6,
        Self::Dominant9,
        Self::Major9,
        Self::Minor9,
        Self::Dominant11,
        Self::Minor11,
        Self::Dominant13,
    ];

    /// Get chord intervals from root
    pub fn intervals(&self) -> &'static [u8] {
        match self {
            Self::Major => &[0, 4, 7],
            Self::Minor => &[0, 3, 7],
            Self::Diminished => &[0, 3, 6],
            Self::Augmented => &[0, 4, 8],
            Self::Major7 => &[0, 4, 7, 11],
            Self::Minor7 => &[0, 3, 7, 10],
            Self::Dominant7 => &[0, 4, 7, 10],
            Self::Diminished7 => &[0, 3, 6, 9],
            Self::HalfDiminished7 => &[0, 3, 6, 10],
            Self::Sus2 => &[0, 2, 7],
            Self::Sus4 => &[0, 5, 7],
            Self::Dominant7Sus4 => &[0, 5, 7, 10],
            Self::Add9 => &[0, 4, 7, 14],
            Self::Major6 => &[0, 4, 7, 9],
            Self::Minor6 => &[0, 3, 7, 9],
            Self::Dominant9 => &[0, 4, 7, 10, 14],
            Self::Major9 => &[0, 4, 7, 11, 14],
            Self::Minor9 => &[0, 3, 7, 10, 14],
            Self::Dominant11 => &[0, 4, 7, 10, 14, 17],
            Self::Minor11 => &[0, 3, 7, 10, 14, 17],
            Self::Dominant13 => &[0, 4, 7, 10, 14, 21],
        }
    }

    /// Canonical symbol written after the root
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Major => "",
            Self::Minor => "m",
            Self::Diminished => "dim",
            Self::Augmented => "aug",
            Self::Major7 => "maj7",
            Self::Minor7 => "m7",
            Self::Dominant7 => "7",
            Self::Diminished7 => "dim7",
            Self::HalfDiminished7 => "m7b5",
            Self::Sus2 => "sus2",
            Self::Sus4 => "sus4",
            Self::Dominant7Sus4 => "7sus4",
            Self::Add9 => "add9",
            Self::Major6 => "6",
            Self::Minor6 => "m6",
            Self::Dominant9 => "9",
            Self::Major9 => "maj9",
            Self::Minor9 => "m9",
            Self::Dominant11 => "11",
            Self::Minor11 => "m11",
            Self::Dominant13 => "13",
        }
    }

    /// Accepts the canonical symbol and common lead-sheet aliases
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let quality = match symbol {
            "" | "maj" | "M" => Self::Major,
            "m" | "min" | "-" => Self::Minor,
            "dim" | "°" | "o" => Self::Diminished,
            "aug" | "+" => Self::Augmented,
            "maj7" | "M7" | "Δ" | "Δ7" | "ma7" => Self::Major7,
            "m7" | "min7" | "-7" => Self::Minor7,
            "7" | "dom7" => Self::Dominant7,
            "dim7" | "°7" | "o7" => Self::Diminished7,
            "m7b5" | "min7b5" | "-7b5" | "ø" | "ø7" => Self::HalfDiminished7,
            "sus2" => Self::Sus2,
            "sus4" | "sus" => Self::Sus4,
            "7sus4" | "7sus" => Self::Dominant7Sus4,
            "add9" | "add2" => Self::Add9,
            "6" | "maj6" => Self::Major6,
            "m6" | "min6" => Self::Minor6,
            "9" => Self::Dominant9,
            "maj9" | "M9" => Self::Major9,
            "m9" | "min9" => Self::Minor9,
            "11" => Self::Dominant11,
            "m11" | "min11" => Self::Minor11,
            "13" => Self::Dominant13,
            _ => return None,
        };
        Some(quality)
    }

    /// Qualities built on a minor third
    pub fn is_minor(&self) -> bool {
        self.intervals().get(1) == Some(&3)
    }
}

// ============================================================================
// Chord
// ============================================================================

/// A chord symbol: root, quality and optional slash bass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Chord {
    pub root: SpelledPitch,
    pub quality: ChordQuality,
    pub bass: Option<SpelledPitch>,
}

impl Chord {
    pub fn new(root: SpelledPitch, quality: ChordQuality) -> Self {
        Self {
            root,
            quality,
            bass: None,
        }
    }

    pub fn with_bass(mut self, bass: SpelledPitch) -> Self {
        self.bass = Some(bass);
        self
    }

    /// Parse a chord symbol such as `Am`, `Db/F` or `Eb11`
    pub fn parse(text: &str) -> Result<Self> {
        let invalid = || PhinError::InvalidChordSyntax(text.to_string());

        let (root, rest) = SpelledPitch::parse_prefix(text.trim()).ok_or_else(invalid)?;
        let (quality_text, bass_text) = match rest.split_once('/') {
            Some((quality, bass)) => (quality, Some(bass)),
            None => (rest, None),
        };

        let quality = ChordQuality::from_symbol(quality_text).ok_or_else(invalid)?;
        let bass = match bass_text {
            Some(bass_text) => match SpelledPitch::parse_prefix(bass_text) {
                Some((bass, "")) => Some(bass),
                _ => return Err(invalid()),
            },
            None => None,
        };

        Ok(Self { root, quality, bass })
    }

    /// Conventional key implied by a chord rooted here: minor-third
    /// qualities imply a minor key, everything else a major key.
    pub fn implied_key(&self) -> Key {
        let mode = if self.quality.is_minor() {
            Mode::Minor
        } else {
            Mode::Major
        };
        Key::new(self.root.class(), mode)
    }

    /// Shift root and bass by `semitones` (any integer, reduced mod 12),
    /// spelled by the key the transposed chord implies.
    pub fn transpose(&self, semitones: i32) -> Self {
        let target = Key::new(self.root.class().transpose(semitones), self.implied_key().mode());
        self.transpose_with(semitones, target.preferred_accidental())
    }

    /// Shift root and bass by `semitones`, spelled with `prefer`
    pub fn transpose_with(&self, semitones: i32, prefer: Accidental) -> Self {
        Self {
            root: self.root.transpose(semitones, prefer),
            quality: self.quality,
            bass: self.bass.map(|bass| bass.transpose(semitones, prefer)),
        }
    }

    /// Pitch classes sounded by the chord, bass first when present
    pub fn tones(&self) -> Vec<PitchClass> {
        let mut tones = Vec::with_capacity(self.quality.intervals().len() + 1);
        if let Some(bass) = self.bass {
            tones.push(bass.class());
        }
        for &interval in self.quality.intervals() {
            let tone = self.root.class().transpose(interval as i32);
            if !tones.contains(&tone) {
                tones.push(tone);
            }
        }
        tones
    }
}

impl fmt::Display for Chord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.root, self.quality.symbol())?;
        if let Some(bass) = self.bass {
            write!(f, "/{}", bass)?;
        }
        Ok(())
    }
}

impl FromStr for Chord {
    type Err = PhinError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Chord {
    type Error = PhinError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Chord> for String {
    fn from(chord: Chord) -> Self {
        chord.to_string()
    }
}
