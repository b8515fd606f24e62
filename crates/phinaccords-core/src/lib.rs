//! phinaccords-core: Domain types for the PhinAccords chord-practice engine

pub mod chart;
pub mod chord;
mod error;
pub mod pitch;
pub mod session;
pub mod song;
pub mod transport;
pub mod transpose;

pub use chart::{ChordChart, ChordEvent};
pub use chord::{Chord, ChordQuality};
pub use error::{PhinError, Result};
pub use pitch::{Accidental, Key, Mode, PitchClass, SpelledPitch};
pub use session::{SessionView, SongSession, StripChord};
pub use song::{SongId, SongInfo};
pub use transport::{ClockStep, DEFAULT_BPM, PlaybackClock, TransportState, format_secs};
pub use transpose::{TransposeOffset, transpose_chart};
