//! Plain-text views of songs, charts and the live practice state

use phinaccords_core::{
    Accidental, ChordChart, PitchClass, SessionView, SongInfo, SpelledPitch, StripChord,
    TransportState,
};

pub fn song_line(song: &SongInfo) -> String {
    let key = song.key.map(|k| k.to_string()).unwrap_or_else(|| "-".into());
    let bpm = song
        .bpm
        .map(|b| format!("{b:.0} BPM"))
        .unwrap_or_else(|| "- BPM".into());
    format!(
        "{:<20} {} - {} [{}] {} {}",
        song.id.as_str(),
        song.title,
        song.artist,
        song.format_duration(),
        key,
        bpm
    )
}

/// One line per chord change: start beat then symbol
pub fn chart_lines(chart: &ChordChart) -> Vec<String> {
    let mut lines = Vec::with_capacity(chart.len() + 1);
    if let Some(key) = chart.key() {
        lines.push(format!("Key: {key}"));
    }
    lines.extend(
        chart
            .events()
            .iter()
            .map(|event| format!("{:>6.1}  {}", event.start_beat, event.chord)),
    );
    lines
}

/// Chords around the playhead; the sounding one is bracketed
pub fn strip_line(strip: &[StripChord]) -> String {
    strip
        .iter()
        .map(|c| {
            if c.current {
                format!("[{}]", c.chord)
            } else {
                c.chord.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("  ")
}

/// One octave with the chord's tones marked underneath
pub fn keyboard(tones: &[PitchClass]) -> String {
    let mut names = String::new();
    let mut marks = String::new();
    for value in 0..12 {
        let key = PitchClass::new(value);
        let name = SpelledPitch::new(key, Accidental::Sharp).name();
        let lit = tones.contains(&key);
        names.push_str(&format!("{name:<3}"));
        marks.push_str(if lit { "*  " } else { "   " });
    }
    format!("{}\n{}", names.trim_end(), marks.trim_end())
}

pub fn status_line(view: &SessionView) -> String {
    let icon = match view.state {
        TransportState::Playing => "\u{25B6}",
        TransportState::Paused => "\u{23F8}",
        TransportState::Stopped => "\u{23F9}",
    };
    let chord = view
        .current_chord
        .map(|c| c.to_string())
        .unwrap_or_else(|| "-".into());
    let key = view.key.map(|k| k.to_string()).unwrap_or_else(|| "-".into());
    format!(
        "{icon} {} / {}  beat {:.1}  {:.0} BPM  key {key} ({})  {chord}{}",
        view.elapsed,
        view.duration,
        view.position_beat,
        view.bpm,
        view.transpose,
        if view.looping { "  loop" } else { "" }
    )
}
