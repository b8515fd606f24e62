use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use phinaccords_core::{SongId, TransportState};
use phinaccords_services::{
    AudioPositionSource, CatalogError, EngineError, InMemoryCatalog, ManualTimer, PracticeConfig,
    PracticeEngine, SyntheticTimer,
};

fn chord_name(engine: &PracticeEngine) -> Option<String> {
    engine.current_chord().map(|c| c.to_string())
}

#[test]
fn test_practice_session_from_sample_catalog() {
    let catalog = InMemoryCatalog::sample().unwrap();
    let timer = ManualTimer::new();
    let engine = PracticeEngine::open(
        &catalog,
        &SongId::new("yahweh-sabaoth"),
        &PracticeConfig::default(),
        Box::new(timer.clone()),
    )
    .unwrap();

    let view = engine.snapshot();
    assert_eq!(view.title.as_deref(), Some("Yahweh Sabaoth"));
    assert_eq!(view.bpm, 126.0);
    assert_eq!(view.key.map(|k| k.to_string()), Some("F".into()));
    assert_eq!(chord_name(&engine), Some("A#".into()));

    // "Transpose D": F up to D is -3 semitones; the whole chart respells flat-free
    engine.set_transpose_offset(-3);
    assert_eq!(engine.snapshot().key.map(|k| k.to_string()), Some("D".into()));
    assert_eq!(chord_name(&engine), Some("G".into()));

    engine.play();
    // Five beats in: second chord (C, shown as A)
    timer.step(5.0 * 60.0 / 126.0);
    engine.tick();
    assert_eq!(chord_name(&engine), Some("A".into()));

    let strip: Vec<String> = engine
        .chord_strip(1, 1)
        .iter()
        .map(|c| c.chord.to_string())
        .collect();
    assert_eq!(strip, vec!["G", "A", "Bm"]);
}

#[test]
fn test_open_unknown_song() {
    let catalog = InMemoryCatalog::sample().unwrap();
    let err = PracticeEngine::open(
        &catalog,
        &SongId::new("missing"),
        &PracticeConfig::default(),
        Box::new(ManualTimer::new()),
    )
    .err()
    .unwrap();
    assert!(matches!(err, EngineError::Catalog(CatalogError::SongNotFound(_))));
}

#[test]
fn test_config_looping_applies_to_session() {
    let catalog = InMemoryCatalog::sample().unwrap();
    let timer = ManualTimer::new();
    let config = PracticeConfig {
        looping: true,
        ..Default::default()
    };
    let engine = PracticeEngine::open(
        &catalog,
        &SongId::new("way-maker"),
        &config,
        Box::new(timer.clone()),
    )
    .unwrap();

    engine.play();
    // 16 beats at 68 BPM, plus one more beat
    timer.step(17.0 * 60.0 / 68.0);
    engine.tick();
    assert_eq!(engine.state(), TransportState::Playing);
    assert!(engine.position_beat() < 2.0);
    assert_eq!(chord_name(&engine), Some("E".into()));
}

#[test]
fn test_tempo_stepper_uses_config_step() {
    let catalog = InMemoryCatalog::sample().unwrap();
    let config = PracticeConfig {
        bpm_step: 4.0,
        ..Default::default()
    };
    let engine = PracticeEngine::open(
        &catalog,
        &SongId::new("awesome-god"),
        &config,
        Box::new(ManualTimer::new()),
    )
    .unwrap();

    assert_eq!(engine.snapshot().bpm, 92.0);
    assert_eq!(engine.tempo_up().unwrap(), 96.0);
    assert_eq!(engine.tempo_down().unwrap(), 92.0);
    assert_eq!(engine.tempo_down().unwrap(), 88.0);
}

#[test]
fn test_audio_position_drives_clock() {
    let catalog = InMemoryCatalog::sample().unwrap();
    let audio_millis = Arc::new(AtomicU64::new(0));
    let reader = audio_millis.clone();
    let source = AudioPositionSource::new(move || {
        Some(reader.load(Ordering::SeqCst) as f64 / 1000.0)
    });

    let engine = PracticeEngine::open(
        &catalog,
        &SongId::new("jesus-est-roi"),
        &PracticeConfig::default(),
        Box::new(source),
    )
    .unwrap();
    engine.set_tempo(60.0).unwrap();

    audio_millis.store(5_000, Ordering::SeqCst);
    engine.tick();
    // Not playing yet: the mirror ignores the audio clock
    assert_eq!(engine.position_beat(), 0.0);

    engine.play();
    engine.tick();
    assert_eq!(engine.position_beat(), 5.0);
    assert_eq!(chord_name(&engine), Some("D/F#".into()));
}

#[test]
fn test_ticker_thread_moves_position() {
    let catalog = InMemoryCatalog::sample().unwrap();
    let mut engine = PracticeEngine::open(
        &catalog,
        &SongId::new("royal-priesthood"),
        &PracticeConfig::default(),
        Box::new(SyntheticTimer::new()),
    )
    .unwrap();

    let changes = engine.subscribe();
    engine.start_ticker(Duration::from_millis(2)).unwrap();
    engine.play();
    let first = changes.recv_timeout(Duration::from_secs(1)).unwrap();
    assert_eq!(first.chord.map(|c| c.to_string()), Some("E".into()));

    std::thread::sleep(Duration::from_millis(50));
    engine.stop();
    engine.stop_ticker().unwrap();

    assert_eq!(engine.state(), TransportState::Stopped);
    assert_eq!(engine.position_beat(), 0.0);
}
