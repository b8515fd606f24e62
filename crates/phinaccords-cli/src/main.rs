//! phinaccords: chord-chart practice from the terminal

mod args;
mod render;

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use args::{Cli, Command, PracticeArgs};
use crossbeam_channel::RecvTimeoutError;
use phinaccords_core::{TransportState, transpose_chart};
use phinaccords_services::{
    InMemoryCatalog, PracticeConfig, PracticeEngine, SongCatalog, SyntheticTimer, load_config,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const STRIP_BEFORE: usize = 1;
const STRIP_AFTER: usize = 3;
const STATUS_POLL: Duration = Duration::from_millis(250);

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("phinaccords=info".parse()?),
        )
        .init();

    let cli = match args::parse_args(std::env::args().skip(1)) {
        Ok(cli) => cli,
        Err(message) => {
            eprintln!("{message}\n\n{}", args::USAGE);
            std::process::exit(2);
        }
    };

    let mut config = load_config();
    if cli.catalog.is_some() {
        config.catalog_path = cli.catalog.clone();
    }

    run(cli, config)
}

fn run(cli: Cli, config: PracticeConfig) -> Result<()> {
    if cli.command == Command::Help {
        println!("{}", args::USAGE);
        return Ok(());
    }

    let catalog = open_catalog(&config)?;
    match cli.command {
        Command::List { tag } => {
            let songs = match tag.as_deref() {
                Some(tag) => catalog.songs_tagged(tag),
                None => catalog.songs(),
            };
            for song in &songs {
                println!("{}", render::song_line(song));
            }
        }
        Command::Show { song, transpose } => {
            let info = catalog.song(&song)?;
            let chart = catalog.fetch_chart(&song)?;
            println!("{}", render::song_line(&info));
            for line in render::chart_lines(&transpose_chart(&chart, transpose)) {
                println!("{line}");
            }
        }
        Command::Practice(practice_args) => practice(&catalog, config, practice_args)?,
        Command::Help => {}
    }
    Ok(())
}

fn open_catalog(config: &PracticeConfig) -> Result<InMemoryCatalog> {
    match &config.catalog_path {
        Some(path) => InMemoryCatalog::load(path)
            .with_context(|| format!("Failed to load catalog {}", path.display())),
        None => Ok(InMemoryCatalog::sample()?),
    }
}

fn practice(catalog: &InMemoryCatalog, mut config: PracticeConfig, args: PracticeArgs) -> Result<()> {
    config.looping |= args.looping;

    let mut engine = PracticeEngine::open(
        catalog,
        &args.song,
        &config,
        Box::new(SyntheticTimer::new()),
    )?;
    if let Some(bpm) = args.bpm {
        engine.set_tempo(bpm)?;
    }
    engine.set_transpose_offset(args.transpose);

    let changes = engine.subscribe();
    engine.start_ticker(config.tick_interval())?;
    engine.play();
    info!(song = %args.song, "Practice started");

    let deadline = args
        .seconds
        .and_then(|secs| Duration::try_from_secs_f64(secs.max(0.0)).ok())
        .and_then(|limit| Instant::now().checked_add(limit));

    loop {
        match changes.recv_timeout(STATUS_POLL) {
            Ok(change) => {
                let strip = engine.chord_strip(STRIP_BEFORE, STRIP_AFTER);
                let tones = change.chord.map(|c| c.tones()).unwrap_or_default();
                println!("{}", render::strip_line(&strip));
                println!("{}", render::keyboard(&tones));
                println!("{}\n", render::status_line(&engine.snapshot()));
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                warn!("Chord updates closed");
                break;
            }
        }

        if engine.state() == TransportState::Stopped {
            break;
        }
        if deadline.is_some_and(|d| Instant::now() >= d) {
            break;
        }
    }

    println!("{}", render::status_line(&engine.snapshot()));
    engine.stop();
    engine.stop_ticker()?;
    info!("Practice ended");
    Ok(())
}
