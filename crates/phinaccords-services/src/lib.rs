//! phinaccords-services: Catalog, practice engine, time sources and config

pub mod catalog;
pub mod config;
pub mod practice_engine;
pub mod tick_source;

pub use catalog::{CatalogError, InMemoryCatalog, SongCatalog};
pub use config::{PracticeConfig, config_path, load_config, load_config_from, save_config, save_config_to};
pub use practice_engine::{ChordChange, EngineError, PracticeEngine};
pub use tick_source::{AudioPositionSource, ManualTimer, SyntheticTimer, Tick, TickSource};
