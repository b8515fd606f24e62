//! Song catalog: read-only source of charts and song metadata

use std::path::Path;
use std::sync::Arc;

use phinaccords_core::{ChordChart, SongId, SongInfo};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

const SAMPLE_CATALOG: &str = include_str!("../assets/sample_catalog.json");

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Song not found: {0}")]
    SongNotFound(SongId),
    #[error("Duplicate song id in catalog: {0}")]
    DuplicateSong(SongId),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Catalog JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Read-only song source injected into practice sessions
pub trait SongCatalog: Send + Sync {
    /// All songs, in catalog order
    fn songs(&self) -> Vec<SongInfo>;

    fn song(&self, id: &SongId) -> Result<SongInfo, CatalogError>;

    fn fetch_chart(&self, id: &SongId) -> Result<Arc<ChordChart>, CatalogError>;

    /// Library filter chip ("Gospel", "Live", ...)
    fn songs_tagged(&self, tag: &str) -> Vec<SongInfo> {
        self.songs().into_iter().filter(|s| s.has_tag(tag)).collect()
    }

    /// Case-insensitive match on title or artist
    fn search(&self, query: &str) -> Vec<SongInfo> {
        let query = query.trim().to_lowercase();
        self.songs()
            .into_iter()
            .filter(|s| {
                s.title.to_lowercase().contains(&query) || s.artist.to_lowercase().contains(&query)
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
struct CatalogEntry {
    info: SongInfo,
    chart: Arc<ChordChart>,
}

/// Catalog held in memory, loadable from a JSON document
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    entries: Vec<CatalogEntry>,
}

#[derive(Deserialize)]
struct CatalogDocument {
    songs: Vec<SongDocument>,
}

#[derive(Deserialize)]
struct SongDocument {
    #[serde(flatten)]
    info: SongInfo,
    chart: ChordChart,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a song. A chart without its own key inherits the song's key.
    pub fn insert(&mut self, info: SongInfo, chart: ChordChart) -> Result<(), CatalogError> {
        if self.entries.iter().any(|e| e.info.id == info.id) {
            return Err(CatalogError::DuplicateSong(info.id));
        }
        let chart = match chart.key() {
            Some(_) => chart,
            None => chart.with_key(info.key),
        };
        debug!("Catalog: added {} ({} chords)", info.id, chart.len());
        self.entries.push(CatalogEntry {
            info,
            chart: Arc::new(chart),
        });
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let document: CatalogDocument = serde_json::from_str(json)?;
        let mut catalog = Self::new();
        for song in document.songs {
            catalog.insert(song.info, song.chart)?;
        }
        Ok(catalog)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path)?;
        let catalog = Self::from_json(&json)?;
        info!("Loaded {} songs from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    /// The bundled library shown on first launch
    pub fn sample() -> Result<Self, CatalogError> {
        Self::from_json(SAMPLE_CATALOG)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, id: &SongId) -> Result<&CatalogEntry, CatalogError> {
        self.entries
            .iter()
            .find(|e| &e.info.id == id)
            .ok_or_else(|| CatalogError::SongNotFound(id.clone()))
    }
}

impl SongCatalog for InMemoryCatalog {
    fn songs(&self) -> Vec<SongInfo> {
        self.entries.iter().map(|e| e.info.clone()).collect()
    }

    fn song(&self, id: &SongId) -> Result<SongInfo, CatalogError> {
        self.entry(id).map(|e| e.info.clone())
    }

    fn fetch_chart(&self, id: &SongId) -> Result<Arc<ChordChart>, CatalogError> {
        self.entry(id).map(|e| e.chart.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_catalog_loads() {
        let catalog = InMemoryCatalog::sample().unwrap();
        assert_eq!(catalog.len(), 6);

        let songs = catalog.songs();
        assert_eq!(songs[0].title, "Yahweh Sabaoth");
        assert_eq!(songs[0].format_duration(), "11:40");
        assert_eq!(songs[0].bpm, Some(126.0));

        let chart = catalog.fetch_chart(&SongId::new("yahweh-sabaoth")).unwrap();
        assert_eq!(chart.key().map(|k| k.to_string()), Some("F".into()));
        assert_eq!(chart.chord_at(0.0).map(|c| c.to_string()), Some("A#".into()));
    }

    #[test]
    fn test_missing_song() {
        let catalog = InMemoryCatalog::sample().unwrap();
        let err = catalog.fetch_chart(&SongId::new("nope")).unwrap_err();
        assert!(matches!(err, CatalogError::SongNotFound(id) if id.as_str() == "nope"));
    }

    #[test]
    fn test_filters() {
        let catalog = InMemoryCatalog::sample().unwrap();
        let live: Vec<String> = catalog.songs_tagged("live").into_iter().map(|s| s.title).collect();
        assert_eq!(live, vec!["Yahweh Sabaoth", "JESUS EST ROI", "In extremis Alleluia"]);

        let found = catalog.search("sinach");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Way Maker");
    }

    #[test]
    fn test_rejects_invalid_chart() {
        let json = r#"{"songs":[{"id":"x","title":"X","artist":"Y",
            "chart":{"total_beats":4,"events":[{"chord":"C","beat":2},{"chord":"G","beat":1}]}}]}"#;
        assert!(matches!(InMemoryCatalog::from_json(json), Err(CatalogError::Json(_))));

        let json = r#"{"songs":[{"id":"x","title":"X","artist":"Y",
            "chart":{"total_beats":4,"events":[{"chord":"Cq","beat":0}]}}]}"#;
        assert!(matches!(InMemoryCatalog::from_json(json), Err(CatalogError::Json(_))));
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let mut catalog = InMemoryCatalog::new();
        let chart = ChordChart::from_symbols(&[("C", 0.0)], 4.0).unwrap();
        catalog.insert(SongInfo::new("a", "A", "Artist"), chart.clone()).unwrap();
        let err = catalog.insert(SongInfo::new("a", "A again", "Artist"), chart).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateSong(_)));
        assert_eq!(catalog.len(), 1);
    }
}
