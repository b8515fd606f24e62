//! Song metadata shown in the library and practice views

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::pitch::Key;
use crate::transport::format_secs;

/// Catalog identifier for a song
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SongId(pub String);

impl SongId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SongId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SongId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for SongId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Library entry for a song
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongInfo {
    pub id: SongId,
    pub title: String,
    pub artist: String,
    /// Recording length in seconds
    #[serde(default)]
    pub duration_secs: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artwork_url: Option<String>,
    /// Library filter tags ("Gospel", "Live", ...)
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<Key>,
    /// Suggested practice tempo
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bpm: Option<f64>,
}

impl SongInfo {
    pub fn new(id: impl Into<SongId>, title: impl Into<String>, artist: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            duration_secs: 0,
            artwork_url: None,
            tags: Vec::new(),
            key: None,
            bpm: None,
        }
    }

    /// Recording length as M:SS
    pub fn format_duration(&self) -> String {
        format_secs(self.duration_secs as f64)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_song_info_defaults() {
        let info: SongInfo = serde_json::from_str(
            r#"{"id":"way-maker","title":"Way Maker","artist":"Sinach","duration_secs":375,"tags":["Gospel"]}"#,
        )
        .unwrap();
        assert_eq!(info.id, SongId::new("way-maker"));
        assert_eq!(info.format_duration(), "6:15");
        assert!(info.has_tag("gospel"));
        assert!(!info.has_tag("Live"));
        assert_eq!(info.key, None);
        assert_eq!(info.bpm, None);
    }
}
