//! Error types for phinaccords

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PhinError {
    #[error("Invalid chord syntax: {0:?}")]
    InvalidChordSyntax(String),
    #[error("Invalid tempo: {0} BPM (must be a positive number)")]
    InvalidTempo(f64),
    #[error("Invalid chart: {0}")]
    InvalidChart(String),
    #[error("Invalid key: {0:?}")]
    InvalidKey(String),
}

pub type Result<T> = std::result::Result<T, PhinError>;
