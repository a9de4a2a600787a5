//! Error types for puzzle construction and configuration

use thiserror::Error;

use crate::sim::DeflectorId;

#[derive(Error, Debug)]
pub enum PuzzleError {
    #[error("Scene has no laser emitter")]
    MissingEmitter,

    #[error("Scene has no laser receiver")]
    MissingReceiver,

    #[error("Tower controller has no deflectors to control")]
    NoDeflectors,

    #[error("Unknown deflector: {0}")]
    UnknownDeflector(DeflectorId),

    #[error("Deflector listed twice in tower order: {0}")]
    DuplicateTowerEntry(DeflectorId),

    #[error("Unknown laser material: {0}")]
    UnknownMaterial(String),

    #[error("Laser material defined twice: {0}")]
    DuplicateMaterial(String),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PuzzleError>;
