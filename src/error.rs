//! Error types shared across the crate.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures raised while normalizing speed limits and deriving travel times.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeatureError {
    #[error("Cannot parse {attribute} value {value:?} on edge {edge}")]
    Parse {
        edge: String,
        attribute: &'static str,
        value: String,
    },

    #[error("Invalid speed limit {speed} on edge {edge}")]
    InvalidSpeed { edge: String, speed: f64 },

    #[error("Edge {0} has no length")]
    MissingLength(String),

    #[error("Unsupported {attribute} value on edge {edge}")]
    UnsupportedValue {
        edge: String,
        attribute: &'static str,
    },
}

/// Failures raised by the bundled centrality measures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CentralityError {
    #[error("Negative weight {weight} on edge {edge}")]
    NegativeWeight { edge: String, weight: f64 },

    #[error("Non-numeric weight {key:?} on edge {edge}")]
    InvalidWeight { edge: String, key: String },

    #[error("Measure is not defined for directed graphs")]
    Directed,

    #[error("Graph is not connected")]
    NotConnected,

    #[error("Laplacian matrix is singular")]
    Singular,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Feature(#[from] FeatureError),

    #[error(transparent)]
    Centrality(#[from] CentralityError),

    #[error("Unknown centrality measure: {0}")]
    UnknownMeasure(String),

    #[error("Invalid graph document: {0}")]
    Load(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
