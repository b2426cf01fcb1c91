//! Error types for loading, styling and controlling the composed map.

use crate::types::OverlayId;
use thiserror::Error;

/// Coarse classification of a dataset load failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The transfer itself failed or returned a non-success status.
    Network,
    /// The body arrived but is not a usable GeoJSON FeatureCollection.
    Parse,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported dataset format: {0}")]
    UnsupportedFormat(String),

    #[error("{source_name} is not valid GeoJSON: {source}")]
    Json {
        source_name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0} must be a FeatureCollection")]
    NotFeatureCollection(String),
}

impl LoadError {
    pub fn kind(&self) -> FailureKind {
        match self {
            LoadError::Request { .. } | LoadError::Status { .. } | LoadError::Io { .. } => {
                FailureKind::Network
            }
            LoadError::UnsupportedFormat(_)
            | LoadError::Json { .. }
            | LoadError::NotFeatureCollection(_) => FailureKind::Parse,
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum StyleError {
    #[error("expected {expected} colors for {breakpoints} breakpoints, got {actual}")]
    ColorCount {
        breakpoints: usize,
        expected: usize,
        actual: usize,
    },

    #[error("breakpoints must be strictly ascending (index {0})")]
    Unordered(usize),

    #[error("no numeric values to classify")]
    NoValues,
}

#[derive(Debug, Error, PartialEq)]
pub enum LegendError {
    #[error("legend needs at least one breakpoint")]
    Empty,

    #[error("legend has {breakpoints} breakpoints but {colors} colors")]
    LengthMismatch { breakpoints: usize, colors: usize },

    #[error("legend breakpoints must be strictly ascending (index {0})")]
    Unordered(usize),
}

#[derive(Debug, Error, PartialEq)]
pub enum ControlError {
    #[error("overlay {0} is not available")]
    Unavailable(OverlayId),

    #[error("overlay {0} is not visible")]
    NotVisible(OverlayId),

    #[error("overlay {overlay} has no feature {index}")]
    UnknownFeature { overlay: OverlayId, index: usize },

    #[error("overlay {0} does not handle feature events")]
    NotInteractive(OverlayId),

    #[error("unknown base layer: {0}")]
    UnknownBaseLayer(String),

    #[error("map overlays were already loaded")]
    AlreadyInitialized,
}
