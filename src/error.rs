//! Domain error types.
//!
//! Orchestration code uses `anyhow`; these enums cover the failures a caller
//! is expected to match on (skip a movie, surface a bad year, etc.).

use std::path::PathBuf;
use thiserror::Error;

/// A box-office string that could not be read as a dollar amount.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("Invalid box office value: {raw:?}")]
pub struct BoxOfficeParseError {
    pub raw: String,
}

impl BoxOfficeParseError {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }
}

/// Errors from the price-index adjustment.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InflationError {
    #[error("No price index available for year {0}")]
    IndexUnavailable(i32),

    #[error("Invalid release year: {0:?}")]
    InvalidYear(String),

    #[error("Price index table is empty")]
    EmptyTable,

    #[error("Malformed price index line {line}: {content:?}")]
    MalformedTable { line: usize, content: String },
}

/// Errors from computing aggregate statistics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregateError {
    #[error("Cannot aggregate an empty movie list")]
    EmptyInput,
}

/// Errors from poster composition and video writing.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("FFmpeg not found: {0}")]
    FfmpegNotFound(PathBuf),

    #[error("FFmpeg exited with status {status}: {stderr}")]
    FfmpegFailed { status: String, stderr: String },

    #[error("Invalid video settings: {0}")]
    InvalidVideo(String),

    #[error("Nothing to render: {0}")]
    Empty(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RenderError {
    pub fn ffmpeg_failed(status: impl ToString, stderr: impl Into<String>) -> Self {
        Self::FfmpegFailed {
            status: status.to_string(),
            stderr: stderr.into(),
        }
    }
}
