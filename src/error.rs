//! Error taxonomy for the canvas pipeline.
//!
//! Per-image problems never escape `process_one`: they are turned into a
//! [`SkipReason`] (the image produces no output) or a [`ProcessingWarning`]
//! (the image is still emitted). Only [`ConfigError`] is fatal, and it is
//! raised before any image is touched.

use std::fmt;
use thiserror::Error;

/// Configuration problems detected before a batch starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Invalid color format: '{0}'. Expected hex format like #RRGGBB or #RGB")]
    InvalidColorSpec(String),

    #[error("Canvas size must be a positive integer, got: {0}")]
    InvalidCanvasSize(u32),
}

/// Why an image produced no output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("unsupported file format: {name}")]
    UnsupportedFormat { name: String },

    #[error("failed to decode image: {0}")]
    DecodeFailure(String),

    #[error("image {width}x{height} exceeds canvas size {canvas}x{canvas}")]
    OversizedInput { width: u32, height: u32, canvas: u32 },

    #[error("failed to resize image: {0}")]
    ResizeFailure(String),

    #[error("failed to encode image: {0}")]
    EncodeFailure(String),

    #[error("failed to write output: {0}")]
    WriteFailure(String),
}

impl SkipReason {
    /// Short label used in tables and JSON output
    pub fn label(&self) -> &'static str {
        match self {
            SkipReason::UnsupportedFormat { .. } => "unsupported",
            SkipReason::DecodeFailure(_) => "decode",
            SkipReason::OversizedInput { .. } => "oversized",
            SkipReason::ResizeFailure(_) => "resize",
            SkipReason::EncodeFailure(_) => "encode",
            SkipReason::WriteFailure(_) => "write",
        }
    }
}

/// Metadata blobs carried from the source to the output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataKind {
    Exif,
    IccProfile,
}

impl fmt::Display for MetadataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataKind::Exif => write!(f, "EXIF"),
            MetadataKind::IccProfile => write!(f, "ICC profile"),
        }
    }
}

/// Recoverable problems: the image is still emitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProcessingWarning {
    #[error("Could not apply EXIF orientation: {0}")]
    OrientationReadFailure(String),

    #[error("Could not carry {kind} metadata: {message}")]
    MetadataCarryFailure { kind: MetadataKind, message: String },
}

/// Batch-level outcome errors, decided by the driver rather than the core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchError {
    #[error("No images were processed successfully ({skipped} skipped)")]
    NothingProcessed { skipped: usize },
}
