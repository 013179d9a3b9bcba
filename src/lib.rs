// Library exports for reuse by the command-line tool and upload front ends
pub mod cli;
pub mod config_file;
pub mod error;
pub mod image_processing;
pub mod json_output;
pub mod utils;

// Re-export commonly used types
pub use cli::{Args, OutputFormat};
pub use error::{BatchError, ConfigError, ProcessingWarning, SkipReason};
pub use image_processing::batch::{BatchResult, FileRecord, FileStatus};
pub use image_processing::codec::OutputCodec;
pub use image_processing::upload::{NamedOutput, Upload, UploadBatch};
pub use image_processing::{
    Background, CanvasSpec, ImageInput, OutputArtifact, OutputPolicy, ProcessOutcome,
    ProcessingConfig, ProcessingEngine,
};
pub use json_output::JsonMessage;
