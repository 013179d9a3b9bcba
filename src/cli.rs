use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::image_processing::codec::OutputCodec;
use crate::image_processing::{CanvasSpec, ProcessingConfig, DEFAULT_CANVAS_SIZE};

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Lossless PNG (default)
    #[default]
    #[value(name = "png")]
    Png,
    /// Lossless WebP
    #[value(name = "webp")]
    Webp,
}

impl From<OutputFormat> for OutputCodec {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Png => OutputCodec::Png,
            OutputFormat::Webp => OutputCodec::WebpLossless,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "canvas-formatter",
    about = "Center images on a fixed-size square canvas without losing quality",
    long_about = "
Canvas Formatter

Places every image at its original size in the middle of a square canvas,
padding the rest with a transparent or solid background. Images are turned
upright from their EXIF orientation first, and outputs are always encoded
losslessly (PNG, or WebP when requested) with the source EXIF and ICC
profile carried over.

Images larger than the canvas are skipped unless --downscale is given, in
which case they are scaled down (Lanczos3) to fit.

Example Usage:
  # Single image on the default 1200x1200 transparent canvas
  canvas-formatter -i photo.jpg -o photo.png

  # Whole folder on a white 1080x1080 canvas, lossless WebP output
  canvas-formatter -i ~/Photos -o ~/formatted -s 1080 --bg '#ffffff' --format webp

  # Scale oversized images down instead of skipping them
  canvas-formatter -i ~/Photos -o ~/formatted --downscale --report

  # Settings from a JSON file, machine-readable progress
  canvas-formatter -i ~/Photos -o ~/formatted --config canvas.json --json

  # Dry run: compose everything but write nothing
  canvas-formatter -i ~/Photos -o ~/formatted --dry-run --verbose"
)]
pub struct Args {
    /// Input image file or folder of images
    #[arg(short = 'i', long = "input", value_name = "FILE|DIR")]
    pub input: PathBuf,

    /// Output image file, or output folder when the input is a folder
    #[arg(short = 'o', long = "output", value_name = "FILE|DIR")]
    pub output: PathBuf,

    /// Canvas side length in pixels
    #[arg(
        short = 's',
        long = "size",
        default_value_t = DEFAULT_CANVAS_SIZE,
        value_name = "PIXELS"
    )]
    pub size: u32,

    /// Background color as hex (#RRGGBB or #RGB); transparent when omitted
    #[arg(long = "bg", value_name = "COLOR")]
    pub background: Option<String>,

    /// Scale images larger than the canvas down to fit instead of skipping them
    #[arg(long = "downscale")]
    pub downscale: bool,

    /// Output format for folder processing
    #[arg(long = "format", value_enum, default_value_t = OutputFormat::Png)]
    pub format: OutputFormat,

    /// Do not copy EXIF and ICC profile data to the output
    #[arg(long = "strip-metadata")]
    pub strip_metadata: bool,

    /// JSON configuration file (command-line values take precedence)
    #[arg(long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Emit progress and results as JSON lines instead of human output
    #[arg(long = "json")]
    pub json: bool,

    /// Display a table with the result for every image at the end
    #[arg(long = "report")]
    pub report: bool,

    /// Perform a dry run: decode and compose images without writing files
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// Enable verbose output with detailed progress information
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl Args {
    /// Validated canvas settings
    pub fn canvas_spec(&self) -> Result<CanvasSpec, ConfigError> {
        CanvasSpec::from_options(self.size, self.background.as_deref())
    }

    /// Build the processing configuration for this run.
    ///
    /// `--downscale` only changes how oversized images are handled; the codec
    /// is still picked from the destination.
    pub fn processing_config(&self) -> Result<ProcessingConfig, ConfigError> {
        let mut config = ProcessingConfig::cli(self.canvas_spec()?);
        config.allow_downscale = self.downscale;
        config.preserve_metadata = !self.strip_metadata;
        config.verbose = self.verbose && !self.json;
        Ok(config)
    }
}


// Default implementation for tests
#[cfg(test)]
impl Default for Args {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            output: PathBuf::new(),
            size: DEFAULT_CANVAS_SIZE,
            background: None,
            downscale: false,
            format: OutputFormat::Png,
            strip_metadata: false,
            config_file: None,
            json: false,
            report: false,
            dry_run: false,
            verbose: false,
        }
    }
}
