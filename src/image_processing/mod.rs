pub mod batch;
pub mod canvas;
pub mod codec;
pub mod color;
pub mod orientation;
pub mod report;
pub mod resize;
pub mod upload;

use anyhow::{Context, Result};
use image::Rgb;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{ConfigError, ProcessingWarning, SkipReason};
use crate::utils::{get_file_extension, has_valid_extension, verbose_println};
use codec::{Metadata, OutputCodec};
use orientation::ExifOrientation;

/// Default canvas side length in pixels
pub const DEFAULT_CANVAS_SIZE: u32 = 1200;

/// Canvas background
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Background {
    #[default]
    Transparent,
    Solid(Rgb<u8>),
}

/// Size and background of the output canvas, validated on construction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasSpec {
    size: u32,
    background: Background,
}

impl CanvasSpec {
    pub fn new(size: u32, background: Background) -> Result<Self, ConfigError> {
        if size == 0 {
            return Err(ConfigError::InvalidCanvasSize(size));
        }
        Ok(Self { size, background })
    }

    /// Build canvas settings from raw option values (`None` background = transparent)
    pub fn from_options(size: u32, background: Option<&str>) -> Result<Self, ConfigError> {
        let background = color::parse_background(background)?;
        Self::new(size, background)
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn background(&self) -> Background {
        self.background
    }
}

/// How the output codec is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputPolicy {
    /// Always encode with this codec, whatever the destination is called
    Fixed(OutputCodec),
    /// Lossless WebP for `.webp` destinations, PNG otherwise
    FromDestination,
}

impl OutputPolicy {
    pub fn resolve(&self, destination: Option<&Path>) -> OutputCodec {
        match (self, destination) {
            (OutputPolicy::Fixed(codec), _) => *codec,
            (OutputPolicy::FromDestination, Some(path)) => OutputCodec::for_destination(path),
            (OutputPolicy::FromDestination, None) => OutputCodec::Png,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProcessingConfig {
    pub canvas: CanvasSpec,
    /// Scale oversized images down instead of skipping them
    pub allow_downscale: bool,
    pub output_policy: OutputPolicy,
    /// Re-attach the source EXIF and ICC blobs to the output
    pub preserve_metadata: bool,
    pub verbose: bool,
}

impl ProcessingConfig {
    /// Command-line behavior: oversized images are skipped, the codec follows
    /// the destination extension.
    pub fn cli(canvas: CanvasSpec) -> Self {
        Self {
            canvas,
            allow_downscale: false,
            output_policy: OutputPolicy::FromDestination,
            preserve_metadata: true,
            verbose: false,
        }
    }

    /// Upload behavior: oversized images are scaled down, output is always PNG.
    pub fn web(canvas: CanvasSpec) -> Self {
        Self {
            canvas,
            allow_downscale: true,
            output_policy: OutputPolicy::Fixed(OutputCodec::Png),
            preserve_metadata: true,
            verbose: false,
        }
    }
}

/// A readable image resource
#[derive(Debug, Clone, Copy)]
pub enum ImageInput<'a> {
    Path(&'a Path),
    Bytes { name: &'a str, data: &'a [u8] },
}

impl ImageInput<'_> {
    /// Display name used in logs and skip reasons
    pub fn name(&self) -> Cow<'_, str> {
        match self {
            ImageInput::Path(path) => path.to_string_lossy(),
            ImageInput::Bytes { name, .. } => Cow::Borrowed(name),
        }
    }

    fn extension(&self) -> Option<String> {
        match self {
            ImageInput::Path(path) => get_file_extension(path),
            ImageInput::Bytes { name, .. } => get_file_extension(Path::new(name)),
        }
    }
}

/// What happened to one image on its way to the canvas
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositionDetails {
    /// Size after orientation correction, before any downscale
    pub source_size: (u32, u32),
    pub placed_size: (u32, u32),
    pub offset: (u32, u32),
    pub orientation: ExifOrientation,
    pub downscaled: bool,
}

/// An encoded output image
#[derive(Debug, Clone)]
pub struct OutputArtifact {
    pub bytes: Vec<u8>,
    pub codec: OutputCodec,
    pub details: CompositionDetails,
    pub warnings: Vec<ProcessingWarning>,
}

/// Result of processing a single image
#[derive(Debug)]
pub enum ProcessOutcome {
    Success(OutputArtifact),
    Skipped(SkipReason),
}

pub struct ProcessingEngine {
    config: ProcessingConfig,
}

impl ProcessingEngine {
    pub fn new(config: ProcessingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProcessingConfig {
        &self.config
    }

    /// Discover supported image files directly inside a directory
    pub fn discover_images(&self, input_dir: &Path) -> Result<Vec<PathBuf>> {
        verbose_println(
            self.config.verbose,
            &format!("Scanning directory: {}", input_dir.display()),
        );

        let mut image_files = Vec::new();
        let walker = WalkDir::new(input_dir).min_depth(1).max_depth(1);

        for entry in walker {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if path.is_file() && has_valid_extension(path, codec::SUPPORTED_EXTENSIONS) {
                image_files.push(path.to_path_buf());
            }
        }

        // Sort for consistent processing order
        image_files.sort();

        verbose_println(
            self.config.verbose,
            &format!("Found {} image files", image_files.len()),
        );
        Ok(image_files)
    }

    /// Run one image through decode, orientation, composition and encoding.
    ///
    /// `destination` is only used to pick the codec under
    /// [`OutputPolicy::FromDestination`]; nothing is written here.
    pub fn process_one(&self, input: ImageInput<'_>, destination: Option<&Path>) -> ProcessOutcome {
        match self.run_pipeline(input, destination) {
            Ok(artifact) => ProcessOutcome::Success(artifact),
            Err(reason) => {
                verbose_println(
                    self.config.verbose,
                    &format!("Skipping {}: {}", input.name(), reason),
                );
                ProcessOutcome::Skipped(reason)
            }
        }
    }

    fn run_pipeline(
        &self,
        input: ImageInput<'_>,
        destination: Option<&Path>,
    ) -> Result<OutputArtifact, SkipReason> {
        let name = input.name();

        let supported = input
            .extension()
            .map(|ext| codec::is_supported_extension(&ext))
            .unwrap_or(false);
        if !supported {
            return Err(SkipReason::UnsupportedFormat {
                name: name.into_owned(),
            });
        }

        let source = match input {
            ImageInput::Path(path) => {
                let data = std::fs::read(path)
                    .map_err(|e| SkipReason::DecodeFailure(format!("{}: {}", path.display(), e)))?;
                codec::decode(&data)?
            }
            ImageInput::Bytes { data, .. } => codec::decode(data)?,
        };
        verbose_println(
            self.config.verbose,
            &format!(
                "Decoded {} ({:?}, {}x{})",
                name,
                source.format,
                source.pixels.width(),
                source.pixels.height()
            ),
        );

        let mut warnings = Vec::new();
        let (source, orientation_warning) = orientation::normalize_orientation(source);
        warnings.extend(orientation_warning);
        if source.orientation.needs_transform() {
            let swapped = if source.orientation.swaps_dimensions() {
                ", width and height swapped"
            } else {
                ""
            };
            verbose_println(
                self.config.verbose,
                &format!(
                    "Applied EXIF orientation: {}{}",
                    source.orientation.description(),
                    swapped
                ),
            );
        }

        let canvas =
            canvas::center_on_canvas(&source.pixels, &self.config.canvas, self.config.allow_downscale)?;
        let details = CompositionDetails {
            source_size: (source.pixels.width(), source.pixels.height()),
            placed_size: canvas.placed_size,
            offset: canvas.offset,
            orientation: source.orientation,
            downscaled: canvas.downscaled,
        };
        if details.downscaled {
            verbose_println(
                self.config.verbose,
                &format!(
                    "Resized {}x{} to {}x{} to fit {}x{} canvas",
                    details.source_size.0,
                    details.source_size.1,
                    details.placed_size.0,
                    details.placed_size.1,
                    self.config.canvas.size(),
                    self.config.canvas.size()
                ),
            );
        }

        let metadata = if self.config.preserve_metadata {
            Metadata {
                exif: source.exif.as_deref(),
                icc_profile: source.icc_profile.as_deref(),
            }
        } else {
            Metadata::default()
        };

        let codec = self.config.output_policy.resolve(destination);
        let (bytes, metadata_warnings) = codec::encode(&canvas.image, codec, metadata)?;
        warnings.extend(metadata_warnings);

        Ok(OutputArtifact {
            bytes,
            codec,
            details,
            warnings,
        })
    }
}
