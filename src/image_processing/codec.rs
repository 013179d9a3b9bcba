use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::{DynamicImage, ImageDecoder, ImageEncoder, ImageFormat, ImageReader};
use std::io::Cursor;
use std::path::Path;

use super::orientation::{self, ExifOrientation};
use crate::error::{MetadataKind, ProcessingWarning, SkipReason};
use crate::utils::get_file_extension;

/// Input extensions accepted by the pipeline (lowercase, without dot)
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tiff", "tif", "bmp", "webp"];

/// APP1 identifier some decoders leave in front of the TIFF structure
const EXIF_APP1_PREFIX: &[u8] = b"Exif\0\0";

/// Check whether an extension (any case, without dot) is a supported input
pub fn is_supported_extension(extension: &str) -> bool {
    SUPPORTED_EXTENSIONS.contains(&extension.to_lowercase().as_str())
}

/// A decoded image with the metadata needed downstream
#[derive(Debug, Clone)]
pub struct SourceImage {
    pub pixels: DynamicImage,
    pub format: ImageFormat,
    /// TIFF-structured EXIF data, without the APP1 prefix
    pub exif: Option<Vec<u8>>,
    pub icc_profile: Option<Vec<u8>>,
    /// Orientation tag read from the container itself, for formats whose
    /// decoder has no separate EXIF blob (TIFF)
    pub container_orientation: Option<Result<ExifOrientation, String>>,
    /// Orientation found during normalization
    pub orientation: ExifOrientation,
}

/// Decode an in-memory image, keeping its EXIF and ICC blobs.
pub fn decode(data: &[u8]) -> Result<SourceImage, SkipReason> {
    let failure = |e: image::ImageError| SkipReason::DecodeFailure(e.to_string());

    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| SkipReason::DecodeFailure(e.to_string()))?;
    let format = reader
        .format()
        .ok_or_else(|| SkipReason::DecodeFailure("unrecognized image data".to_string()))?;

    let mut decoder = reader.into_decoder().map_err(failure)?;

    // Metadata is best-effort; a broken chunk must not block the pixels
    let icc_profile = decoder.icc_profile().ok().flatten();
    let exif = decoder
        .exif_metadata()
        .ok()
        .flatten()
        .map(strip_exif_prefix)
        .filter(|blob| !blob.is_empty());

    let pixels = DynamicImage::from_decoder(decoder).map_err(failure)?;

    let container_orientation = match (&exif, format) {
        (None, ImageFormat::Tiff) => Some(
            orientation::read_container_orientation(data).map_err(|e| format!("{:#}", e)),
        ),
        _ => None,
    };

    Ok(SourceImage {
        pixels,
        format,
        exif,
        icc_profile,
        container_orientation,
        orientation: ExifOrientation::Undefined,
    })
}

fn strip_exif_prefix(blob: Vec<u8>) -> Vec<u8> {
    match blob.strip_prefix(EXIF_APP1_PREFIX) {
        Some(rest) => rest.to_vec(),
        None => blob,
    }
}

/// Lossless output codecs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputCodec {
    #[default]
    Png,
    WebpLossless,
}

impl OutputCodec {
    /// File extension written for this codec
    pub fn extension(&self) -> &'static str {
        match self {
            OutputCodec::Png => "png",
            OutputCodec::WebpLossless => "webp",
        }
    }

    /// Pick the codec from a destination path: `.webp` is encoded as
    /// lossless WebP, everything else falls back to PNG.
    pub fn for_destination(path: &Path) -> Self {
        match get_file_extension(path).as_deref() {
            Some("webp") => OutputCodec::WebpLossless,
            _ => OutputCodec::Png,
        }
    }

    /// True if the extension names one of the output codecs
    pub fn is_output_extension(extension: &str) -> bool {
        matches!(extension.to_lowercase().as_str(), "png" | "webp")
    }
}

/// Metadata to re-attach to the encoded output
#[derive(Debug, Clone, Copy, Default)]
pub struct Metadata<'a> {
    pub exif: Option<&'a [u8]>,
    pub icc_profile: Option<&'a [u8]>,
}

/// Encode a composed canvas losslessly.
///
/// Metadata that the encoder refuses is reported as a warning and the image
/// is written without it.
pub fn encode(
    image: &DynamicImage,
    codec: OutputCodec,
    metadata: Metadata<'_>,
) -> Result<(Vec<u8>, Vec<ProcessingWarning>), SkipReason> {
    let mut buffer = Vec::new();
    let mut warnings = Vec::new();

    let result = match codec {
        OutputCodec::Png => {
            let mut encoder = PngEncoder::new_with_quality(
                &mut buffer,
                CompressionType::Best,
                FilterType::Adaptive,
            );
            attach_metadata(&mut encoder, metadata, &mut warnings);
            encoder.write_image(
                image.as_bytes(),
                image.width(),
                image.height(),
                image.color().into(),
            )
        }
        OutputCodec::WebpLossless => {
            let mut encoder = WebPEncoder::new_lossless(&mut buffer);
            attach_metadata(&mut encoder, metadata, &mut warnings);
            encoder.write_image(
                image.as_bytes(),
                image.width(),
                image.height(),
                image.color().into(),
            )
        }
    };

    result.map_err(|e| SkipReason::EncodeFailure(e.to_string()))?;
    Ok((buffer, warnings))
}

fn attach_metadata<E: ImageEncoder>(
    encoder: &mut E,
    metadata: Metadata<'_>,
    warnings: &mut Vec<ProcessingWarning>,
) {
    if let Some(icc) = metadata.icc_profile {
        if let Err(e) = encoder.set_icc_profile(icc.to_vec()) {
            warnings.push(ProcessingWarning::MetadataCarryFailure {
                kind: MetadataKind::IccProfile,
                message: e.to_string(),
            });
        }
    }

    if let Some(exif) = metadata.exif {
        if let Err(e) = encoder.set_exif_metadata(exif.to_vec()) {
            warnings.push(ProcessingWarning::MetadataCarryFailure {
                kind: MetadataKind::Exif,
                message: e.to_string(),
            });
        }
    }
}
