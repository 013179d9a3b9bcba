use anyhow::{Context, Result};
use exif::{Exif, In, Reader, Tag};
use image::DynamicImage;
use std::io::Cursor;

use super::codec::SourceImage;
use crate::error::ProcessingWarning;

/// EXIF orientation tag number (0x0112)
const ORIENTATION_TAG: u16 = 0x0112;
/// TIFF field type SHORT
const TIFF_SHORT: u16 = 3;

/// EXIF orientation values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExifOrientation {
    /// No orientation specified or undefined
    Undefined = 0,
    /// Normal orientation (0 degrees)
    TopLeft = 1,
    /// Horizontally flipped
    TopRight = 2,
    /// Rotated 180 degrees
    BottomRight = 3,
    /// Vertically flipped
    BottomLeft = 4,
    /// Transposed (mirrored + rotated 90 degrees CW)
    LeftTop = 5,
    /// Rotated 90 degrees CW
    RightTop = 6,
    /// Transversed (mirrored + rotated 90 degrees CCW)
    RightBottom = 7,
    /// Rotated 90 degrees CCW
    LeftBottom = 8,
}

impl From<u32> for ExifOrientation {
    fn from(value: u32) -> Self {
        match value {
            1 => ExifOrientation::TopLeft,
            2 => ExifOrientation::TopRight,
            3 => ExifOrientation::BottomRight,
            4 => ExifOrientation::BottomLeft,
            5 => ExifOrientation::LeftTop,
            6 => ExifOrientation::RightTop,
            7 => ExifOrientation::RightBottom,
            8 => ExifOrientation::LeftBottom,
            _ => ExifOrientation::Undefined,
        }
    }
}

impl ExifOrientation {
    /// Get a human-readable description of the orientation
    pub fn description(&self) -> &'static str {
        match self {
            ExifOrientation::Undefined => "Undefined",
            ExifOrientation::TopLeft => "Normal",
            ExifOrientation::TopRight => "Horizontally flipped",
            ExifOrientation::BottomRight => "Rotated 180°",
            ExifOrientation::BottomLeft => "Vertically flipped",
            ExifOrientation::LeftTop => "Transposed",
            ExifOrientation::RightTop => "Rotated 90° CW",
            ExifOrientation::RightBottom => "Transversed",
            ExifOrientation::LeftBottom => "Rotated 90° CCW",
        }
    }

    /// True when applying this orientation changes the pixel buffer
    pub fn needs_transform(&self) -> bool {
        !matches!(self, ExifOrientation::Undefined | ExifOrientation::TopLeft)
    }

    /// True when applying this orientation swaps width and height
    pub fn swaps_dimensions(&self) -> bool {
        matches!(
            self,
            ExifOrientation::LeftTop
                | ExifOrientation::RightTop
                | ExifOrientation::RightBottom
                | ExifOrientation::LeftBottom
        )
    }
}

/// Read the orientation tag from a TIFF-structured EXIF blob.
///
/// Returns `Undefined` when the blob has no orientation tag and an error when
/// the blob cannot be parsed or the tag holds a value outside 1-8.
pub fn read_orientation(exif_blob: &[u8]) -> Result<ExifOrientation> {
    let exif = Reader::new()
        .read_raw(exif_blob.to_vec())
        .context("Failed to read EXIF data")?;
    orientation_from(&exif)
}

/// Read the orientation tag straight from an encoded file.
///
/// Used for containers whose decoder exposes no separate EXIF blob, such as
/// TIFF where the tag lives in the image's own first directory.
pub fn read_container_orientation(data: &[u8]) -> Result<ExifOrientation> {
    let exif = Reader::new()
        .read_from_container(&mut Cursor::new(data))
        .context("Failed to read orientation from image container")?;
    orientation_from(&exif)
}

fn orientation_from(exif: &Exif) -> Result<ExifOrientation> {
    let Some(field) = exif.get_field(Tag::Orientation, In::PRIMARY) else {
        return Ok(ExifOrientation::Undefined);
    };

    let value = field
        .value
        .get_uint(0)
        .ok_or_else(|| anyhow::anyhow!("Orientation tag has no integer value"))?;

    match ExifOrientation::from(value) {
        ExifOrientation::Undefined => Err(anyhow::anyhow!(
            "Orientation tag has invalid value {}",
            value
        )),
        orientation => Ok(orientation),
    }
}

/// Apply EXIF rotation to an image
///
/// Handles all 8 EXIF orientations with the matching combination of
/// rotations and flips.
pub fn apply_rotation(img: DynamicImage, orientation: ExifOrientation) -> DynamicImage {
    match orientation {
        ExifOrientation::Undefined | ExifOrientation::TopLeft => img,
        ExifOrientation::TopRight => img.fliph(),
        ExifOrientation::BottomRight => img.rotate180(),
        ExifOrientation::BottomLeft => img.flipv(),
        ExifOrientation::LeftTop => img.rotate90().fliph(),
        ExifOrientation::RightTop => img.rotate90(),
        ExifOrientation::RightBottom => img.rotate270().fliph(),
        ExifOrientation::LeftBottom => img.rotate270(),
    }
}

/// Bring a decoded source upright according to its EXIF orientation.
///
/// Never fails: a missing tag leaves the image untouched, a malformed tag
/// leaves it untouched and reports a warning. After a transform the tag in
/// the carried EXIF blob is reset to 1; when that is not possible the blob is
/// dropped so the orientation cannot be applied twice downstream. Sources
/// without an EXIF blob fall back to the orientation read from the container
/// at decode time.
pub fn normalize_orientation(
    mut source: SourceImage,
) -> (SourceImage, Option<ProcessingWarning>) {
    let read = match (source.exif.as_deref(), source.container_orientation.take()) {
        (Some(exif_blob), _) => read_orientation(exif_blob),
        (None, Some(container)) => container.map_err(|message| anyhow::anyhow!(message)),
        (None, None) => return (source, None),
    };

    let orientation = match read {
        Ok(orientation) => orientation,
        Err(e) => {
            return (
                source,
                Some(ProcessingWarning::OrientationReadFailure(format!("{:#}", e))),
            );
        }
    };

    source.orientation = orientation;
    if !orientation.needs_transform() {
        return (source, None);
    }

    source.pixels = apply_rotation(source.pixels, orientation);

    let reset = source
        .exif
        .as_mut()
        .map(|blob| reset_orientation_tag(blob))
        .unwrap_or(Ok(false));
    if !matches!(reset, Ok(true)) {
        source.exif = None;
    }

    (source, None)
}

/// Rewrite the IFD0 orientation entry of a TIFF-structured EXIF blob to 1
/// (normal) in place. Returns `Ok(false)` when the entry is not present.
pub fn reset_orientation_tag(blob: &mut [u8]) -> Result<bool> {
    if blob.len() < 8 {
        return Err(anyhow::anyhow!("EXIF blob too short for a TIFF header"));
    }

    let little_endian = match &blob[0..2] {
        b"II" => true,
        b"MM" => false,
        _ => return Err(anyhow::anyhow!("Unknown TIFF byte order")),
    };

    let read_u16 = |buf: &[u8], at: usize| -> Option<u16> {
        let bytes: [u8; 2] = buf.get(at..at + 2)?.try_into().ok()?;
        Some(if little_endian {
            u16::from_le_bytes(bytes)
        } else {
            u16::from_be_bytes(bytes)
        })
    };
    let read_u32 = |buf: &[u8], at: usize| -> Option<u32> {
        let bytes: [u8; 4] = buf.get(at..at + 4)?.try_into().ok()?;
        Some(if little_endian {
            u32::from_le_bytes(bytes)
        } else {
            u32::from_be_bytes(bytes)
        })
    };

    if read_u16(blob, 2) != Some(42) {
        return Err(anyhow::anyhow!("Invalid TIFF magic number"));
    }

    let ifd0 = read_u32(blob, 4).context("Missing IFD0 offset")? as usize;
    let entry_count = read_u16(blob, ifd0).context("IFD0 offset out of bounds")? as usize;

    for index in 0..entry_count {
        let entry = ifd0 + 2 + index * 12;
        let tag = read_u16(blob, entry).context("IFD0 entry out of bounds")?;
        if tag != ORIENTATION_TAG {
            continue;
        }

        let field_type = read_u16(blob, entry + 2).context("IFD0 entry out of bounds")?;
        if field_type != TIFF_SHORT {
            return Err(anyhow::anyhow!(
                "Orientation entry has unexpected type {}",
                field_type
            ));
        }

        let value = blob
            .get_mut(entry + 8..entry + 10)
            .context("IFD0 entry out of bounds")?;
        let normal: u16 = 1;
        value.copy_from_slice(&if little_endian {
            normal.to_le_bytes()
        } else {
            normal.to_be_bytes()
        });
        return Ok(true);
    }

    Ok(false)
}
