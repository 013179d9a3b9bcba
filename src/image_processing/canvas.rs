use image::{imageops, DynamicImage, RgbImage, Rgba, RgbaImage};
use std::borrow::Cow;

use super::resize;
use super::{Background, CanvasSpec};
use crate::error::SkipReason;

/// A composed square canvas and where the source landed on it
#[derive(Debug, Clone)]
pub struct Canvas {
    /// RGBA for transparent backgrounds, RGB for solid ones
    pub image: DynamicImage,
    /// Top-left corner of the placed source
    pub offset: (u32, u32),
    /// Size of the source after an optional downscale
    pub placed_size: (u32, u32),
    pub downscaled: bool,
}

/// Offset that centers a `width x height` image on a square canvas.
///
/// Uses floor division, so an odd leftover pixel ends up on the
/// bottom/right side.
pub fn center_offset(canvas_size: u32, width: u32, height: u32) -> (u32, u32) {
    (
        canvas_size.saturating_sub(width) / 2,
        canvas_size.saturating_sub(height) / 2,
    )
}

/// Center an upright source on a fresh canvas.
///
/// When the source is larger than the canvas on either axis it is either
/// scaled down to fit (`allow_downscale`) or rejected with
/// [`SkipReason::OversizedInput`].
pub fn center_on_canvas(
    source: &DynamicImage,
    spec: &CanvasSpec,
    allow_downscale: bool,
) -> Result<Canvas, SkipReason> {
    let size = spec.size();
    let (width, height) = (source.width(), source.height());
    let oversized = width > size || height > size;

    if oversized && !allow_downscale {
        return Err(SkipReason::OversizedInput {
            width,
            height,
            canvas: size,
        });
    }

    let fitted: Cow<'_, DynamicImage> = if oversized {
        let (new_width, new_height) = resize::fit_within(width, height, size);
        let resized = resize::resize_high_quality(source, new_width, new_height)
            .map_err(|e| SkipReason::ResizeFailure(format!("{:#}", e)))?;
        Cow::Owned(resized)
    } else {
        Cow::Borrowed(source)
    };

    let placed_size = (fitted.width(), fitted.height());
    let offset = center_offset(size, placed_size.0, placed_size.1);
    let (x, y) = (offset.0 as i64, offset.1 as i64);
    let has_alpha = fitted.color().has_alpha();

    let image = match spec.background() {
        Background::Transparent => {
            let mut canvas = RgbaImage::new(size, size);
            let top = fitted.to_rgba8();
            if has_alpha {
                imageops::overlay(&mut canvas, &top, x, y);
            } else {
                imageops::replace(&mut canvas, &top, x, y);
            }
            DynamicImage::ImageRgba8(canvas)
        }
        Background::Solid(color) if has_alpha => {
            // Blend against the opaque color, then drop the alpha channel
            let [r, g, b] = color.0;
            let mut canvas = RgbaImage::from_pixel(size, size, Rgba([r, g, b, 255]));
            imageops::overlay(&mut canvas, &fitted.to_rgba8(), x, y);
            DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(canvas).to_rgb8())
        }
        Background::Solid(color) => {
            let mut canvas = RgbImage::from_pixel(size, size, color);
            imageops::replace(&mut canvas, &fitted.to_rgb8(), x, y);
            DynamicImage::ImageRgb8(canvas)
        }
    };

    Ok(Canvas {
        image,
        offset,
        placed_size,
        downscaled: oversized,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn create_test_image(width: u32, height: u32) -> RgbImage {
        ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([(x % 251) as u8, (y % 251) as u8, ((x + y) % 251) as u8 | 1])
        })
    }

    fn transparent(size: u32) -> CanvasSpec {
        CanvasSpec::new(size, Background::Transparent).unwrap()
    }

    fn solid(size: u32, color: [u8; 3]) -> CanvasSpec {
        CanvasSpec::new(size, Background::Solid(Rgb(color))).unwrap()
    }

    #[test]
    fn test_center_offset_floor_division() {
        assert_eq!(center_offset(1200, 1200, 600), (0, 300));
        assert_eq!(center_offset(10, 7, 4), (1, 3));
        assert_eq!(center_offset(10, 10, 10), (0, 0));
    }

    #[test]
    fn test_small_image_is_placed_unchanged() {
        let src = create_test_image(7, 4);
        let canvas = center_on_canvas(&DynamicImage::ImageRgb8(src.clone()), &transparent(10), false)
            .unwrap();

        assert_eq!((canvas.image.width(), canvas.image.height()), (10, 10));
        assert_eq!(canvas.offset, (1, 3));
        assert_eq!(canvas.placed_size, (7, 4));
        assert!(!canvas.downscaled);

        let out = canvas.image.to_rgba8();
        for (x, y, pixel) in src.enumerate_pixels() {
            let placed = out.get_pixel(x + 1, y + 3);
            assert_eq!([placed[0], placed[1], placed[2], placed[3]], [pixel[0], pixel[1], pixel[2], 255]);
        }
        // Padding stays fully transparent, including the extra right/bottom pixel
        assert_eq!(out.get_pixel(0, 0)[3], 0);
        assert_eq!(out.get_pixel(9, 9)[3], 0);
        assert_eq!(out.get_pixel(8, 7)[3], 0);
    }

    #[test]
    fn test_oversized_is_skipped_without_downscale() {
        let src = DynamicImage::ImageRgb8(create_test_image(2000, 1000));
        let result = center_on_canvas(&src, &transparent(1200), false);
        assert_eq!(
            result.unwrap_err(),
            SkipReason::OversizedInput {
                width: 2000,
                height: 1000,
                canvas: 1200
            }
        );
    }

    #[test]
    fn test_oversized_single_axis_is_skipped() {
        let src = DynamicImage::ImageRgb8(create_test_image(10, 13));
        assert!(center_on_canvas(&src, &transparent(12), false).is_err());
    }

    #[test]
    fn test_oversized_is_downscaled_and_centered() {
        let src = DynamicImage::ImageRgb8(create_test_image(2000, 1000));
        let canvas = center_on_canvas(&src, &solid(1200, [255, 255, 255]), true).unwrap();

        assert!(canvas.downscaled);
        assert_eq!(canvas.placed_size, (1200, 600));
        assert_eq!(canvas.offset, (0, 300));
        assert_eq!((canvas.image.width(), canvas.image.height()), (1200, 1200));

        let out = canvas.image.to_rgb8();
        assert_eq!(out.get_pixel(600, 0), &Rgb([255, 255, 255]));
        assert_eq!(out.get_pixel(600, 1199), &Rgb([255, 255, 255]));
    }

    #[test]
    fn test_exact_size_is_identity() {
        let src = create_test_image(16, 16);
        let canvas =
            center_on_canvas(&DynamicImage::ImageRgb8(src.clone()), &solid(16, [0, 0, 0]), true)
                .unwrap();
        assert_eq!(canvas.offset, (0, 0));
        assert!(!canvas.downscaled);
        assert_eq!(canvas.image.to_rgb8(), src);
    }

    #[test]
    fn test_solid_background_fills_padding() {
        let src = DynamicImage::ImageRgb8(create_test_image(4, 2));
        let canvas = center_on_canvas(&src, &solid(6, [10, 20, 30]), false).unwrap();
        assert!(!canvas.image.color().has_alpha());

        let out = canvas.image.to_rgb8();
        assert_eq!(out.get_pixel(0, 0), &Rgb([10, 20, 30]));
        assert_eq!(out.get_pixel(5, 5), &Rgb([10, 20, 30]));
        assert_eq!(out.get_pixel(1, 2), &Rgb([0, 0, 1]));
    }

    #[test]
    fn test_transparent_source_blends_with_solid_background() {
        let src: RgbaImage = ImageBuffer::from_fn(2, 1, |x, _| {
            if x == 0 {
                Rgba([200, 100, 50, 0])
            } else {
                Rgba([200, 100, 50, 255])
            }
        });
        let canvas = center_on_canvas(
            &DynamicImage::ImageRgba8(src),
            &solid(2, [9, 9, 9]),
            false,
        )
        .unwrap();

        let out = canvas.image.to_rgb8();
        assert_eq!(out.get_pixel(0, 0), &Rgb([9, 9, 9]));
        assert_eq!(out.get_pixel(1, 0), &Rgb([200, 100, 50]));
    }

    #[test]
    fn test_transparent_source_keeps_alpha_on_transparent_canvas() {
        let src: RgbaImage = ImageBuffer::from_fn(2, 2, |x, _| {
            Rgba([1, 2, 3, if x == 0 { 0 } else { 255 }])
        });
        let canvas =
            center_on_canvas(&DynamicImage::ImageRgba8(src), &transparent(4), false).unwrap();
        let out = canvas.image.to_rgba8();
        assert_eq!(out.get_pixel(1, 1)[3], 0);
        assert_eq!(out.get_pixel(2, 1), &Rgba([1, 2, 3, 255]));
    }

    #[test]
    fn test_transparent_then_flattened_round_trip() {
        let src = create_test_image(5, 3);
        let canvas =
            center_on_canvas(&DynamicImage::ImageRgb8(src.clone()), &transparent(9), false)
                .unwrap();
        let (ox, oy) = canvas.offset;

        for background in [[0u8, 0, 0], [255, 255, 255], [12, 200, 99]] {
            let mut flat = RgbaImage::from_pixel(9, 9, Rgba([background[0], background[1], background[2], 255]));
            imageops::overlay(&mut flat, &canvas.image.to_rgba8(), 0, 0);
            for (x, y, pixel) in src.enumerate_pixels() {
                let out = flat.get_pixel(x + ox, y + oy);
                assert_eq!([out[0], out[1], out[2]], pixel.0);
            }
        }
    }
}
