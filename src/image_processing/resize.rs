use anyhow::Result;
use fast_image_resize::images::Image;
use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::{DynamicImage, RgbImage, RgbaImage};

/// Compute the dimensions of an image scaled down to fit inside a square
/// canvas, preserving aspect ratio.
///
/// `scale = min(canvas / width, canvas / height)`; each dimension is
/// `floor(dimension * scale)`, never below 1. Images that already fit are
/// returned unchanged.
///
/// Computed in integers so the limiting side lands exactly on the canvas
/// size instead of one pixel short after float rounding.
pub fn fit_within(width: u32, height: u32, canvas_size: u32) -> (u32, u32) {
    if width <= canvas_size && height <= canvas_size {
        return (width, height);
    }

    let scaled = |side: u32, longest: u32| -> u32 {
        let value = side as u64 * canvas_size as u64 / longest as u64;
        (value as u32).clamp(1, canvas_size)
    };

    if width >= height {
        (canvas_size, scaled(height, width))
    } else {
        (scaled(width, height), canvas_size)
    }
}

/// Resize an image to exact dimensions using Lanczos3 convolution.
///
/// Images with an alpha channel are resized as RGBA (the resizer
/// premultiplies alpha so transparent edges do not bleed); everything else is
/// resized as RGB.
pub fn resize_high_quality(img: &DynamicImage, width: u32, height: u32) -> Result<DynamicImage> {
    let (src_width, src_height) = (img.width(), img.height());

    if src_width == width && src_height == height {
        return Ok(img.clone());
    }
    if src_width == 0 || src_height == 0 {
        return Err(anyhow::anyhow!("Source image has zero size"));
    }
    if width == 0 || height == 0 {
        return Err(anyhow::anyhow!("Target size {}x{} is empty", width, height));
    }

    let has_alpha = img.color().has_alpha();
    let (pixel_type, src_pixels) = if has_alpha {
        (PixelType::U8x4, img.to_rgba8().into_raw())
    } else {
        (PixelType::U8x3, img.to_rgb8().into_raw())
    };

    let src_image = Image::from_vec_u8(src_width, src_height, src_pixels, pixel_type)?;
    let mut dst_image = Image::new(width, height, pixel_type);

    let options =
        ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Lanczos3));
    let mut resizer = Resizer::new();
    resizer.resize(&src_image, &mut dst_image, &options)?;

    let dst_pixels = dst_image.into_vec();
    let resized = if has_alpha {
        RgbaImage::from_raw(width, height, dst_pixels).map(DynamicImage::ImageRgba8)
    } else {
        RgbImage::from_raw(width, height, dst_pixels).map(DynamicImage::ImageRgb8)
    };

    resized.ok_or_else(|| anyhow::anyhow!("Resized buffer does not match {}x{}", width, height))
}
