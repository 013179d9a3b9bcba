use image::Rgb;

use super::Background;
use crate::error::ConfigError;

/// Parse a hex color string into an RGB triple.
///
/// Accepts `#RRGGBB`, `#RGB` and the same forms without the leading `#`.
/// The short form duplicates each nibble (`abc` -> `aabbcc`).
pub fn parse_color(color_str: &str) -> Result<Rgb<u8>, ConfigError> {
    let trimmed = color_str.trim();
    let hex = trimmed.strip_prefix('#').unwrap_or(trimmed);

    let invalid = || ConfigError::InvalidColorSpec(color_str.to_string());

    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }

    match hex.len() {
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).map_err(|_| invalid())?;
            let g = u8::from_str_radix(&hex[2..4], 16).map_err(|_| invalid())?;
            let b = u8::from_str_radix(&hex[4..6], 16).map_err(|_| invalid())?;
            Ok(Rgb([r, g, b]))
        }
        3 => {
            let r = u8::from_str_radix(&hex[0..1].repeat(2), 16).map_err(|_| invalid())?;
            let g = u8::from_str_radix(&hex[1..2].repeat(2), 16).map_err(|_| invalid())?;
            let b = u8::from_str_radix(&hex[2..3].repeat(2), 16).map_err(|_| invalid())?;
            Ok(Rgb([r, g, b]))
        }
        _ => Err(invalid()),
    }
}

/// Parse an optional background option. `None` and `"transparent"` both mean
/// a transparent canvas.
pub fn parse_background(value: Option<&str>) -> Result<Background, ConfigError> {
    match value.map(str::trim) {
        None => Ok(Background::Transparent),
        Some(v) if v.eq_ignore_ascii_case("transparent") => Ok(Background::Transparent),
        Some(v) => parse_color(v).map(Background::Solid),
    }
}
