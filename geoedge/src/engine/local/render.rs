//! Rasterization of an evaluated image into RGBA pixels.

use image::{Rgba, RgbaImage};

use super::raster::{Raster, RasterBand};
use crate::engine::{EngineError, RenderOptions};

/// Render `raster` with `options`.
///
/// One band renders as grayscale or through `palette`; three bands render
/// as RGB. Pixels masked in any rendered band are fully transparent.
pub(super) fn render(raster: &Raster, options: &RenderOptions) -> Result<RgbaImage, EngineError> {
    let bands = rendered_bands(raster, options)?;
    let count = bands.len();
    options.check_layout(count).map_err(EngineError::Computation)?;

    let min = per_band(&options.min, count);
    let max = per_band(&options.max, count);
    let gamma = match &options.gamma {
        Some(gamma) => per_band(gamma, count),
        None => vec![1.0; count],
    };
    let palette = options.palette.as_deref().map(parse_palette).transpose()?;
    let alpha = (options.opacity.unwrap_or(1.0).clamp(0.0, 1.0) * 255.0).round() as u8;

    let width = u32::try_from(raster.grid.width)
        .map_err(|_| EngineError::Computation("Image too wide to render".to_string()))?;
    let height = u32::try_from(raster.grid.height)
        .map_err(|_| EngineError::Computation("Image too tall to render".to_string()))?;

    let mut out = RgbaImage::new(width, height);
    for (index, pixel) in out.pixels_mut().enumerate() {
        let levels: Option<Vec<f64>> = bands
            .iter()
            .enumerate()
            .map(|(b, band)| {
                band.values
                    .get(index)
                    .copied()
                    .flatten()
                    .map(|v| normalize(v, min[b], max[b], gamma[b]))
            })
            .collect();

        *pixel = match (levels, &palette) {
            (None, _) => Rgba([0, 0, 0, 0]),
            (Some(levels), Some(palette)) => {
                let [r, g, b] = interpolate(palette, levels[0]);
                Rgba([r, g, b, alpha])
            }
            (Some(levels), None) if count == 1 => {
                let gray = to_byte(levels[0]);
                Rgba([gray, gray, gray, alpha])
            }
            (Some(levels), None) => {
                Rgba([to_byte(levels[0]), to_byte(levels[1]), to_byte(levels[2]), alpha])
            }
        };
    }
    Ok(out)
}

fn rendered_bands<'r>(
    raster: &'r Raster,
    options: &RenderOptions,
) -> Result<Vec<&'r RasterBand>, EngineError> {
    let bands: Vec<&RasterBand> = if options.bands.is_empty() {
        raster.bands.iter().collect()
    } else {
        options
            .bands
            .iter()
            .map(|name| {
                raster.band(name).ok_or_else(|| {
                    EngineError::Computation(format!("Cannot render missing band '{name}'"))
                })
            })
            .collect::<Result<_, _>>()?
    };
    Ok(bands)
}

/// Expand a shared value to `count` values; per-band lists pass through.
fn per_band(values: &[f64], count: usize) -> Vec<f64> {
    match values {
        [shared] => vec![*shared; count],
        _ => values.to_vec(),
    }
}

fn normalize(value: f64, min: f64, max: f64, gamma: f64) -> f64 {
    let span = max - min;
    if span <= 0.0 || !span.is_finite() {
        return 0.0;
    }
    let level = ((value - min) / span).clamp(0.0, 1.0);
    if gamma > 0.0 && gamma != 1.0 {
        level.powf(1.0 / gamma)
    } else {
        level
    }
}

fn to_byte(level: f64) -> u8 {
    (level.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Parse `RRGGBB` / `RGB` colors, with or without a leading `#`.
fn parse_palette(colors: &[String]) -> Result<Vec<[u8; 3]>, EngineError> {
    if colors.is_empty() {
        return Err(EngineError::Computation("Palette is empty".to_string()));
    }
    colors.iter().map(|c| parse_color(c)).collect()
}

fn parse_color(color: &str) -> Result<[u8; 3], EngineError> {
    let hex = color.trim().trim_start_matches('#');
    let invalid = || EngineError::Computation(format!("Invalid palette color '{color}'"));
    let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| invalid());

    if !hex.is_ascii() {
        return Err(invalid());
    }
    match hex.len() {
        6 => Ok([channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?]),
        3 => {
            let expand = |s: &str| channel(&s.repeat(2));
            Ok([expand(&hex[0..1])?, expand(&hex[1..2])?, expand(&hex[2..3])?])
        }
        _ => Err(invalid()),
    }
}

fn interpolate(palette: &[[u8; 3]], level: f64) -> [u8; 3] {
    if palette.len() == 1 {
        return palette[0];
    }
    let position = level.clamp(0.0, 1.0) * (palette.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = (lower + 1).min(palette.len() - 1);
    let t = position - lower as f64;
    let mut rgb = [0u8; 3];
    for (c, out) in rgb.iter_mut().enumerate() {
        let a = f64::from(palette[lower][c]);
        let b = f64::from(palette[upper][c]);
        *out = (a + (b - a) * t).round() as u8;
    }
    rgb
}
