//! Writing the accumulated image to disk.
//!
//! The final buffer holds gamma-encoded RGBA; pass `linear = true` to undo
//! the display gamma before writing HDR formats.

use std::path::Path;

use image::{DynamicImage, ImageFormat, Rgba32FImage};
use rayon::prelude::*;

use crate::util::{Error, Result};

const DISPLAY_GAMMA: f32 = 2.2;

/// Save `pixels` (row-major RGBA) as `.exr` or `.hdr`, chosen by extension.
pub fn save_image(path: &Path, width: u32, height: u32, pixels: &[[f32; 4]], linear: bool) -> Result<()> {
    let expected = width as usize * height as usize;
    if pixels.len() != expected {
        return Err(Error::other(format!("expected {expected} pixels, got {}", pixels.len())));
    }

    let format = ImageFormat::from_path(path).map_err(|e| Error::other(format!("{}: {e}", path.display())))?;
    let raw: Vec<f32> = pixels
        .par_iter()
        .flat_map_iter(|px| {
            let [r, g, b, a] = *px;
            let rgb = if linear { [r, g, b].map(|c| c.max(0.0).powf(DISPLAY_GAMMA)) } else { [r, g, b] };
            [rgb[0], rgb[1], rgb[2], a]
        })
        .collect();
    let buffer = Rgba32FImage::from_raw(width, height, raw).ok_or_else(|| Error::other("pixel buffer size mismatch"))?;
    let image = DynamicImage::ImageRgba32F(buffer);

    let result = match format {
        ImageFormat::OpenExr => image.save_with_format(path, format),
        // Radiance HDR has no alpha channel
        ImageFormat::Hdr => DynamicImage::ImageRgb32F(image.to_rgb32f()).save_with_format(path, format),
        other => return Err(Error::other(format!("unsupported output format {other:?}"))),
    };
    result.map_err(|e| Error::other(format!("failed to write {}: {e}", path.display())))?;
    tracing::info!(path = %path.display(), width, height, "image saved");
    Ok(())
}
