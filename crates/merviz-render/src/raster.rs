//! Raster post-processing.
//!
//! Raster renders are supersampled: the engine renders at `scale ×` the
//! requested viewport and the result is downsampled back to the requested
//! dimensions with a Lanczos3 filter, which reduces aliasing compared to
//! rendering at target size directly. The final pixel dimensions always
//! equal the requested width × height.

use std::path::Path;

use image::imageops::FilterType;

use crate::error::{Error, Result};
use crate::result::PixelSize;

/// Downsamples a PNG in place to exactly `width × height`.
///
/// Decoding and resizing are CPU-bound; callers run this on a blocking
/// thread.
///
/// # Errors
///
/// Returns an extraction/image error when the file cannot be decoded or
/// re-encoded.
pub fn downsample_to(path: &Path, width: u32, height: u32) -> Result<PixelSize> {
    let decoded = image::open(path).map_err(|e| Error::Image(e.to_string()))?;

    let resized = decoded.resize_exact(width, height, FilterType::Lanczos3);
    resized
        .save(path)
        .map_err(|e| Error::Image(e.to_string()))?;

    Ok(PixelSize { width, height })
}

/// Reads the pixel dimensions of a raster artifact without full decode.
///
/// # Errors
///
/// Returns an image error when the header cannot be read.
pub fn measure(path: &Path) -> Result<PixelSize> {
    let (width, height) = image::image_dimensions(path).map_err(|e| Error::Image(e.to_string()))?;
    Ok(PixelSize { width, height })
}
