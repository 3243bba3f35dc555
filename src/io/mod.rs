// Copyright @yucwang 2021

pub mod exr_utils;
pub mod image_utils;

use crate::core::grid::ImageGrid;

use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GridIoError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("exr error: {0}")]
    Exr(#[from] exr::error::Error),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Read a single-channel grid from an EXR or any format `image` decodes.
pub fn read_grid<P: AsRef<Path>>(path: P, srgb: bool) -> Result<ImageGrid<f32>, GridIoError> {
    let path = path.as_ref();
    let is_exr = path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("exr"))
        .unwrap_or(false);
    if is_exr {
        exr_utils::read_exr_grid(path)
    } else {
        image_utils::read_image_grid(path, srgb)
    }
}

pub(crate) fn luminance(r: f32, g: f32, b: f32) -> f32 {
    0.2126 * r + 0.7152 * g + 0.0722 * b
}
