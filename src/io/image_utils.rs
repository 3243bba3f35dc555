// Copyright @yucwang 2026

use super::{ luminance, GridIoError };
use crate::core::grid::ImageGrid;

use image::io::Reader as ImageReader;
use image::GenericImageView;

use std::path::Path;

fn srgb_to_linear(v: f32) -> f32 {
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

/// Decode a low dynamic range image into a luminance grid.
pub fn read_image_grid<P: AsRef<Path>>(path: P, srgb: bool) -> Result<ImageGrid<f32>, GridIoError> {
    let path = path.as_ref();
    log::info!("Reading image from: {}.", path.display());
    let img = ImageReader::open(path)?.decode()?;

    let (width, height) = img.dimensions();
    let rgb = img.to_rgb32f();
    let mut grid = ImageGrid::<f32>::new(width as usize, height as usize);
    for (x, y, p) in rgb.enumerate_pixels() {
        let (mut r, mut g, mut b) = (p[0], p[1], p[2]);
        if srgb {
            r = srgb_to_linear(r);
            g = srgb_to_linear(g);
            b = srgb_to_linear(b);
        }
        grid.set(x as i32, y as i32, luminance(r, g, b));
    }
    Ok(grid)
}
