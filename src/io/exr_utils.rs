/* Copyright 2020 @TwoCookingMice */

use super::{ luminance, GridIoError };
use crate::core::grid::{ ImageGrid, PixelGrid, PixelValue };

use exr::prelude::*;

use std::path::Path;

/// Read an EXR file as a luminance grid with its origin at `(0, 0)`.
pub fn read_exr_grid<P: AsRef<Path>>(path: P) -> std::result::Result<ImageGrid<f32>, GridIoError> {
    let path = path.as_ref();
    log::info!("Starting reading OpenEXR image from: {}.", path.display());

    let image = read()
        .no_deep_data()
        .largest_resolution_level()
        .rgba_channels(
            |resolution, _| ImageGrid::<f32>::new(resolution.width(), resolution.height()),
            |grid, position, (r, g, b, _a): (f32, f32, f32, f32)| {
                grid.set(position.x() as i32, position.y() as i32, luminance(r, g, b));
            },
        )
        .first_valid_layer()
        .all_attributes()
        .from_file(path)?;

    let grid = image.layer_data.channel_data.pixels;
    log::info!("OpenEXR loaded, width = {}, height = {}.", grid.width(), grid.height());
    Ok(grid)
}

/// Write a grid as a grey RGB EXR. Pixel `(xmin, ymin)` becomes the top-left.
pub fn write_exr_grid<T: PixelValue, P: AsRef<Path>>(grid: &ImageGrid<T>,
                                                     path: P) -> std::result::Result<(), GridIoError> {
    let path = path.as_ref();
    log::info!("Starting writing openexr images: {}.", path.display());

    let bounds = grid.bounds();
    write_rgb_file(path, grid.width(), grid.height(), |x, y| {
        let v = grid.read(bounds.xmin() + x as i32, bounds.ymin() + y as i32).to_float() as f32;
        (v, v, v)
    })?;
    log::info!("EXR written to: {}.", path.display());
    Ok(())
}
