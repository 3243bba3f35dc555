// Copyright @yucwang 2026

use crate::math::bounds::Bounds2i;
use crate::math::constants::{ Float, Int };

use nalgebra::{ DMatrix, Scalar };

use std::ops;

/// Numeric type stored in a pixel grid.
pub trait PixelValue: Scalar + Copy + Send + Sync + 'static {
    fn zero() -> Self;
    fn from_float(v: Float) -> Self;
    fn to_float(self) -> Float;
}

impl PixelValue for f32 {
    fn zero() -> Self { 0.0 }
    fn from_float(v: Float) -> Self { v as f32 }
    fn to_float(self) -> Float { self as Float }
}

impl PixelValue for f64 {
    fn zero() -> Self { 0.0 }
    fn from_float(v: Float) -> Self { v }
    fn to_float(self) -> Float { self }
}

/// Minimal capability set the engines need from an image.
pub trait PixelGrid {
    type Pixel: PixelValue;

    fn bounds(&self) -> Bounds2i;
    /// Value of an in-bounds pixel.
    fn read(&self, ix: Int, iy: Int) -> Self::Pixel;
    /// Accumulate into an in-bounds pixel.
    fn add(&mut self, ix: Int, iy: Int, value: Self::Pixel);
}

/// Owned pixel grid. Rows are `y`, columns are `x`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageGrid<T: PixelValue> {
    data: DMatrix<T>,
    bounds: Bounds2i,
}

impl<T: PixelValue> ImageGrid<T> {
    pub fn new(width: usize, height: usize) -> Self {
        Self::with_origin(0, 0, width, height)
    }

    pub fn with_origin(x0: Int, y0: Int, width: usize, height: usize) -> Self {
        Self::from_bounds(Bounds2i::from_origin(x0, y0, width, height))
    }

    pub fn from_bounds(bounds: Bounds2i) -> Self {
        Self { data: DMatrix::from_element(bounds.height(), bounds.width(), T::zero()),
               bounds }
    }

    /// Build from row-major values; `values[iy][ix]` with the origin at `(0, 0)`.
    pub fn from_rows(rows: &[Vec<T>]) -> Self {
        let height = rows.len();
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(0);
        let mut grid = Self::new(width, height);
        for (iy, row) in rows.iter().enumerate() {
            for (ix, v) in row.iter().enumerate() {
                grid.data[(iy, ix)] = *v;
            }
        }
        grid
    }

    pub fn width(&self) -> usize {
        self.bounds.width()
    }

    pub fn height(&self) -> usize {
        self.bounds.height()
    }

    /// Move the grid so that its first pixel is `(x0, y0)`.
    pub fn set_origin(&mut self, x0: Int, y0: Int) {
        self.bounds = Bounds2i::from_origin(x0, y0, self.width(), self.height());
    }

    /// Put the central pixel at `(0, 0)`.
    pub fn center_on_origin(&mut self) {
        let x0 = -((self.width() / 2) as Int);
        let y0 = -((self.height() / 2) as Int);
        self.set_origin(x0, y0);
    }

    pub fn get(&self, ix: Int, iy: Int) -> Option<T> {
        self.index_of(ix, iy).map(|idx| self.data[idx])
    }

    pub fn set(&mut self, ix: Int, iy: Int, value: T) -> bool {
        match self.index_of(ix, iy) {
            Some(idx) => {
                self.data[idx] = value;
                true
            }
            None => false,
        }
    }

    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }

    pub fn sum(&self) -> Float {
        self.data.iter().map(|v| v.to_float()).sum()
    }

    pub fn min_max(&self) -> Option<(Float, Float)> {
        self.data.iter().map(|v| v.to_float()).fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
    }

    /// Add `other` pixel by pixel. Returns false when the bounds differ.
    pub fn merge_from(&mut self, other: &ImageGrid<T>) -> bool {
        if self.bounds != other.bounds {
            return false;
        }
        for (dst, src) in self.data.iter_mut().zip(other.data.iter()) {
            *dst = T::from_float(dst.to_float() + src.to_float());
        }
        true
    }

    pub fn scale(&mut self, factor: Float) {
        for v in self.data.iter_mut() {
            *v = T::from_float(v.to_float() * factor);
        }
    }

    /// Copy with each pixel converted to another pixel type.
    pub fn convert<U: PixelValue>(&self) -> ImageGrid<U> {
        ImageGrid { data: self.data.map(|v| U::from_float(v.to_float())),
                    bounds: self.bounds }
    }

    fn index_of(&self, ix: Int, iy: Int) -> Option<(usize, usize)> {
        if !self.bounds.includes(ix, iy) {
            return None;
        }
        Some(((iy - self.bounds.ymin()) as usize, (ix - self.bounds.xmin()) as usize))
    }
}

impl<T: PixelValue> PixelGrid for ImageGrid<T> {
    type Pixel = T;

    fn bounds(&self) -> Bounds2i {
        self.bounds
    }

    fn read(&self, ix: Int, iy: Int) -> T {
        self[(ix, iy)]
    }

    fn add(&mut self, ix: Int, iy: Int, value: T) {
        let v = &mut self[(ix, iy)];
        *v = T::from_float(v.to_float() + value.to_float());
    }
}

impl<T: PixelValue> ops::Index<(Int, Int)> for ImageGrid<T> {
    type Output = T;

    fn index(&self, index: (Int, Int)) -> &T {
        assert!(self.bounds.includes(index.0, index.1),
                "pixel ({}, {}) outside {:?}", index.0, index.1, self.bounds);
        let row = (index.1 - self.bounds.ymin()) as usize;
        let col = (index.0 - self.bounds.xmin()) as usize;
        &self.data[(row, col)]
    }
}

impl<T: PixelValue> ops::IndexMut<(Int, Int)> for ImageGrid<T> {
    fn index_mut(&mut self, index: (Int, Int)) -> &mut T {
        assert!(self.bounds.includes(index.0, index.1),
                "pixel ({}, {}) outside {:?}", index.0, index.1, self.bounds);
        let row = (index.1 - self.bounds.ymin()) as usize;
        let col = (index.0 - self.bounds.xmin()) as usize;
        &mut self.data[(row, col)]
    }
}

/* Test for ImageGrid */
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_basic_functions() {
        let mut grid = ImageGrid::<f32>::new(256, 128);
        assert_eq!(grid.width(), 256);
        assert_eq!(grid.height(), 128);

        grid[(5, 6)] = 1.0;
        grid.add(5, 6, 0.5);
        assert!((grid[(5, 6)] - 1.5).abs() < 1e-6);
        assert_eq!(grid.get(2, 6), Some(0.0));
        assert_eq!(grid.get(256, 0), None);
        assert!((grid.sum() - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_grid_with_origin() {
        let mut grid = ImageGrid::<f64>::with_origin(-1, 10, 3, 2);
        assert!(grid.set(-1, 10, 2.0));
        assert!(grid.set(1, 11, 3.0));
        assert!(!grid.set(2, 11, 3.0));
        assert_eq!(grid.read(1, 11), 3.0);
        assert_eq!(grid.bounds(), Bounds2i::new(-1, 1, 10, 11));
        assert_eq!(grid.min_max(), Some((0.0, 3.0)));
    }

    #[test]
    fn test_grid_from_rows_and_merge() {
        let mut a = ImageGrid::from_rows(&[vec![1.0f64, 2.0], vec![3.0, 4.0]]);
        assert_eq!(a.read(1, 0), 2.0);
        assert_eq!(a.read(0, 1), 3.0);
        let b = a.clone();
        assert!(a.merge_from(&b));
        assert_eq!(a.read(1, 1), 8.0);
        assert!(!a.merge_from(&ImageGrid::new(3, 2)));

        let c: ImageGrid<f32> = a.convert();
        assert_eq!(c.read(0, 0), 2.0f32);
    }

    #[test]
    fn test_grid_center_on_origin() {
        let mut grid = ImageGrid::<f64>::new(5, 4);
        grid.set(2, 2, 7.0);
        grid.center_on_origin();
        assert_eq!(grid.bounds(), Bounds2i::new(-2, 2, -2, 1));
        assert_eq!(grid.read(0, 0), 7.0);
    }
}
