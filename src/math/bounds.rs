// Copyright 2020 @TwoCookingMice

use super::constants::{ Int, Float, Vector2i, HALF_PIXEL };

/// Inclusive integer pixel bounds `[xmin, xmax] x [ymin, ymax]`.
///
/// Pixel `(ix, iy)` is centred on the integer coordinate and covers
/// `[ix - 0.5, ix + 0.5) x [iy - 0.5, iy + 0.5)`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Bounds2i {
    pub p_min: Vector2i,
    pub p_max: Vector2i
}

impl Default for Bounds2i {
    fn default() -> Self {
        Self { p_min: Vector2i::new(0, 0),
               p_max: Vector2i::new(-1, -1) }
    }
}

impl Bounds2i {
    pub fn new(xmin: Int, xmax: Int, ymin: Int, ymax: Int) -> Self {
        Self { p_min: Vector2i::new(xmin, ymin),
               p_max: Vector2i::new(xmax, ymax) }
    }

    /// Bounds of a `width` x `height` grid whose first pixel is `(x0, y0)`.
    pub fn from_origin(x0: Int, y0: Int, width: usize, height: usize) -> Self {
        Self::new(x0, x0 + width as Int - 1, y0, y0 + height as Int - 1)
    }

    pub fn xmin(&self) -> Int { self.p_min.x }
    pub fn xmax(&self) -> Int { self.p_max.x }
    pub fn ymin(&self) -> Int { self.p_min.y }
    pub fn ymax(&self) -> Int { self.p_max.y }

    pub fn is_defined(&self) -> bool {
        self.p_max.x >= self.p_min.x && self.p_max.y >= self.p_min.y
    }

    pub fn width(&self) -> usize {
        if self.is_defined() { (self.p_max.x - self.p_min.x + 1) as usize } else { 0 }
    }

    pub fn height(&self) -> usize {
        if self.is_defined() { (self.p_max.y - self.p_min.y + 1) as usize } else { 0 }
    }

    pub fn area(&self) -> usize {
        self.width() * self.height()
    }

    pub fn includes(&self, ix: Int, iy: Int) -> bool {
        ix >= self.p_min.x && ix <= self.p_max.x &&
        iy >= self.p_min.y && iy <= self.p_max.y
    }

    /// Pixel containing the continuous position `(x, y)`, or `None` when the
    /// position is not finite or does not fit in an `Int`.
    pub fn pixel_of(x: Float, y: Float) -> Option<(Int, Int)> {
        let fx = (x + HALF_PIXEL).floor();
        let fy = (y + HALF_PIXEL).floor();
        let lo = Int::MIN as Float;
        let hi = Int::MAX as Float;
        if !(fx >= lo && fx <= hi && fy >= lo && fy <= hi) {
            return None;
        }
        Some((fx as Int, fy as Int))
    }

    /// Row-major offset of `(ix, iy)`, or `None` outside the bounds.
    pub fn offset(&self, ix: Int, iy: Int) -> Option<usize> {
        if !self.includes(ix, iy) {
            return None;
        }
        let col = (ix - self.p_min.x) as usize;
        let row = (iy - self.p_min.y) as usize;
        Some(row * self.width() + col)
    }

    /// Inverse of `offset`.
    pub fn pixel_at(&self, offset: usize) -> (Int, Int) {
        let width = self.width().max(1);
        let ix = self.p_min.x + (offset % width) as Int;
        let iy = self.p_min.y + (offset / width) as Int;
        (ix, iy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_basic_functions() {
        let b = Bounds2i::from_origin(1, 1, 4, 3);
        assert!(b.is_defined());
        assert_eq!(b.width(), 4);
        assert_eq!(b.height(), 3);
        assert_eq!(b.xmax(), 4);
        assert_eq!(b.ymax(), 3);
        assert!(b.includes(1, 1));
        assert!(b.includes(4, 3));
        assert!(!b.includes(0, 1));
        assert!(!b.includes(4, 4));
    }

    #[test]
    fn test_bounds_default_is_undefined() {
        let b = Bounds2i::default();
        assert!(!b.is_defined());
        assert_eq!(b.area(), 0);
    }

    #[test]
    fn test_pixel_of_rounds_to_centre() {
        assert_eq!(Bounds2i::pixel_of(0.0, 0.0), Some((0, 0)));
        assert_eq!(Bounds2i::pixel_of(0.49, -0.5), Some((0, 0)));
        assert_eq!(Bounds2i::pixel_of(0.5, -0.51), Some((1, -1)));
        assert_eq!(Bounds2i::pixel_of(Float::NAN, 0.0), None);
        assert_eq!(Bounds2i::pixel_of(1e300, 0.0), None);
    }

    #[test]
    fn test_offset_round_trip() {
        let b = Bounds2i::from_origin(-2, 5, 3, 2);
        let off = b.offset(0, 6).unwrap();
        assert_eq!(off, 5);
        assert_eq!(b.pixel_at(off), (0, 6));
        assert_eq!(b.offset(1, 6), None);
    }
}
