// Copyright @yucwang 2026

use crate::core::error::{ invalid_argument, invalid_state, PhotonError, Result };
use crate::core::grid::{ PixelGrid, PixelValue };
use crate::core::photon_array::PhotonArray;
use crate::core::rng::UniformDeviate;
use crate::math::bounds::Bounds2i;
use crate::math::constants::{ Float, Int, HALF_PIXEL };

/// Pixel grid viewed as a discrete density over its cells.
///
/// Cells are weighted by `|value|`; the sign of the selected cell is kept
/// on the photon so signed images stay unbiased.
pub struct GridDistribution {
    bounds: Bounds2i,
    cdf: Vec<Float>,
    signs: Vec<bool>,
    total_flux: Float,
    abs_flux: Float,
}

impl GridDistribution {
    pub fn new<G: PixelGrid + ?Sized>(grid: &G) -> Result<Self> {
        let bounds = grid.bounds();
        if !bounds.is_defined() {
            return invalid_state("cannot sample from a grid with undefined bounds");
        }

        let mut cdf = Vec::with_capacity(bounds.area());
        let mut signs = Vec::with_capacity(bounds.area());
        let mut total_flux = 0.0;
        let mut abs_flux = 0.0;
        for iy in bounds.ymin()..=bounds.ymax() {
            for ix in bounds.xmin()..=bounds.xmax() {
                let v = grid.read(ix, iy).to_float();
                if !v.is_finite() {
                    return invalid_state(format!("pixel ({}, {}) is not finite", ix, iy));
                }
                total_flux += v;
                abs_flux += v.abs();
                cdf.push(abs_flux);
                signs.push(v < 0.0);
            }
        }

        if !(total_flux > 0.0) || !(abs_flux > 0.0) || !abs_flux.is_finite() {
            return invalid_state(format!("grid total flux {} is not a valid density", total_flux));
        }

        Ok(Self { bounds, cdf, signs, total_flux, abs_flux })
    }

    /// Signed sum of the grid.
    pub fn total_flux(&self) -> Float {
        self.total_flux
    }

    /// Sum of absolute pixel values.
    pub fn abs_flux(&self) -> Float {
        self.abs_flux
    }

    /// Offset of the cell whose cumulative range contains `u * abs_flux`.
    fn select(&self, u: Float) -> usize {
        let target = u * self.abs_flux;
        let idx = self.cdf.partition_point(|c| *c <= target);
        idx.min(self.cdf.len() - 1)
    }

    /// Draw one photon: cell, then x jitter, then y jitter.
    ///
    /// Returns `(x, y, sign)` where `sign` is -1 for negative cells.
    pub fn sample<U: UniformDeviate + ?Sized>(&self, ud: &mut U) -> (Float, Float, Float) {
        let idx = self.select(ud.next_uniform());
        let (ix, iy) = self.bounds.pixel_at(idx);
        let x = jitter(ix, ud.next_uniform());
        let y = jitter(iy, ud.next_uniform());
        let sign = if self.signs[idx] { -1.0 } else { 1.0 };
        (x, y, sign)
    }

    /// Fill index-aligned slices with photons of flux `sign * abs_flux / n_total`.
    pub(crate) fn fill<U: UniformDeviate + ?Sized>(&self,
                                                   xs: &mut [Float],
                                                   ys: &mut [Float],
                                                   fluxes: &mut [Float],
                                                   n_total: usize,
                                                   ud: &mut U) {
        let flux_per = self.abs_flux / n_total as Float;
        for ((x, y), flux) in xs.iter_mut().zip(ys.iter_mut()).zip(fluxes.iter_mut()) {
            let (px, py, sign) = self.sample(ud);
            *x = px;
            *y = py;
            *flux = sign * flux_per;
        }
    }
}

/// Position of a uniform draw `u` in `[0, 1)` inside the pixel centred on
/// `i`. The result always lies in `[i - 0.5, i + 0.5)`.
fn jitter(i: Int, u: Float) -> Float {
    let lo = i as Float - HALF_PIXEL;
    (lo + u).min(float_below(i as Float + HALF_PIXEL))
}

/// Largest float strictly below a finite `v`.
fn float_below(v: Float) -> Float {
    if v > 0.0 {
        Float::from_bits(v.to_bits() - 1)
    } else if v < 0.0 {
        Float::from_bits(v.to_bits() + 1)
    } else {
        -Float::from_bits(1)
    }
}

/// Number of photons `set_from_pixels` writes for this grid and `max_flux`.
///
/// Fails with `InvalidArgument` when the count does not fit in `usize`.
pub fn count_pixel_photons<G: PixelGrid + ?Sized>(grid: &G, max_flux: Float) -> Result<usize> {
    let bounds = grid.bounds();
    if !bounds.is_defined() {
        return Ok(0);
    }
    let mut count = 0usize;
    for iy in bounds.ymin()..=bounds.ymax() {
        for ix in bounds.xmin()..=bounds.xmax() {
            let value = grid.read(ix, iy).to_float();
            count = photons_for_pixel(value, max_flux)
                .and_then(|c| count.checked_add(c))
                .ok_or_else(|| too_many_photons(max_flux))?;
        }
    }
    Ok(count)
}

fn too_many_photons(max_flux: Float) -> PhotonError {
    PhotonError::InvalidArgument(
        format!("photon count for max_flux = {} does not fit in usize", max_flux))
}

/// Photons for one pixel, or `None` when the split count is not representable.
fn photons_for_pixel(value: Float, max_flux: Float) -> Option<usize> {
    if value == 0.0 || !value.is_finite() {
        Some(0)
    } else if max_flux <= 0.0 || value.abs() <= max_flux {
        Some(1)
    } else {
        let parts = (value.abs() / max_flux).ceil();
        // usize::MAX as Float rounds up, so the bound is exclusive.
        if parts.is_finite() && parts < usize::MAX as Float {
            Some(parts as usize)
        } else {
            None
        }
    }
}

impl<'a> PhotonArray<'a> {
    /// Overwrite all photons with draws from `grid` treated as a density.
    ///
    /// Each photon carries `grid_total / size()` flux (signed cells keep
    /// their sign), so the expected total flux equals the grid's. The
    /// array is marked uncorrelated. Returns the number of photons drawn.
    pub fn set_from<G, U>(&mut self, grid: &G, ud: &mut U) -> Result<usize>
    where
        G: PixelGrid + ?Sized,
        U: UniformDeviate + ?Sized,
    {
        let dist = GridDistribution::new(grid)?;
        let n = self.size();
        self.clear_optional();
        self.set_correlated(false);
        if n == 0 {
            return Ok(0);
        }

        let (xs, ys, fluxes) = self.core_mut();
        dist.fill(xs, ys, fluxes, n, ud);
        log::debug!("Resampled {} photons from grid with flux {}.", n, dist.total_flux());
        Ok(n)
    }

    /// One photon per nonzero pixel, splitting pixels brighter than
    /// `max_flux` into equal parts (no splitting when `max_flux <= 0`).
    ///
    /// The array must hold exactly `count_pixel_photons(grid, max_flux)`
    /// photons. The result is flux-exact and marked correlated.
    pub fn set_from_pixels<G, U>(&mut self, grid: &G, max_flux: Float, ud: &mut U) -> Result<usize>
    where
        G: PixelGrid + ?Sized,
        U: UniformDeviate + ?Sized,
    {
        if max_flux.is_nan() {
            return invalid_argument("max_flux is NaN");
        }
        let bounds = grid.bounds();
        if !bounds.is_defined() {
            return invalid_state("cannot sample from a grid with undefined bounds");
        }
        let expected = count_pixel_photons(grid, max_flux)?;
        if expected != self.size() {
            return invalid_argument(format!(
                "grid needs {} photons, array holds {}", expected, self.size()));
        }

        self.clear_optional();
        let mut k = 0usize;
        for iy in bounds.ymin()..=bounds.ymax() {
            for ix in bounds.xmin()..=bounds.xmax() {
                let value = grid.read(ix, iy).to_float();
                let count = photons_for_pixel(value, max_flux).unwrap_or(0);
                if count == 0 {
                    continue;
                }
                let flux_per = value / count as Float;
                for _ in 0..count {
                    let x = jitter(ix, ud.next_uniform());
                    let y = jitter(iy, ud.next_uniform());
                    self.set_photon(k, x, y, flux_per);
                    k += 1;
                }
            }
        }

        self.set_correlated(true);
        log::debug!("Split grid into {} pixel photons (max_flux = {}).", k, max_flux);
        Ok(k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::grid::ImageGrid;
    use crate::core::rng::LcgRng;

    fn in_cell(x: Float, y: Float, ix: i32, iy: i32) -> bool {
        x >= ix as Float - 0.5 && x < ix as Float + 0.5 &&
        y >= iy as Float - 0.5 && y < iy as Float + 0.5
    }

    #[test]
    fn single_bright_cell_receives_every_photon() {
        let grid = ImageGrid::from_rows(&[vec![10.0f64, 0.0], vec![0.0, 0.0]]);
        let mut pa = PhotonArray::new(5);
        let mut rng = LcgRng::new(1);
        assert_eq!(pa.set_from(&grid, &mut rng).unwrap(), 5);
        for i in 0..5 {
            assert!(in_cell(pa.x(i), pa.y(i), 0, 0), "photon {} at ({}, {})", i, pa.x(i), pa.y(i));
            assert_eq!(pa.flux(i), 2.0);
        }
        assert!(!pa.is_correlated());
    }

    #[test]
    fn resampling_is_reproducible_for_a_seed() {
        let grid = ImageGrid::from_rows(&[vec![1.0f32, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
        let mut a = PhotonArray::new(64);
        let mut b = PhotonArray::new(64);
        a.set_from(&grid, &mut LcgRng::new(77)).unwrap();
        b.set_from(&grid, &mut LcgRng::new(77)).unwrap();
        assert_eq!(a.xs(), b.xs());
        assert_eq!(a.ys(), b.ys());
        assert_eq!(a.fluxes(), b.fluxes());
    }

    #[test]
    fn expected_total_flux_matches_grid() {
        let grid = ImageGrid::from_rows(&[vec![3.0f64, -1.0, 0.5], vec![0.0, 2.5, 1.0]]);
        let total = grid.sum();
        let trials = 400;
        let mut mean = 0.0;
        let mut pa = PhotonArray::new(50);
        for seed in 0..trials {
            pa.set_from(&grid, &mut LcgRng::new(seed)).unwrap();
            mean += pa.total_flux();
        }
        mean /= trials as Float;
        assert!((mean - total).abs() < 0.05 * total, "mean {} vs total {}", mean, total);
    }

    #[test]
    fn cell_frequencies_follow_density() {
        let grid = ImageGrid::from_rows(&[vec![1.0f64, 3.0]]);
        let mut pa = PhotonArray::new(20000);
        pa.set_from(&grid, &mut LcgRng::new(5)).unwrap();
        let right = pa.xs().iter().filter(|x| **x >= 0.5).count() as Float;
        assert!((right / 20000.0 - 0.75).abs() < 0.02);
    }

    #[test]
    fn degenerate_density_is_rejected() {
        let mut pa = PhotonArray::new(3);
        let mut rng = LcgRng::new(0);
        let zero = ImageGrid::<f64>::new(2, 2);
        assert!(matches!(pa.set_from(&zero, &mut rng), Err(PhotonError::InvalidState(_))));

        let negative = ImageGrid::from_rows(&[vec![1.0f64, -2.0]]);
        assert!(matches!(pa.set_from(&negative, &mut rng), Err(PhotonError::InvalidState(_))));

        let nan = ImageGrid::from_rows(&[vec![1.0f64, Float::NAN]]);
        assert!(matches!(pa.set_from(&nan, &mut rng), Err(PhotonError::InvalidState(_))));
    }

    #[test]
    fn resampling_resets_optional_attributes() {
        let grid = ImageGrid::from_rows(&[vec![1.0f64]]);
        let mut pa = PhotonArray::new(2).with_wavelengths();
        pa.set_wavelength(0, 500.0).unwrap();
        pa.set_correlated(true);
        pa.set_from(&grid, &mut LcgRng::new(2)).unwrap();
        assert_eq!(pa.wavelength(0), Some(0.0));
        assert!(!pa.is_correlated());
    }

    #[test]
    fn pixel_mode_splits_bright_pixels() {
        let grid = ImageGrid::from_rows(&[vec![0.0f64, 5.0], vec![1.0, 0.0]]);
        assert_eq!(count_pixel_photons(&grid, 0.0).unwrap(), 2);
        assert_eq!(count_pixel_photons(&grid, 2.0).unwrap(), 4);

        let mut pa = PhotonArray::new(4);
        let written = pa.set_from_pixels(&grid, 2.0, &mut LcgRng::new(3)).unwrap();
        assert_eq!(written, 4);
        assert!((pa.total_flux() - 6.0).abs() < 1e-12);
        assert!(pa.is_correlated());
        for i in 0..3 {
            assert!(in_cell(pa.x(i), pa.y(i), 1, 0));
            assert!((pa.flux(i) - 5.0 / 3.0).abs() < 1e-12);
        }
        assert!(in_cell(pa.x(3), pa.y(3), 0, 1));
        assert_eq!(pa.flux(3), 1.0);
    }

    #[test]
    fn pixel_mode_checks_array_size() {
        let grid = ImageGrid::from_rows(&[vec![1.0f64, 1.0]]);
        let mut pa = PhotonArray::new(3);
        let err = pa.set_from_pixels(&grid, 0.0, &mut LcgRng::new(0)).unwrap_err();
        assert!(matches!(err, PhotonError::InvalidArgument(_)));
    }

    /// Replays a fixed list of draws.
    struct FixedDraws {
        draws: Vec<Float>,
        next: usize,
    }

    impl UniformDeviate for FixedDraws {
        fn next_uniform(&mut self) -> Float {
            let u = self.draws[self.next % self.draws.len()];
            self.next += 1;
            u
        }
    }

    const LARGEST_DRAW: Float = 1.0 - Float::EPSILON / 2.0;

    #[test]
    fn largest_draw_stays_inside_selected_cell() {
        let grid = ImageGrid::from_rows(&[vec![0.0f64, 1.0, 0.0, 0.0]]);
        let mut pa = PhotonArray::new(1);
        let mut ud = FixedDraws { draws: vec![0.5, LARGEST_DRAW, 0.5], next: 0 };
        pa.set_from(&grid, &mut ud).unwrap();
        assert!(in_cell(pa.x(0), pa.y(0), 1, 0), "photon at ({}, {})", pa.x(0), pa.y(0));
        assert_eq!(Bounds2i::pixel_of(pa.x(0), pa.y(0)), Some((1, 0)));

        let mut out = ImageGrid::<f64>::new(4, 1);
        pa.add_to(&mut out).unwrap();
        assert_eq!(out.read(1, 0), 1.0);
        assert_eq!(out.read(2, 0), 0.0);
    }

    #[test]
    fn largest_draw_stays_inside_pixel_mode_cell() {
        let mut grid = ImageGrid::<f64>::with_origin(-3, 5, 3, 1);
        grid.set(-2, 5, 2.0);
        let mut pa = PhotonArray::new(1);
        let mut ud = FixedDraws { draws: vec![LARGEST_DRAW], next: 0 };
        pa.set_from_pixels(&grid, 0.0, &mut ud).unwrap();
        assert!(in_cell(pa.x(0), pa.y(0), -2, 5), "photon at ({}, {})", pa.x(0), pa.y(0));
        assert_eq!(Bounds2i::pixel_of(pa.x(0), pa.y(0)), Some((-2, 5)));
    }

    #[test]
    fn jitter_covers_the_pixel() {
        for i in [-1000, -1, 0, 1, 7, 1 << 20] {
            assert_eq!(jitter(i, 0.0), i as Float - 0.5);
            let top = jitter(i, LARGEST_DRAW);
            assert!(top < i as Float + 0.5);
            assert_eq!(Bounds2i::pixel_of(top, 0.0).map(|p| p.0), Some(i));
        }
    }

    #[test]
    fn huge_pixel_counts_are_rejected() {
        let grid = ImageGrid::from_rows(&[vec![1e30f64, 1e30]]);
        let err = count_pixel_photons(&grid, 1e-3).unwrap_err();
        assert!(matches!(err, PhotonError::InvalidArgument(_)));

        let mut pa = PhotonArray::new(2);
        let err = pa.set_from_pixels(&grid, 1e-3, &mut LcgRng::new(0)).unwrap_err();
        assert!(matches!(err, PhotonError::InvalidArgument(_)));
    }

    #[test]
    fn pixel_count_overflow_across_pixels_is_rejected() {
        // Each pixel fits on its own; the sum does not.
        let half = (usize::MAX / 2) as Float;
        let grid = ImageGrid::from_rows(&[vec![half, half, half]]);
        assert!(matches!(count_pixel_photons(&grid, 1.0), Err(PhotonError::InvalidArgument(_))));
    }
}
