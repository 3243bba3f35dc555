// Copyright @yucwang 2026

use crate::core::error::{ invalid_state, Result };
use crate::core::grid::{ PixelGrid, PixelValue };
use crate::core::photon_array::PhotonArray;
use crate::math::bounds::Bounds2i;
use crate::math::constants::Float;

impl<'a> PhotonArray<'a> {
    /// Add every photon's flux to the pixel containing it.
    ///
    /// Photons outside the grid are skipped. Returns the flux actually
    /// deposited; compare with `total_flux()` to detect truncation.
    pub fn add_to<G: PixelGrid + ?Sized>(&self, grid: &mut G) -> Result<Float> {
        let bounds = grid.bounds();
        if !bounds.is_defined() {
            return invalid_state("cannot deposit photons onto a grid with undefined bounds");
        }

        let (added, skipped) = deposit_range(self.xs(), self.ys(), self.fluxes(), bounds, grid);
        log::debug!("Deposited {} of {} photons, flux = {}.", self.size() - skipped, self.size(), added);
        Ok(added)
    }
}

/// Deposit index-aligned photons; returns `(added flux, skipped count)`.
pub(crate) fn deposit_range<G: PixelGrid + ?Sized>(xs: &[Float],
                                                   ys: &[Float],
                                                   fluxes: &[Float],
                                                   bounds: Bounds2i,
                                                   grid: &mut G) -> (Float, usize) {
    let mut added = 0.0;
    let mut skipped = 0usize;
    for ((x, y), flux) in xs.iter().zip(ys.iter()).zip(fluxes.iter()) {
        match Bounds2i::pixel_of(*x, *y) {
            Some((ix, iy)) if bounds.includes(ix, iy) => {
                grid.add(ix, iy, G::Pixel::from_float(*flux));
                added += *flux;
            }
            _ => skipped += 1,
        }
    }
    (added, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::PhotonError;
    use crate::core::grid::ImageGrid;

    fn three_photons_at_origin() -> PhotonArray<'static> {
        PhotonArray::from_vecs(vec![0.0, 0.2, -0.3], vec![0.1, -0.4, 0.0], vec![1.0, 2.0, 3.0], false).unwrap()
    }

    #[test]
    fn deposit_into_single_cell() {
        let pa = three_photons_at_origin();
        let mut grid = ImageGrid::<f64>::new(4, 4);
        let added = pa.add_to(&mut grid).unwrap();
        assert_eq!(added, 6.0);
        assert_eq!(grid.read(0, 0), 6.0);
        for iy in 0..4 {
            for ix in 0..4 {
                if (ix, iy) != (0, 0) {
                    assert_eq!(grid.read(ix, iy), 0.0);
                }
            }
        }
    }

    #[test]
    fn deposit_is_identical_for_single_precision() {
        let pa = three_photons_at_origin();
        let mut grid = ImageGrid::<f32>::new(4, 4);
        assert_eq!(pa.add_to(&mut grid).unwrap(), 6.0);
        assert_eq!(grid.read(0, 0), 6.0f32);
    }

    #[test]
    fn deposit_conserves_flux_when_everything_fits() {
        let xs: Vec<Float> = (0..50).map(|i| (i % 10) as Float + 0.3).collect();
        let ys: Vec<Float> = (0..50).map(|i| (i / 10) as Float - 0.2).collect();
        let fluxes: Vec<Float> = (0..50).map(|i| 0.5 + i as Float).collect();
        let total: Float = fluxes.iter().sum();
        let pa = PhotonArray::from_vecs(xs, ys, fluxes, false).unwrap();

        let mut grid = ImageGrid::<f64>::new(12, 6);
        let added = pa.add_to(&mut grid).unwrap();
        assert!((added - total).abs() < 1e-9);
        assert!((grid.sum() - total).abs() < 1e-9);
    }

    #[test]
    fn truncation_drops_exactly_outside_flux() {
        let pa = PhotonArray::from_vecs(
            vec![0.0, 1.0, 5.0, -3.0, 2.6],
            vec![0.0, 1.0, 0.0, 0.0, 2.4],
            vec![1.0, 2.0, 4.0, 8.0, 16.0],
            false,
        ).unwrap();
        let mut grid = ImageGrid::<f64>::new(3, 3);
        let added = pa.add_to(&mut grid).unwrap();
        // (5, 0), (-3, 0) and (3, 2) fall outside.
        assert_eq!(added, pa.total_flux() - 4.0 - 8.0 - 16.0);
        assert_eq!(grid.read(1, 1), 2.0);
    }

    #[test]
    fn repeated_deposits_accumulate() {
        let pa = three_photons_at_origin();
        let mut grid = ImageGrid::<f64>::with_origin(-1, -1, 3, 3);
        pa.add_to(&mut grid).unwrap();
        pa.add_to(&mut grid).unwrap();
        assert_eq!(grid.read(0, 0), 12.0);
    }

    #[test]
    fn non_finite_positions_are_skipped() {
        let pa = PhotonArray::from_vecs(vec![Float::NAN, 0.0], vec![0.0, Float::INFINITY],
                                        vec![1.0, 1.0], false).unwrap();
        let mut grid = ImageGrid::<f64>::new(2, 2);
        assert_eq!(pa.add_to(&mut grid).unwrap(), 0.0);
    }

    #[test]
    fn undefined_grid_is_rejected() {
        let pa = three_photons_at_origin();
        let mut grid = ImageGrid::<f64>::new(0, 0);
        assert!(matches!(pa.add_to(&mut grid), Err(PhotonError::InvalidState(_))));
    }
}
