// Copyright @yucwang 2026

//! Data-parallel variants of the photon engines.
//!
//! Deposits go to per-task partial grids merged afterwards, so no pixel
//! update is lost. Resampling gives chunk `k` its own generator seeded with
//! `seed + k`; the output depends on the seed and chunk size only, not on
//! the number of threads.

use crate::core::convolve::{ check_convolvable, combine_flux, copy_passthrough };
use crate::core::deposit::deposit_range;
use crate::core::error::{ invalid_state, Result };
use crate::core::grid::{ ImageGrid, PixelGrid, PixelValue };
use crate::core::photon_array::PhotonArray;
use crate::core::resample::GridDistribution;
use crate::core::rng::RandDeviate;
use crate::math::constants::Float;

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;

pub const DEFAULT_CHUNK_SIZE: usize = 4096;

impl<'a> PhotonArray<'a> {
    /// Parallel `add_to`. Returns the same deposited flux.
    pub fn add_to_parallel<T: PixelValue>(&self, grid: &mut ImageGrid<T>, chunk_size: usize) -> Result<Float> {
        let bounds = grid.bounds();
        if !bounds.is_defined() {
            return invalid_state("cannot deposit photons onto a grid with undefined bounds");
        }
        let chunk = chunk_size.max(1);

        let merged = self.xs().par_chunks(chunk)
            .zip(self.ys().par_chunks(chunk))
            .zip(self.fluxes().par_chunks(chunk))
            .fold(|| (ImageGrid::<T>::from_bounds(bounds), 0.0),
                  |(mut partial, sum), ((xs, ys), fluxes)| {
                      let (added, _) = deposit_range(xs, ys, fluxes, bounds, &mut partial);
                      (partial, sum + added)
                  })
            .reduce_with(|(mut a, sum_a), (b, sum_b)| {
                a.merge_from(&b);
                (a, sum_a + sum_b)
            });

        let added = match merged {
            Some((partial, added)) => {
                grid.merge_from(&partial);
                added
            }
            None => 0.0,
        };
        log::debug!("Deposited {} photons in parallel, flux = {}.", self.size(), added);
        Ok(added)
    }

    /// Parallel `set_from` with one seeded generator per chunk.
    pub fn set_from_parallel<G>(&mut self, grid: &G, seed: u64, chunk_size: usize) -> Result<usize>
    where
        G: PixelGrid + ?Sized,
    {
        let dist = GridDistribution::new(grid)?;
        let n = self.size();
        self.clear_optional();
        self.set_correlated(false);
        let chunk = chunk_size.max(1);

        let (xs, ys, fluxes) = self.core_mut();
        xs.par_chunks_mut(chunk)
            .zip(ys.par_chunks_mut(chunk))
            .zip(fluxes.par_chunks_mut(chunk))
            .enumerate()
            .for_each(|(k, ((xs, ys), fluxes))| {
                let mut ud = RandDeviate::new(StdRng::seed_from_u64(seed.wrapping_add(k as u64)));
                dist.fill(xs, ys, fluxes, n, &mut ud);
            });
        log::debug!("Resampled {} photons in parallel (seed = {}).", n, seed);
        Ok(n)
    }

    /// Parallel `convolve`.
    pub fn convolve_parallel(&self, rhs: &PhotonArray<'_>) -> Result<PhotonArray<'static>> {
        check_convolvable(self, rhs)?;
        let n = self.size();
        let scale = n as Float;
        let mut out = PhotonArray::new(n);
        if self.has_allocated_angles() || rhs.has_allocated_angles() {
            out.allocate_angles();
        }
        if self.has_allocated_wavelengths() || rhs.has_allocated_wavelengths() {
            out.allocate_wavelengths();
        }

        {
            let lhs: &PhotonArray<'_> = self;
            let (xs, ys, fluxes) = out.core_mut();
            xs.par_iter_mut()
                .zip(ys.par_iter_mut())
                .zip(fluxes.par_iter_mut())
                .enumerate()
                .for_each(|(i, ((x, y), flux))| {
                    *x = lhs.x(i) + rhs.x(i);
                    *y = lhs.y(i) + rhs.y(i);
                    *flux = combine_flux(lhs.flux(i), rhs.flux(i), scale);
                });
        }
        copy_passthrough(self, rhs, &mut out);
        out.set_correlated(true);
        Ok(out)
    }
}
