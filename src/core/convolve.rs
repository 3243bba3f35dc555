// Copyright @yucwang 2026

use crate::core::error::{ invalid_argument, invalid_state, Result };
use crate::core::photon_array::PhotonArray;
use crate::math::constants::Float;

/// Factor applied to `flux1 * flux2` when two arrays are convolved.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FluxNormalization {
    /// Multiply by the photon count, which keeps the expected total equal
    /// to the product of the input totals.
    PhotonCount,
    /// Fixed calibration constant.
    Fixed(Float),
}

impl Default for FluxNormalization {
    fn default() -> Self {
        FluxNormalization::PhotonCount
    }
}

impl FluxNormalization {
    pub fn scale(&self, n: usize) -> Float {
        match self {
            FluxNormalization::PhotonCount => n as Float,
            FluxNormalization::Fixed(s) => *s,
        }
    }
}

impl<'a> PhotonArray<'a> {
    /// Pair photon `i` of `self` with photon `i` of `rhs`: positions add and
    /// fluxes multiply (times the photon count).
    ///
    /// When one input is correlated its fluxes already carry the marginal
    /// weights, so the same product applies without extra factors. Two
    /// correlated inputs have no defined pairing and are rejected. The
    /// result is always marked correlated.
    pub fn convolve(&self, rhs: &PhotonArray<'_>) -> Result<PhotonArray<'static>> {
        self.convolve_with(rhs, FluxNormalization::default())
    }

    pub fn convolve_with(&self, rhs: &PhotonArray<'_>, norm: FluxNormalization) -> Result<PhotonArray<'static>> {
        check_convolvable(self, rhs)?;
        let mut out = PhotonArray::new(self.size());
        if self.has_allocated_angles() || rhs.has_allocated_angles() {
            out.allocate_angles();
        }
        if self.has_allocated_wavelengths() || rhs.has_allocated_wavelengths() {
            out.allocate_wavelengths();
        }
        convolve_core(self, rhs, &mut out, norm);
        Ok(out)
    }

    /// Write the convolution of `self` and `rhs` into `out`.
    ///
    /// `out` keeps its own set of allocated optional attributes. Each is
    /// copied from the inputs when one of them carries it and zeroed
    /// otherwise.
    pub fn convolve_into(&self, rhs: &PhotonArray<'_>, out: &mut PhotonArray<'_>) -> Result<()> {
        check_convolvable(self, rhs)?;
        if out.size() != self.size() {
            return invalid_argument(format!(
                "output holds {} photons, inputs hold {}", out.size(), self.size()));
        }
        convolve_core(self, rhs, out, FluxNormalization::default());
        Ok(())
    }
}

pub(crate) fn check_convolvable(lhs: &PhotonArray<'_>, rhs: &PhotonArray<'_>) -> Result<()> {
    if lhs.size() != rhs.size() {
        return invalid_argument(format!(
            "cannot convolve photon arrays of sizes {} and {}", lhs.size(), rhs.size()));
    }
    if lhs.is_correlated() && rhs.is_correlated() {
        return invalid_state("cannot convolve two correlated photon arrays");
    }
    Ok(())
}

pub(crate) fn combine_flux(f1: Float, f2: Float, scale: Float) -> Float {
    f1 * f2 * scale
}

fn convolve_core(lhs: &PhotonArray<'_>, rhs: &PhotonArray<'_>, out: &mut PhotonArray<'_>,
                 norm: FluxNormalization) {
    let n = lhs.size();
    let scale = norm.scale(n);
    for i in 0..n {
        out.set_photon(i,
                       lhs.x(i) + rhs.x(i),
                       lhs.y(i) + rhs.y(i),
                       combine_flux(lhs.flux(i), rhs.flux(i), scale));
    }
    copy_passthrough(lhs, rhs, out);
    out.set_correlated(true);
    log::debug!("Convolved {} photon pairs, output flux = {}.", n, out.total_flux());
}

/// Optional attributes come from `lhs` when it has them, else from `rhs`.
/// Attributes of `out` with no source are zeroed.
pub(crate) fn copy_passthrough(lhs: &PhotonArray<'_>, rhs: &PhotonArray<'_>, out: &mut PhotonArray<'_>) {
    let angles = lhs.dxdzs().zip(lhs.dydzs())
        .or_else(|| rhs.dxdzs().zip(rhs.dydzs()));
    if let Some((dx, dy)) = out.angles_mut() {
        match angles {
            Some((src_dx, src_dy)) => {
                dx.copy_from_slice(src_dx);
                dy.copy_from_slice(src_dy);
            }
            None => {
                dx.fill(0.0);
                dy.fill(0.0);
            }
        }
    }

    let waves = lhs.wavelengths().or_else(|| rhs.wavelengths());
    if let Some(w) = out.wavelengths_mut() {
        match waves {
            Some(src) => w.copy_from_slice(src),
            None => w.fill(0.0),
        }
    }
}
