// Copyright @yucwang 2026

use crate::core::error::{ invalid_argument, invalid_state, Result };
use crate::math::constants::Float;

use std::ops::{ Deref, DerefMut };

/// Storage of one photon attribute: owned, or a view into caller memory.
#[derive(Debug)]
pub(crate) enum AttributeBuffer<'a> {
    Owned(Vec<Float>),
    Borrowed(&'a mut [Float]),
}

impl<'a> Deref for AttributeBuffer<'a> {
    type Target = [Float];

    fn deref(&self) -> &[Float] {
        match self {
            AttributeBuffer::Owned(v) => v.as_slice(),
            AttributeBuffer::Borrowed(s) => s,
        }
    }
}

impl<'a> DerefMut for AttributeBuffer<'a> {
    fn deref_mut(&mut self) -> &mut [Float] {
        match self {
            AttributeBuffer::Owned(v) => v.as_mut_slice(),
            AttributeBuffer::Borrowed(s) => s,
        }
    }
}

impl<'a> AttributeBuffer<'a> {
    fn zeros(n: usize) -> Self {
        AttributeBuffer::Owned(vec![0.0; n])
    }

    fn to_owned_buffer(&self) -> AttributeBuffer<'static> {
        AttributeBuffer::Owned(self.to_vec())
    }
}

/// Caller-owned slices used as photon storage without copying.
pub struct PhotonViews<'a> {
    pub x: &'a mut [Float],
    pub y: &'a mut [Float],
    pub flux: &'a mut [Float],
    pub dxdz: Option<&'a mut [Float]>,
    pub dydz: Option<&'a mut [Float]>,
    pub wave: Option<&'a mut [Float]>,
    pub is_corr: bool,
}

/// Raw buffer handles handed over by an external array system.
///
/// Null `dxdz`/`dydz`/`wave` pointers mean the attribute is absent.
pub struct RawPhotonBuffers {
    pub n: isize,
    pub x: *mut Float,
    pub y: *mut Float,
    pub flux: *mut Float,
    pub dxdz: *mut Float,
    pub dydz: *mut Float,
    pub wave: *mut Float,
    pub is_corr: bool,
}

/// Fixed-size collection of photons.
///
/// Every attribute is an index-aligned sequence of length `size()`.
/// `dxdz` and `dydz` are present or absent together.
#[derive(Debug)]
pub struct PhotonArray<'a> {
    n: usize,
    x: AttributeBuffer<'a>,
    y: AttributeBuffer<'a>,
    flux: AttributeBuffer<'a>,
    dxdz: Option<AttributeBuffer<'a>>,
    dydz: Option<AttributeBuffer<'a>>,
    wave: Option<AttributeBuffer<'a>>,
    is_corr: bool,
}

impl PhotonArray<'static> {
    /// Zero-initialised array of `n` photons with owned storage.
    pub fn new(n: usize) -> Self {
        Self {
            n,
            x: AttributeBuffer::zeros(n),
            y: AttributeBuffer::zeros(n),
            flux: AttributeBuffer::zeros(n),
            dxdz: None,
            dydz: None,
            wave: None,
            is_corr: false,
        }
    }

    pub fn with_angles(mut self) -> Self {
        self.allocate_angles();
        self
    }

    pub fn with_wavelengths(mut self) -> Self {
        self.allocate_wavelengths();
        self
    }

    pub fn from_vecs(x: Vec<Float>, y: Vec<Float>, flux: Vec<Float>, is_corr: bool) -> Result<Self> {
        let n = x.len();
        if y.len() != n || flux.len() != n {
            return invalid_argument(format!(
                "attribute lengths differ: x={}, y={}, flux={}", n, y.len(), flux.len()));
        }
        Ok(Self {
            n,
            x: AttributeBuffer::Owned(x),
            y: AttributeBuffer::Owned(y),
            flux: AttributeBuffer::Owned(flux),
            dxdz: None,
            dydz: None,
            wave: None,
            is_corr,
        })
    }
}

impl<'a> PhotonArray<'a> {
    /// Wrap caller slices. All present slices must share the length of `x`.
    pub fn from_views(views: PhotonViews<'a>) -> Result<Self> {
        let n = views.x.len();
        check_len("y", views.y.len(), n)?;
        check_len("flux", views.flux.len(), n)?;
        if views.dxdz.is_some() != views.dydz.is_some() {
            return invalid_argument("dxdz and dydz must be supplied together");
        }
        if let Some(d) = &views.dxdz {
            check_len("dxdz", d.len(), n)?;
        }
        if let Some(d) = &views.dydz {
            check_len("dydz", d.len(), n)?;
        }
        if let Some(w) = &views.wave {
            check_len("wave", w.len(), n)?;
        }

        Ok(Self {
            n,
            x: AttributeBuffer::Borrowed(views.x),
            y: AttributeBuffer::Borrowed(views.y),
            flux: AttributeBuffer::Borrowed(views.flux),
            dxdz: views.dxdz.map(AttributeBuffer::Borrowed),
            dydz: views.dydz.map(AttributeBuffer::Borrowed),
            wave: views.wave.map(AttributeBuffer::Borrowed),
            is_corr: views.is_corr,
        })
    }

    /// Wrap raw external buffers without copying.
    ///
    /// # Safety
    ///
    /// Every non-null pointer must be valid for reads and writes of `n`
    /// properly aligned `Float`s for all of `'a`, the buffers must not
    /// overlap, and nothing else may access them while the array lives.
    /// Only the count and the null/non-null pattern are checked.
    pub unsafe fn from_raw_parts(raw: RawPhotonBuffers) -> Result<Self> {
        if raw.n < 0 {
            return invalid_argument(format!("negative photon count {}", raw.n));
        }
        if raw.x.is_null() || raw.y.is_null() || raw.flux.is_null() {
            return invalid_argument("x, y and flux buffers are required");
        }
        if raw.dxdz.is_null() != raw.dydz.is_null() {
            return invalid_argument("dxdz and dydz must be supplied together");
        }
        let n = raw.n as usize;

        Ok(Self {
            n,
            x: AttributeBuffer::Borrowed(std::slice::from_raw_parts_mut(raw.x, n)),
            y: AttributeBuffer::Borrowed(std::slice::from_raw_parts_mut(raw.y, n)),
            flux: AttributeBuffer::Borrowed(std::slice::from_raw_parts_mut(raw.flux, n)),
            dxdz: raw_view(raw.dxdz, n).map(AttributeBuffer::Borrowed),
            dydz: raw_view(raw.dydz, n).map(AttributeBuffer::Borrowed),
            wave: raw_view(raw.wave, n).map(AttributeBuffer::Borrowed),
            is_corr: raw.is_corr,
        })
    }

    /// Deep copy into owned storage.
    pub fn to_owned_array(&self) -> PhotonArray<'static> {
        PhotonArray {
            n: self.n,
            x: self.x.to_owned_buffer(),
            y: self.y.to_owned_buffer(),
            flux: self.flux.to_owned_buffer(),
            dxdz: self.dxdz.as_ref().map(|b| b.to_owned_buffer()),
            dydz: self.dydz.as_ref().map(|b| b.to_owned_buffer()),
            wave: self.wave.as_ref().map(|b| b.to_owned_buffer()),
            is_corr: self.is_corr,
        }
    }

    pub fn size(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn x(&self, i: usize) -> Float { self.x[i] }
    pub fn y(&self, i: usize) -> Float { self.y[i] }
    pub fn flux(&self, i: usize) -> Float { self.flux[i] }

    pub fn dxdz(&self, i: usize) -> Option<Float> {
        self.dxdz.as_ref().map(|b| b[i])
    }

    pub fn dydz(&self, i: usize) -> Option<Float> {
        self.dydz.as_ref().map(|b| b[i])
    }

    pub fn wavelength(&self, i: usize) -> Option<Float> {
        self.wave.as_ref().map(|b| b[i])
    }

    pub fn set_photon(&mut self, i: usize, x: Float, y: Float, flux: Float) {
        self.x[i] = x;
        self.y[i] = y;
        self.flux[i] = flux;
    }

    pub fn set_angles(&mut self, i: usize, dxdz: Float, dydz: Float) -> Result<()> {
        match (self.dxdz.as_mut(), self.dydz.as_mut()) {
            (Some(dx), Some(dy)) => {
                dx[i] = dxdz;
                dy[i] = dydz;
                Ok(())
            }
            _ => invalid_state("photon angles are not allocated"),
        }
    }

    pub fn set_wavelength(&mut self, i: usize, wave: Float) -> Result<()> {
        match self.wave.as_mut() {
            Some(w) => {
                w[i] = wave;
                Ok(())
            }
            None => invalid_state("photon wavelengths are not allocated"),
        }
    }

    pub fn xs(&self) -> &[Float] { &self.x }
    pub fn ys(&self) -> &[Float] { &self.y }
    pub fn fluxes(&self) -> &[Float] { &self.flux }
    pub fn xs_mut(&mut self) -> &mut [Float] { &mut self.x }
    pub fn ys_mut(&mut self) -> &mut [Float] { &mut self.y }
    pub fn fluxes_mut(&mut self) -> &mut [Float] { &mut self.flux }

    pub fn dxdzs(&self) -> Option<&[Float]> { self.dxdz.as_deref() }
    pub fn dydzs(&self) -> Option<&[Float]> { self.dydz.as_deref() }
    pub fn wavelengths(&self) -> Option<&[Float]> { self.wave.as_deref() }

    /// Mutable views of positions and fluxes at once.
    pub(crate) fn core_mut(&mut self) -> (&mut [Float], &mut [Float], &mut [Float]) {
        (&mut *self.x, &mut *self.y, &mut *self.flux)
    }

    pub(crate) fn angles_mut(&mut self) -> Option<(&mut [Float], &mut [Float])> {
        match (self.dxdz.as_mut(), self.dydz.as_mut()) {
            (Some(dx), Some(dy)) => Some((&mut **dx, &mut **dy)),
            _ => None,
        }
    }

    pub(crate) fn wavelengths_mut(&mut self) -> Option<&mut [Float]> {
        self.wave.as_deref_mut()
    }

    /// Zero the optional attributes that are allocated.
    pub(crate) fn clear_optional(&mut self) {
        for buffer in [self.dxdz.as_mut(), self.dydz.as_mut(), self.wave.as_mut()].into_iter().flatten() {
            buffer.fill(0.0);
        }
    }

    pub fn has_allocated_angles(&self) -> bool {
        self.dxdz.is_some() && self.dydz.is_some()
    }

    pub fn has_allocated_wavelengths(&self) -> bool {
        self.wave.is_some()
    }

    /// Add zero-filled angle storage if missing.
    pub fn allocate_angles(&mut self) {
        if !self.has_allocated_angles() {
            self.dxdz = Some(AttributeBuffer::zeros(self.n));
            self.dydz = Some(AttributeBuffer::zeros(self.n));
        }
    }

    pub fn allocate_wavelengths(&mut self) {
        if self.wave.is_none() {
            self.wave = Some(AttributeBuffer::zeros(self.n));
        }
    }

    pub fn is_correlated(&self) -> bool {
        self.is_corr
    }

    pub fn set_correlated(&mut self, is_corr: bool) {
        self.is_corr = is_corr;
    }

    pub fn total_flux(&self) -> Float {
        self.flux.iter().sum()
    }

    /// Rescale so that `total_flux()` becomes `flux`.
    pub fn set_total_flux(&mut self, flux: Float) -> Result<()> {
        let current = self.total_flux();
        if current == 0.0 || !current.is_finite() {
            return invalid_state(format!("cannot rescale photons with total flux {}", current));
        }
        self.scale_flux(flux / current);
        Ok(())
    }

    pub fn scale_flux(&mut self, scale: Float) {
        for f in self.flux.iter_mut() {
            *f *= scale;
        }
    }

    pub fn scale_xy(&mut self, scale: Float) {
        for v in self.x.iter_mut().chain(self.y.iter_mut()) {
            *v *= scale;
        }
    }

    /// Copy `rhs` into photons `istart..istart + rhs.size()`.
    ///
    /// Optional attributes are copied where both arrays carry them.
    pub fn assign_at(&mut self, istart: usize, rhs: &PhotonArray<'_>) -> Result<()> {
        let end = istart.checked_add(rhs.n).filter(|end| *end <= self.n);
        let end = match end {
            Some(end) => end,
            None => return invalid_argument(format!(
                "cannot assign {} photons at {} into an array of {}", rhs.n, istart, self.n)),
        };

        self.x[istart..end].copy_from_slice(&rhs.x);
        self.y[istart..end].copy_from_slice(&rhs.y);
        self.flux[istart..end].copy_from_slice(&rhs.flux);
        copy_optional(&mut self.dxdz, &rhs.dxdz, istart, end);
        copy_optional(&mut self.dydz, &rhs.dydz, istart, end);
        copy_optional(&mut self.wave, &rhs.wave, istart, end);
        Ok(())
    }
}

/// # Safety
///
/// See `PhotonArray::from_raw_parts`.
unsafe fn raw_view<'a>(p: *mut Float, n: usize) -> Option<&'a mut [Float]> {
    if p.is_null() {
        None
    } else {
        Some(std::slice::from_raw_parts_mut(p, n))
    }
}

fn check_len(name: &str, len: usize, n: usize) -> Result<()> {
    if len != n {
        return invalid_argument(format!("{} has length {}, expected {}", name, len, n));
    }
    Ok(())
}

fn copy_optional(dst: &mut Option<AttributeBuffer<'_>>, src: &Option<AttributeBuffer<'_>>,
                 start: usize, end: usize) {
    if let (Some(d), Some(s)) = (dst.as_mut(), src.as_ref()) {
        d[start..end].copy_from_slice(s);
    }
}
