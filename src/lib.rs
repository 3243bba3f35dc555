// Copyright @yucwang 2021

pub extern crate nalgebra as na;

pub mod core;
pub mod math;
pub mod io;

pub use crate::core::convolve::FluxNormalization;
pub use crate::core::error::{ PhotonError, Result };
pub use crate::core::grid::{ ImageGrid, PixelGrid, PixelValue };
pub use crate::core::photon_array::{ PhotonArray, PhotonViews, RawPhotonBuffers };
pub use crate::core::resample::{ count_pixel_photons, GridDistribution };
pub use crate::core::rng::{ LcgRng, RandDeviate, UniformDeviate };
pub use crate::math::bounds::Bounds2i;
