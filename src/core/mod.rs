// Copyright @yucwang 2021

pub mod config;
pub mod convolve;
pub mod deposit;
pub mod error;
pub mod grid;
pub mod parallel;
pub mod photon_array;
pub mod resample;
pub mod rng;
