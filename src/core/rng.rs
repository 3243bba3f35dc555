// Copyright @yucwang 2026

use crate::math::constants::Float;

use rand::RngCore;

/// Supplier of uniform deviates in `[0, 1)`.
///
/// Sources are passed explicitly to every sampling call; the sequence is
/// fully determined by the seed and the order of draws.
pub trait UniformDeviate {
    fn next_uniform(&mut self) -> Float;
}

impl<U: UniformDeviate + ?Sized> UniformDeviate for &mut U {
    fn next_uniform(&mut self) -> Float {
        (**self).next_uniform()
    }
}

pub struct LcgRng {
    state: u64,
}

impl LcgRng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        (self.state >> 32) as u32
    }

    pub fn next_f64(&mut self) -> Float {
        // 2^-32 keeps the result strictly below one.
        (self.next_u32() as Float) * (1.0 / 4294967296.0)
    }
}

impl UniformDeviate for LcgRng {
    fn next_uniform(&mut self) -> Float {
        self.next_f64()
    }
}

/// Adapter turning any `rand` generator into a uniform deviate.
pub struct RandDeviate<R: RngCore> {
    rng: R,
}

impl<R: RngCore> RandDeviate<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    pub fn into_inner(self) -> R {
        self.rng
    }
}

impl<R: RngCore> UniformDeviate for RandDeviate<R> {
    fn next_uniform(&mut self) -> Float {
        // 53 random mantissa bits.
        ((self.rng.next_u64() >> 11) as Float) * (1.0 / (1u64 << 53) as Float)
    }
}
