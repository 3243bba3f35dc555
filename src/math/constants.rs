/* Copyright 2020 @Yuchen Wong */

use nalgebra as na;

pub type Float = f64;
pub type Int = i32;

pub type Vector2i = na::Vector2<Int>;

/// Offset from a pixel's integer centre to its lower edge.
pub const HALF_PIXEL: Float = 0.5;
