// Copyright 2020 @TwoCookingMice

pub mod bounds;
pub mod constants;
