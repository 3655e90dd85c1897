use conv::ApproxFrom;
use ndarray::NdFloat;
use num_traits::FloatConst;
use std::iter::Sum;

/// Floating point type the jump finder operates on, implemented for [f32] and [f64]
pub trait Float: 'static + NdFloat + FloatConst + ApproxFrom<usize> + Sum<Self> {
    fn half() -> Self;

    fn two() -> Self;

    /// Converts from [f64], rounding to the nearest representable value
    fn from_f64_lossy(x: f64) -> Self;

    fn to_f64_lossy(self) -> f64;
}

impl Float for f32 {
    #[inline]
    fn half() -> Self {
        0.5
    }

    #[inline]
    fn two() -> Self {
        2.0
    }

    #[inline]
    fn from_f64_lossy(x: f64) -> Self {
        x as f32
    }

    #[inline]
    fn to_f64_lossy(self) -> f64 {
        self.into()
    }
}

impl Float for f64 {
    #[inline]
    fn half() -> Self {
        0.5
    }

    #[inline]
    fn two() -> Self {
        2.0
    }

    #[inline]
    fn from_f64_lossy(x: f64) -> Self {
        x
    }

    #[inline]
    fn to_f64_lossy(self) -> f64 {
        self
    }
}
