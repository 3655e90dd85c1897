//! Simple array statistics functions replacing ndarray-stats dependency

use crate::data::SortedArray;
use crate::float_trait::Float;

use ndarray::ArrayView1;

/// Scale factor turning the median absolute deviation into a Gaussian standard deviation estimate
pub const MAD_SCALE: f64 = 1.4826;

/// Index of the first maximum among finite elements, `None` if there are no finite elements
pub fn argmax<T>(arr: ArrayView1<T>) -> Option<usize>
where
    T: Float,
{
    arr.iter()
        .enumerate()
        .filter(|(_, x)| x.is_finite())
        .fold(None, |best: Option<(usize, T)>, (idx, &val)| match best {
            Some((_, max_val)) if val <= max_val => best,
            _ => Some((idx, val)),
        })
        .map(|(idx, _)| idx)
}

/// Median absolute deviation of finite values scaled by [MAD_SCALE]
pub fn robust_std<T>(values: impl IntoIterator<Item = T>) -> Option<T>
where
    T: Float,
{
    let sorted = SortedArray::from_finite(values);
    let median = sorted.median()?;
    let deviations: Vec<_> = sorted.iter().map(|&x| (x - median).abs()).collect();
    let mad = SortedArray::from(deviations).median()?;
    Some(T::from_f64_lossy(MAD_SCALE) * mad)
}
