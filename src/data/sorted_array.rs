use crate::float_trait::Float;

use ndarray::{Array1, ArrayView1};
use std::ops::Deref;

/// Sorted and contiguous array with NaN values removed
#[derive(Clone, Debug, PartialEq)]
pub struct SortedArray<T>(pub Array1<T>);

impl<T> SortedArray<T>
where
    T: Float,
{
    /// Keeps finite values only, infinities are dropped together with NaNs
    pub fn from_finite(values: impl IntoIterator<Item = T>) -> Self {
        values
            .into_iter()
            .filter(|x| x.is_finite())
            .collect::<Vec<_>>()
            .into()
    }

    /// Median, the mean of two central values for even lengths, `None` for empty arrays
    pub fn median(&self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let i = (self.len() - 1) / 2;
        if self.len() % 2 == 0 {
            Some(T::half() * (self[i] + self[i + 1]))
        } else {
            Some(self[i])
        }
    }
}

impl<T> From<Vec<T>> for SortedArray<T>
where
    T: Float,
{
    fn from(mut v: Vec<T>) -> Self {
        v.retain(|x| !x.is_nan());
        v[..].sort_unstable_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        Self(Array1::from_vec(v))
    }
}

impl<T> From<ArrayView1<'_, T>> for SortedArray<T>
where
    T: Float,
{
    fn from(v: ArrayView1<'_, T>) -> Self {
        v.to_vec().into()
    }
}

impl<T> Deref for SortedArray<T> {
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        self.0
            .as_slice()
            .expect("SortedArray is always built from a Vec")
    }
}
