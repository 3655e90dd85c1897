use crate::float_trait::Float;

use ndarray::{Array1, ArrayView1};
use std::cmp::Ordering;

/// Index of `i` after mirroring over the array edges, `d c b a | a b c d | d c b a`
fn reflect(i: isize, len: usize) -> usize {
    let len = len as isize;
    let i = i.rem_euclid(2 * len);
    if i < len {
        i as usize
    } else {
        (2 * len - 1 - i) as usize
    }
}

/// Moving median with the window of `size` elements
///
/// The window of element $i$ spans $[i - size / 2, i - size / 2 + size)$, out-of-range indices
/// are mirrored over the edges. Non-finite values are ignored. For an even number of values in the
/// window the upper of the two central values is taken. Windows without finite values give NaN.
pub fn median_filter<T>(x: ArrayView1<T>, size: usize) -> Array1<T>
where
    T: Float,
{
    assert_ne!(size, 0, "median filter window must be positive");
    let len = x.len();
    let half = (size / 2) as isize;
    let mut window = Vec::with_capacity(size);
    (0..len)
        .map(|i| {
            window.clear();
            let first = i as isize - half;
            window.extend(
                (first..first + size as isize)
                    .map(|j| x[reflect(j, len)])
                    .filter(|v| v.is_finite()),
            );
            if window.is_empty() {
                return T::nan();
            }
            let rank = window.len() / 2;
            let (_, median, _) = window.select_nth_unstable_by(rank, |a, b| {
                a.partial_cmp(b).unwrap_or(Ordering::Equal)
            });
            *median
        })
        .collect()
}
