use crate::data::sorted_array::SortedArray;
use crate::error::InputError;
use crate::float_trait::Float;

use ndarray::{Array1, ArrayView1, Zip, s};
use std::ops::Range;

/// Split `len` indices into consecutive ranges of `chunk_size`
///
/// The last range holds the remainder and is empty when `len` is divisible by `chunk_size`, so
/// the output always has `len / chunk_size + 1` elements.
pub fn chunk_ranges(len: usize, chunk_size: usize) -> Vec<Range<usize>> {
    assert_ne!(chunk_size, 0, "chunk size must be positive");
    let n_full = len / chunk_size;
    (0..n_full)
        .map(|i| i * chunk_size..(i + 1) * chunk_size)
        .chain(std::iter::once(n_full * chunk_size..len))
        .collect()
}

/// Cleaned and normalized photometric series partitioned into chunks
///
/// Flux is divided by the median of the raw flux array and shifted by -1. The median is taken
/// before any filtering, only NaN values are ignored by it.
#[derive(Clone, Debug)]
pub struct ObservationSeries<T> {
    cadence: Array1<T>,
    flux: Array1<T>,
    flux_median: T,
    chunks: Vec<Range<usize>>,
}

impl<T> ObservationSeries<T>
where
    T: Float,
{
    /// Filters non-finite observations and those inside any of `excluded_cadences` closed
    /// intervals, normalizes flux and splits the series into chunks of `chunk_size`
    pub fn new<'a>(
        cadence: impl Into<ArrayView1<'a, T>>,
        flux: impl Into<ArrayView1<'a, T>>,
        chunk_size: usize,
        excluded_cadences: &[(f64, f64)],
    ) -> Result<Self, InputError> {
        let cadence = cadence.into();
        let flux = flux.into();
        if cadence.len() != flux.len() {
            return Err(InputError::LengthMismatch {
                cadence: cadence.len(),
                flux: flux.len(),
            });
        }
        if chunk_size == 0 {
            return Err(InputError::InvalidConfig("chunk_size must be positive"));
        }

        let flux_median = SortedArray::from(flux)
            .median()
            .filter(|median| median.is_finite() && !median.is_zero())
            .ok_or(InputError::UndefinedMedian)?;

        let excluded: Vec<(T, T)> = excluded_cadences
            .iter()
            .map(|&(lower, upper)| (T::from_f64_lossy(lower), T::from_f64_lossy(upper)))
            .collect();
        let (cadence, flux): (Vec<_>, Vec<_>) = Zip::from(&cadence)
            .and(&flux)
            .fold(Vec::new(), |mut acc, &t, &m| {
                let finite = t.is_finite() && m.is_finite();
                if finite && !excluded.iter().any(|&(lo, hi)| lo <= t && t <= hi) {
                    acc.push((t, m / flux_median - T::one()));
                }
                acc
            })
            .into_iter()
            .unzip();
        if cadence.is_empty() {
            return Err(InputError::EmptySeries);
        }

        Ok(Self {
            chunks: chunk_ranges(cadence.len(), chunk_size),
            cadence: cadence.into(),
            flux: flux.into(),
            flux_median,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cadence.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cadence.is_empty()
    }

    #[inline]
    pub fn cadence(&self) -> ArrayView1<'_, T> {
        self.cadence.view()
    }

    /// Normalized flux
    #[inline]
    pub fn flux(&self) -> ArrayView1<'_, T> {
        self.flux.view()
    }

    /// Normalization reference, the NaN-ignoring median of the raw flux
    #[inline]
    pub fn flux_median(&self) -> T {
        self.flux_median
    }

    /// Chunk index ranges, the last one may be empty
    #[inline]
    pub fn chunks(&self) -> &[Range<usize>] {
        &self.chunks
    }

    pub fn chunk(&self, range: &Range<usize>) -> (ArrayView1<'_, T>, ArrayView1<'_, T>) {
        (
            self.cadence.slice(s![range.clone()]),
            self.flux.slice(s![range.clone()]),
        )
    }
}
