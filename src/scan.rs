use crate::data::ObservationSeries;
use crate::error::{GpError, JumpFinderError};
use crate::float_trait::Float;
use crate::gp::GaussianProcess;

use ndarray::{Array1, ArrayView1};
use rayon::prelude::*;

/// Log-likelihood ratio of a breakpoint at every cadence of the chunk against no breakpoint
///
/// A breakpoint at the first cadence leaves a single segment, so its ratio is zero by
/// construction. It is replaced by the ratio of the second cadence to keep the first observation
/// of every chunk from looking like a dip.
pub fn chunk_ln_likelihood_ratio<T, G>(
    gp: &G,
    params: &[T],
    t: ArrayView1<T>,
    m: ArrayView1<T>,
) -> Result<Array1<T>, GpError>
where
    T: Float,
    G: GaussianProcess<T> + ?Sized,
{
    let minimum = gp.min_observations().max(2);
    if t.len() < minimum {
        return Err(GpError::TooFewObservations {
            actual: t.len(),
            minimum,
        });
    }
    let baseline = gp.ln_likelihood(params, t, m, None)?;
    let mut ratio = gp.breakpoint_ln_likelihoods(params, t, m)? - baseline;
    ratio[0] = ratio[1];
    Ok(ratio)
}

/// Log-likelihood ratio profile over the whole series, chunks are scanned independently
///
/// Entries of chunks which cannot be scanned are NaN, meaning no evidence either way. If no
/// chunk can be scanned [JumpFinderError::DegenerateChunk] is returned.
pub fn ln_likelihood_ratio<T, G>(
    gp: &G,
    params: &[T],
    series: &ObservationSeries<T>,
) -> Result<Array1<T>, JumpFinderError>
where
    T: Float,
    G: GaussianProcess<T> + ?Sized,
{
    let ratios: Vec<_> = series
        .chunks()
        .par_iter()
        .map(|range| {
            let (t, m) = series.chunk(range);
            chunk_ln_likelihood_ratio(gp, params, t, m)
        })
        .collect();

    let mut profile = Array1::from_elem(series.len(), T::nan());
    let mut scanned = 0;
    for (chunk, (range, ratio)) in series.chunks().iter().zip(ratios).enumerate() {
        match ratio {
            Ok(ratio) => {
                profile
                    .slice_mut(ndarray::s![range.clone()])
                    .assign(&ratio);
                scanned += 1;
            }
            Err(error) => {
                if !range.is_empty() {
                    tracing::warn!(chunk, %error, "chunk is not scanned for jumps");
                }
            }
        }
    }
    if scanned == 0 {
        return Err(JumpFinderError::DegenerateChunk {
            chunks: series.chunks().len(),
            minimum: gp.min_observations().max(2),
        });
    }
    tracing::debug!(scanned, chunks = series.chunks().len(), "likelihood ratio profile ready");
    Ok(profile)
}
