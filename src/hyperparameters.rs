use crate::data::ObservationSeries;
use crate::error::{GpError, JumpFinderError};
use crate::float_trait::Float;
use crate::gp::{GaussianProcess, Hyperparameters};
use crate::minimize::MinimizerTrait;

use ndarray::ArrayView1;
use rayon::prelude::*;

/// Absolute limit on the number of leading chunks used for the hyperparameter fit
pub const MAX_FIT_CHUNKS: usize = 50;

/// Reason a single chunk gave no hyperparameter estimate
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ChunkFitError {
    #[error(transparent)]
    Gp(#[from] GpError),

    #[error("optimizer gave invalid hyperparameters {0:?}")]
    Diverged(Vec<f64>),
}

/// Negative log-likelihood, $+\infty$ for non-positive hyperparameters or failed evaluations
pub fn negative_ln_likelihood<T, G>(gp: &G, params: &[T], t: ArrayView1<T>, m: ArrayView1<T>) -> T
where
    T: Float,
    G: GaussianProcess<T> + ?Sized,
{
    if params.iter().any(|&x| x <= T::zero()) {
        return T::infinity();
    }
    match gp.ln_likelihood(params, t, m, None) {
        Ok(lnl) if lnl.is_finite() => -lnl,
        _ => T::infinity(),
    }
}

/// Maximum-likelihood hyperparameters of a single chunk
pub fn fit_chunk<T, G, M>(
    gp: &G,
    minimizer: &M,
    t: ArrayView1<T>,
    m: ArrayView1<T>,
) -> Result<Hyperparameters<T>, ChunkFitError>
where
    T: Float,
    G: GaussianProcess<T> + ?Sized,
    M: MinimizerTrait,
{
    let minimum = gp.min_observations();
    if t.len() < minimum {
        return Err(GpError::TooFewObservations {
            actual: t.len(),
            minimum,
        }
        .into());
    }
    let x0 = gp.initial_parameters(t, m);
    let result = minimizer.minimize(
        |params: &[T]| negative_ln_likelihood(gp, params, t, m),
        x0.as_slice(),
    );
    let fitted = Hyperparameters::new(result.x);
    if !result.value.is_finite() || !fitted.is_valid() {
        return Err(ChunkFitError::Diverged(
            fitted.0.iter().map(|x| x.to_f64_lossy()).collect(),
        ));
    }
    if !result.success {
        tracing::debug!(
            evaluations = result.evaluations,
            "minimizer stopped before convergence, keeping the best point"
        );
    }
    Ok(fitted)
}

/// Consensus hyperparameters: componentwise median of per-chunk fits over up to `max_chunks`
/// leading chunks, chunks which cannot be fitted are skipped
pub fn fit_hyperparameters<T, G, M>(
    gp: &G,
    minimizer: &M,
    series: &ObservationSeries<T>,
    max_chunks: usize,
) -> Result<Hyperparameters<T>, JumpFinderError>
where
    T: Float,
    G: GaussianProcess<T> + ?Sized,
    M: MinimizerTrait + Sync,
{
    let chunks = &series.chunks()[..series.chunks().len().min(max_chunks)];
    let fits: Vec<_> = chunks
        .par_iter()
        .map(|range| {
            let (t, m) = series.chunk(range);
            fit_chunk(gp, minimizer, t, m)
        })
        .collect();

    let successful: Vec<_> = fits
        .into_iter()
        .zip(chunks)
        .enumerate()
        .filter_map(|(chunk, (fit, range))| match fit {
            Ok(hp) => {
                tracing::debug!(chunk, hyperparameters = ?hp.0, "chunk hyperparameters fitted");
                Some(hp)
            }
            Err(error) => {
                if !range.is_empty() {
                    tracing::warn!(chunk, %error, "skipping chunk in hyperparameter fit");
                }
                None
            }
        })
        .collect();

    let consensus = Hyperparameters::median(&successful).ok_or(JumpFinderError::FitFailure {
        attempted: chunks.len(),
    })?;
    tracing::info!(
        chunks = successful.len(),
        hyperparameters = ?consensus.0,
        "consensus hyperparameters"
    );
    Ok(consensus)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::gp::GpModel;
    use crate::minimize::{CobylaMinimizer, MinimizerAlgorithm, NelderMead};

    use light_curve_jump_finder_test_util::{OuParameters, ou_series};
    use ndarray::Array1;

    fn series(n: usize, chunk_size: usize, seed: u64) -> ObservationSeries<f64> {
        let (t, m) = ou_series(n, &OuParameters::default(), seed);
        let flux: Vec<_> = m.iter().map(|&m| 10.0 + m).collect();
        ObservationSeries::new(&t, &flux, chunk_size, &[]).unwrap()
    }

    #[test]
    fn negative_ln_likelihood_is_infinite_outside() {
        let gp = GpModel::default();
        let t = Array1::linspace(0.0, 9.0, 10);
        let m = Array1::zeros(10);
        assert_eq!(
            negative_ln_likelihood(&gp, &[1.0, -1.0, 1.0], t.view(), m.view()),
            f64::INFINITY
        );
        assert_eq!(
            negative_ln_likelihood(&gp, &[0.0, 1.0, 1.0], t.view(), m.view()),
            f64::INFINITY
        );
        assert!(negative_ln_likelihood(&gp, &[1.0, 1.0, 1.0], t.view(), m.view()).is_finite());
    }

    #[test]
    fn fit_chunk_recovers_noise() {
        let series = series(256, 256, 0);
        let (t, m) = series.chunk(&series.chunks()[0]);
        let gp = GpModel::default();
        let hp = fit_chunk(&gp, &NelderMead::default(), t, m).unwrap();
        assert!(hp.is_valid());
        // OU + white noise with unit amplitudes, flux is normalized by ~10
        let noise = hp.0[2] * series.flux_median();
        assert!((0.7..1.3).contains(&noise), "noise = {noise}");
    }

    #[test]
    fn fit_chunk_too_short() {
        let gp = GpModel::default();
        let t = Array1::from_elem(1, 1.0);
        assert_eq!(
            fit_chunk(&gp, &NelderMead::default(), t.view(), t.view()),
            Err(ChunkFitError::Gp(GpError::TooFewObservations {
                actual: 1,
                minimum: 2
            }))
        );
    }

    #[test]
    fn fit_chunk_flat_diverges() {
        let gp = GpModel::default();
        let t = Array1::linspace(0.0, 9.0, 10);
        let m = Array1::zeros(10);
        assert!(matches!(
            fit_chunk(&gp, &NelderMead::default(), t.view(), m.view()),
            Err(ChunkFitError::Diverged(_))
        ));
    }

    #[test]
    fn consensus_is_median_of_chunks() {
        let series = series(512, 128, 1);
        let gp = GpModel::default();
        let minimizer: MinimizerAlgorithm = NelderMead::default().into();
        let consensus = fit_hyperparameters(&gp, &minimizer, &series, 15).unwrap();

        let per_chunk: Vec<_> = series.chunks()[..4]
            .iter()
            .map(|range| {
                let (t, m) = series.chunk(range);
                fit_chunk(&gp, &minimizer, t, m).unwrap()
            })
            .collect();
        assert_eq!(consensus, Hyperparameters::median(&per_chunk).unwrap());
    }

    #[test]
    fn max_chunks_limits_fit() {
        let series = series(512, 128, 2);
        let gp = GpModel::default();
        let minimizer = NelderMead::default();
        let first = fit_hyperparameters(&gp, &minimizer, &series, 1).unwrap();
        let (t, m) = series.chunk(&series.chunks()[0]);
        assert_eq!(first, fit_chunk(&gp, &minimizer, t, m).unwrap());
    }

    #[test]
    fn cobyla_fit() {
        let series = series(256, 128, 3);
        let gp = GpModel::default();
        let minimizer: MinimizerAlgorithm = CobylaMinimizer::default().into();
        let consensus = fit_hyperparameters(&gp, &minimizer, &series, 15).unwrap();
        assert!(consensus.is_valid());
    }

    #[test]
    fn all_chunks_fail() {
        let t: Vec<f64> = (0..20).map(f64::from).collect();
        let flux = vec![1.0; 20];
        let series = ObservationSeries::new(&t, &flux, 10, &[]).unwrap();
        let gp = GpModel::default();
        assert_eq!(
            fit_hyperparameters(&gp, &NelderMead::default(), &series, 15),
            Err(JumpFinderError::FitFailure { attempted: 3 })
        );
    }
}
