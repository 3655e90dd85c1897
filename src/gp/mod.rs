//! Gaussian-process noise model
//!
//! The smooth stochastic variation of the flux is a zero-mean Gaussian process with a stationary
//! [Covariance] plus white noise. A hypothesized discontinuity, a *breakpoint* at cadence $b$,
//! makes observations with $t < b$ and $t \geq b$ uncorrelated, so the likelihood of the data
//! becomes the sum of two independent segment likelihoods.
//!
//! The model has no mutable state: every call receives its hyperparameters explicitly, and the
//! same model can be shared between worker threads.

mod cholesky;
use cholesky::Cholesky;

pub mod kernel;
pub use kernel::{
    Covariance, CovarianceTrait, ExponentialCovariance, Matern32Covariance,
    SquaredExponentialCovariance,
};

use crate::data::SortedArray;
use crate::error::GpError;
use crate::float_trait::Float;

use conv::prelude::*;
use itertools::Itertools;
use ndarray::{Array1, Array2, ArrayView1, s};
use serde::{Deserialize, Serialize};

/// Hyperparameter vector of a [GaussianProcess], all components must be positive
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hyperparameters<T>(pub Vec<T>);

impl<T> Hyperparameters<T>
where
    T: Float,
{
    pub fn new(values: impl Into<Vec<T>>) -> Self {
        Self(values.into())
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `true` if every component is positive and finite
    pub fn is_valid(&self) -> bool {
        self.0.iter().all(|&x| x > T::zero() && x.is_finite())
    }

    /// Componentwise median of equally-sized vectors, `None` if the iterator is empty
    pub fn median<'a>(vectors: impl IntoIterator<Item = &'a Self>) -> Option<Self> {
        let vectors: Vec<_> = vectors.into_iter().collect();
        let size = vectors.first()?.len();
        assert!(
            vectors.iter().all(|v| v.len() == size),
            "hyperparameter vectors must have the same size"
        );
        (0..size)
            .map(|i| SortedArray::from(vectors.iter().map(|v| v.0[i]).collect_vec()).median())
            .collect::<Option<Vec<_>>>()
            .map(Self)
    }
}

impl<T> AsRef<[T]> for Hyperparameters<T> {
    fn as_ref(&self) -> &[T] {
        &self.0
    }
}

/// Gaussian-process capability consumed by the jump finder
///
/// Cadences are assumed to be sorted in increasing order.
pub trait GaussianProcess<T: Float>: Send + Sync {
    /// Dimensionality of the hyperparameter vector
    fn nparams(&self) -> usize;

    /// Minimum number of observations the likelihood is defined for
    fn min_observations(&self) -> usize {
        2
    }

    /// Default starting point for the hyperparameter optimization
    fn initial_parameters(&self, t: ArrayView1<T>, m: ArrayView1<T>) -> Hyperparameters<T>;

    /// Log-likelihood of `m` observed at `t`, optionally with a breakpoint at cadence `breakpoint`
    fn ln_likelihood(
        &self,
        params: &[T],
        t: ArrayView1<T>,
        m: ArrayView1<T>,
        breakpoint: Option<T>,
    ) -> Result<T, GpError>;

    /// Log-likelihood with a breakpoint at every cadence, element $k$ corresponds to `t[k]`
    fn breakpoint_ln_likelihoods(
        &self,
        params: &[T],
        t: ArrayView1<T>,
        m: ArrayView1<T>,
    ) -> Result<Array1<T>, GpError> {
        t.iter()
            .map(|&b| self.ln_likelihood(params, t, m, Some(b)))
            .collect()
    }

    /// Conditional mean of the smooth component at `t` given the observations `m`
    fn predict(
        &self,
        params: &[T],
        t: ArrayView1<T>,
        m: ArrayView1<T>,
        breakpoint: Option<T>,
    ) -> Result<Array1<T>, GpError>;
}

/// Index of the first observation at or after the breakpoint
fn split_index<T: Float>(t: ArrayView1<T>, breakpoint: Option<T>) -> usize {
    match breakpoint {
        Some(b) => t.iter().position(|&x| x >= b).unwrap_or(t.len()),
        None => t.len(),
    }
}

/// Zero-mean GP with a stationary [Covariance] and white noise
///
/// Hyperparameters are `[amplitude, length_scale, white_noise]`, the last one is the standard
/// deviation of the noise.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct GpModel {
    covariance: Covariance,
}

impl GpModel {
    pub const NPARAMS: usize = 3;

    pub fn new(covariance: Covariance) -> Self {
        Self { covariance }
    }

    #[inline]
    pub fn covariance(&self) -> Covariance {
        self.covariance
    }

    fn check<T: Float>(
        &self,
        params: &[T],
        t: ArrayView1<T>,
        m: ArrayView1<T>,
    ) -> Result<(), GpError> {
        if params.len() != Self::NPARAMS {
            return Err(GpError::WrongParameterCount {
                actual: params.len(),
                expected: Self::NPARAMS,
            });
        }
        if let Some(index) = params.iter().position(|&x| !(x > T::zero() && x.is_finite())) {
            return Err(GpError::NonPositiveParameter { index });
        }
        if t.len() != m.len() {
            return Err(GpError::ShapeMismatch {
                t: t.len(),
                m: m.len(),
            });
        }
        Ok(())
    }

    /// Covariance matrix of the smooth component, with the white noise added to the diagonal if
    /// `with_noise` is set
    fn covariance_matrix<T: Float>(
        &self,
        params: &[T],
        t: ArrayView1<T>,
        with_noise: bool,
    ) -> Array2<T> {
        let (amplitude, length_scale, noise) = (params[0], params[1], params[2]);
        let noise_variance = if with_noise { noise * noise } else { T::zero() };
        Array2::from_shape_fn((t.len(), t.len()), |(i, j)| {
            let k = self.covariance.covariance(amplitude, length_scale, t[i] - t[j]);
            if i == j { k + noise_variance } else { k }
        })
    }

    fn segment_ln_likelihood<T: Float>(
        &self,
        params: &[T],
        t: ArrayView1<T>,
        m: ArrayView1<T>,
    ) -> Result<T, GpError> {
        if t.is_empty() {
            return Ok(T::zero());
        }
        Ok(Cholesky::new(self.covariance_matrix(params, t, true))?.ln_likelihood(m))
    }

    /// Prefix log-likelihoods of the segment, see [Cholesky::prefix_ln_likelihoods]
    fn prefix_ln_likelihoods<T: Float>(
        &self,
        params: &[T],
        t: ArrayView1<T>,
        m: ArrayView1<T>,
    ) -> Result<Array1<T>, GpError> {
        Ok(Cholesky::new(self.covariance_matrix(params, t, true))?.prefix_ln_likelihoods(m))
    }

    fn segment_predict<T: Float>(
        &self,
        params: &[T],
        t: ArrayView1<T>,
        m: ArrayView1<T>,
    ) -> Result<Array1<T>, GpError> {
        if t.is_empty() {
            return Ok(Array1::zeros(0));
        }
        let alpha = Cholesky::new(self.covariance_matrix(params, t, true))?.solve(m);
        Ok(self.covariance_matrix(params, t, false).dot(&alpha))
    }
}

impl<T> GaussianProcess<T> for GpModel
where
    T: Float,
{
    fn nparams(&self) -> usize {
        Self::NPARAMS
    }

    /// `[std(m), 16 median(dt), std(m) / 2]`
    fn initial_parameters(&self, t: ArrayView1<T>, m: ArrayView1<T>) -> Hyperparameters<T> {
        let std = if m.len() > 1 {
            let n: T = m.len().approx_as::<T>().unwrap();
            let mean = m.sum() / n;
            (m.fold(T::zero(), |acc, &x| acc + (x - mean).powi(2)) / (n - T::one())).sqrt()
        } else {
            T::zero()
        };
        let dt_median = SortedArray::from(
            t.iter()
                .tuple_windows()
                .map(|(&a, &b)| b - a)
                .collect_vec(),
        )
        .median()
        .unwrap_or_else(T::one);
        Hyperparameters(vec![
            std,
            T::from_f64_lossy(16.0) * dt_median,
            T::half() * std,
        ])
    }

    fn ln_likelihood(
        &self,
        params: &[T],
        t: ArrayView1<T>,
        m: ArrayView1<T>,
        breakpoint: Option<T>,
    ) -> Result<T, GpError> {
        self.check(params, t, m)?;
        let minimum = <Self as GaussianProcess<T>>::min_observations(self);
        if t.len() < minimum {
            return Err(GpError::TooFewObservations {
                actual: t.len(),
                minimum,
            });
        }
        let split = split_index(t, breakpoint);
        let before =
            self.segment_ln_likelihood(params, t.slice(s![..split]), m.slice(s![..split]))?;
        let after =
            self.segment_ln_likelihood(params, t.slice(s![split..]), m.slice(s![split..]))?;
        Ok(before + after)
    }

    /// Two factorizations instead of one per breakpoint: the likelihood with a breakpoint before
    /// observation $k$ is the $k$-th forward prefix likelihood plus the $(n-k)$-th prefix
    /// likelihood of the reversed series, the covariance depends on the lag only.
    fn breakpoint_ln_likelihoods(
        &self,
        params: &[T],
        t: ArrayView1<T>,
        m: ArrayView1<T>,
    ) -> Result<Array1<T>, GpError> {
        self.check(params, t, m)?;
        let minimum = <Self as GaussianProcess<T>>::min_observations(self);
        if t.len() < minimum {
            return Err(GpError::TooFewObservations {
                actual: t.len(),
                minimum,
            });
        }
        let n = t.len();
        let forward = self.prefix_ln_likelihoods(params, t, m)?;
        let backward =
            self.prefix_ln_likelihoods(params, t.slice(s![..;-1]), m.slice(s![..;-1]))?;
        Ok(t.iter()
            .map(|&b| {
                let split = split_index(t, Some(b));
                forward[split] + backward[n - split]
            })
            .collect())
    }

    fn predict(
        &self,
        params: &[T],
        t: ArrayView1<T>,
        m: ArrayView1<T>,
        breakpoint: Option<T>,
    ) -> Result<Array1<T>, GpError> {
        self.check(params, t, m)?;
        let split = split_index(t, breakpoint);
        let before = self.segment_predict(params, t.slice(s![..split]), m.slice(s![..split]))?;
        let after = self.segment_predict(params, t.slice(s![split..]), m.slice(s![split..]))?;
        Ok(before.into_iter().chain(after).collect())
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use light_curve_jump_finder_test_util::{OuParameters, ou_series};
    use ndarray::{Array1, array};

    const PARAMS: [f64; 3] = [1.0, 10.0, 0.5];

    fn series(n: usize, seed: u64) -> (Array1<f64>, Array1<f64>) {
        let ou = OuParameters {
            amplitude: PARAMS[0],
            length_scale: PARAMS[1],
            noise: PARAMS[2],
        };
        let (t, m) = ou_series(n, &ou, seed);
        (t.into(), m.into())
    }

    #[test]
    fn breakpoint_scan_equals_direct() {
        let (t, m) = series(40, 0);
        for covariance in [
            Covariance::exponential(),
            Covariance::matern32(),
            Covariance::squared_exponential(),
        ] {
            let gp = GpModel::new(covariance);
            let fast = gp
                .breakpoint_ln_likelihoods(&PARAMS, t.view(), m.view())
                .unwrap();
            let direct: Array1<f64> = t
                .iter()
                .map(|&b| {
                    gp.ln_likelihood(&PARAMS, t.view(), m.view(), Some(b))
                        .unwrap()
                })
                .collect();
            for (a, b) in fast.iter().zip(direct.iter()) {
                assert_relative_eq!(a, b, epsilon = 1e-8, max_relative = 1e-10);
            }
        }
    }

    #[test]
    fn breakpoint_at_first_cadence_is_baseline() {
        let (t, m) = series(30, 1);
        let gp = GpModel::default();
        let baseline = gp.ln_likelihood(&PARAMS, t.view(), m.view(), None).unwrap();
        let first = gp
            .ln_likelihood(&PARAMS, t.view(), m.view(), Some(t[0]))
            .unwrap();
        assert_relative_eq!(baseline, first, epsilon = 1e-12);
    }

    #[test]
    fn breakpoint_splits_into_independent_segments() {
        let (t, m) = series(30, 2);
        let gp = GpModel::default();
        let with_break = gp
            .ln_likelihood(&PARAMS, t.view(), m.view(), Some(t[12]))
            .unwrap();
        let first = gp
            .ln_likelihood(&PARAMS, t.slice(s![..12]), m.slice(s![..12]), None)
            .unwrap();
        let second = gp
            .ln_likelihood(&PARAMS, t.slice(s![12..]), m.slice(s![12..]), None)
            .unwrap();
        assert_relative_eq!(with_break, first + second, epsilon = 1e-10);
    }

    #[test]
    fn ln_likelihood_white_noise_limit() {
        // the smooth component is negligible, so the observations are i.i.d. N(0, 1)
        let t = array![0.0, 1.0, 2.0];
        let m = array![0.5, -1.0, 2.0];
        let gp = GpModel::default();
        let actual = gp
            .ln_likelihood(&[1e-9, 1.0, 1.0], t.view(), m.view(), None)
            .unwrap();
        let desired = m
            .iter()
            .map(|&x| -0.5 * x * x - 0.5 * f64::ln(2.0 * std::f64::consts::PI))
            .sum::<f64>();
        assert_relative_eq!(actual, desired, epsilon = 1e-8);
    }

    #[test]
    fn predict_interpolates_with_small_noise() {
        let (t, m) = series(25, 3);
        let gp = GpModel::default();
        let predicted = gp
            .predict(&[1.0, 10.0, 1e-6], t.view(), m.view(), None)
            .unwrap();
        for (p, x) in predicted.iter().zip(m.iter()) {
            assert_relative_eq!(p, x, epsilon = 1e-4);
        }
    }

    #[test]
    fn predict_recovers_step() {
        let t: Array1<f64> = (0..60).map(f64::from).collect();
        let m = t.mapv(|t| if t < 30.0 { -1.0 } else { 1.0 });
        let gp = GpModel::default();
        let predicted = gp
            .predict(&[1.0, 50.0, 0.01], t.view(), m.view(), Some(30.0))
            .unwrap();
        assert_eq!(predicted.len(), 60);
        assert_relative_eq!(predicted[30] - predicted[29], 2.0, epsilon = 0.05);
    }

    #[test]
    fn non_positive_parameter() {
        let (t, m) = series(10, 4);
        let gp = GpModel::default();
        assert_eq!(
            gp.ln_likelihood(&[1.0, 0.0, 1.0], t.view(), m.view(), None),
            Err(GpError::NonPositiveParameter { index: 1 })
        );
        assert_eq!(
            gp.ln_likelihood(&[1.0, 1.0], t.view(), m.view(), None),
            Err(GpError::WrongParameterCount {
                actual: 2,
                expected: 3
            })
        );
    }

    #[test]
    fn too_few_observations() {
        let gp = GpModel::default();
        let t = array![1.0];
        assert_eq!(
            gp.ln_likelihood(&PARAMS, t.view(), t.view(), None),
            Err(GpError::TooFewObservations {
                actual: 1,
                minimum: 2
            })
        );
    }

    #[test]
    fn initial_parameters_are_valid() {
        let (t, m) = series(100, 5);
        let initial: Hyperparameters<f64> =
            GpModel::default().initial_parameters(t.view(), m.view());
        assert!(initial.is_valid());
        assert_relative_eq!(initial.0[1], 16.0);
        assert_relative_eq!(initial.0[2], 0.5 * initial.0[0]);
    }

    #[test]
    fn hyperparameters_median() {
        let vectors = [
            Hyperparameters::new(vec![1.0, 10.0, 0.1]),
            Hyperparameters::new(vec![3.0, 20.0, 0.3]),
            Hyperparameters::new(vec![100.0, 15.0, 0.2]),
            Hyperparameters::new(vec![2.0, 1000.0, 0.4]),
        ];
        let median = Hyperparameters::median(&vectors).unwrap();
        assert_eq!(median.0, vec![2.5, 17.5, 0.25]);
        assert!(Hyperparameters::<f64>::median(&[]).is_none());
    }
}
