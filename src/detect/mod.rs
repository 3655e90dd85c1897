//! Robust outlier detection in the log-likelihood ratio profile
//!
//! The profile is detrended by a moving median and thresholded in units of the robust standard
//! deviation of the residual. Above-threshold samples are grown by binary dilation and grouped
//! into connected regions, every region gives a single candidate at its profile maximum.

mod median_filter;
pub use median_filter::median_filter;

mod morphology;
pub use morphology::{binary_dilation, label};

use crate::array_stats::{argmax, robust_std};
use crate::float_trait::Float;

use ndarray::{Array1, ArrayView1, s};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Thresholding settings of the likelihood-ratio profile
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct RobustDetector {
    threshold_multiplier: f64,
    median_filter_window: usize,
    dilation_iterations: usize,
}

impl RobustDetector {
    pub fn new(
        threshold_multiplier: f64,
        median_filter_window: usize,
        dilation_iterations: usize,
    ) -> Self {
        assert!(
            threshold_multiplier >= 0.0 && threshold_multiplier.is_finite(),
            "threshold_multiplier must be non-negative and finite"
        );
        assert_ne!(median_filter_window, 0, "median_filter_window must be positive");
        Self {
            threshold_multiplier,
            median_filter_window,
            dilation_iterations,
        }
    }

    #[inline]
    pub fn default_threshold_multiplier() -> f64 {
        15.0
    }

    #[inline]
    pub fn default_median_filter_window() -> usize {
        90
    }

    #[inline]
    pub fn default_dilation_iterations() -> usize {
        5
    }

    #[inline]
    pub fn threshold_multiplier(&self) -> f64 {
        self.threshold_multiplier
    }

    #[inline]
    pub fn median_filter_window(&self) -> usize {
        self.median_filter_window
    }

    #[inline]
    pub fn dilation_iterations(&self) -> usize {
        self.dilation_iterations
    }

    /// Candidate jumps of the profile, `cadence` and `profile` must have the same length
    pub fn detect<T>(&self, cadence: ArrayView1<T>, profile: ArrayView1<T>) -> Detection<T>
    where
        T: Float,
    {
        assert_eq!(
            cadence.len(),
            profile.len(),
            "cadence and profile must have the same length"
        );
        let trend = median_filter(profile, self.median_filter_window);
        let residual = &profile - &trend;

        let Some(sigma) = robust_std(residual.iter().copied()) else {
            tracing::debug!("likelihood ratio profile has no finite values");
            return Detection {
                candidates: vec![],
                sigma: T::nan(),
                residual,
            };
        };
        let threshold = T::from_f64_lossy(self.threshold_multiplier) * sigma;

        let mask: Vec<bool> = residual.iter().map(|&r| r > threshold).collect();
        let regions = label(&binary_dilation(&mask, self.dilation_iterations));
        let candidates = regions
            .into_iter()
            .filter_map(|region| {
                let index = region.start + argmax(profile.slice(s![region]))?;
                Some(Candidate {
                    index,
                    cadence: cadence[index],
                    ln_likelihood_ratio: profile[index],
                })
            })
            .filter(|candidate| candidate.cadence > T::zero())
            .collect();

        Detection {
            candidates,
            sigma,
            residual,
        }
    }
}

impl Default for RobustDetector {
    fn default() -> Self {
        Self::new(
            Self::default_threshold_multiplier(),
            Self::default_median_filter_window(),
            Self::default_dilation_iterations(),
        )
    }
}

/// Profile maximum of an above-threshold region
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate<T> {
    /// Index into the cleaned series
    pub index: usize,
    pub cadence: T,
    pub ln_likelihood_ratio: T,
}

/// Output of [RobustDetector::detect]
#[derive(Clone, Debug, PartialEq)]
pub struct Detection<T> {
    /// Candidates in increasing cadence order
    pub candidates: Vec<Candidate<T>>,
    /// Robust standard deviation of the residual, NaN if the profile has no finite values
    pub sigma: T,
    /// Profile minus its moving median
    pub residual: Array1<T>,
}

impl<T> Detection<T>
where
    T: Float,
{
    /// Number of residual samples above `threshold_multiplier` robust standard deviations
    pub fn count_above(&self, threshold_multiplier: f64) -> usize {
        let threshold = T::from_f64_lossy(threshold_multiplier) * self.sigma;
        self.residual.iter().filter(|&&r| r > threshold).count()
    }
}
