use crate::amplitude::estimate_amplitude;
use crate::config::{JumpFinderConfig, validate_threshold};
use crate::data::ObservationSeries;
use crate::detect::{Candidate, Detection};
use crate::error::{InputError, JumpFinderError};
use crate::float_trait::Float;
use crate::gp::{GaussianProcess, GpModel, Hyperparameters};
use crate::hyperparameters::{MAX_FIT_CHUNKS, fit_hyperparameters};
use crate::scan::ln_likelihood_ratio;

use ndarray::{Array1, ArrayView1};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Detected discontinuity
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Jump<T> {
    /// First cadence after the discontinuity
    pub cadence: T,
    /// Flux change in the units of the input flux
    pub amplitude: T,
    /// Flux change relative to the flux median, the amplitude in normalized flux units
    pub relative_amplitude: T,
}

/// Optional inputs of [JumpFinder::find_jumps_with]
///
/// `None` fields are computed: hyperparameters are fitted, the profile is scanned and the
/// threshold is taken from the [JumpFinderConfig].
#[derive(Clone, Debug, PartialEq)]
pub struct FindJumpsOptions<T> {
    pub threshold_multiplier: Option<f64>,
    pub hyperparameters: Option<Hyperparameters<T>>,
    /// Log-likelihood ratio profile, requires `hyperparameters` it was computed with
    pub profile: Option<Array1<T>>,
}

impl<T> Default for FindJumpsOptions<T> {
    fn default() -> Self {
        Self {
            threshold_multiplier: None,
            hyperparameters: None,
            profile: None,
        }
    }
}

/// Output of the full detection pipeline
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JumpSearch<T> {
    /// Consensus hyperparameters the profile was computed with
    pub hyperparameters: Hyperparameters<T>,
    /// Log-likelihood ratio profile aligned with [ObservationSeries::cadence]
    pub profile: Array1<T>,
    /// Robust standard deviation of the detrended profile
    pub sigma: T,
    /// Jumps in increasing cadence order
    pub jumps: Vec<Jump<T>>,
}

impl<T> JumpSearch<T>
where
    T: Float,
{
    /// Options re-using hyperparameters and profile of this search with a new threshold
    pub fn rethreshold(&self, threshold_multiplier: f64) -> FindJumpsOptions<T> {
        FindJumpsOptions {
            threshold_multiplier: Some(threshold_multiplier),
            hyperparameters: Some(self.hyperparameters.clone()),
            profile: Some(self.profile.clone()),
        }
    }
}

/// Jump detector for a single photometric series
///
/// The series is cleaned, normalized and chunked on construction. The pipeline is
/// - [JumpFinder::learn_hyperparameters]: GP hyperparameters fitted chunk by chunk and combined
///   by the componentwise median,
/// - [JumpFinder::ln_likelihood_ratio]: evidence of a breakpoint at every cadence,
/// - [JumpFinder::detect]: robust thresholding of the profile,
/// - [JumpFinder::estimate_amplitudes]: flux change at every detected cadence.
///
/// [JumpFinder::find_jumps] runs all of them.
#[derive(Clone, Debug)]
pub struct JumpFinder<T> {
    config: JumpFinderConfig,
    series: ObservationSeries<T>,
    gp: GpModel,
}

impl<T> JumpFinder<T>
where
    T: Float,
{
    pub fn new<'a>(
        cadence: impl Into<ArrayView1<'a, T>>,
        flux: impl Into<ArrayView1<'a, T>>,
        config: JumpFinderConfig,
    ) -> Result<Self, JumpFinderError> {
        config.validate()?;
        let series = ObservationSeries::new(
            cadence,
            flux,
            config.chunk_size,
            &config.excluded_cadences,
        )?;
        tracing::debug!(
            observations = series.len(),
            chunks = series.chunks().len(),
            "series prepared"
        );
        Ok(Self {
            gp: GpModel::new(config.kernel),
            config,
            series,
        })
    }

    #[inline]
    pub fn config(&self) -> &JumpFinderConfig {
        &self.config
    }

    #[inline]
    pub fn series(&self) -> &ObservationSeries<T> {
        &self.series
    }

    #[inline]
    pub fn gp(&self) -> &GpModel {
        &self.gp
    }

    fn check_hyperparameters(
        &self,
        hyperparameters: &Hyperparameters<T>,
    ) -> Result<(), InputError> {
        let expected = GaussianProcess::<T>::nparams(&self.gp);
        if hyperparameters.len() == expected && hyperparameters.is_valid() {
            Ok(())
        } else {
            Err(InputError::InvalidHyperparameters {
                expected,
                actual: hyperparameters.0.iter().map(|x| x.to_f64_lossy()).collect(),
            })
        }
    }

    /// Consensus hyperparameters over the configured number of leading chunks
    pub fn learn_hyperparameters(&self) -> Result<Hyperparameters<T>, JumpFinderError> {
        self.learn_hyperparameters_on(self.config.max_fit_chunks)
    }

    /// Consensus hyperparameters over up to `max_chunks` leading chunks
    pub fn learn_hyperparameters_on(
        &self,
        max_chunks: usize,
    ) -> Result<Hyperparameters<T>, JumpFinderError> {
        if !(1..=MAX_FIT_CHUNKS).contains(&max_chunks) {
            return Err(
                InputError::InvalidConfig("max_fit_chunks must be between 1 and 50").into(),
            );
        }
        fit_hyperparameters(&self.gp, &self.config.minimizer, &self.series, max_chunks)
    }

    pub fn ln_likelihood_ratio(
        &self,
        hyperparameters: &Hyperparameters<T>,
    ) -> Result<Array1<T>, JumpFinderError> {
        self.check_hyperparameters(hyperparameters)?;
        ln_likelihood_ratio(&self.gp, hyperparameters.as_slice(), &self.series)
    }

    /// Candidate jumps of a log-likelihood ratio profile
    pub fn detect(
        &self,
        profile: ArrayView1<T>,
        threshold_multiplier: f64,
    ) -> Result<Detection<T>, JumpFinderError> {
        validate_threshold(threshold_multiplier)?;
        if profile.len() != self.series.len() {
            return Err(InputError::ProfileLength {
                actual: profile.len(),
                expected: self.series.len(),
            }
            .into());
        }
        Ok(self
            .config
            .detector(threshold_multiplier)
            .detect(self.series.cadence(), profile))
    }

    /// Jumps of the candidates, those at the first observation of the series have no amplitude
    /// and are dropped
    pub fn estimate_amplitudes(
        &self,
        hyperparameters: &Hyperparameters<T>,
        candidates: &[Candidate<T>],
    ) -> Result<Vec<Jump<T>>, JumpFinderError> {
        self.check_hyperparameters(hyperparameters)?;
        let jumps: Vec<_> = candidates
            .par_iter()
            .map(|candidate| {
                estimate_amplitude(
                    &self.gp,
                    hyperparameters.as_slice(),
                    &self.series,
                    candidate.index,
                    self.config.chunk_size,
                )
                .map(|relative_amplitude| {
                    relative_amplitude.map(|relative_amplitude| Jump {
                        cadence: candidate.cadence,
                        amplitude: relative_amplitude * self.series.flux_median(),
                        relative_amplitude,
                    })
                })
                .map_err(|source| JumpFinderError::AmplitudeFailure {
                    cadence: candidate.cadence.to_f64_lossy(),
                    source,
                })
            })
            .collect::<Result<_, _>>()?;
        Ok(jumps
            .into_iter()
            .zip(candidates)
            .filter_map(|(jump, candidate)| {
                if jump.is_none() {
                    tracing::debug!(
                        cadence = candidate.cadence.to_f64_lossy(),
                        "no observation before the candidate, dropping it"
                    );
                }
                jump
            })
            .collect())
    }

    /// Full pipeline with the configured settings
    pub fn find_jumps(&self) -> Result<JumpSearch<T>, JumpFinderError> {
        self.find_jumps_with(FindJumpsOptions::default())
    }

    pub fn find_jumps_with(
        &self,
        options: FindJumpsOptions<T>,
    ) -> Result<JumpSearch<T>, JumpFinderError> {
        let FindJumpsOptions {
            threshold_multiplier,
            hyperparameters,
            profile,
        } = options;
        let threshold_multiplier =
            threshold_multiplier.unwrap_or(self.config.threshold_multiplier);
        validate_threshold(threshold_multiplier)?;

        let hyperparameters = match hyperparameters {
            Some(hyperparameters) => {
                self.check_hyperparameters(&hyperparameters)?;
                hyperparameters
            }
            None => self.learn_hyperparameters()?,
        };
        let profile = match profile {
            Some(profile) => profile,
            None => self.ln_likelihood_ratio(&hyperparameters)?,
        };
        let detection = self.detect(profile.view(), threshold_multiplier)?;
        let jumps = self.estimate_amplitudes(&hyperparameters, &detection.candidates)?;
        tracing::info!(
            jumps = jumps.len(),
            threshold_multiplier,
            sigma = detection.sigma.to_f64_lossy(),
            "jump search finished"
        );

        Ok(JumpSearch {
            hyperparameters,
            profile,
            sigma: detection.sigma,
            jumps,
        })
    }

    /// GP conditional mean of the normalized flux over the chunk, no breakpoint is assumed
    pub fn smooth_chunk(
        &self,
        chunk: usize,
        hyperparameters: &Hyperparameters<T>,
    ) -> Result<Array1<T>, JumpFinderError> {
        self.check_hyperparameters(hyperparameters)?;
        let range = self
            .series
            .chunks()
            .get(chunk)
            .ok_or(InputError::InvalidConfig("chunk index is out of range"))?;
        let (t, m) = self.series.chunk(range);
        self.gp
            .predict(hyperparameters.as_slice(), t, m, None)
            .map_err(|source| JumpFinderError::SmoothingFailure { chunk, source })
    }
}
