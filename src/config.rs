use crate::detect::RobustDetector;
use crate::error::InputError;
use crate::gp::Covariance;
use crate::hyperparameters::MAX_FIT_CHUNKS;
use crate::minimize::MinimizerAlgorithm;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Settings of [crate::JumpFinder]
///
/// Missing fields take their default values on deserialization.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct JumpFinderConfig {
    /// Covariance family of the GP noise model
    pub kernel: Covariance,
    /// Number of observations per chunk, chunks are fitted and scanned independently
    pub chunk_size: usize,
    /// Number of leading chunks used to fit hyperparameters, at most [MAX_FIT_CHUNKS]
    pub max_fit_chunks: usize,
    pub minimizer: MinimizerAlgorithm,
    /// Detection threshold in robust standard deviations of the detrended profile
    pub threshold_multiplier: f64,
    pub median_filter_window: usize,
    pub dilation_iterations: usize,
    /// Closed cadence intervals removed from the series before the analysis
    pub excluded_cadences: Vec<(f64, f64)>,
}

impl JumpFinderConfig {
    #[inline]
    pub fn default_chunk_size() -> usize {
        128
    }

    #[inline]
    pub fn default_max_fit_chunks() -> usize {
        15
    }

    pub fn validate(&self) -> Result<(), InputError> {
        if self.chunk_size < 2 {
            return Err(InputError::InvalidConfig("chunk_size must be at least 2"));
        }
        if !(1..=MAX_FIT_CHUNKS).contains(&self.max_fit_chunks) {
            return Err(InputError::InvalidConfig(
                "max_fit_chunks must be between 1 and 50",
            ));
        }
        validate_threshold(self.threshold_multiplier)?;
        if self.median_filter_window == 0 {
            return Err(InputError::InvalidConfig(
                "median_filter_window must be positive",
            ));
        }
        if self
            .excluded_cadences
            .iter()
            .any(|&(lower, upper)| lower.is_nan() || upper.is_nan() || lower > upper)
        {
            return Err(InputError::InvalidConfig(
                "excluded_cadences must be ordered (lower, upper) pairs",
            ));
        }
        Ok(())
    }

    /// Profile detector with the configured settings and a custom threshold
    pub fn detector(&self, threshold_multiplier: f64) -> RobustDetector {
        RobustDetector::new(
            threshold_multiplier,
            self.median_filter_window,
            self.dilation_iterations,
        )
    }
}

pub(crate) fn validate_threshold(threshold_multiplier: f64) -> Result<(), InputError> {
    if threshold_multiplier >= 0.0 && threshold_multiplier.is_finite() {
        Ok(())
    } else {
        Err(InputError::InvalidConfig(
            "threshold_multiplier must be non-negative and finite",
        ))
    }
}

impl Default for JumpFinderConfig {
    fn default() -> Self {
        Self {
            kernel: Covariance::default(),
            chunk_size: Self::default_chunk_size(),
            max_fit_chunks: Self::default_max_fit_chunks(),
            minimizer: MinimizerAlgorithm::default(),
            threshold_multiplier: RobustDetector::default_threshold_multiplier(),
            median_filter_window: RobustDetector::default_median_filter_window(),
            dilation_iterations: RobustDetector::default_dilation_iterations(),
            excluded_cadences: vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::minimize::CobylaMinimizer;

    #[test]
    fn default_is_valid() {
        assert_eq!(JumpFinderConfig::default().validate(), Ok(()));
    }

    #[test]
    fn invalid() {
        let configs = [
            JumpFinderConfig {
                chunk_size: 1,
                ..Default::default()
            },
            JumpFinderConfig {
                max_fit_chunks: 0,
                ..Default::default()
            },
            JumpFinderConfig {
                max_fit_chunks: 51,
                ..Default::default()
            },
            JumpFinderConfig {
                threshold_multiplier: -1.0,
                ..Default::default()
            },
            JumpFinderConfig {
                threshold_multiplier: f64::NAN,
                ..Default::default()
            },
            JumpFinderConfig {
                median_filter_window: 0,
                ..Default::default()
            },
            JumpFinderConfig {
                excluded_cadences: vec![(10.0, 5.0)],
                ..Default::default()
            },
        ];
        for config in configs {
            assert!(
                matches!(config.validate(), Err(InputError::InvalidConfig(_))),
                "{config:?}"
            );
        }
    }

    #[test]
    fn serialization() {
        let config = JumpFinderConfig {
            kernel: Covariance::matern32(),
            chunk_size: 64,
            minimizer: CobylaMinimizer::default().into(),
            excluded_cadences: vec![(100.0, 120.5)],
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: JumpFinderConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn missing_fields_are_default() {
        let config: JumpFinderConfig = serde_json::from_str(r#"{"chunk_size": 64}"#).unwrap();
        assert_eq!(
            config,
            JumpFinderConfig {
                chunk_size: 64,
                ..Default::default()
            }
        );
    }

    #[test]
    fn json_schema() {
        let schema = schemars::schema_for!(JumpFinderConfig);
        let json = serde_json::to_value(&schema).unwrap();
        assert!(json["properties"]["threshold_multiplier"].is_object());
    }
}
