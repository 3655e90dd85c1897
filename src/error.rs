/// Error returned from [crate::JumpFinder]
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum JumpFinderError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InputError),

    #[error("hyperparameter optimization failed for all {attempted} attempted chunks")]
    FitFailure { attempted: usize },

    #[error("none of {chunks} chunks has at least {minimum} observations to scan")]
    DegenerateChunk { chunks: usize, minimum: usize },

    #[error("amplitude estimation failed for the jump at cadence {cadence}: {source}")]
    AmplitudeFailure { cadence: f64, source: GpError },

    #[error("GP prediction failed for chunk #{chunk}: {source}")]
    SmoothingFailure { chunk: usize, source: GpError },
}

/// Malformed series or configuration
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum InputError {
    #[error("cadence length {cadence} differs from flux length {flux}")]
    LengthMismatch { cadence: usize, flux: usize },

    #[error("no finite observations left after filtering")]
    EmptySeries,

    #[error("flux median is zero or undefined, series cannot be normalized")]
    UndefinedMedian,

    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),

    #[error("expected {expected} positive finite hyperparameters, got {actual:?}")]
    InvalidHyperparameters { expected: usize, actual: Vec<f64> },

    #[error("log-likelihood ratio profile has length {actual}, series has length {expected}")]
    ProfileLength { actual: usize, expected: usize },
}

/// Error returned from [crate::GaussianProcess] methods
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GpError {
    #[error("{actual} observations is less than the minimum {minimum} required by the GP model")]
    TooFewObservations { actual: usize, minimum: usize },

    #[error("GP model expects {expected} hyperparameters, {actual} given")]
    WrongParameterCount { actual: usize, expected: usize },

    #[error("hyperparameter #{index} must be positive and finite")]
    NonPositiveParameter { index: usize },

    #[error("covariance matrix is not positive definite (row {row})")]
    NotPositiveDefinite { row: usize },

    #[error("observation arrays have different lengths: {t} and {m}")]
    ShapeMismatch { t: usize, m: usize },
}
