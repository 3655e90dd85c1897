#![doc = include_str!("../README.md")]


mod amplitude;
pub use amplitude::estimate_amplitude;

mod array_stats;
pub use array_stats::MAD_SCALE;

mod config;
pub use config::JumpFinderConfig;

mod data;
pub use data::{ObservationSeries, chunk_ranges};

pub mod detect;
pub use detect::{Candidate, Detection, RobustDetector};

mod error;
pub use error::{GpError, InputError, JumpFinderError};

mod float_trait;
pub use float_trait::Float;

pub mod gp;
pub use gp::{Covariance, CovarianceTrait, GaussianProcess, GpModel, Hyperparameters};

mod hyperparameters;
pub use hyperparameters::{
    ChunkFitError, MAX_FIT_CHUNKS, fit_chunk, fit_hyperparameters, negative_ln_likelihood,
};

mod jump_finder;
pub use jump_finder::{FindJumpsOptions, Jump, JumpFinder, JumpSearch};

pub mod minimize;
pub use minimize::{
    CobylaMinimizer, MinimizeResult, MinimizerAlgorithm, MinimizerTrait, NelderMead,
};

mod scan;
pub use scan::{chunk_ln_likelihood_ratio, ln_likelihood_ratio};

pub use ndarray;
