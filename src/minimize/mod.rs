//! Derivative-free minimization of hyperparameter objectives
//!
//! Objectives are not bounded explicitly: a minimizer must cope with $+\infty$ returned outside
//! of the valid region.

pub mod cobyla;
pub use cobyla::CobylaMinimizer;

pub mod nelder_mead;
pub use nelder_mead::NelderMead;

use crate::float_trait::Float;

use enum_dispatch::enum_dispatch;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Best point found by a minimizer
#[derive(Clone, Debug, PartialEq)]
pub struct MinimizeResult<T> {
    pub x: Vec<T>,
    pub value: T,
    /// Number of objective evaluations
    pub evaluations: usize,
    pub success: bool,
}

#[enum_dispatch]
pub trait MinimizerTrait: Clone + Debug {
    fn minimize<T, F>(&self, objective: F, x0: &[T]) -> MinimizeResult<T>
    where
        T: Float,
        F: Fn(&[T]) -> T;
}

/// Minimization algorithm used to fit GP hyperparameters
#[enum_dispatch(MinimizerTrait)]
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[non_exhaustive]
pub enum MinimizerAlgorithm {
    NelderMead(NelderMead),
    Cobyla(CobylaMinimizer),
}

impl Default for MinimizerAlgorithm {
    fn default() -> Self {
        NelderMead::default().into()
    }
}
