use crate::float_trait::Float;
use crate::minimize::{MinimizeResult, MinimizerTrait};

use cobyla::{Func, RhoBeg, StopTols, minimize};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Objective value COBYLA sees instead of non-finite ones, its linear models need finite values
const INVALID_OBJECTIVE: f64 = 1e30;

/// COBYLA (Constrained Optimization BY Linear Approximations) wrapper
///
/// COBYLA is a derivative-free algorithm building linear approximations of the objective. The
/// hyperparameter positivity is passed to it as a zero lower bound, and non-finite objective
/// values are replaced by a large constant. The initial change of every parameter is `rhobeg`
/// relative to its initial value.
///
/// M.J.D. Powell, 1994, "A direct search optimization method that models the objective and
/// constraint functions by linear interpolation"
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename = "Cobyla")]
pub struct CobylaMinimizer {
    pub niterations: u32,
    pub rhobeg: f64,
    pub ftol_rel: f64,
}

impl CobylaMinimizer {
    /// Create a new [CobylaMinimizer].
    ///
    /// # Arguments
    /// - `niterations`: maximum number of function evaluations
    /// - `rhobeg`: initial relative change of parameters
    /// - `ftol_rel`: relative tolerance on function value for convergence
    pub fn new(niterations: u32, rhobeg: f64, ftol_rel: f64) -> Self {
        assert!(niterations > 0, "niterations must be positive");
        assert!(rhobeg > 0.0, "rhobeg must be positive");
        assert!(rhobeg.is_finite(), "rhobeg must be finite");
        assert!(ftol_rel >= 0.0, "ftol_rel must be non-negative");
        assert!(ftol_rel.is_finite(), "ftol_rel must be finite");
        Self {
            niterations,
            rhobeg,
            ftol_rel,
        }
    }

    #[inline]
    pub fn default_niterations() -> u32 {
        1000
    }

    #[inline]
    pub fn default_rhobeg() -> f64 {
        0.5
    }

    #[inline]
    pub fn default_ftol_rel() -> f64 {
        1e-8
    }
}

impl Default for CobylaMinimizer {
    fn default() -> Self {
        Self::new(
            Self::default_niterations(),
            Self::default_rhobeg(),
            Self::default_ftol_rel(),
        )
    }
}

impl MinimizerTrait for CobylaMinimizer {
    fn minimize<T, F>(&self, objective: F, x0: &[T]) -> MinimizeResult<T>
    where
        T: Float,
        F: Fn(&[T]) -> T,
    {
        let evaluations = std::cell::Cell::new(0);
        let func = |x: &[f64], _user_data: &mut ()| -> f64 {
            evaluations.set(evaluations.get() + 1);
            let x: Vec<T> = x.iter().map(|&x| T::from_f64_lossy(x)).collect();
            let value = objective(&x).to_f64_lossy();
            if value.is_finite() {
                value
            } else {
                INVALID_OBJECTIVE
            }
        };

        let x0: Vec<f64> = x0.iter().map(|x| x.to_f64_lossy()).collect();
        let bounds = vec![(0.0, f64::INFINITY); x0.len()];
        // No additional constraints beyond bounds
        let constraints: Vec<&dyn Func<()>> = vec![];
        let rhobeg = x0
            .iter()
            .map(|&x| if x == 0.0 { self.rhobeg } else { self.rhobeg * x.abs() })
            .collect();
        let stop_tol = StopTols {
            ftol_rel: self.ftol_rel,
            ..StopTols::default()
        };

        let (x, value, success) = match minimize(
            func,
            &x0,
            &bounds,
            &constraints,
            (),
            self.niterations as usize,
            RhoBeg::Set(rhobeg),
            Some(stop_tol),
        ) {
            Ok((status, x, value)) => (
                x,
                value,
                matches!(
                    status,
                    cobyla::SuccessStatus::Success
                        | cobyla::SuccessStatus::FtolReached
                        | cobyla::SuccessStatus::XtolReached
                ),
            ),
            Err((_status, x, value)) => (x, value, false),
        };
        let value = if value >= INVALID_OBJECTIVE {
            T::infinity()
        } else {
            T::from_f64_lossy(value)
        };
        MinimizeResult {
            x: x.into_iter().map(T::from_f64_lossy).collect(),
            value,
            evaluations: evaluations.get(),
            success: success && value.is_finite(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_abs_diff_eq;

    #[test]
    fn quadratic() {
        let result = CobylaMinimizer::default().minimize(
            |x: &[f64]| (x[0] - 2.0).powi(2) + 10.0 * (x[1] - 3.0).powi(2),
            &[0.5, 1.0],
        );
        assert!(result.success);
        assert_abs_diff_eq!(&result.x[..], &[2.0, 3.0][..], epsilon = 1e-2);
    }

    #[test]
    fn positive_region() {
        let objective = |x: &[f64]| {
            if x.iter().any(|&x| x <= 0.0) {
                f64::INFINITY
            } else {
                (x[0].ln() - 0.5).powi(2) + (x[1] - 4.0).powi(2)
            }
        };
        let result = CobylaMinimizer::new(2000, 0.5, 1e-12).minimize(objective, &[1.0, 1.0]);
        assert!(result.x.iter().all(|&x| x > 0.0));
        assert_abs_diff_eq!(&result.x[..], &[f64::exp(0.5), 4.0][..], epsilon = 1e-2);
    }
}
