use crate::float_trait::Float;
use crate::minimize::{MinimizeResult, MinimizerTrait};

use conv::prelude::*;
use itertools::Itertools;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Nelder-Mead downhill simplex
///
/// The initial simplex is built by stepping every coordinate of the initial guess by
/// `initial_step` relative to its absolute value. Iterations stop when the spread of objective
/// values over the simplex drops below `ftol_abs` and every vertex is within `xtol_rel`
/// (relative) from the best one. Infinite objective values are allowed, NaN is treated as
/// $+\infty$.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(rename = "NelderMead")]
pub struct NelderMead {
    pub niterations: u32,
    pub initial_step: f64,
    pub ftol_abs: f64,
    pub xtol_rel: f64,
}

const REFLECTION: f64 = 1.0;
const EXPANSION: f64 = 2.0;
const CONTRACTION: f64 = 0.5;
const SHRINKAGE: f64 = 0.5;

impl NelderMead {
    /// Create a new [NelderMead].
    ///
    /// # Arguments
    /// - `niterations`: maximum number of simplex iterations
    /// - `initial_step`: relative size of the initial simplex
    /// - `ftol_abs`: absolute tolerance on the objective spread over the simplex
    /// - `xtol_rel`: relative tolerance on the simplex size
    pub fn new(niterations: u32, initial_step: f64, ftol_abs: f64, xtol_rel: f64) -> Self {
        assert!(niterations > 0, "niterations must be positive");
        assert!(
            initial_step > 0.0 && initial_step.is_finite(),
            "initial_step must be positive and finite"
        );
        assert!(
            ftol_abs >= 0.0 && ftol_abs.is_finite(),
            "ftol_abs must be non-negative and finite"
        );
        assert!(
            xtol_rel >= 0.0 && xtol_rel.is_finite(),
            "xtol_rel must be non-negative and finite"
        );
        Self {
            niterations,
            initial_step,
            ftol_abs,
            xtol_rel,
        }
    }

    #[inline]
    pub fn default_niterations() -> u32 {
        1000
    }

    #[inline]
    pub fn default_initial_step() -> f64 {
        0.5
    }

    #[inline]
    pub fn default_ftol_abs() -> f64 {
        1e-4
    }

    #[inline]
    pub fn default_xtol_rel() -> f64 {
        1e-4
    }
}

impl Default for NelderMead {
    fn default() -> Self {
        Self::new(
            Self::default_niterations(),
            Self::default_initial_step(),
            Self::default_ftol_abs(),
            Self::default_xtol_rel(),
        )
    }
}

/// `a + coeff * (b - a)`
fn towards<T: Float>(a: &[T], b: &[T], coeff: T) -> Vec<T> {
    a.iter().zip(b).map(|(&a, &b)| a + coeff * (b - a)).collect()
}

impl MinimizerTrait for NelderMead {
    fn minimize<T, F>(&self, objective: F, x0: &[T]) -> MinimizeResult<T>
    where
        T: Float,
        F: Fn(&[T]) -> T,
    {
        let mut evaluations = 0;
        let mut f = |x: &[T]| {
            evaluations += 1;
            let value = objective(x);
            if value.is_nan() { T::infinity() } else { value }
        };

        let n = x0.len();
        if n == 0 {
            let value = f(x0);
            return MinimizeResult {
                x: vec![],
                value,
                evaluations,
                success: value.is_finite(),
            };
        }

        let step = T::from_f64_lossy(self.initial_step);
        let mut simplex: Vec<Vec<T>> = Vec::with_capacity(n + 1);
        simplex.push(x0.to_vec());
        for i in 0..n {
            let mut vertex = x0.to_vec();
            vertex[i] += if x0[i].is_zero() {
                step
            } else {
                step * x0[i].abs()
            };
            simplex.push(vertex);
        }
        let mut values: Vec<T> = simplex.iter().map(|v| f(v)).collect();

        let (alpha, gamma, rho, sigma) = (
            T::from_f64_lossy(REFLECTION),
            T::from_f64_lossy(EXPANSION),
            T::from_f64_lossy(CONTRACTION),
            T::from_f64_lossy(SHRINKAGE),
        );
        let nf: T = n.approx_as::<T>().unwrap();
        let ftol = T::from_f64_lossy(self.ftol_abs);
        let xtol = T::from_f64_lossy(self.xtol_rel);

        let mut converged = false;
        for _ in 0..self.niterations {
            let order = (0..=n)
                .sorted_by(|&a, &b| {
                    values[a]
                        .partial_cmp(&values[b])
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .collect_vec();
            let (best, second_worst, worst) = (order[0], order[n - 1], order[n]);
            if values[best].is_infinite() {
                break;
            }

            let f_spread = values[worst] - values[best];
            let x_spread = simplex
                .iter()
                .flat_map(|v| {
                    v.iter()
                        .zip(&simplex[best])
                        .map(|(&x, &b)| (x - b).abs() / b.abs().max(T::min_positive_value()))
                })
                .fold(T::zero(), T::max);
            if f_spread <= ftol && x_spread <= xtol {
                converged = true;
                break;
            }

            let centroid: Vec<T> = (0..n)
                .map(|j| {
                    simplex
                        .iter()
                        .enumerate()
                        .filter(|&(i, _)| i != worst)
                        .map(|(_, v)| v[j])
                        .sum::<T>()
                        / nf
                })
                .collect();

            let reflected = towards(&centroid, &simplex[worst], -alpha);
            let reflected_value = f(&reflected);

            if reflected_value < values[best] {
                let expanded = towards(&centroid, &reflected, gamma);
                let expanded_value = f(&expanded);
                if expanded_value < reflected_value {
                    simplex[worst] = expanded;
                    values[worst] = expanded_value;
                } else {
                    simplex[worst] = reflected;
                    values[worst] = reflected_value;
                }
                continue;
            }
            if reflected_value < values[second_worst] {
                simplex[worst] = reflected;
                values[worst] = reflected_value;
                continue;
            }

            let (contracted, threshold) = if reflected_value < values[worst] {
                (towards(&centroid, &reflected, rho), reflected_value)
            } else {
                (towards(&centroid, &simplex[worst], rho), values[worst])
            };
            let contracted_value = f(&contracted);
            if contracted_value < threshold {
                simplex[worst] = contracted;
                values[worst] = contracted_value;
                continue;
            }

            let best_vertex = simplex[best].clone();
            for i in (0..=n).filter(|&i| i != best) {
                simplex[i] = towards(&best_vertex, &simplex[i], sigma);
                values[i] = f(&simplex[i]);
            }
        }

        let best = (0..=n)
            .min_by(|&a, &b| {
                values[a]
                    .partial_cmp(&values[b])
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .unwrap_or(0);
        let value = values[best];
        MinimizeResult {
            x: simplex.swap_remove(best),
            value,
            evaluations,
            success: converged && value.is_finite(),
        }
    }
}
