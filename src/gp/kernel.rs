use crate::float_trait::Float;

use enum_dispatch::enum_dispatch;
use macro_const::macro_const;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

macro_const! {
    const COVARIANCE_DOC: &'static str = r"Stationary covariance of the smooth stochastic flux component

All families are parameterized by the amplitude $\sigma_f$ and the length scale $\ell$ in cadence
units, the white-noise term is added by the GP model itself.
";
}

#[doc = COVARIANCE_DOC!()]
#[enum_dispatch]
pub trait CovarianceTrait: Send + Sync + Clone + Debug {
    /// Covariance at the absolute cadence lag `dt`
    fn covariance<T: Float>(&self, amplitude: T, length_scale: T, dt: T) -> T;
}

#[doc = COVARIANCE_DOC!()]
#[enum_dispatch(CovarianceTrait)]
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Covariance {
    Exponential(ExponentialCovariance),
    Matern32(Matern32Covariance),
    SquaredExponential(SquaredExponentialCovariance),
}

impl Covariance {
    pub fn exponential() -> Self {
        Self::Exponential(ExponentialCovariance)
    }

    pub fn matern32() -> Self {
        Self::Matern32(Matern32Covariance)
    }

    pub fn squared_exponential() -> Self {
        Self::SquaredExponential(SquaredExponentialCovariance)
    }
}

impl Default for Covariance {
    fn default() -> Self {
        Self::exponential()
    }
}

/// $k = \sigma_f^2 \exp(-|\Delta t| / \ell)$, Ornstein-Uhlenbeck process
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(rename = "Exponential")]
pub struct ExponentialCovariance;

impl CovarianceTrait for ExponentialCovariance {
    fn covariance<T: Float>(&self, amplitude: T, length_scale: T, dt: T) -> T {
        amplitude.powi(2) * T::exp(-dt.abs() / length_scale)
    }
}

/// $k = \sigma_f^2 (1 + \sqrt3 r) \exp(-\sqrt3 r)$, $r = |\Delta t| / \ell$
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(rename = "Matern32")]
pub struct Matern32Covariance;

impl CovarianceTrait for Matern32Covariance {
    fn covariance<T: Float>(&self, amplitude: T, length_scale: T, dt: T) -> T {
        let x = (T::one() + T::two()).sqrt() * dt.abs() / length_scale;
        amplitude.powi(2) * (T::one() + x) * T::exp(-x)
    }
}

/// $k = \sigma_f^2 \exp(-\Delta t^2 / 2\ell^2)$
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(rename = "SquaredExponential")]
pub struct SquaredExponentialCovariance;

impl CovarianceTrait for SquaredExponentialCovariance {
    fn covariance<T: Float>(&self, amplitude: T, length_scale: T, dt: T) -> T {
        amplitude.powi(2) * T::exp(-T::half() * (dt / length_scale).powi(2))
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn zero_lag_is_variance() {
        for covariance in [
            Covariance::exponential(),
            Covariance::matern32(),
            Covariance::squared_exponential(),
        ] {
            assert_relative_eq!(covariance.covariance(3.0_f64, 10.0, 0.0), 9.0);
        }
    }

    #[test]
    fn symmetric_and_decreasing() {
        for covariance in [
            Covariance::exponential(),
            Covariance::matern32(),
            Covariance::squared_exponential(),
        ] {
            let mut previous = f64::INFINITY;
            for i in 0..50 {
                let dt = 0.5 * i as f64;
                let k = covariance.covariance(1.0, 4.0, dt);
                assert_eq!(k, covariance.covariance(1.0, 4.0, -dt));
                assert!(k <= previous);
                previous = k;
            }
        }
    }

    #[test]
    fn exponential_value() {
        let k = Covariance::exponential().covariance(2.0_f32, 5.0, 5.0);
        assert_relative_eq!(k, 4.0 * f32::exp(-1.0), epsilon = 1e-6);
    }

    #[test]
    fn serialization() {
        let covariance = Covariance::matern32();
        let json = serde_json::to_string(&covariance).unwrap();
        let restored: Covariance = serde_json::from_str(&json).unwrap();
        assert_eq!(covariance, restored);
    }
}
