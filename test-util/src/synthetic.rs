use lazy_static::lazy_static;
use rand::prelude::*;
use rand_distr::StandardNormal;

/// Exponential-covariance GP (Ornstein-Uhlenbeck process) plus white noise
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OuParameters {
    pub amplitude: f64,
    pub length_scale: f64,
    pub noise: f64,
}

impl Default for OuParameters {
    fn default() -> Self {
        Self {
            amplitude: 1.0,
            length_scale: 50.0,
            noise: 1.0,
        }
    }
}

/// Exact sample of the OU prior at unit-spaced cadences `1.0, 2.0, ..., n`
pub fn ou_series(n: usize, params: &OuParameters, seed: u64) -> (Vec<f64>, Vec<f64>) {
    let mut rng = StdRng::seed_from_u64(seed);
    let t: Vec<f64> = (1..=n).map(|i| i as f64).collect();
    let mut latent = params.amplitude * rng.sample::<f64, _>(StandardNormal);
    let mut previous_t = t.first().copied().unwrap_or_default();
    let m = t
        .iter()
        .map(|&t| {
            let rho = f64::exp(-(t - previous_t) / params.length_scale);
            let innovation: f64 = rng.sample(StandardNormal);
            latent = rho * latent + f64::sqrt(1.0 - rho * rho) * params.amplitude * innovation;
            previous_t = t;
            let noise: f64 = rng.sample(StandardNormal);
            latent + params.noise * noise
        })
        .collect();
    (t, m)
}

/// OU sample with a step: `-amplitude / 2` before `jump_cadence` and `+amplitude / 2` after
pub fn step_series(
    n: usize,
    params: &OuParameters,
    seed: u64,
    jump_cadence: f64,
    amplitude: f64,
) -> (Vec<f64>, Vec<f64>) {
    let (t, m) = ou_series(n, params, seed);
    let m = t
        .iter()
        .zip(m)
        .map(|(&t, m)| {
            if t < jump_cadence {
                m - 0.5 * amplitude
            } else {
                m + 0.5 * amplitude
            }
        })
        .collect();
    (t, m)
}

/// Turns a zero-mean relative variation into a positive photometric flux `1 + scale * m`
pub fn photometric_flux(m: &[f64], scale: f64) -> Vec<f64> {
    m.iter().map(|&m| 1.0 + scale * m).collect()
}

/// Synthetic photometric series with an optional step-like jump
#[derive(Clone, Debug)]
pub struct JumpFixture {
    pub params: OuParameters,
    /// Relative flux units per unit of [OuParameters]
    pub scale: f64,
    pub cadence: Vec<f64>,
    pub flux: Vec<f64>,
    /// First cadence after the jump and its relative amplitude
    pub jump: Option<(f64, f64)>,
}

impl JumpFixture {
    /// Hyperparameters generating the series in normalized flux units
    pub fn true_hyperparameters(&self) -> [f64; 3] {
        [
            self.scale * self.params.amplitude,
            self.params.length_scale,
            self.scale * self.params.noise,
        ]
    }
}

lazy_static! {
    pub static ref SMOOTH_SERIES: JumpFixture = {
        let params = OuParameters::default();
        let scale = 1e-3;
        let (cadence, m) = ou_series(1024, &params, 0);
        JumpFixture {
            params,
            scale,
            cadence,
            flux: photometric_flux(&m, scale),
            jump: None,
        }
    };
    pub static ref SINGLE_JUMP_SERIES: JumpFixture = {
        let params = OuParameters::default();
        let scale = 1e-3;
        let amplitude = 12.0;
        let (cadence, m) = step_series(1024, &params, 0, 519.5, amplitude);
        JumpFixture {
            params,
            scale,
            cadence,
            flux: photometric_flux(&m, scale),
            jump: Some((520.0, scale * amplitude)),
        }
    };
}
