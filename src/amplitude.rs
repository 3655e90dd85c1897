use crate::data::ObservationSeries;
use crate::error::GpError;
use crate::float_trait::Float;
use crate::gp::GaussianProcess;

use itertools::Itertools;
use ndarray::s;
use std::cmp::Ordering;

/// Jump amplitude at observation `index` from the GP conditioned with a breakpoint there
///
/// The conditional mean is evaluated over up to `window / 2` observations on both sides of the
/// jump, the amplitude is the difference between the predictions at the jump and at the
/// preceding observation. Returns `None` if there is no preceding observation.
pub fn estimate_amplitude<T, G>(
    gp: &G,
    params: &[T],
    series: &ObservationSeries<T>,
    index: usize,
    window: usize,
) -> Result<Option<T>, GpError>
where
    T: Float,
    G: GaussianProcess<T> + ?Sized,
{
    let half = window / 2;
    let lower = index.saturating_sub(half);
    let upper = (index + half).min(series.len());
    let t = series.cadence().slice_move(s![lower..upper]);
    let m = series.flux().slice_move(s![lower..upper]);
    let jump_cadence = series.cadence()[index];

    let nearest = t.iter().position_min_by(|&&a, &&b| {
        (a - jump_cadence)
            .abs()
            .partial_cmp(&(b - jump_cadence).abs())
            .unwrap_or(Ordering::Equal)
    });
    let k = match nearest {
        Some(k) if k > 0 => k,
        _ => return Ok(None),
    };
    let predicted = gp.predict(params, t, m, Some(jump_cadence))?;
    Ok(Some(predicted[k] - predicted[k - 1]))
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::gp::GpModel;

    use approx::assert_relative_eq;
    use light_curve_jump_finder_test_util::{OuParameters, photometric_flux, step_series};

    fn series(amplitude: f64, seed: u64) -> ObservationSeries<f64> {
        let params = OuParameters {
            noise: 0.1,
            ..OuParameters::default()
        };
        let (t, m) = step_series(256, &params, seed, 100.5, amplitude);
        ObservationSeries::new(&t, &photometric_flux(&m, 1e-3), 128, &[]).unwrap()
    }

    #[test]
    fn recovers_step() {
        let gp = GpModel::default();
        let params = [1e-3, 50.0, 1e-4];
        for amplitude in [-10.0, 5.0, 20.0] {
            let series = series(amplitude, 0);
            let estimated = estimate_amplitude(&gp, &params, &series, 100, 128)
                .unwrap()
                .unwrap();
            let expected = 1e-3 * amplitude / series.flux_median();
            assert_relative_eq!(estimated, expected, max_relative = 0.25);
        }
    }

    #[test]
    fn window_is_clipped_at_end() {
        let gp = GpModel::default();
        let series = series(10.0, 1);
        let last = series.len() - 1;
        let estimated = estimate_amplitude(&gp, &[1e-3, 50.0, 1e-4], &series, last, 128).unwrap();
        assert!(estimated.is_some_and(|a| a.is_finite()));
    }

    #[test]
    fn no_preceding_observation() {
        let gp = GpModel::default();
        let series = series(10.0, 2);
        assert_eq!(
            estimate_amplitude(&gp, &[1e-3, 50.0, 1e-4], &series, 0, 128),
            Ok(None)
        );
    }

    #[test]
    fn invalid_parameters() {
        let gp = GpModel::default();
        let series = series(10.0, 3);
        assert_eq!(
            estimate_amplitude(&gp, &[1e-3, -50.0, 1e-4], &series, 50, 128),
            Err(GpError::NonPositiveParameter { index: 1 })
        );
    }
}
