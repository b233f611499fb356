use super::AnalysisError;

/// Weekly seasonality assumed for daily observations.
pub const DEFAULT_PERIOD: usize = 7;

/// Additive decomposition `observed = trend + seasonal + resid`.
#[derive(Debug, Clone)]
pub struct Decomposition {
    pub observed: Vec<f64>,
    pub trend: Vec<f64>,
    pub seasonal: Vec<f64>,
    pub resid: Vec<f64>,
    pub period: usize,
}

/// Classical moving-average decomposition.
///
/// The trend is a centred moving average (2x`period` for even periods), so
/// its first and last `period / 2` values are `NaN`, and so are the
/// matching residuals. The seasonal component is the per-phase mean of
/// the detrended series, shifted to sum to zero over one period.
pub fn seasonal_decompose(values: &[f64], period: usize) -> Result<Decomposition, AnalysisError> {
    if period < 2 {
        return Err(AnalysisError::InvalidParameter(format!(
            "period must be at least 2, got {}",
            period
        )));
    }
    let n = values.len();
    if n < 2 * period {
        return Err(AnalysisError::InsufficientData {
            required: 2 * period,
            actual: n,
        });
    }

    let trend = centered_moving_average(values, &trend_filter(period));
    let detrended: Vec<f64> = values.iter().zip(&trend).map(|(x, t)| x - t).collect();

    let mut period_averages: Vec<f64> = (0..period)
        .map(|phase| nan_mean(detrended.iter().skip(phase).step_by(period).copied()))
        .collect();
    let offset = nan_mean(period_averages.iter().copied());
    for avg in period_averages.iter_mut() {
        *avg -= offset;
    }

    let seasonal: Vec<f64> = (0..n).map(|t| period_averages[t % period]).collect();
    let resid: Vec<f64> = detrended
        .iter()
        .zip(&seasonal)
        .map(|(d, s)| d - s)
        .collect();

    Ok(Decomposition {
        observed: values.to_vec(),
        trend,
        seasonal,
        resid,
        period,
    })
}

fn trend_filter(period: usize) -> Vec<f64> {
    let p = period as f64;
    if period % 2 == 0 {
        let mut filt = vec![1.0 / p; period + 1];
        filt[0] = 0.5 / p;
        filt[period] = 0.5 / p;
        filt
    } else {
        vec![1.0 / p; period]
    }
}

/// Two-sided convolution with an odd-length filter; edges without a full
/// window are `NaN`.
fn centered_moving_average(values: &[f64], filt: &[f64]) -> Vec<f64> {
    let half = filt.len() / 2;
    let n = values.len();
    (0..n)
        .map(|t| {
            if t < half || t + half >= n {
                return f64::NAN;
            }
            filt.iter()
                .enumerate()
                .map(|(k, w)| w * values[t + k - half])
                .sum()
        })
        .collect()
}

fn nan_mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 { f64::NAN } else { sum / count as f64 }
}
