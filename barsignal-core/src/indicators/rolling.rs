//! Trailing-window statistics shared by the band and range indicators.

/// Mean of each trailing window of `period` values, written at the window's
/// last index. Windows that contain a NaN stay NaN.
pub fn rolling_mean(values: &[f64], period: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }

    // running sum over the finite values plus a count of NaNs in the window
    let mut sum = 0.0;
    let mut gaps = 0usize;
    for i in 0..values.len() {
        let entering = values[i];
        if entering.is_nan() {
            gaps += 1;
        } else {
            sum += entering;
        }

        if let Some(&leaving) = i.checked_sub(period).and_then(|j| values.get(j)) {
            if leaving.is_nan() {
                gaps -= 1;
            } else {
                sum -= leaving;
            }
        }

        if i + 1 >= period && gaps == 0 {
            out[i] = sum / period as f64;
        }
    }

    out
}

/// Rolling standard deviation over `period` values with `ddof` delta degrees
/// of freedom (0 = population, 1 = sample).
///
/// Each window is recomputed from its own mean, so the result carries no
/// drift from a running sum of squares.
pub fn rolling_std(values: &[f64], period: usize, ddof: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; values.len()];
    if period == 0 || period <= ddof || values.len() < period {
        return out;
    }

    for (slot, window) in out[period - 1..].iter_mut().zip(values.windows(period)) {
        if window.iter().any(|v| v.is_nan()) {
            continue;
        }
        let mean = window.iter().sum::<f64>() / period as f64;
        let squares: f64 = window.iter().map(|v| (v - mean).powi(2)).sum();
        *slot = (squares / (period - ddof) as f64).sqrt();
    }

    out
}
