//! Descriptive statistics over `f64` samples
//!
//! Percentiles use linear interpolation between closest ranks, so a value at
//! percentile `p` of `n` sorted samples sits at fractional index `p/100 * (n-1)`.

/// Arithmetic mean; 0 for an empty slice
#[must_use]
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divides by n)
#[must_use]
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Sample standard deviation (divides by n - 1)
#[must_use]
pub fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    sample_covariance(values, values).sqrt()
}

/// Sample covariance of two equally long series (divides by n - 1)
#[must_use]
pub fn sample_covariance(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n < 2 {
        return 0.0;
    }
    let mean_a = mean(&a[..n]);
    let mean_b = mean(&b[..n]);
    a[..n]
        .iter()
        .zip(&b[..n])
        .map(|(x, y)| (x - mean_a) * (y - mean_b))
        .sum::<f64>()
        / (n - 1) as f64
}

/// Sorted copy of the samples (NaN-safe total ordering)
#[must_use]
pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut out = values.to_vec();
    out.sort_by(f64::total_cmp);
    out
}

/// Percentile `p` in `[0, 100]` of already-sorted samples
#[must_use]
pub fn percentile_of_sorted(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let rank = (p.clamp(0.0, 100.0) / 100.0) * (n - 1) as f64;
            let lower = rank.floor() as usize;
            let upper = rank.ceil() as usize;
            let frac = rank - lower as f64;
            sorted[lower] + (sorted[upper] - sorted[lower]) * frac
        }
    }
}

/// Median of already-sorted samples
#[must_use]
pub fn median_of_sorted(sorted: &[f64]) -> f64 {
    percentile_of_sorted(sorted, 50.0)
}

/// Share of samples satisfying `pred`, in percent
#[must_use]
pub fn percent_where(values: &[f64], pred: impl Fn(f64) -> bool) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let hits = values.iter().filter(|v| pred(**v)).count();
    hits as f64 / values.len() as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile_interpolates() {
        let values = sorted(&[4.0, 1.0, 3.0, 2.0, 5.0]);
        assert_eq!(percentile_of_sorted(&values, 0.0), 1.0);
        assert_eq!(percentile_of_sorted(&values, 50.0), 3.0);
        assert_eq!(percentile_of_sorted(&values, 100.0), 5.0);
        // rank 0.1 * 4 = 0.4 -> 1.4
        assert!((percentile_of_sorted(&values, 10.0) - 1.4).abs() < 1e-12);
        assert!((percentile_of_sorted(&[1.0, 2.0], 50.0) - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_std_dev_variants() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((std_dev(&values) - 2.0).abs() < 1e-12);
        let expected_sample = (32.0_f64 / 7.0).sqrt();
        assert!((sample_std_dev(&values) - expected_sample).abs() < 1e-12);
    }

    #[test]
    fn test_sample_covariance() {
        let a = [1.0, 2.0, 3.0];
        let b = [2.0, 4.0, 6.0];
        assert!((sample_covariance(&a, &b) - 2.0).abs() < 1e-12);
        assert_eq!(sample_covariance(&[1.0], &[1.0]), 0.0);
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(std_dev(&[]), 0.0);
        assert_eq!(percentile_of_sorted(&[], 50.0), 0.0);
        assert_eq!(percent_where(&[], |_| true), 0.0);
        assert_eq!(percent_where(&[1.0, -1.0], |v| v > 0.0), 50.0);
    }
}
