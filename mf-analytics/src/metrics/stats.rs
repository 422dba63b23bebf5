//! Descriptive statistics over return slices.
//!
//! Every function returns `None` when the statistic does not exist for the
//! input (too few observations, zero dispersion) instead of NaN.

use statrs::statistics::Statistics;

/// Dispersion at or below this is treated as zero.
pub const ZERO_TOLERANCE: f64 = 1e-12;

pub fn is_effectively_zero(x: f64) -> bool {
    x.abs() <= ZERO_TOLERANCE
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().mean())
}

/// Sample standard deviation (N-1 denominator).
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    Some(values.iter().std_dev())
}

/// Sample standard deviation of the values strictly below `threshold`.
///
/// `Some(0.0)` when nothing falls below the threshold; `None` when exactly one
/// value does, since a single observation has no sample deviation.
pub fn downside_deviation(values: &[f64], threshold: f64) -> Option<f64> {
    let below: Vec<f64> = values.iter().copied().filter(|r| *r < threshold).collect();
    match below.len() {
        0 => Some(0.0),
        1 => None,
        _ => sample_std(&below),
    }
}

pub fn sorted(values: &[f64]) -> Vec<f64> {
    let mut v = values.to_vec();
    v.sort_by(f64::total_cmp);
    v
}

/// Empirical quantile with linear interpolation between order statistics.
///
/// `sorted_values` must be ascending. Position is `(n - 1) * q`.
pub fn quantile(sorted_values: &[f64], q: f64) -> Option<f64> {
    if sorted_values.is_empty() || !(0.0..=1.0).contains(&q) {
        return None;
    }
    let h = (sorted_values.len() - 1) as f64 * q;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    let lower = sorted_values[lo];
    Some(lower + (h - lo as f64) * (sorted_values[hi] - lower))
}

/// Population central moments m2, m3, m4 (divided by n).
fn central_moments(values: &[f64]) -> (f64, f64, f64) {
    let n = values.len() as f64;
    let m = values.iter().sum::<f64>() / n;
    let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
    for x in values {
        let d = x - m;
        let d2 = d * d;
        m2 += d2;
        m3 += d2 * d;
        m4 += d2 * d2;
    }
    (m2 / n, m3 / n, m4 / n)
}

/// Bias-corrected sample skewness (adjusted Fisher-Pearson, G1).
pub fn skewness(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 3 {
        return None;
    }
    let (m2, m3, _) = central_moments(values);
    if is_effectively_zero(m2.sqrt()) {
        return None;
    }
    let n = n as f64;
    let g1 = m3 / m2.powf(1.5);
    Some(g1 * (n * (n - 1.0)).sqrt() / (n - 2.0))
}

/// Bias-corrected sample excess kurtosis (G2); a normal sample gives ~0.
pub fn excess_kurtosis(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 4 {
        return None;
    }
    let (m2, _, m4) = central_moments(values);
    if is_effectively_zero(m2.sqrt()) {
        return None;
    }
    let n = n as f64;
    let g2 = m4 / (m2 * m2) - 3.0;
    Some(((n + 1.0) * g2 + 6.0) * (n - 1.0) / ((n - 2.0) * (n - 3.0)))
}

/// R² of an OLS fit of `y` against its index `0..n`.
pub fn r_squared_against_index(y: &[f64]) -> Option<f64> {
    let n = y.len();
    if n < 2 {
        return None;
    }
    let nf = n as f64;
    let x_mean = (nf - 1.0) / 2.0;
    let y_mean = y.iter().sum::<f64>() / nf;

    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for (i, yi) in y.iter().enumerate() {
        let dx = i as f64 - x_mean;
        let dy = yi - y_mean;
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }

    if sxx == 0.0 || is_effectively_zero(syy) {
        return None;
    }
    Some(sxy * sxy / (sxx * syy))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn test_mean_and_std() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!(close(mean(&v).unwrap(), 5.0, 1e-12));
        // Sample variance = 32 / 7
        assert!(close(sample_std(&v).unwrap(), (32.0_f64 / 7.0).sqrt(), 1e-12));
        assert_eq!(sample_std(&[1.0]), None);
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_quantile_linear_interpolation() {
        let v = sorted(&[4.0, 1.0, 3.0, 2.0, 5.0]);
        assert_eq!(quantile(&v, 0.0), Some(1.0));
        assert_eq!(quantile(&v, 1.0), Some(5.0));
        assert_eq!(quantile(&v, 0.5), Some(3.0));
        // h = 4 * 0.05 = 0.2 -> 1 + 0.2 * (2 - 1)
        assert!(close(quantile(&v, 0.05).unwrap(), 1.2, 1e-12));
        assert_eq!(quantile(&[], 0.5), None);
    }

    #[test]
    fn test_downside_deviation() {
        assert_eq!(downside_deviation(&[0.01, 0.02], 0.0), Some(0.0));
        assert_eq!(downside_deviation(&[0.01, -0.02], 0.0), None);
        let dd = downside_deviation(&[0.05, -0.01, -0.03], 0.0).unwrap();
        // stdev of [-0.01, -0.03]
        assert!(close(dd, 0.02 / 2.0_f64.sqrt(), 1e-12));
    }

    #[test]
    fn test_skewness_symmetric_is_zero() {
        let s = skewness(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert!(close(s, 0.0, 1e-12));
        assert_eq!(skewness(&[1.0, 2.0]), None);
        assert_eq!(skewness(&[3.0, 3.0, 3.0]), None);
    }

    #[test]
    fn test_skewness_right_tail() {
        // G1 of [1, 2, 3, 10] is 1.7636...
        let s = skewness(&[1.0, 2.0, 3.0, 10.0]).unwrap();
        assert!(close(s, 1.763_6, 1e-3));
    }

    #[test]
    fn test_excess_kurtosis() {
        // G2 of 1..=5 is -1.2
        let k = excess_kurtosis(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert!(close(k, -1.2, 1e-12));
        assert_eq!(excess_kurtosis(&[1.0, 2.0, 3.0]), None);
    }

    #[test]
    fn test_r_squared() {
        let perfect = [0.0, 0.5, 1.0, 1.5];
        assert!(close(r_squared_against_index(&perfect).unwrap(), 1.0, 1e-12));
        assert_eq!(r_squared_against_index(&[2.0, 2.0, 2.0]), None);

        let noisy = [0.0, 1.0, 0.0, 1.0];
        let r2 = r_squared_against_index(&noisy).unwrap();
        assert!(r2 > 0.0 && r2 < 1.0);
    }
}
