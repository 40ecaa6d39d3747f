//! Sample statistics of pixel values
//!
//! The standard deviation is the population one (divided by the number of samples).
//! Any NaN in the samples makes the statistics NaN.

/// Mean of the samples, NaN if there is none
pub fn mean(x: &[f64]) -> f64 {
    x.iter().sum::<f64>() / x.len() as f64
}
/// Returns the mean and the population standard deviation of the samples
pub fn mean_std(x: &[f64]) -> (f64, f64) {
    let n = x.len() as f64;
    let mean = mean(x);
    let std = (x.iter().map(|x| x - mean).fold(0f64, |s, x| s + x * x) / n).sqrt();
    (mean, std)
}
/// Population standard deviation of the samples
pub fn std(x: &[f64]) -> f64 {
    mean_std(x).1
}
/// Median of the samples, the mean of the two central values for an even number of samples
pub fn median(x: &[f64]) -> f64 {
    if x.is_empty() || x.iter().any(|x| x.is_nan()) {
        return f64::NAN;
    }
    let mut sorted = x.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        0.5 * (sorted[mid - 1] + sorted[mid])
    } else {
        sorted[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn population_std() {
        let (m, s) = mean_std(&[2., 4., 4., 4., 5., 5., 7., 9.]);
        assert_eq!(m, 5.);
        assert_eq!(s, 2.);
    }
    #[test]
    fn median_even_odd() {
        assert_eq!(median(&[3., 1., 2.]), 2.);
        assert_eq!(median(&[4., 1., 3., 2.]), 2.5);
    }
    #[test]
    fn nan_propagates() {
        assert!(median(&[1., f64::NAN, 2.]).is_nan());
        assert!(mean(&[1., f64::NAN]).is_nan());
        assert!(std(&[1., f64::NAN]).is_nan());
        assert!(median(&[]).is_nan());
    }
}
