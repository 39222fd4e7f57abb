//! Per-electrode z-score normalisation.
//!
//! Each electrode's series is normalised against its own statistics:
//!   μ = mean(series),  σ = std (ddof=0)
//!   series = (series − μ) / σ

/// Z-score one electrode series in place.
/// Returns (mean, std) used for normalisation.
pub fn zscore_inplace(series: &mut [f32]) -> (f32, f32) {
    if series.is_empty() {
        return (0.0, 0.0);
    }
    let n = series.len() as f64;
    let mean = series.iter().map(|&v| v as f64).sum::<f64>() / n;
    let var = series
        .iter()
        .map(|&v| {
            let d = v as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    let std = var.sqrt() as f32;
    let mean = mean as f32;

    if std > 0.0 {
        for v in series.iter_mut() {
            *v = (*v - mean) / std;
        }
    }
    (mean, std)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zscore_mean_zero_std_one() {
        let mut series: Vec<f32> = (0..512).map(|t| (t as f32 * 0.1).sin() * 50.0).collect();
        let (mean, std) = zscore_inplace(&mut series);
        assert!(std > 0.0);
        let _ = mean;

        let n = series.len() as f64;
        let out_mean = series.iter().map(|&v| v as f64).sum::<f64>() / n;
        let out_std = (series
            .iter()
            .map(|&v| {
                let d = v as f64 - out_mean;
                d * d
            })
            .sum::<f64>()
            / n)
            .sqrt();

        approx::assert_abs_diff_eq!(out_mean as f32, 0.0, epsilon = 1e-5_f32);
        approx::assert_abs_diff_eq!(out_std as f32, 1.0, epsilon = 1e-4_f32);
    }

    #[test]
    fn zscore_constant_signal_no_panic() {
        let mut series = vec![7.0_f32; 128];
        let (_m, s) = zscore_inplace(&mut series);
        // std=0: series unchanged.
        assert_eq!(s, 0.0);
        for &v in series.iter() {
            approx::assert_abs_diff_eq!(v, 7.0, epsilon = 1e-6_f32);
        }
    }

    #[test]
    fn zscore_empty_series_no_panic() {
        let mut series: Vec<f32> = vec![];
        assert_eq!(zscore_inplace(&mut series), (0.0, 0.0));
    }

    #[test]
    fn zscore_returns_original_stats() {
        let mut series = vec![1.0_f32, 3.0];
        let (mean, std) = zscore_inplace(&mut series);
        approx::assert_abs_diff_eq!(mean, 2.0, epsilon = 1e-6_f32);
        approx::assert_abs_diff_eq!(std, 1.0, epsilon = 1e-6_f32);
        assert_eq!(series, vec![-1.0, 1.0]);
    }
}
