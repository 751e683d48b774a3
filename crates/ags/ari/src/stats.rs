//! Small numeric helpers shared by the engine

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
pub fn stdev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Least-squares linear fit. Returns (slope, intercept); a single
/// point yields a flat line through it.
pub fn linear_fit(xs: &[f64], ys: &[f64]) -> (f64, f64) {
    debug_assert_eq!(xs.len(), ys.len());
    let n = xs.len();
    if n == 0 {
        return (0.0, 0.0);
    }
    if n == 1 {
        return (0.0, ys[0]);
    }
    let mx = mean(xs);
    let my = mean(ys);
    let sxx: f64 = xs.iter().map(|x| (x - mx).powi(2)).sum();
    if sxx == 0.0 {
        return (0.0, my);
    }
    let sxy: f64 = xs.iter().zip(ys).map(|(x, y)| (x - mx) * (y - my)).sum();
    let slope = sxy / sxx;
    (slope, my - slope * mx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_and_stdev() {
        assert_eq!(mean(&[]), 0.0);
        assert!((mean(&[0.2, 0.4, 0.6]) - 0.4).abs() < 1e-12);
        assert_eq!(stdev(&[0.5]), 0.0);
        assert!(stdev(&[0.5, 0.5, 0.5]) < 1e-12);
        assert!(stdev(&[0.0, 1.0]) > 0.49);
    }

    #[test]
    fn fit_recovers_exact_line() {
        let xs = [0.0, 1.0, 2.0, 3.0];
        let ys = [0.1, 0.3, 0.5, 0.7];
        let (slope, intercept) = linear_fit(&xs, &ys);
        assert!((slope - 0.2).abs() < 1e-12);
        assert!((intercept - 0.1).abs() < 1e-12);
    }

    #[test]
    fn fit_handles_degenerate_input() {
        assert_eq!(linear_fit(&[], &[]), (0.0, 0.0));
        assert_eq!(linear_fit(&[2.0], &[0.8]), (0.0, 0.8));
        let (slope, _) = linear_fit(&[1.0, 1.0], &[0.2, 0.8]);
        assert_eq!(slope, 0.0);
    }

    proptest::proptest! {
        #[test]
        fn fit_recovers_any_generated_line(
            slope in -1.0f64..1.0,
            intercept in 0.0f64..1.0,
        ) {
            let xs: Vec<f64> = (0..6).map(|i| i as f64).collect();
            let ys: Vec<f64> = xs.iter().map(|x| intercept + slope * x).collect();
            let (s, b) = linear_fit(&xs, &ys);
            proptest::prop_assert!((s - slope).abs() < 1e-9);
            proptest::prop_assert!((b - intercept).abs() < 1e-9);
        }
    }
}
