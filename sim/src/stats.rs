//! Small statistics helpers used by signal logic

/// Population standard deviation; `0.0` for fewer than two samples.
#[must_use]
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

/// Exponentially weighted moving average, seeded with the first sample;
/// `0.0` for an empty slice.
#[must_use]
pub fn ewma(values: &[f64], alpha: f64) -> f64 {
    let mut iter = values.iter();
    let Some(&first) = iter.next() else {
        return 0.0;
    };
    iter.fold(first, |acc, &v| alpha * v + (1.0 - alpha) * acc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::approx_eq;

    #[test]
    fn std_dev_of_constant_series_is_zero() {
        assert_eq!(std_dev(&[5.0, 5.0, 5.0]), 0.0);
        assert_eq!(std_dev(&[]), 0.0);
        assert_eq!(std_dev(&[1.0]), 0.0);
    }

    #[test]
    fn std_dev_known_value() {
        // Population sigma of {2,4,4,4,5,5,7,9} is exactly 2.
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!(approx_eq(std_dev(&values), 2.0));
    }

    #[test]
    fn ewma_weights_recent_samples() {
        assert_eq!(ewma(&[], 0.5), 0.0);
        assert_eq!(ewma(&[3.0], 0.5), 3.0);
        // seed 0.0, then 0.5*4+0.5*0 = 2.0, then 0.5*2+0.5*2 = 2.0
        assert!(approx_eq(ewma(&[0.0, 4.0, 2.0], 0.5), 2.0));
    }
}
