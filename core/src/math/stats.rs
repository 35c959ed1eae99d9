pub struct StatsHelper;

impl StatsHelper {
    pub fn mean(samples: &[f64]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        samples.iter().sum::<f64>() / samples.len() as f64
    }

    /// Largest sample, 0 for an empty slice.
    pub fn max(samples: &[f64]) -> f64 {
        if samples.is_empty() {
            return 0.0;
        }
        samples.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sequence_yields_zero() {
        assert_eq!(StatsHelper::mean(&[]), 0.0);
        assert_eq!(StatsHelper::max(&[]), 0.0);
    }

    #[test]
    fn mean_and_max_of_powers() {
        let powers = [200.0, 250.0, 150.0];
        assert!((StatsHelper::mean(&powers) - 200.0).abs() < 1e-9);
        assert_eq!(StatsHelper::max(&powers), 250.0);
    }
}
