use crate::math::stats::StatsHelper;

/// Standard gravity, m/s².
pub const GRAVITY: f64 = 9.81;

/// Work-rate estimate for lifting `mass_kg` through `displacement_m` in
/// `duration_s`. Non-positive (or NaN) durations yield 0 W.
pub fn power(mass_kg: f64, displacement_m: f64, duration_s: f64) -> f64 {
    if !(duration_s > 0.0) {
        return 0.0;
    }
    mass_kg * GRAVITY * displacement_m / duration_s
}

/// Fixed mass and displacement for one processing call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerModel {
    mass_kg: f64,
    displacement_m: f64,
}

impl PowerModel {
    pub fn new(mass_kg: f64, displacement_m: f64) -> Self {
        Self {
            mass_kg,
            displacement_m,
        }
    }

    pub fn rep_power(&self, duration_s: f64) -> f64 {
        power(self.mass_kg, self.displacement_m, duration_s)
    }

    pub fn mass_kg(&self) -> f64 {
        self.mass_kg
    }

    pub fn displacement_m(&self) -> f64 {
        self.displacement_m
    }
}

/// Average and maximum over a rep-power history, recomputed on demand.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PowerSummary {
    pub avg_power: f64,
    pub max_power: f64,
}

impl PowerSummary {
    pub fn from_powers(powers: &[f64]) -> Self {
        Self {
            avg_power: StatsHelper::mean(powers),
            max_power: StatsHelper::max(powers),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pullup_rep_power() {
        let watts = power(70.0, 0.6, 2.0);
        assert!((watts - 70.0 * GRAVITY * 0.6 / 2.0).abs() < 1e-9, "got {}", watts);
        assert!((watts - 206.01).abs() < 0.1);
        assert!((PowerModel::new(70.0, 0.6).rep_power(2.0) - watts).abs() < 1e-12);
    }

    #[test]
    fn non_positive_duration_yields_zero() {
        for duration in [0.0, -0.5, -10.0, f64::NAN] {
            assert_eq!(power(70.0, 0.6, duration), 0.0);
            assert_eq!(power(120.0, 2.0, duration), 0.0);
        }
    }

    #[test]
    fn summary_of_empty_history_is_zero() {
        assert_eq!(PowerSummary::from_powers(&[]), PowerSummary::default());
    }

    #[test]
    fn summary_tracks_mean_and_max() {
        let summary = PowerSummary::from_powers(&[100.0, 300.0, 200.0]);
        assert!((summary.avg_power - 200.0).abs() < 1e-9);
        assert_eq!(summary.max_power, 300.0);
    }
}
