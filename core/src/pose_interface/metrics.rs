use serde::{Deserialize, Serialize};

/// Terminal output of one `process_video` call, handed to the persistence layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutMetrics {
    pub rep_count: u32,
    pub avg_power: f64,
    pub max_power: f64,
    pub avg_power_per_kg: f64,
    pub max_power_per_kg: f64,
    pub processed_video_path: String,
}

impl WorkoutMetrics {
    /// Derives the per-kilogram figures; both are 0 when `body_mass_kg <= 0`.
    pub fn new(
        rep_count: u32,
        avg_power: f64,
        max_power: f64,
        body_mass_kg: f64,
        processed_video_path: String,
    ) -> Self {
        let per_kg = |watts: f64| {
            if body_mass_kg > 0.0 {
                watts / body_mass_kg
            } else {
                0.0
            }
        };
        Self {
            rep_count,
            avg_power,
            max_power,
            avg_power_per_kg: per_kg(avg_power),
            max_power_per_kg: per_kg(max_power),
            processed_video_path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn per_kg_figures_divide_by_body_mass() {
        let metrics = WorkoutMetrics::new(3, 210.0, 280.0, 70.0, "out.jsonl".into());
        assert!((metrics.avg_power_per_kg - 3.0).abs() < 1e-9);
        assert!((metrics.max_power_per_kg - 4.0).abs() < 1e-9);
    }

    #[test]
    fn per_kg_figures_are_zero_without_body_mass() {
        let metrics = WorkoutMetrics::new(3, 210.0, 280.0, 0.0, String::new());
        assert_eq!(metrics.avg_power_per_kg, 0.0);
        assert_eq!(metrics.max_power_per_kg, 0.0);

        let negative = WorkoutMetrics::new(1, 100.0, 100.0, -5.0, String::new());
        assert_eq!(negative.max_power_per_kg, 0.0);
    }
}
