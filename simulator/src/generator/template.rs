use std::f32::consts::PI;

/// Joint-angle trajectory of one repetition: starts at `extended`, reaches
/// `flexed` halfway through and heads back.
pub fn rep_waveform(length: usize, extended: f32, flexed: f32) -> Vec<f32> {
    (0..length)
        .map(|i| {
            let phase = i as f32 / length as f32 * 2.0 * PI;
            let blend = 0.5 - 0.5 * phase.cos();
            extended + (flexed - extended) * blend
        })
        .collect()
}
