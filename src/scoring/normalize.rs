//! Score normalization and seed blending, shared by both strategies.
//!
//! The search path and the refresh path scale differently on purpose:
//! search divides by the max only, refresh applies a full min-max. Both
//! treat an all-non-positive raw vector as degenerate and return zeros
//! instead of dividing by zero.

/// 50/50 blend of raw similarity and per-prospect seed values.
pub fn blend_seed(raw: &[f32], seeds: &[f32]) -> Vec<f32> {
    raw.iter()
        .zip(seeds.iter())
        .map(|(r, s)| r * 0.5 + s * 0.5)
        .collect()
}

/// Scale to [0, 100] by the max value only (plain search path).
/// Negative values clamp to zero so the output never leaves the range.
pub fn scale_by_max(values: &[f32]) -> Vec<f32> {
    let max = values.iter().cloned().fold(f32::MIN, f32::max);
    if values.is_empty() || max <= 0.0 {
        return vec![0.0; values.len()];
    }
    values.iter().map(|v| v.max(0.0) / max * 100.0).collect()
}

/// Full min-max scale to [0, 100] (refresh path). When every value is
/// identical and positive there is no spread to stretch; they all map
/// to 100.
pub fn min_max_scale(values: &[f32]) -> Vec<f32> {
    let max = values.iter().cloned().fold(f32::MIN, f32::max);
    if values.is_empty() || max <= 0.0 {
        return vec![0.0; values.len()];
    }
    let min = values.iter().cloned().fold(f32::MAX, f32::min);
    let span = max - min;
    if span <= f32::EPSILON {
        return vec![100.0; values.len()];
    }
    values.iter().map(|v| (v - min) / span * 100.0).collect()
}

pub fn round_to(values: &[f32], decimals: u32) -> Vec<f32> {
    let factor = 10f32.powi(decimals as i32);
    values.iter().map(|v| (v * factor).round() / factor).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_in_bounds(values: &[f32]) {
        for v in values {
            assert!((0.0..=100.0).contains(v), "out of bounds: {v}");
        }
    }

    #[test]
    fn scale_by_max_bounds_and_degenerate() {
        let scaled = scale_by_max(&[0.2, 0.4, 0.1]);
        assert_in_bounds(&scaled);
        assert_eq!(scaled[1], 100.0);

        assert_eq!(scale_by_max(&[0.0, 0.0]), vec![0.0, 0.0]);
        assert_eq!(scale_by_max(&[-0.5, -0.1]), vec![0.0, 0.0]);
        assert!(scale_by_max(&[]).is_empty());
        assert!(scale_by_max(&[0.0, 0.0]).iter().all(|v| !v.is_nan()));
    }

    #[test]
    fn min_max_scale_bounds_and_degenerate() {
        let scaled = min_max_scale(&[0.2, 0.4, 0.3]);
        assert_in_bounds(&scaled);
        assert_eq!(scaled[0], 0.0);
        assert_eq!(scaled[1], 100.0);

        assert_eq!(min_max_scale(&[0.0, 0.0]), vec![0.0, 0.0]);
        assert_eq!(min_max_scale(&[0.5, 0.5]), vec![100.0, 100.0]);
        assert!(min_max_scale(&[0.0, 0.0]).iter().all(|v| !v.is_nan()));
    }

    #[test]
    fn negative_raw_values_clamp_to_zero() {
        // embedding cosines can come back negative; a low seed keeps the
        // blend below zero, which must not escape the range
        let scaled = scale_by_max(&[-0.2, 0.5]);
        assert_eq!(scaled, vec![0.0, 100.0]);
        assert_in_bounds(&scaled);

        let scaled = min_max_scale(&[-0.5, 0.5]);
        assert_in_bounds(&scaled);
        assert_eq!(scaled, vec![0.0, 100.0]);
    }

    #[test]
    fn blend_is_even_split() {
        assert_eq!(blend_seed(&[0.4, 0.0], &[0.6, 1.0]), vec![0.5, 0.5]);
    }

    #[test]
    fn search_and_refresh_paths_diverge() {
        // identical inputs, different scaling per caller
        let raw = [0.2, 0.6, 1.0];
        let search = scale_by_max(&raw);
        let refresh = min_max_scale(&raw);
        assert_eq!(search, vec![20.0, 60.0, 100.0]);
        assert_eq!(refresh, vec![0.0, 50.0, 100.0]);
    }

    #[test]
    fn rounding() {
        assert_eq!(round_to(&[33.333, 66.666], 1), vec![33.3, 66.7]);
        assert_eq!(round_to(&[33.5], 0), vec![34.0]);
    }
}
