//! Synthetic geolocation for discovered candidates.

use rand::Rng;

/// Uniform jitter applied independently to each axis, in degrees
pub const JITTER_DEGREES: f64 = 0.08;

pub const LIMA: (f64, f64) = (-12.0464, -77.0428);

const CITY_COORDS: [(&str, f64, f64); 6] = [
    ("lima", -12.0464, -77.0428),
    ("arequipa", -16.4090, -71.5375),
    ("trujillo", -8.1120, -79.0288),
    ("chiclayo", -6.7714, -79.8409),
    ("piura", -5.1945, -80.6328),
    ("huancayo", -12.0651, -75.2049),
];

/// Coordinates for a named region; unknown cities fall back to Lima.
pub fn city_coords(region: &str) -> (f64, f64) {
    let region = region.trim().to_lowercase();
    CITY_COORDS
        .iter()
        .find(|(city, _, _)| *city == region)
        .map(|(_, lat, lon)| (*lat, *lon))
        .unwrap_or(LIMA)
}

/// City coordinates with uniform random jitter on each axis.
pub fn jittered_coords<R: Rng>(region: &str, rng: &mut R) -> (f64, f64) {
    let (lat, lon) = city_coords(region);
    (
        lat + rng.random_range(-JITTER_DEGREES..=JITTER_DEGREES),
        lon + rng.random_range(-JITTER_DEGREES..=JITTER_DEGREES),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn known_city_lookup_is_case_insensitive() {
        assert_eq!(city_coords("Arequipa"), (-16.4090, -71.5375));
        assert_eq!(city_coords("arequipa"), city_coords("AREQUIPA"));
    }

    #[test]
    fn unknown_city_falls_back_to_lima_within_jitter() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let (lat, lon) = jittered_coords("Cusco", &mut rng);
            assert!((lat - LIMA.0).abs() <= JITTER_DEGREES + 1e-9);
            assert!((lon - LIMA.1).abs() <= JITTER_DEGREES + 1e-9);
        }
    }

    #[test]
    fn seeded_rng_makes_jitter_deterministic() {
        let a = jittered_coords("Lima", &mut StdRng::seed_from_u64(42));
        let b = jittered_coords("Lima", &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }
}
