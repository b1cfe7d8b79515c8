use glam::Vec3;
use rand::Rng;

/// Direction returned when a vector is too short to normalize.
pub const DEFAULT_AXIS: Vec3 = Vec3::Z;

/// Squared length below which a vector counts as degenerate.
const NORMALIZE_EPSILON_SQ: f32 = 1e-12;

/// Normalize `v`, falling back to [`DEFAULT_AXIS`] for near-zero or non-finite input.
pub fn safe_normalize(v: Vec3) -> Vec3 {
    let len_sq = v.length_squared();
    if len_sq <= NORMALIZE_EPSILON_SQ || !len_sq.is_finite() {
        return DEFAULT_AXIS;
    }
    v / len_sq.sqrt()
}

/// Uniform random point inside the unit sphere (rejection sampled).
pub fn random_vector<R: Rng>(rng: &mut R) -> Vec3 {
    loop {
        let v = Vec3::new(
            rng.random_range(-1.0f32..=1.0),
            rng.random_range(-1.0f32..=1.0),
            rng.random_range(-1.0f32..=1.0),
        );
        if v.length_squared() <= 1.0 {
            return v;
        }
    }
}

/// Distance along the ray `origin + dir * t` to the first intersection with a sphere.
///
/// Returns `None` when the ray misses or the sphere lies entirely behind the origin.
/// An origin inside the sphere reports the exit point.
pub fn ray_sphere_intersection(origin: Vec3, dir: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let f = origin - center;
    let b = f.dot(dir);
    let c = f.length_squared() - radius * radius;
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }

    let sqrt_d = discriminant.sqrt();
    let t1 = -b - sqrt_d;
    let t2 = -b + sqrt_d;
    if t1 > 0.0 {
        Some(t1)
    } else if t2 > 0.0 {
        Some(t2)
    } else {
        None
    }
}

/// Horizontal (XZ plane) distance between two points.
pub fn distance_2d(a: Vec3, b: Vec3) -> f32 {
    let dx = a.x - b.x;
    let dz = a.z - b.z;
    (dx * dx + dz * dz).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn normalize_regular_vector() {
        let n = safe_normalize(Vec3::new(3.0, 0.0, 4.0));
        assert!((n.length() - 1.0).abs() < 1e-6);
        assert!((n.x - 0.6).abs() < 1e-6);
    }

    #[test]
    fn normalize_zero_falls_back_to_default_axis() {
        assert_eq!(safe_normalize(Vec3::ZERO), DEFAULT_AXIS);
        assert_eq!(safe_normalize(Vec3::splat(1e-9)), DEFAULT_AXIS);
    }

    #[test]
    fn normalize_nan_falls_back_to_default_axis() {
        assert_eq!(safe_normalize(Vec3::new(f32::NAN, 0.0, 1.0)), DEFAULT_AXIS);
    }

    #[test]
    fn random_vector_inside_unit_sphere() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            assert!(random_vector(&mut rng).length_squared() <= 1.0);
        }
    }

    #[test]
    fn sphere_hit_in_front() {
        let t = ray_sphere_intersection(Vec3::ZERO, Vec3::Z, Vec3::new(0.0, 0.0, 10.0), 2.0);
        assert!((t.unwrap() - 8.0).abs() < 1e-5);
    }

    #[test]
    fn sphere_behind_origin_missed() {
        let t = ray_sphere_intersection(Vec3::ZERO, Vec3::Z, Vec3::new(0.0, 0.0, -10.0), 2.0);
        assert!(t.is_none());
    }

    #[test]
    fn sphere_from_inside_reports_exit() {
        let t = ray_sphere_intersection(Vec3::ZERO, Vec3::X, Vec3::ZERO, 5.0);
        assert!((t.unwrap() - 5.0).abs() < 1e-5);
    }

    #[test]
    fn horizontal_distance_ignores_height() {
        let d = distance_2d(Vec3::new(0.0, 100.0, 0.0), Vec3::new(3.0, -50.0, 4.0));
        assert!((d - 5.0).abs() < 1e-6);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn normalized_vectors_are_unit_length(
                x in -1e4f32..1e4,
                y in -1e4f32..1e4,
                z in -1e4f32..1e4,
            ) {
                let n = safe_normalize(Vec3::new(x, y, z));
                prop_assert!((n.length() - 1.0).abs() < 1e-4);
            }

            #[test]
            fn sphere_hits_lie_on_the_surface(
                cz in 20.0f32..200.0,
                cx in -5.0f32..5.0,
                radius in 6.0f32..15.0,
            ) {
                let center = Vec3::new(cx, 0.0, cz);
                let t = ray_sphere_intersection(Vec3::ZERO, Vec3::Z, center, radius);
                prop_assert!(t.is_some());
                let hit = Vec3::Z * t.unwrap_or_default();
                prop_assert!((hit.distance(center) - radius).abs() < 5e-2);
            }
        }
    }
}
