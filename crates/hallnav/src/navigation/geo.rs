//! Great-circle distance.

use hallnav_protocol::defaults::EARTH_RADIUS_METERS;
use hallnav_protocol::Coordinates;

/// Distance in meters by the spherical law of cosines.
pub fn great_circle_distance(a: Coordinates, b: Coordinates) -> f64 {
    // acos near 1 is ill-conditioned; identical points would come out a few cm apart.
    if a == b {
        return 0.0;
    }
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let dlon = (b.lon - a.lon).to_radians();

    // Rounding can push the cosine just outside [-1, 1] for near-identical points.
    let cos = (lat1.sin() * lat2.sin() + lat1.cos() * lat2.cos() * dlon.cos()).clamp(-1.0, 1.0);
    cos.acos() * EARTH_RADIUS_METERS
}

/// Kilometers with two decimals, e.g. `"0.93"`.
pub fn format_km(meters: f64) -> String {
    format!("{:.2}", meters / 1000.0)
}

/// Smallest box containing every point, as (south-west, north-east).
pub fn bounds(points: &[Coordinates]) -> Option<(Coordinates, Coordinates)> {
    let first = points.first()?;
    let (mut sw, mut ne) = (*first, *first);
    for p in &points[1..] {
        sw.lat = sw.lat.min(p.lat);
        sw.lon = sw.lon.min(p.lon);
        ne.lat = ne.lat.max(p.lat);
        ne.lon = ne.lon.max(p.lon);
    }
    Some((sw, ne))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LT1: Coordinates = Coordinates::new(34.0522, -118.2437);
    const LT3: Coordinates = Coordinates::new(34.045, -118.235);

    #[test]
    fn test_distance_zero_for_same_point() {
        let points = [
            LT1,
            LT3,
            Coordinates::new(6.67, -1.57),
            Coordinates::new(10.1, 20.2),
            Coordinates::new(-33.8688, 151.2093),
            Coordinates::new(89.9, 0.0),
            Coordinates::new(0.0, 0.0),
        ];
        for p in points {
            let d = great_circle_distance(p, p);
            assert!(d < 1e-6, "{p} is {d} m from itself");
        }
    }

    #[test]
    fn test_distance_symmetric() {
        let ab = great_circle_distance(LT1, LT3);
        let ba = great_circle_distance(LT3, LT1);
        assert!((ab - ba).abs() < 1e-6);
        // About 1.1 km between the two theatres.
        assert!((1_000.0..1_200.0).contains(&ab), "got {ab}");
    }

    #[test]
    fn test_distance_antipodal_is_half_circumference() {
        let d = great_circle_distance(Coordinates::new(0.0, 0.0), Coordinates::new(0.0, 180.0));
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_METERS).abs() < 1.0);
    }

    #[test]
    fn test_format_km() {
        assert_eq!(format_km(934.4), "0.93");
        assert_eq!(format_km(0.0), "0.00");
    }

    #[test]
    fn test_bounds() {
        let (sw, ne) = bounds(&[LT1, LT3]).unwrap();
        assert_eq!(sw, Coordinates::new(34.045, -118.2437));
        assert_eq!(ne, Coordinates::new(34.0522, -118.235));
        assert!(bounds(&[]).is_none());
    }
}
