//! Great-circle distance on a spherical Earth.

use crate::model::geo::Coordinate;

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Returns the haversine distance in meters between two coordinates.
///
/// Pure and symmetric; `distance_meters(a, a)` is `0.0`.
pub fn distance_meters(a: Coordinate, b: Coordinate) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
    // Rounding can push `h` a hair past 1.0 for antipodal points.
    let c = 2.0 * h.sqrt().min(1.0).asin();
    EARTH_RADIUS_METERS * c
}

#[cfg(test)]
mod tests {
    use super::{distance_meters, EARTH_RADIUS_METERS};
    use crate::model::geo::Coordinate;

    const OFFICE: Coordinate = Coordinate::new(41.2995, 69.2401);

    #[test]
    fn same_point_is_zero() {
        assert_eq!(distance_meters(OFFICE, OFFICE), 0.0);
    }

    #[test]
    fn distance_is_symmetric_and_non_negative() {
        let pairs = [
            (OFFICE, Coordinate::new(41.3110, 69.2797)),
            (Coordinate::new(-33.8688, 151.2093), Coordinate::new(51.5074, -0.1278)),
            (Coordinate::new(0.0, 179.9), Coordinate::new(0.0, -179.9)),
        ];
        for (a, b) in pairs {
            let ab = distance_meters(a, b);
            let ba = distance_meters(b, a);
            assert!(ab >= 0.0);
            assert!((ab - ba).abs() < 1e-6, "{ab} != {ba}");
        }
    }

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let d = distance_meters(Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 0.0));
        let expected = EARTH_RADIUS_METERS * 1.0_f64.to_radians();
        assert!((d - expected).abs() < 1e-6);
        assert!((d - 111_195.0).abs() < 1.0);
    }

    #[test]
    fn antipodal_points_are_half_circumference() {
        let d = distance_meters(Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 180.0));
        assert!((d - EARTH_RADIUS_METERS * std::f64::consts::PI).abs() < 1e-3);
    }
}
