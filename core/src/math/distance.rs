use crate::geo::point::GeoPoint;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Spherical Earth radius used by every distance in the crate.
pub const EARTH_RADIUS_KM: f64 = 6378.0;

/// How distances (and therefore buffer radii) are measured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DistanceMetric {
    /// Euclidean distance over raw (lon, lat) degrees. Radii are in degrees.
    /// Only usable over a few degrees close to the equator.
    PlanarDegrees,
    /// Great-circle distance on the sphere. Radii are in kilometres.
    #[default]
    Haversine,
}

impl DistanceMetric {
    pub fn distance(&self, a: &GeoPoint, b: &GeoPoint) -> f64 {
        match self {
            DistanceMetric::PlanarDegrees => planar_degrees(a, b),
            DistanceMetric::Haversine => haversine_km(a, b),
        }
    }

    /// Expresses a radius given in km in this metric's unit.
    pub fn radius_from_km(&self, km: f64) -> f64 {
        match self {
            DistanceMetric::PlanarDegrees => km_to_degrees(km),
            DistanceMetric::Haversine => km,
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            DistanceMetric::PlanarDegrees => "deg",
            DistanceMetric::Haversine => "km",
        }
    }
}

pub fn planar_degrees(a: &GeoPoint, b: &GeoPoint) -> f64 {
    (a.lon() - b.lon()).hypot(a.lat() - b.lat())
}

pub fn haversine_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let dlat = (b.lat() - a.lat()).to_radians();
    let dlon = (b.lon() - a.lon()).to_radians();
    let lat1 = a.lat().to_radians();
    let lat2 = b.lat().to_radians();
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

/// Kilometres spanned by one degree of arc on the sphere.
pub fn km_per_degree() -> f64 {
    EARTH_RADIUS_KM * PI / 180.0
}

/// Degree equivalent of `km` at the equator.
pub fn km_to_degrees(km: f64) -> f64 {
    km / km_per_degree()
}

/// Point reached after travelling `distance_km` from `origin` along
/// `bearing_rad` (clockwise from north) on a great circle, as raw (lon, lat).
pub(crate) fn destination(origin: &GeoPoint, bearing_rad: f64, distance_km: f64) -> (f64, f64) {
    let lat_rad = origin.lat().to_radians();
    let lon_rad = origin.lon().to_radians();
    let angular = distance_km / EARTH_RADIUS_KM;

    let dest_lat = (lat_rad.sin() * angular.cos()
        + lat_rad.cos() * angular.sin() * bearing_rad.cos())
    .asin();
    let dest_lon = lon_rad
        + (bearing_rad.sin() * angular.sin() * lat_rad.cos())
            .atan2(angular.cos() - lat_rad.sin() * dest_lat.sin());

    (wrap_longitude(dest_lon.to_degrees()), dest_lat.to_degrees())
}

pub(crate) fn wrap_longitude(lon: f64) -> f64 {
    let wrapped = (lon + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 && lon > 0.0 {
        180.0
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(lon: f64, lat: f64) -> GeoPoint {
        GeoPoint::new(lon, lat).unwrap()
    }

    #[test]
    fn one_degree_along_equator() {
        let d = haversine_km(&pt(0.0, 0.0), &pt(1.0, 0.0));
        assert!((d - km_per_degree()).abs() < 1e-6);
        assert!((d - 111.317).abs() < 1e-2);
    }

    #[test]
    fn km_convert_to_equatorial_degrees() {
        assert!((km_to_degrees(km_per_degree()) - 1.0).abs() < 1e-12);
        assert!((km_to_degrees(5.0) - 0.044_917).abs() < 1e-6);
        assert_eq!(km_to_degrees(0.0), 0.0);
    }

    #[test]
    fn radius_from_km_follows_metric_unit() {
        assert_eq!(DistanceMetric::Haversine.radius_from_km(5.0), 5.0);
        assert_eq!(
            DistanceMetric::PlanarDegrees.radius_from_km(10.0),
            km_to_degrees(10.0)
        );
    }

    #[test]
    fn planar_is_euclidean_in_degrees() {
        let d = planar_degrees(&pt(0.0, 0.0), &pt(3.0, 4.0));
        assert!((d - 5.0).abs() < 1e-12);
        assert_eq!(DistanceMetric::PlanarDegrees.unit(), "deg");
    }

    #[test]
    fn distance_is_symmetric() {
        let a = pt(9.7, 4.05);
        let b = pt(10.2, 3.6);
        for metric in [DistanceMetric::PlanarDegrees, DistanceMetric::Haversine] {
            assert_eq!(metric.distance(&a, &b), metric.distance(&b, &a));
            assert_eq!(metric.distance(&a, &a), 0.0);
        }
    }

    #[test]
    fn destination_round_trips_distance() {
        let origin = pt(9.7, 4.05);
        let (lon, lat) = destination(&origin, 1.0, 10.0);
        let d = haversine_km(&origin, &pt(lon, lat));
        assert!((d - 10.0).abs() < 1e-6);
    }

    #[test]
    fn longitude_wraps_into_range() {
        assert_eq!(wrap_longitude(190.0), -170.0);
        assert_eq!(wrap_longitude(-190.0), 170.0);
        assert_eq!(wrap_longitude(180.0), 180.0);
    }

    #[test]
    fn metric_reads_kebab_case() {
        let metric: DistanceMetric = serde_json::from_str("\"planar-degrees\"").unwrap();
        assert_eq!(metric, DistanceMetric::PlanarDegrees);
    }
}
