use crate::geo::point::GeoPoint;
use crate::geo::site::Site;
use crate::math::distance::{destination, wrap_longitude, DistanceMetric};
use crate::prelude::{validate_radius, StudyError, StudyResult};
use serde::Serialize;
use std::f64::consts::PI;

/// Disk of `radius` around a site, measured with `metric`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BufferZone {
    site: Site,
    radius: f64,
    metric: DistanceMetric,
}

impl BufferZone {
    pub fn new(site: Site, radius: f64, metric: DistanceMetric) -> StudyResult<Self> {
        validate_radius(radius)?;
        Ok(Self {
            site,
            radius,
            metric,
        })
    }

    pub fn site(&self) -> &Site {
        &self.site
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    pub fn contains(&self, point: &GeoPoint) -> bool {
        self.metric.distance(self.site.point(), point) <= self.radius
    }

    /// Closed polygon approximating the zone boundary, first vertex repeated
    /// at the end.
    pub fn outline(&self, vertices: usize) -> StudyResult<Vec<GeoPoint>> {
        if vertices < 3 {
            return Err(StudyError::Validation(format!(
                "buffer outline needs at least 3 vertices, got {}",
                vertices
            )));
        }

        let center = self.site.point();
        let mut ring = Vec::with_capacity(vertices + 1);
        for i in 0..vertices {
            let bearing = i as f64 * 2.0 * PI / vertices as f64;
            let (lon, lat) = match self.metric {
                DistanceMetric::Haversine => destination(center, bearing, self.radius),
                DistanceMetric::PlanarDegrees => (
                    wrap_longitude(center.lon() + self.radius * bearing.sin()),
                    (center.lat() + self.radius * bearing.cos()).clamp(-90.0, 90.0),
                ),
            };
            ring.push(GeoPoint::new(lon, lat)?);
        }
        ring.push(ring[0]);
        Ok(ring)
    }
}
