use crate::prelude::{StudyError, StudyResult};
use serde::{Deserialize, Serialize};

/// A WGS84 longitude/latitude pair in decimal degrees.
///
/// Construction goes through [`GeoPoint::new`], so every value in circulation
/// is finite and inside the valid coordinate ranges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PointRecord", into = "PointRecord")]
pub struct GeoPoint {
    lon: f64,
    lat: f64,
}

/// Unvalidated `{lon, lat}` form used on the wire.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PointRecord {
    pub lon: f64,
    pub lat: f64,
}

impl GeoPoint {
    pub fn new(lon: f64, lat: f64) -> StudyResult<Self> {
        if !lon.is_finite() || !lat.is_finite() {
            return Err(StudyError::DataQuality(format!(
                "non-finite coordinate ({}, {})",
                lon, lat
            )));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(StudyError::Validation(format!(
                "longitude {} outside [-180, 180]",
                lon
            )));
        }
        if !(-90.0..=90.0).contains(&lat) {
            return Err(StudyError::Validation(format!(
                "latitude {} outside [-90, 90]",
                lat
            )));
        }
        Ok(Self { lon, lat })
    }

    pub fn lon(&self) -> f64 {
        self.lon
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }
}

impl TryFrom<PointRecord> for GeoPoint {
    type Error = StudyError;

    fn try_from(raw: PointRecord) -> Result<Self, Self::Error> {
        GeoPoint::new(raw.lon, raw.lat)
    }
}

impl From<GeoPoint> for PointRecord {
    fn from(point: GeoPoint) -> Self {
        Self {
            lon: point.lon,
            lat: point.lat,
        }
    }
}
