use crate::geo::point::GeoPoint;
use crate::prelude::{StudyError, StudyResult};
use serde::{Deserialize, Serialize};

/// A labelled candidate development location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SiteRecord", into = "SiteRecord")]
pub struct Site {
    label: String,
    point: GeoPoint,
}

/// Flat `{label, lon, lat}` form used by site tables on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteRecord {
    pub label: String,
    pub lon: f64,
    pub lat: f64,
}

impl Site {
    pub fn new(label: impl Into<String>, lon: f64, lat: f64) -> StudyResult<Self> {
        Self::at(label, GeoPoint::new(lon, lat)?)
    }

    pub fn at(label: impl Into<String>, point: GeoPoint) -> StudyResult<Self> {
        let label = label.into();
        if label.trim().is_empty() {
            return Err(StudyError::Validation("site label is empty".into()));
        }
        Ok(Self { label, point })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn point(&self) -> &GeoPoint {
        &self.point
    }
}

impl TryFrom<SiteRecord> for Site {
    type Error = StudyError;

    fn try_from(record: SiteRecord) -> Result<Self, Self::Error> {
        Site::new(record.label, record.lon, record.lat)
    }
}

impl From<Site> for SiteRecord {
    fn from(site: Site) -> Self {
        Self {
            lon: site.point.lon(),
            lat: site.point.lat(),
            label: site.label,
        }
    }
}
