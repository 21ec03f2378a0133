use crate::math::distance::EARTH_RADIUS_KM;
use crate::prelude::{StudyError, StudyResult};
use crate::telemetry::log::LogManager;
use serde::{Deserialize, Serialize};

/// Ground spacing of sensor grid samples at one latitude.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolutionResult {
    pub lat: f64,
    pub d_lat: f64,
    pub d_lon: f64,
    /// North-south spacing in km.
    #[serde(rename = "res_ns")]
    pub ns_km: f64,
    /// East-west spacing in km.
    #[serde(rename = "res_we")]
    pub we_km: f64,
}

/// Converts an angular sampling interval into ground distance on a sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolutionEstimator {
    earth_radius_km: f64,
}

impl ResolutionEstimator {
    pub fn new() -> Self {
        Self {
            earth_radius_km: EARTH_RADIUS_KM,
        }
    }

    pub fn with_radius(earth_radius_km: f64) -> StudyResult<Self> {
        if !earth_radius_km.is_finite() || earth_radius_km <= 0.0 {
            return Err(StudyError::Validation(format!(
                "earth radius must be positive, got {}",
                earth_radius_km
            )));
        }
        Ok(Self { earth_radius_km })
    }

    pub fn estimate(&self, d_lat: f64, d_lon: f64, lat: f64) -> StudyResult<ResolutionResult> {
        validate_interval("d_lat", d_lat)?;
        validate_interval("d_lon", d_lon)?;
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(StudyError::Validation(format!(
                "latitude {} outside [-90, 90]",
                lat
            )));
        }

        let ns_km = self.earth_radius_km * d_lat.to_radians();
        // cos(pi/2) is not exactly zero in floating point
        let we_km = if lat.abs() == 90.0 {
            0.0
        } else {
            (self.earth_radius_km * d_lon.to_radians() * lat.to_radians().cos()).max(0.0)
        };

        Ok(ResolutionResult {
            lat,
            d_lat,
            d_lon,
            ns_km,
            we_km,
        })
    }

    /// One row per requested latitude, in input order.
    pub fn table(
        &self,
        d_lat: f64,
        d_lon: f64,
        latitudes: &[f64],
    ) -> StudyResult<Vec<ResolutionResult>> {
        let rows = latitudes
            .iter()
            .map(|&lat| self.estimate(d_lat, d_lon, lat))
            .collect::<StudyResult<Vec<_>>>()?;

        let logger = LogManager::new("resolution");
        for row in &rows {
            logger.record(&format!(
                "lat {:.3}: NS {:.3} km, WE {:.3} km",
                row.lat, row.ns_km, row.we_km
            ));
        }
        Ok(rows)
    }
}

impl Default for ResolutionEstimator {
    fn default() -> Self {
        Self::new()
    }
}

pub fn estimate_resolution(d_lat: f64, d_lon: f64, lat: f64) -> StudyResult<ResolutionResult> {
    ResolutionEstimator::new().estimate(d_lat, d_lon, lat)
}

fn validate_interval(name: &str, value: f64) -> StudyResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(StudyError::Validation(format!(
            "{} must be a positive angle in degrees, got {}",
            name, value
        )));
    }
    Ok(())
}
