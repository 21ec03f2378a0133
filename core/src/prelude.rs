use crate::math::distance::DistanceMetric;
use serde::{Deserialize, Serialize};

/// Parameters shared by the near/far buffer passes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    pub near_radius: f64,
    pub far_radius: f64,
    #[serde(default)]
    pub metric: DistanceMetric,
}

impl ExtractionConfig {
    pub fn new(near_radius: f64, far_radius: f64, metric: DistanceMetric) -> StudyResult<Self> {
        let config = Self {
            near_radius,
            far_radius,
            metric,
        };
        config.validate()?;
        Ok(config)
    }

    /// Both radii must be positive and nested.
    pub fn validate(&self) -> StudyResult<()> {
        validate_radius(self.near_radius)?;
        validate_radius(self.far_radius)?;
        if self.near_radius > self.far_radius {
            return Err(StudyError::Validation(format!(
                "near radius {} exceeds far radius {}",
                self.near_radius, self.far_radius
            )));
        }
        Ok(())
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            near_radius: 5.0,
            far_radius: 10.0,
            metric: DistanceMetric::Haversine,
        }
    }
}

/// Common error type for the compute stage.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum StudyError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("data quality error: {0}")]
    DataQuality(String),
}

pub type StudyResult<T> = Result<T, StudyError>;

pub(crate) fn validate_radius(radius: f64) -> StudyResult<()> {
    if !radius.is_finite() || radius <= 0.0 {
        return Err(StudyError::Validation(format!(
            "radius must be a positive number, got {}",
            radius
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_nested() {
        let config = ExtractionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.metric, DistanceMetric::Haversine);
    }

    #[test]
    fn inverted_radii_are_rejected() {
        let err = ExtractionConfig::new(10.0, 5.0, DistanceMetric::PlanarDegrees).unwrap_err();
        assert!(matches!(err, StudyError::Validation(_)));
    }

    #[test]
    fn non_positive_radius_is_rejected() {
        assert!(validate_radius(0.0).is_err());
        assert!(validate_radius(-1.0).is_err());
        assert!(validate_radius(f64::NAN).is_err());
        assert!(validate_radius(0.1).is_ok());
    }
}
