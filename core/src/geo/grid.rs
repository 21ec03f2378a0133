use crate::geo::point::GeoPoint;
use crate::prelude::{StudyError, StudyResult};
use serde::{Deserialize, Serialize};

/// Fill value commonly written by HDF5 swath products for absent samples.
pub const DEFAULT_SENTINEL: f64 = -9999.0;

/// An unvalidated sample as read from a raster or table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawPixel {
    pub id: u64,
    pub lon: f64,
    pub lat: f64,
}

/// One validated satellite sample location and the id of its source record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelRecord {
    pub id: u64,
    pub point: GeoPoint,
}

/// Sentinel policy for missing readings. NaN is always missing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MissingValue {
    pub sentinel: f64,
}

impl MissingValue {
    pub fn new(sentinel: f64) -> Self {
        Self { sentinel }
    }

    pub fn is_missing(&self, value: f64) -> bool {
        value.is_nan() || value == self.sentinel
    }

    fn raw_is_missing(&self, raw: &RawPixel) -> bool {
        self.is_missing(raw.lon) || self.is_missing(raw.lat)
    }
}

impl Default for MissingValue {
    fn default() -> Self {
        Self::new(DEFAULT_SENTINEL)
    }
}

/// Counts reported by [`PixelGrid::filter_raw`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSummary {
    pub kept: usize,
    pub missing: usize,
    pub out_of_range: usize,
}

impl FilterSummary {
    pub fn rejected(&self) -> usize {
        self.missing + self.out_of_range
    }
}

/// Region of interest in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> StudyResult<Self> {
        GeoPoint::new(min_lon, min_lat)?;
        GeoPoint::new(max_lon, max_lat)?;
        if min_lon > max_lon || min_lat > max_lat {
            return Err(StudyError::Validation(format!(
                "empty bounding box [{}, {}] x [{}, {}]",
                min_lon, max_lon, min_lat, max_lat
            )));
        }
        Ok(Self {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
        })
    }

    pub fn contains(&self, point: &GeoPoint) -> bool {
        (self.min_lon..=self.max_lon).contains(&point.lon())
            && (self.min_lat..=self.max_lat).contains(&point.lat())
    }
}

/// Validated collection of satellite sample locations.
///
/// Records keep their input order; sentinel and out-of-range samples never
/// make it in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PixelGrid {
    records: Vec<PixelRecord>,
}

impl PixelGrid {
    /// Ids are the input positions.
    pub fn from_points(points: Vec<GeoPoint>) -> Self {
        let records = points
            .into_iter()
            .enumerate()
            .map(|(idx, point)| PixelRecord {
                id: idx as u64,
                point,
            })
            .collect();
        Self { records }
    }

    pub fn from_records(records: Vec<PixelRecord>) -> Self {
        Self { records }
    }

    /// Drops missing and out-of-range samples, counting each kind.
    pub fn filter_raw<I>(raws: I, missing: &MissingValue) -> (Self, FilterSummary)
    where
        I: IntoIterator<Item = RawPixel>,
    {
        let mut summary = FilterSummary::default();
        let mut records = Vec::new();

        for raw in raws {
            if missing.raw_is_missing(&raw) {
                summary.missing += 1;
                continue;
            }
            match GeoPoint::new(raw.lon, raw.lat) {
                Ok(point) => records.push(PixelRecord { id: raw.id, point }),
                Err(_) => summary.out_of_range += 1,
            }
        }

        summary.kept = records.len();
        (Self { records }, summary)
    }

    /// Strict ingestion: the first unfiltered sentinel or invalid sample fails
    /// the whole grid.
    pub fn try_from_raw<I>(raws: I, missing: &MissingValue) -> StudyResult<Self>
    where
        I: IntoIterator<Item = RawPixel>,
    {
        let records = raws
            .into_iter()
            .map(|raw| {
                if missing.raw_is_missing(&raw) {
                    return Err(StudyError::DataQuality(format!(
                        "pixel {} carries missing value ({}, {})",
                        raw.id, raw.lon, raw.lat
                    )));
                }
                GeoPoint::new(raw.lon, raw.lat).map(|point| PixelRecord { id: raw.id, point })
            })
            .collect::<StudyResult<Vec<_>>>()?;
        Ok(Self { records })
    }

    pub fn within_bounds(&self, bounds: &BoundingBox) -> Self {
        let records = self
            .records
            .iter()
            .filter(|record| bounds.contains(&record.point))
            .copied()
            .collect();
        Self { records }
    }

    pub fn records(&self) -> &[PixelRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PixelRecord> {
        self.records.iter()
    }
}
