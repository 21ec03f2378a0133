use crate::workflow::config::WorkflowConfig;
use anyhow::Context;
use log::{info, warn};
use sitecore::geo::{BufferZone, FilterSummary, GeoPoint, PixelGrid, Site};
use sitecore::processing::{
    BufferExtractor, NestedExtraction, ResolutionEstimator, ResolutionResult,
};
use sitecore::telemetry::MetricsRecorder;
use std::sync::Arc;

/// Loaded inputs for one study pass.
#[derive(Debug, Clone)]
pub struct StudyInput {
    pub sites: Vec<Site>,
    pub grid: PixelGrid,
    pub filter: FilterSummary,
}

/// Polygon rings for one site's near and far buffers.
#[derive(Debug, Clone)]
pub struct SiteOutline {
    pub site: String,
    pub near: Vec<GeoPoint>,
    pub far: Vec<GeoPoint>,
}

pub struct WorkflowResult {
    pub resolution: Vec<ResolutionResult>,
    pub extraction: NestedExtraction,
    pub outlines: Vec<SiteOutline>,
    pub filter: FilterSummary,
    pub candidates: usize,
}

#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
    metrics: Arc<MetricsRecorder>,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        Self {
            config,
            metrics: Arc::new(MetricsRecorder::new()),
        }
    }

    pub fn metrics(&self) -> &MetricsRecorder {
        &self.metrics
    }

    pub fn execute(&self, input: &StudyInput) -> anyhow::Result<WorkflowResult> {
        self.config.validate()?;
        let extraction_config = self.config.to_extraction_config()?;

        let resolution = ResolutionEstimator::new()
            .table(self.config.d_lat, self.config.d_lon, &self.config.latitudes)
            .context("estimating grid resolution")?;

        let grid = match self.config.bounds {
            Some(bounds) => input.grid.within_bounds(&bounds),
            None => input.grid.clone(),
        };
        if grid.len() < input.grid.len() {
            info!(
                "region of interest kept {}/{} pixels",
                grid.len(),
                input.grid.len()
            );
        }
        if input.sites.is_empty() {
            warn!("site table is empty, buffers will be empty");
        }

        let extractor = BufferExtractor::from(&extraction_config);
        let extraction = if self.config.parallel {
            NestedExtraction {
                near_radius: extraction_config.near_radius,
                far_radius: extraction_config.far_radius,
                metric: extraction_config.metric,
                near: extractor
                    .extract_parallel(&input.sites, grid.records(), extraction_config.near_radius)
                    .context("extracting near buffer")?,
                far: extractor
                    .extract_parallel(&input.sites, grid.records(), extraction_config.far_radius)
                    .context("extracting far buffer")?,
            }
        } else {
            extractor
                .extract_nested(
                    &input.sites,
                    grid.records(),
                    extraction_config.near_radius,
                    extraction_config.far_radius,
                )
                .context("extracting buffers")?
        };

        self.metrics.record_rejected(input.filter.rejected());
        self.metrics.record_pass(grid.len(), extraction.near.len());
        self.metrics.record_pass(grid.len(), extraction.far.len());

        let outlines = input
            .sites
            .iter()
            .map(|site| -> sitecore::StudyResult<SiteOutline> {
                let near = BufferZone::new(site.clone(), extraction.near_radius, extraction.metric)?
                    .outline(self.config.outline_vertices)?;
                let far = BufferZone::new(site.clone(), extraction.far_radius, extraction.metric)?
                    .outline(self.config.outline_vertices)?;
                Ok(SiteOutline {
                    site: site.label().to_string(),
                    near,
                    far,
                })
            })
            .collect::<sitecore::StudyResult<Vec<_>>>()
            .context("building buffer outlines")?;

        Ok(WorkflowResult {
            resolution,
            extraction,
            outlines,
            filter: input.filter,
            candidates: grid.len(),
        })
    }
}
