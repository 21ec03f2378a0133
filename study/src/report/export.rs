use crate::report::model::{ExtractedPoint, StudyReport};
use anyhow::Context;
use std::fs::{self, File};
use std::path::Path;

/// Writes `id,lon,lat,site,distance` rows for external data retrieval.
pub fn write_coordinates<P: AsRef<Path>>(path: P, points: &[ExtractedPoint]) -> anyhow::Result<()> {
    let path_ref = path.as_ref();
    ensure_parent(path_ref)?;
    let mut writer = csv::Writer::from_path(path_ref)
        .with_context(|| format!("creating coordinate list {}", path_ref.display()))?;
    for point in points {
        writer
            .serialize(point)
            .with_context(|| format!("writing coordinate list {}", path_ref.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("flushing coordinate list {}", path_ref.display()))?;
    Ok(())
}

pub fn write_report_json<P: AsRef<Path>>(path: P, report: &StudyReport) -> anyhow::Result<()> {
    let path_ref = path.as_ref();
    ensure_parent(path_ref)?;
    let file = File::create(path_ref)
        .with_context(|| format!("creating report {}", path_ref.display()))?;
    serde_json::to_writer_pretty(file, report)
        .with_context(|| format!("writing report {}", path_ref.display()))?;
    Ok(())
}

fn ensure_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory {}", parent.display()))?;
    }
    Ok(())
}
