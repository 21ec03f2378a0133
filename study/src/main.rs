use anyhow::{bail, Context};
use clap::Parser;
use loader::grid::load_grid;
use loader::sites::load_sites;
use loader::synthetic::build_grid;
use log::{info, warn};
use report::bridge::{report_bind_address, ReportBridge};
use report::export::{write_coordinates, write_report_json};
use report::model::StudyReport;
use sitecore::geo::PixelGrid;
use sitecore::math::DistanceMetric;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::WorkflowConfig;
use workflow::runner::{Runner, StudyInput};

mod loader;
mod report;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Satellite pixel / candidate site buffer study")]
struct Args {
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    /// Site table (.yaml, .json or .csv); overrides sites from the workflow
    #[arg(long)]
    sites: Option<PathBuf>,
    /// Pixel table with lon/lat columns
    #[arg(long)]
    grid: Option<PathBuf>,
    /// Use a seeded synthetic lattice instead of a pixel table
    #[arg(long, default_value_t = false)]
    synthetic: bool,
    #[arg(long)]
    near: Option<f64>,
    #[arg(long)]
    far: Option<f64>,
    /// Distance metric: haversine (km) or planar-degrees (deg)
    #[arg(long, value_parser = parse_metric)]
    metric: Option<DistanceMetric>,
    /// Directory receiving near/far coordinate lists and report.json
    #[arg(long, default_value = "output")]
    output: PathBuf,
    /// Spread per-pixel checks over all cores
    #[arg(long, default_value_t = false)]
    parallel: bool,
    /// Keep the report bridge alive for an external map renderer
    #[arg(long, default_value_t = false)]
    serve: bool,
}

fn parse_metric(value: &str) -> Result<DistanceMetric, String> {
    match value {
        "haversine" => Ok(DistanceMetric::Haversine),
        "planar-degrees" | "planar" => Ok(DistanceMetric::PlanarDegrees),
        other => Err(format!(
            "unknown metric '{}', expected haversine or planar-degrees",
            other
        )),
    }
}

/// Workflow file (or defaults) with command-line overrides on top. Radii left
/// unset fall back to 5 km / 10 km expressed in the chosen metric.
fn build_config(args: &Args) -> anyhow::Result<WorkflowConfig> {
    let mut config = match args.workflow.as_ref() {
        Some(path) => {
            let mut config = WorkflowConfig::load(path)?;
            if let Some(metric) = args.metric {
                config.metric = metric;
            }
            if args.near.is_some() {
                config.near_radius = args.near;
            }
            if args.far.is_some() {
                config.far_radius = args.far;
            }
            config
        }
        None => WorkflowConfig::from_args(args.near, args.far, args.metric.unwrap_or_default()),
    };
    config.parallel |= args.parallel;
    config.validate()?;
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let workflow_config = build_config(&args)?;

    let sites = match args.sites.as_ref() {
        Some(path) => load_sites(path)?,
        None => workflow_config.sites.clone(),
    };
    if sites.is_empty() {
        warn!("no sites configured; pass --sites or list them in the workflow");
    }

    let missing = workflow_config.missing_value();
    let (grid, filter) = match (args.grid.as_ref(), args.synthetic) {
        (Some(path), _) => {
            let loaded = load_grid(path, &missing)?;
            (loaded.grid, loaded.summary)
        }
        (None, true) => {
            let raws = build_grid(&workflow_config.synthetic, &missing)
                .context("building synthetic pixel grid")?;
            PixelGrid::filter_raw(raws, &missing)
        }
        (None, false) => bail!("no pixel grid: pass --grid <file> or --synthetic"),
    };
    info!(
        "pixel grid ready: {} kept, {} missing, {} out of range",
        filter.kept, filter.missing, filter.out_of_range
    );

    let input = Arc::new(StudyInput {
        sites,
        grid,
        filter,
    });
    let runner = Arc::new(Runner::new(workflow_config));
    let result = runner.execute(&input)?;
    let report = StudyReport::from_result(&result);

    for row in &report.resolution {
        println!(
            "resolution at lat {:.2}: NS {:.3} km, WE {:.3} km",
            row.lat, row.ns_km, row.we_km
        );
    }
    println!("{}", report.summary_line());

    write_coordinates(args.output.join("near_pixels.csv"), &report.near)?;
    write_coordinates(args.output.join("far_pixels.csv"), &report.far)?;
    write_report_json(args.output.join("report.json"), &report)?;

    let metrics = runner.metrics().snapshot();
    info!(
        "passes {}, scanned {}, matched {}, rejected {}",
        metrics.passes, metrics.scanned, metrics.matched, metrics.rejected
    );

    if args.serve {
        let bridge = ReportBridge::new(runner.clone(), input.clone());
        bridge.publish(&report);
        let (bound, _server) = bridge
            .serve(report_bind_address())
            .context("starting report bridge")?;
        println!("report bridge on http://{}/report (Ctrl+C to stop)", bound);
        let runtime = TokioBuilder::new_current_thread()
            .enable_all()
            .build()
            .context("creating runtime for signal handling")?;
        runtime.block_on(async {
            signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
            Ok::<(), anyhow::Error>(())
        })?;
    }

    Ok(())
}
