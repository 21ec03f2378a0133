use crate::report::model::StudyReport;
use crate::workflow::runner::{Runner, StudyInput};
use anyhow::{anyhow, Context};
use log::{error, info};
use serde_json::json;
use sitecore::geo::Site;
use std::{
    net::SocketAddr,
    sync::{mpsc, Arc, PoisonError, RwLock},
    thread,
};
use tokio::runtime::Builder;
use warp::{http::StatusCode, Filter, Rejection, Reply};

pub fn report_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 9000))
}

/// Publishes the latest study report over HTTP for an external map renderer.
///
/// `GET /report` returns the report; `POST /sites` with a site list re-runs
/// the extraction against the loaded pixel grid and replaces the report.
pub struct ReportBridge {
    state: Arc<RwLock<StudyReport>>,
    runner: Arc<Runner>,
    base: Arc<StudyInput>,
}

impl ReportBridge {
    pub fn new(runner: Arc<Runner>, base: Arc<StudyInput>) -> Self {
        Self {
            state: Arc::new(RwLock::new(StudyReport::default())),
            runner,
            base,
        }
    }

    pub fn routes(&self) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
        let state = self.state.clone();
        let state_filter = warp::any().map(move || state.clone());
        let runner = self.runner.clone();
        let runner_filter = warp::any().map(move || runner.clone());
        let base = self.base.clone();
        let base_filter = warp::any().map(move || base.clone());

        let get_route = warp::path("report")
            .and(warp::get())
            .and(state_filter.clone())
            .map(|state: Arc<RwLock<StudyReport>>| {
                let guard = state.read().unwrap_or_else(PoisonError::into_inner);
                warp::reply::json(&*guard)
            });

        let sites_route = warp::path("sites")
            .and(warp::post())
            .and(warp::body::json())
            .and(state_filter)
            .and(runner_filter)
            .and(base_filter)
            .map(
                |sites: Vec<Site>,
                 state: Arc<RwLock<StudyReport>>,
                 runner: Arc<Runner>,
                 base: Arc<StudyInput>| {
                    let input = StudyInput {
                        sites,
                        grid: base.grid.clone(),
                        filter: base.filter,
                    };
                    match runner.execute(&input) {
                        Ok(result) => {
                            let report = StudyReport::from_result(&result);
                            let reply = json!({
                                "status": "ok",
                                "near": report.near.len(),
                                "far": report.far.len(),
                            });
                            *state.write().unwrap_or_else(PoisonError::into_inner) = report;
                            warp::reply::with_status(warp::reply::json(&reply), StatusCode::OK)
                        }
                        Err(err) => {
                            error!("site update failed: {:#}", err);
                            warp::reply::with_status(
                                warp::reply::json(&json!({
                                    "status": "error",
                                    "message": format!("{:#}", err),
                                })),
                                StatusCode::UNPROCESSABLE_ENTITY,
                            )
                        }
                    }
                },
            );

        get_route.or(sites_route)
    }

    /// Binds `address` and serves the routes on a background thread. Returns
    /// once the listener is bound, so a taken port surfaces as an error here.
    pub fn serve(
        &self,
        address: SocketAddr,
    ) -> anyhow::Result<(SocketAddr, thread::JoinHandle<()>)> {
        let routes = self.routes();
        let (bound_tx, bound_rx) = mpsc::channel::<Result<SocketAddr, String>>();
        let handle = thread::spawn(move || {
            let runtime = match Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime,
                Err(err) => {
                    let _ = bound_tx.send(Err(format!("building runtime: {}", err)));
                    return;
                }
            };
            runtime.block_on(async move {
                match warp::serve(routes).try_bind_ephemeral(address) {
                    Ok((bound, server)) => {
                        let _ = bound_tx.send(Ok(bound));
                        server.await;
                    }
                    Err(err) => {
                        let _ = bound_tx.send(Err(format!("binding {}: {}", address, err)));
                    }
                }
            });
        });

        let bound = bound_rx
            .recv()
            .context("report bridge thread exited before binding")?
            .map_err(|err| {
                error!("report bridge failed: {}", err);
                anyhow!("report bridge failed: {}", err)
            })?;
        info!("report bridge listening on http://{}/report", bound);
        Ok((bound, handle))
    }

    pub fn publish(&self, report: &StudyReport) {
        let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
        *guard = report.clone();
        info!("[report] {}", guard.summary_line());
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> StudyReport {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
