use std::sync::Arc;
use std::time::Duration;

use dashboard::{
    build_stations, get_config_info, run_ui, AviationWeather, FusionEngine, FusionState,
    GovObservations, GridGeometry, GridRenderer, MetarMirror, Region, Scheduler,
};
use slog::info;
use tokio_util::sync::CancellationToken;
use wxgrid_core::{file_logger, level_from_str, HttpFetcher};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let cli = get_config_info();
    let logger = file_logger(&cli.log_file(), level_from_str(cli.level.as_deref()))?;

    info!(logger, "wxgrid dashboard starting...");
    info!(logger, "  Fetch delay: {} seconds", cli.fetch_delay());
    info!(logger, "  Mode hold: {} seconds", cli.mode_hold());
    info!(logger, "  Log file: {}", cli.log_file().display());

    let region = Region::default();
    let stations = build_stations(&region);
    info!(logger, "  Stations: {}", stations.len());
    let (state, changed) = FusionState::new(stations);

    let fetcher = Arc::new(HttpFetcher::new(logger.clone(), &cli.user_agent())?);
    let engine = FusionEngine::new(
        logger.clone(),
        Arc::new(AviationWeather::new(logger.clone(), fetcher.clone())),
        Arc::new(MetarMirror::new(logger.clone(), fetcher.clone())),
        Arc::new(GovObservations::new(logger.clone(), fetcher)),
    );

    let cancel = CancellationToken::new();
    let scheduler = Scheduler::new(
        logger.clone(),
        engine,
        state.clone(),
        Duration::from_secs(cli.fetch_delay()),
    );
    let poller = tokio::spawn(scheduler.run(cancel.child_token()));

    let renderer = GridRenderer::new(GridGeometry::default());
    let result = run_ui(
        logger.clone(),
        state,
        changed,
        renderer,
        time::Duration::seconds(cli.mode_hold() as i64),
    )
    .await;

    cancel.cancel();
    let _ = poller.await;
    info!(logger, "wxgrid dashboard stopped");
    result
}
