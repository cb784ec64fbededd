//! JSON API over a single generation run.
//!
//! The server starts generating as soon as it boots. Stage reports are pushed
//! to `/api/events` while the pipeline runs; the finished map, its statistics
//! and an export trigger are served once the run completes.

use std::{
    convert::Infallible,
    net::SocketAddr,
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
    time::Duration,
};

use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tokio::{net::TcpListener, sync::broadcast};
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};
use tracing::{error, info, warn};

use crate::{
    config::RunConfig,
    export::ExportWriter,
    generator::{GeneratedMap, Generator},
    height::HeightSource,
    pipeline::StageReport,
    stages::HeightThresholds,
    stats::{log_report, Report, StatisticsCoordinator},
};

#[derive(Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEvent {
    Stage(StageReport),
    Completed { cells: usize, cities: usize },
    Failed { message: String },
}

#[derive(Clone, Serialize)]
pub struct StateEnvelope {
    pub run: String,
    pub seed: u64,
    pub completed: bool,
    pub failed: Option<String>,
    pub thresholds: Option<HeightThresholds>,
    pub stages: Vec<StageReport>,
    pub cell_count: usize,
    pub city_count: usize,
}

#[derive(Default)]
struct RunOutcome {
    map: Option<GeneratedMap>,
    report: Option<Report>,
    stages: Vec<StageReport>,
    failed: Option<String>,
}

#[derive(Clone)]
struct AppState {
    broadcaster: broadcast::Sender<String>,
    outcome: Arc<Mutex<RunOutcome>>,
    run_name: String,
    seed: u64,
    export_dir: PathBuf,
    generation_done: Arc<AtomicBool>,
}

impl AppState {
    fn new(config: &RunConfig) -> Self {
        let (tx, _) = broadcast::channel::<String>(64);
        Self {
            broadcaster: tx,
            outcome: Arc::new(Mutex::new(RunOutcome::default())),
            run_name: config.name.clone(),
            seed: config.seed,
            export_dir: config.export.dir.clone(),
            generation_done: Arc::new(AtomicBool::new(false)),
        }
    }

    fn outcome(&self) -> MutexGuard<'_, RunOutcome> {
        self.outcome.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, event: &RunEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = self.broadcaster.send(payload);
        }
    }

    fn fail(&self, message: String) {
        error!(run = %self.run_name, %message, "generation failed");
        self.outcome().failed = Some(message.clone());
        self.generation_done.store(true, Ordering::SeqCst);
        self.publish(&RunEvent::Failed { message });
    }
}

pub struct WebServerConfig {
    pub run: RunConfig,
    pub host: String,
    pub port: u16,
}

pub async fn run(config: WebServerConfig) -> Result<()> {
    let WebServerConfig { run, host, port } = config;
    let state = Arc::new(AppState::new(&run));

    tokio::spawn(generate_in_background(run, state.clone()));

    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .with_context(|| format!("invalid listen address {host}:{port}"))?;
    info!("map API live at http://{addr} (Ctrl+C to stop)");

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/state", get(latest_state))
        .route("/api/cells", get(cells))
        .route("/api/stats", get(stats))
        .route("/api/export", post(export))
        .route("/api/events", get(stream_events))
        .with_state(state)
}

async fn generate_in_background(run: RunConfig, state: Arc<AppState>) {
    let heights = match HeightSource::load(&run.heights, &run.map, run.seed).await {
        Ok(heights) => heights,
        Err(err) => return state.fail(format!("{err}")),
    };
    let mut generator = match Generator::from_config(&run) {
        Ok(generator) => generator,
        Err(err) => return state.fail(format!("{err:#}")),
    };

    let state_for_run = state.clone();
    let handle = tokio::task::spawn_blocking(move || -> Result<(GeneratedMap, Report)> {
        let map = generator
            .generate_with_hook(&heights, |report| {
                state_for_run.outcome().stages.push(report.clone());
                state_for_run.publish(&RunEvent::Stage(report.clone()));
            })?
            .clone();
        let report = StatisticsCoordinator::with_default_collectors().generate(&map.cells);
        Ok((map, report))
    });

    match handle.await {
        Ok(Ok((map, report))) => {
            log_report(&report);
            let event = RunEvent::Completed {
                cells: map.cells.len(),
                cities: map.city_count(),
            };
            {
                let mut outcome = state.outcome();
                outcome.map = Some(map);
                outcome.report = Some(report);
            }
            state.generation_done.store(true, Ordering::SeqCst);
            state.publish(&event);
            info!(run = %state.run_name, "generation completed");
        }
        Ok(Err(err)) => state.fail(format!("{err:#}")),
        Err(err) => state.fail(format!("generation task failed: {err}")),
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutting down map API");
}

fn not_ready() -> Response {
    (StatusCode::SERVICE_UNAVAILABLE, "map not generated yet").into_response()
}

async fn latest_state(State(state): State<Arc<AppState>>) -> Json<StateEnvelope> {
    let outcome = state.outcome();
    let map = outcome.map.as_ref();
    Json(StateEnvelope {
        run: state.run_name.clone(),
        seed: state.seed,
        completed: state.generation_done.load(Ordering::SeqCst),
        failed: outcome.failed.clone(),
        thresholds: map.map(|m| m.thresholds),
        stages: outcome.stages.clone(),
        cell_count: map.map_or(0, |m| m.cells.len()),
        city_count: map.map_or(0, GeneratedMap::city_count),
    })
}

async fn cells(State(state): State<Arc<AppState>>) -> Response {
    match &state.outcome().map {
        Some(map) => Json(map.cells.clone()).into_response(),
        None => not_ready(),
    }
}

async fn stats(State(state): State<Arc<AppState>>) -> Response {
    match &state.outcome().report {
        Some(report) => Json(report.clone()).into_response(),
        None => not_ready(),
    }
}

#[derive(Serialize)]
struct ExportResponse {
    dir: PathBuf,
}

async fn export(State(state): State<Arc<AppState>>) -> Response {
    let (map, report) = {
        let outcome = state.outcome();
        match (&outcome.map, &outcome.report) {
            (Some(map), Some(report)) => (map.clone(), report.clone()),
            _ => return not_ready(),
        }
    };
    let writer = ExportWriter::new(&state.export_dir);
    match tokio::task::spawn_blocking(move || writer.write(&map, &report)).await {
        Ok(Ok(dir)) => Json(ExportResponse { dir }).into_response(),
        Ok(Err(err)) => {
            warn!(error = %err, "export failed");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
        }
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response(),
    }
}

async fn stream_events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.broadcaster.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|msg| match msg {
        Ok(payload) => Some(Ok(Event::default().data(payload))),
        Err(_) => None,
    });
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(2))
            .text("keep-alive"),
    )
}
