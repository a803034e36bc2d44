mod demo;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use axum_prometheus::PrometheusMetricLayer;
use chrono::{Duration, Utc};
use clap::{Args, Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

use turnover_ops::config::AppConfig;
use turnover_ops::error::AppError;
use turnover_ops::telemetry;
use turnover_ops::workflows::turnover::{
    turnover_router, AssignmentRanker, CalendarSyncService, ChecklistEntry, EvidenceStatus,
    EvidenceSubmission, JobId, MemoryStore, PayoutReleaseBatch, PreAuthBatch, PropertyId,
    RankingOptions, RepositoryError, SettlementEngine, TurnoverApi, TurnoverError,
    TurnoverService,
};

#[derive(Clone)]
struct AppState {
    readiness: Arc<AtomicBool>,
    metrics: PrometheusHandle,
}

#[derive(Parser, Debug)]
#[command(
    name = "Turnover Operations",
    about = "Run the turnover coordination service or walk the settlement pipeline from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Walk one job through ingestion, assignment, settlement, and payout
    /// against a seeded in-memory store
    Demo,
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => run_server(args).await,
        Command::Demo => run_demo(),
    }
}

async fn run_server(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let state = AppState {
        readiness: readiness_flag.clone(),
        metrics: prometheus_handle,
    };

    let store = Arc::new(MemoryStore::new());
    demo::seed(&store);
    let gateway = Arc::new(demo::DemoGateway::default());
    let api = TurnoverApi {
        service: Arc::new(TurnoverService::new(store.clone())),
        settlement: Arc::new(SettlementEngine::new(store, gateway)),
    };

    let ops = Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .with_state(state);

    let app = ops.merge(turnover_router(api)).layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "turnover operations service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

async fn healthcheck() -> impl IntoResponse {
    StatusCode::OK
}

async fn readiness_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    if state.readiness.load(Ordering::Acquire) {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Run every batch in pipeline order against a seeded in-memory store and
/// print each report, so the whole flow is visible end to end.
fn run_demo() -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let now = Utc::now();
    let store = Arc::new(MemoryStore::new());
    demo::seed(&store);

    let feed = Arc::new(demo::CannedFeed::for_tomorrow(now));
    let gateway = Arc::new(demo::DemoGateway::default());
    let pricing = Arc::new(demo::FlatPricing {
        total_per_clean_cents: 18_500,
    });
    let geocoder = Arc::new(demo::GridGeocoder);

    let sync = CalendarSyncService::with_chunk_size(
        store.clone(),
        feed,
        config.batch.ingestion_chunk_size,
    );
    let sweep = sync.sync_all().map_err(repository_error)?;
    print_report("calendar sync", &sweep);

    let ranker = AssignmentRanker::with_options(
        store.clone(),
        geocoder,
        RankingOptions {
            radius_miles: config.batch.assignment_radius_miles,
            exclude_on_job: false,
        },
    );
    let service = TurnoverService::new(store.clone());

    let job_id = JobId("job-demo-stay-001".to_string());
    let property_id = PropertyId("prop-shorehouse".to_string());

    let candidates = ranker.ranked_candidates(&property_id)?;
    print_report("ranked candidates", &candidates);

    let Some(best) = candidates.first() else {
        println!("no cleaners within radius; stopping demo");
        return Ok(());
    };
    service.assign_primary(&job_id, &best.cleaner.id)?;

    // Nightly batch runs against the scheduled check-out day.
    let preauth = PreAuthBatch::new(store.clone(), gateway.clone(), pricing);
    let preauth_report = preauth
        .run((now + Duration::days(1)).date_naive())
        .map_err(repository_error)?;
    print_report("pre-authorization", &preauth_report);

    service.check_in(&job_id, now)?;
    service.record_evidence(
        &job_id,
        EvidenceSubmission {
            photo_urls: vec!["https://cdn.example/demo/after.jpg".to_string()],
            checklist_log: vec![ChecklistEntry {
                task: "Strip and remake beds".to_string(),
                done: true,
            }],
            is_checklist_complete: true,
            status: EvidenceStatus::Complete,
        },
    )?;
    service.check_out(&job_id, now + Duration::hours(4))?;

    let settlement = SettlementEngine::new(store.clone(), gateway.clone());
    let outcome = settlement.capture_and_settle(&job_id, now + Duration::hours(5))?;
    print_report("settlement", &outcome);

    let release = PayoutReleaseBatch::new(store, gateway);
    let release_report = release.run().map_err(repository_error)?;
    print_report("payout release", &release_report);

    Ok(())
}

fn repository_error(error: RepositoryError) -> AppError {
    AppError::Turnover(TurnoverError::Repository(error))
}

fn print_report<T: serde::Serialize>(title: &str, report: &T) {
    match serde_json::to_string_pretty(report) {
        Ok(rendered) => println!("== {title}\n{rendered}"),
        Err(err) => eprintln!("failed to render {title} report: {err}"),
    }
}
