use crate::cli::ServeArgs;
use crate::infra::{AppState, Community, InMemoryChatProvisioner, InMemoryStore};
use crate::routes::with_matching_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use skill_swap::config::AppConfig;
use skill_swap::error::AppError;
use skill_swap::matching::{MatchingError, MatchmakingService};
use skill_swap::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = if args.empty {
        InMemoryStore::default()
    } else {
        InMemoryStore::seeded().map_err(MatchingError::from)?
    };
    let store = Arc::new(store);
    let chats = Arc::new(InMemoryChatProvisioner::default());
    let community = Community {
        store: store.clone(),
        honor_multiplier: config.matching.honor_multiplier,
    };
    let service = Arc::new(MatchmakingService::new(
        store,
        chats,
        config.matching.clone(),
    ));

    let app = with_matching_routes(service, community)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, seeded = !args.empty, "skill swap matchmaker ready");

    axum::serve(listener, app).await?;
    Ok(())
}
