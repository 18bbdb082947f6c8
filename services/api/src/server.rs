use crate::cli::ServeArgs;
use crate::infra::{
    default_plan_tiers, sample_listings, AppState, InMemoryBoostOrderRepository,
    InMemoryListingStore, InMemoryPlanCatalog, RecordingInvoiceEmitter,
};
use crate::routes::with_boost_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

use listing_boost::boost::BoostService;
use listing_boost::config::{AppConfig, AppEnvironment};
use listing_boost::error::AppError;
use listing_boost::telemetry;

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

    // The listing store and plan catalog are external systems; outside
    // production the in-memory stand-ins start seeded so the feed has
    // something to rank.
    let listings = if config.environment == AppEnvironment::Production {
        Arc::new(InMemoryListingStore::default())
    } else {
        Arc::new(InMemoryListingStore::with(sample_listings()))
    };
    let plans = Arc::new(InMemoryPlanCatalog::with(default_plan_tiers()));
    let orders = Arc::new(InMemoryBoostOrderRepository::default());
    let invoices = Arc::new(RecordingInvoiceEmitter::default());
    let boost_service = Arc::new(BoostService::new(listings, plans, orders, invoices));

    let app = with_boost_routes(boost_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "boost engine ready");

    axum::serve(listener, app).await?;
    Ok(())
}
