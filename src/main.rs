//! geofilter - Country-filtering HTTP server
//!
//! This is the composition root that wires together all the components.

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use geofilter::{
    load_config, with_geo_filter, CountryResolver, IpFilter, MaxMindCountryResolver, Policy,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing_subscriber::fmt::format::FmtSpan;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from environment
    let cfg = load_config()?;

    // Setup logging
    let log_level = if cfg.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_span_events(FmtSpan::CLOSE)
        .init();

    tracing::info!("starting geofilter listen={}", cfg.listen_addr);

    // ===== COMPOSITION ROOT =====

    // 1. Country resolver (MaxMind)
    let resolver = match MaxMindCountryResolver::from_file(&cfg.geoip_path) {
        Ok(r) => {
            tracing::info!(
                "GeoIP DB loaded from {} (type={}, build_epoch={})",
                cfg.geoip_path,
                r.database_type(),
                r.build_epoch()
            );
            Arc::new(r) as Arc<dyn CountryResolver>
        }
        Err(e) => {
            tracing::error!("failed to load GeoIP DB from {}: {:?}", cfg.geoip_path, e);
            return Err(e);
        }
    };

    // 2. Filter
    let filter = Arc::new(IpFilter::new(resolver, cfg.filter_options()?));
    tracing::info!("country policy: {}", filter.policy());

    // 3. Router
    let router = Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .with_state(filter.clone());
    let app = with_geo_filter(router, filter)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    let listener = TcpListener::bind(&cfg.listen_addr).await?;
    tracing::info!("listening on {}", cfg.listen_addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

async fn root_handler() -> &'static str {
    "ok"
}

async fn health_handler(State(filter): State<Arc<IpFilter>>) -> impl IntoResponse {
    let policy: &Policy = filter.policy();
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "policy": policy,
    }))
}
