use axum::extract::State;
use dotenv::dotenv;
use log::info;
use std::env;
use std::sync::Arc;
use tokio::net::TcpListener;

mod api;
mod app_env;
mod db;
mod domain;
mod dto;
mod external_connections;
#[cfg(test)]
mod integration_test;
mod logging;
mod persistence;
mod routes;
mod routing_utils;

/// Application state shared across request handlers
pub struct SharedData {
    pub ext_cxn: persistence::ExternalConnectivity,
}

/// Extractor alias for the state shared across request handlers
pub type AppState = State<Arc<SharedData>>;

#[tokio::main]
async fn main() {
    dotenv().ok();

    let env_filter = logging::init_env_filter();
    // Telemetry export only activates when both endpoints are configured, so the
    // service still runs without a collector sidecar
    let otel_exporters = match (
        env::var(app_env::OTEL_SPAN_EXPORT_URL),
        env::var(app_env::OTEL_METRIC_EXPORT_URL),
    ) {
        (Ok(span_url), Ok(metric_url)) => Some(logging::init_exporters(&span_url, &metric_url)),
        _ => None,
    };
    logging::setup_logging_and_tracing(env_filter, otel_exporters);

    let db_url = env::var(app_env::DB_URL).expect("Could not get database URL from environment");
    let sqlx_db = db::connect_sqlx(&db_url).await;
    db::run_migrations(&sqlx_db).await;

    let router = logging::attach_tracing_http(
        routes::application_routes().merge(api::swagger_main::build_documentation()),
    )
    .with_state(Arc::new(SharedData {
        ext_cxn: persistence::ExternalConnectivity::new(sqlx_db),
    }));

    let bind_addr = env::var(app_env::SERVER_BIND).unwrap_or_else(|_| "0.0.0.0:8080".to_owned());
    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("Failed to bind the server socket");

    info!("Starting server on {bind_addr}.");
    axum::serve(listener, router)
        .await
        .expect("Server failed while running");
}
