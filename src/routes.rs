use crate::{SharedData, api};
use axum::Router;
use axum::routing::get;
use log::info;
use std::sync::Arc;

/// Builds the application's router, attaching every group of API routes
pub fn application_routes() -> Router<Arc<SharedData>> {
    Router::new()
        .route("/", get(hello))
        .merge(api::dashboard::dashboard_routes())
        .merge(api::list::list_routes())
        .merge(api::task::task_routes())
}

/// Plain liveness route for load balancers and the curious
async fn hello() -> &'static str {
    info!("Hello");
    "Task list service is up and running!"
}
