use crate::external_connections::TransactableExternalConnectivity;
use crate::routing_utils::{CurrentUser, GenericErrorResponse, Json};
use crate::{AppState, SharedData, domain, dto, persistence};
use axum::Router;
use axum::extract::State;
use axum::response::ErrorResponse;
use axum::routing::get;
use log::info;
use std::sync::Arc;
use utoipa::OpenApi;

/// Defines the OpenAPI documentation for the dashboard API
#[derive(OpenApi)]
#[openapi(paths(get_dashboard))]
pub struct DashboardApi;

/// Constant used to group dashboard endpoints in OpenAPI documentation
pub const DASHBOARD_API_GROUP: &str = "Dashboard";

/// Number of recently updated tasks surfaced as the dashboard's activity feed
const RECENT_ACTIVITY_LIMIT: i64 = 3;

/// Builds a router for the routes under "/dashboard"
pub fn dashboard_routes() -> Router<Arc<SharedData>> {
    Router::new().route(
        "/dashboard",
        get(|State(app_state): AppState, user: CurrentUser| async move {
            let mut ext_cxn = app_state.ext_cxn.clone();
            let dashboard_service = domain::dashboard::DashboardService {};
            let task_service = domain::task::TaskService {};
            let list_service = domain::list::ListService {};

            get_dashboard(
                user,
                &mut ext_cxn,
                &dashboard_service,
                &task_service,
                &list_service,
            )
            .await
        }),
    )
}

#[utoipa::path(
    get,
    path = "/dashboard",
    tag = DASHBOARD_API_GROUP,
    responses(
        (status = 200, description = "The user's dashboard", body = dto::dashboard::DashboardPage),
        (status = 401, response = dto::err_resps::BasicError401),
        (status = 500, response = dto::err_resps::BasicError500),
    ),
)]
/// Assembles the requesting user's dashboard: aggregate list/task counts, the
/// most recently updated tasks, and the user's full set of lists and tasks
async fn get_dashboard(
    CurrentUser(user_id): CurrentUser,
    ext_cxn: &mut impl TransactableExternalConnectivity,
    dashboard_service: &impl domain::dashboard::driving_ports::DashboardPort,
    task_service: &impl domain::task::driving_ports::TaskPort,
    list_service: &impl domain::list::driving_ports::ListPort,
) -> Result<Json<dto::dashboard::DashboardPage>, ErrorResponse> {
    info!("Assembling the dashboard for user {user_id}");
    let stat_read = persistence::db_dashboard_driven_ports::DbStatReader {};
    let task_read = persistence::db_task_driven_ports::DbTaskReader {};
    let list_read = persistence::db_list_driven_ports::DbListReader {};

    let stats = dashboard_service
        .stats_for_user(user_id, &mut *ext_cxn, &stat_read)
        .await
        .map_err(GenericErrorResponse)?;
    let recent_tasks = task_service
        .recent_tasks(user_id, RECENT_ACTIVITY_LIMIT, &mut *ext_cxn, &task_read)
        .await
        .map_err(GenericErrorResponse)?;
    let lists = list_service
        .lists_for_user(user_id, &mut *ext_cxn, &list_read)
        .await
        .map_err(GenericErrorResponse)?;
    let tasks = task_service
        .all_tasks(user_id, &mut *ext_cxn, &task_read)
        .await
        .map_err(GenericErrorResponse)?;

    Ok(Json(dto::dashboard::DashboardPage {
        stats: dto::dashboard::DashboardStats::from(stats),
        recent_activities: recent_tasks
            .into_iter()
            .map(dto::task::Task::from)
            .collect(),
        lists: lists.into_iter().map(dto::list::TaskList::from).collect(),
        tasks: tasks.into_iter().map(dto::task::Task::from).collect(),
        flash: None,
    }))
}
