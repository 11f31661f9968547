use crate::domain::task::driving_ports::TaskError;
use crate::dto::{Confirmation, Flash};
use crate::external_connections::TransactableExternalConnectivity;
use crate::routing_utils::{
    CurrentUser, GenericErrorResponse, Json, NotFoundErrorResponse, ValidationErrorResponse,
};
use crate::{AppState, SharedData, domain, dto, persistence};
use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::ErrorResponse;
use axum::routing::{delete, get, post, put};
use log::{error, info};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::{IntoParams, OpenApi};
use validator::Validate;

/// Defines the OpenAPI documentation for the task API
#[derive(OpenApi)]
#[openapi(paths(search_tasks, create_task, update_task, delete_task))]
pub struct TasksApi;

/// Constant used to group task endpoints in OpenAPI documentation
pub const TASK_API_GROUP: &str = "Tasks";

/// Number of tasks on one page of search results
const TASK_PAGE_SIZE: i64 = 10;

/// Builds a router for the routes under "/tasks"
pub fn task_routes() -> Router<Arc<SharedData>> {
    Router::new()
        .route(
            "/tasks",
            get(
                |State(app_state): AppState,
                 user: CurrentUser,
                 Query(search_params): Query<TaskSearchQuery>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let task_service = domain::task::TaskService {};
                    let list_service = domain::list::ListService {};

                    search_tasks(user, search_params, &mut ext_cxn, &task_service, &list_service)
                        .await
                },
            ),
        )
        .route(
            "/tasks",
            post(
                |State(app_state): AppState,
                 user: CurrentUser,
                 Json(new_task): Json<dto::task::NewTask>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let task_service = domain::task::TaskService {};

                    create_task(user, new_task, &mut ext_cxn, &task_service).await
                },
            ),
        )
        .route(
            "/tasks/:task_id",
            put(
                |State(app_state): AppState,
                 user: CurrentUser,
                 Path(task_id): Path<i32>,
                 Json(update): Json<dto::task::UpdateTask>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let task_service = domain::task::TaskService {};

                    update_task(user, task_id, update, &mut ext_cxn, &task_service).await
                },
            ),
        )
        .route(
            "/tasks/:task_id",
            delete(
                |State(app_state): AppState, user: CurrentUser, Path(task_id): Path<i32>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let task_service = domain::task::TaskService {};

                    delete_task(user, task_id, &mut ext_cxn, &task_service).await
                },
            ),
        )
}

/// Query parameters accepted by the task search endpoint
#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TaskSearchQuery {
    /// Case-insensitive substring matched against task titles
    pub search: Option<String>,
    /// One of "all", "completed", or "pending". Unrecognized values behave as "all".
    pub filter: Option<String>,
    /// 1-based page number, defaulting to the first page
    pub page: Option<i64>,
}

/// Maps a failure from the task domain onto the API's error responses. Tasks and
/// lists another user owns produce the same 404 a missing record would.
fn handle_task_error(err: TaskError) -> ErrorResponse {
    match err {
        TaskError::NotFound | TaskError::ListNotFound => NotFoundErrorResponse.into(),
        TaskError::PortError(port_err) => {
            error!("Encountered a problem during a task operation: {port_err}");
            GenericErrorResponse(port_err).into()
        }
    }
}

#[utoipa::path(
    get,
    path = "/tasks",
    tag = TASK_API_GROUP,
    params(TaskSearchQuery),
    responses(
        (status = 200, description = "A page of matching tasks", body = dto::task::TasksPage),
        (status = 401, response = dto::err_resps::BasicError401),
        (status = 500, response = dto::err_resps::BasicError500),
    ),
)]
/// Searches the requesting user's tasks, optionally filtered by title substring
/// and completion state, returning one page of results plus the user's lists
/// for the list picker
async fn search_tasks(
    CurrentUser(user_id): CurrentUser,
    search_params: TaskSearchQuery,
    ext_cxn: &mut impl TransactableExternalConnectivity,
    task_service: &impl domain::task::driving_ports::TaskPort,
    list_service: &impl domain::list::driving_ports::ListPort,
) -> Result<Json<dto::task::TasksPage>, ErrorResponse> {
    info!("Searching tasks for user {user_id}");
    let task_read = persistence::db_task_driven_ports::DbTaskReader {};
    let list_read = persistence::db_list_driven_ports::DbListReader {};

    let filter_echo = dto::task::TaskFilterEcho::new(search_params.search, search_params.filter);
    let search_criteria = filter_echo.search_criteria();

    let task_page = task_service
        .search_tasks(
            user_id,
            &search_criteria,
            search_params.page.unwrap_or(1),
            TASK_PAGE_SIZE,
            &mut *ext_cxn,
            &task_read,
        )
        .await
        .map_err(GenericErrorResponse)?;
    let lists = list_service
        .lists_for_user(user_id, &mut *ext_cxn, &list_read)
        .await
        .map_err(GenericErrorResponse)?;

    Ok(Json(dto::task::TasksPage {
        tasks: dto::task::PaginatedTasks::assemble(task_page, &filter_echo),
        lists: lists
            .into_iter()
            .map(|list| dto::task::TaskListRef {
                id: list.list.id,
                title: list.list.title,
            })
            .collect(),
        filter: filter_echo,
        flash: None,
    }))
}

#[utoipa::path(
    post,
    path = "/tasks",
    tag = TASK_API_GROUP,
    request_body = dto::task::NewTask,
    responses(
        (status = 201, description = "Task created successfully", body = dto::task::InsertedTask),
        (status = 400, response = dto::err_resps::BasicError400),
        (status = 401, response = dto::err_resps::BasicError401),
        (status = 404, response = dto::err_resps::BasicError404),
        (status = 500, response = dto::err_resps::BasicError500),
    ),
)]
/// Creates a new task on one of the requesting user's lists
async fn create_task(
    CurrentUser(user_id): CurrentUser,
    new_task: dto::task::NewTask,
    ext_cxn: &mut impl TransactableExternalConnectivity,
    task_service: &impl domain::task::driving_ports::TaskPort,
) -> Result<(StatusCode, Json<dto::task::InsertedTask>), ErrorResponse> {
    info!("Attempt to create task for user {user_id}: {new_task}");
    new_task.validate().map_err(ValidationErrorResponse::from)?;

    let list_detect = persistence::db_list_driven_ports::DbDetectList {};
    let task_write = persistence::db_task_driven_ports::DbTaskWriter {};
    let domain_task = domain::task::NewTask::from(new_task);

    let new_task_id = task_service
        .create_task(
            user_id,
            &domain_task,
            &mut *ext_cxn,
            &list_detect,
            &task_write,
        )
        .await
        .map_err(handle_task_error)?;

    Ok((
        StatusCode::CREATED,
        Json(dto::task::InsertedTask {
            id: new_task_id,
            flash: Flash::success("Task created successfully."),
        }),
    ))
}

#[utoipa::path(
    put,
    path = "/tasks/{task_id}",
    tag = TASK_API_GROUP,
    params(
        ("task_id" = i32, Path, description = "ID of the task to update"),
    ),
    request_body = dto::task::UpdateTask,
    responses(
        (status = 200, description = "Task updated successfully", body = Confirmation),
        (status = 400, response = dto::err_resps::BasicError400),
        (status = 401, response = dto::err_resps::BasicError401),
        (status = 404, response = dto::err_resps::BasicError404),
        (status = 500, response = dto::err_resps::BasicError500),
    ),
)]
/// Replaces the content of one of the requesting user's tasks, including its
/// completion state and which list it lives on
async fn update_task(
    CurrentUser(user_id): CurrentUser,
    task_id: i32,
    update: dto::task::UpdateTask,
    ext_cxn: &mut impl TransactableExternalConnectivity,
    task_service: &impl domain::task::driving_ports::TaskPort,
) -> Result<Json<Confirmation>, ErrorResponse> {
    info!("Updating task {task_id} for user {user_id}");
    update.validate().map_err(ValidationErrorResponse::from)?;

    let task_detect = persistence::db_task_driven_ports::DbDetectTask {};
    let list_detect = persistence::db_list_driven_ports::DbDetectList {};
    let task_write = persistence::db_task_driven_ports::DbTaskWriter {};
    let domain_update = domain::task::UpdateTask::from(update);

    task_service
        .update_task(
            user_id,
            task_id,
            &domain_update,
            &mut *ext_cxn,
            &task_detect,
            &list_detect,
            &task_write,
        )
        .await
        .map_err(handle_task_error)?;

    Ok(Json(Confirmation {
        flash: Flash::success("Task updated successfully."),
    }))
}

#[utoipa::path(
    delete,
    path = "/tasks/{task_id}",
    tag = TASK_API_GROUP,
    params(
        ("task_id" = i32, Path, description = "ID of the task to delete"),
    ),
    responses(
        (status = 200, description = "Task deleted successfully", body = Confirmation),
        (status = 401, response = dto::err_resps::BasicError401),
        (status = 404, response = dto::err_resps::BasicError404),
        (status = 500, response = dto::err_resps::BasicError500),
    ),
)]
/// Deletes one of the requesting user's tasks
async fn delete_task(
    CurrentUser(user_id): CurrentUser,
    task_id: i32,
    ext_cxn: &mut impl TransactableExternalConnectivity,
    task_service: &impl domain::task::driving_ports::TaskPort,
) -> Result<Json<Confirmation>, ErrorResponse> {
    info!("Deleting task {task_id} for user {user_id}");
    let task_detect = persistence::db_task_driven_ports::DbDetectTask {};
    let task_write = persistence::db_task_driven_ports::DbTaskWriter {};

    task_service
        .delete_task(user_id, task_id, &mut *ext_cxn, &task_detect, &task_write)
        .await
        .map_err(handle_task_error)?;

    Ok(Json(Confirmation {
        flash: Flash::success("Task deleted successfully."),
    }))
}
