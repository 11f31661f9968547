use crate::domain::list::driving_ports::ListError;
use crate::dto::{Confirmation, Flash};
use crate::external_connections::TransactableExternalConnectivity;
use crate::routing_utils::{
    CurrentUser, GenericErrorResponse, Json, NotFoundErrorResponse, ValidationErrorResponse,
};
use crate::{AppState, SharedData, domain, dto, persistence};
use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::ErrorResponse;
use axum::routing::{delete, get, post, put};
use log::{error, info};
use std::sync::Arc;
use utoipa::OpenApi;
use validator::Validate;

/// Defines the OpenAPI documentation for the task list API
#[derive(OpenApi)]
#[openapi(paths(get_lists, create_list, update_list, delete_list))]
pub struct ListsApi;

/// Constant used to group task list endpoints in OpenAPI documentation
pub const LIST_API_GROUP: &str = "Lists";

/// Builds a router for the routes under "/lists"
pub fn list_routes() -> Router<Arc<SharedData>> {
    Router::new()
        .route(
            "/lists",
            get(
                |State(app_state): AppState, user: CurrentUser| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let list_service = domain::list::ListService {};

                    get_lists(user, &mut ext_cxn, &list_service).await
                },
            ),
        )
        .route(
            "/lists",
            post(
                |State(app_state): AppState,
                 user: CurrentUser,
                 Json(new_list): Json<dto::list::NewList>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let list_service = domain::list::ListService {};

                    create_list(user, new_list, &mut ext_cxn, &list_service).await
                },
            ),
        )
        .route(
            "/lists/:list_id",
            put(
                |State(app_state): AppState,
                 user: CurrentUser,
                 Path(list_id): Path<i32>,
                 Json(update): Json<dto::list::UpdateList>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let list_service = domain::list::ListService {};

                    update_list(user, list_id, update, &mut ext_cxn, &list_service).await
                },
            ),
        )
        .route(
            "/lists/:list_id",
            delete(
                |State(app_state): AppState, user: CurrentUser, Path(list_id): Path<i32>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let list_service = domain::list::ListService {};

                    delete_list(user, list_id, &mut ext_cxn, &list_service).await
                },
            ),
        )
}

/// Maps a failure from the list domain onto the API's error responses
fn handle_list_error(err: ListError) -> ErrorResponse {
    match err {
        ListError::NotFound => NotFoundErrorResponse.into(),
        ListError::PortError(port_err) => {
            error!("Encountered a problem during a list operation: {port_err}");
            GenericErrorResponse(port_err).into()
        }
    }
}

#[utoipa::path(
    get,
    path = "/lists",
    tag = LIST_API_GROUP,
    responses(
        (status = 200, description = "The user's task lists", body = dto::list::ListsPage),
        (status = 401, response = dto::err_resps::BasicError401),
        (status = 500, response = dto::err_resps::BasicError500),
    ),
)]
/// Retrieves every task list owned by the requesting user, including the
/// number of tasks currently on each one
async fn get_lists(
    CurrentUser(user_id): CurrentUser,
    ext_cxn: &mut impl TransactableExternalConnectivity,
    list_service: &impl domain::list::driving_ports::ListPort,
) -> Result<Json<dto::list::ListsPage>, ErrorResponse> {
    info!("Fetching task lists for user {user_id}");
    let list_read = persistence::db_list_driven_ports::DbListReader {};

    let lists = list_service
        .lists_for_user(user_id, &mut *ext_cxn, &list_read)
        .await
        .map_err(GenericErrorResponse)?;

    Ok(Json(dto::list::ListsPage {
        lists: lists.into_iter().map(dto::list::TaskList::from).collect(),
        flash: None,
    }))
}

#[utoipa::path(
    post,
    path = "/lists",
    tag = LIST_API_GROUP,
    request_body = dto::list::NewList,
    responses(
        (status = 201, description = "List created successfully", body = dto::list::InsertedList),
        (status = 400, response = dto::err_resps::BasicError400),
        (status = 401, response = dto::err_resps::BasicError401),
        (status = 500, response = dto::err_resps::BasicError500),
    ),
)]
/// Creates a new task list for the requesting user
async fn create_list(
    CurrentUser(user_id): CurrentUser,
    new_list: dto::list::NewList,
    ext_cxn: &mut impl TransactableExternalConnectivity,
    list_service: &impl domain::list::driving_ports::ListPort,
) -> Result<(StatusCode, Json<dto::list::InsertedList>), ErrorResponse> {
    info!("Attempt to create list for user {user_id}: {new_list}");
    new_list.validate().map_err(ValidationErrorResponse::from)?;

    let list_write = persistence::db_list_driven_ports::DbListWriter {};
    let domain_list = domain::list::NewList::from(new_list);

    let new_list_id = list_service
        .create_list(user_id, &domain_list, &mut *ext_cxn, &list_write)
        .await
        .map_err(|create_err| {
            error!("List create failure: {create_err}");
            GenericErrorResponse(create_err)
        })?;

    Ok((
        StatusCode::CREATED,
        Json(dto::list::InsertedList {
            id: new_list_id,
            flash: Flash::success("List created successfully."),
        }),
    ))
}

#[utoipa::path(
    put,
    path = "/lists/{list_id}",
    tag = LIST_API_GROUP,
    params(
        ("list_id" = i32, Path, description = "ID of the list to update"),
    ),
    request_body = dto::list::UpdateList,
    responses(
        (status = 200, description = "List updated successfully", body = Confirmation),
        (status = 400, response = dto::err_resps::BasicError400),
        (status = 401, response = dto::err_resps::BasicError401),
        (status = 404, response = dto::err_resps::BasicError404),
        (status = 500, response = dto::err_resps::BasicError500),
    ),
)]
/// Replaces the title and description of one of the requesting user's task lists
async fn update_list(
    CurrentUser(user_id): CurrentUser,
    list_id: i32,
    update: dto::list::UpdateList,
    ext_cxn: &mut impl TransactableExternalConnectivity,
    list_service: &impl domain::list::driving_ports::ListPort,
) -> Result<Json<Confirmation>, ErrorResponse> {
    info!("Updating list {list_id} for user {user_id}");
    update.validate().map_err(ValidationErrorResponse::from)?;

    let list_detect = persistence::db_list_driven_ports::DbDetectList {};
    let list_write = persistence::db_list_driven_ports::DbListWriter {};
    let domain_update = domain::list::UpdateList::from(update);

    list_service
        .update_list(
            user_id,
            list_id,
            &domain_update,
            &mut *ext_cxn,
            &list_detect,
            &list_write,
        )
        .await
        .map_err(handle_list_error)?;

    Ok(Json(Confirmation {
        flash: Flash::success("List updated successfully."),
    }))
}

#[utoipa::path(
    delete,
    path = "/lists/{list_id}",
    tag = LIST_API_GROUP,
    params(
        ("list_id" = i32, Path, description = "ID of the list to delete"),
    ),
    responses(
        (status = 200, description = "List deleted successfully", body = Confirmation),
        (status = 401, response = dto::err_resps::BasicError401),
        (status = 404, response = dto::err_resps::BasicError404),
        (status = 500, response = dto::err_resps::BasicError500),
    ),
)]
/// Deletes one of the requesting user's task lists along with every task on it
async fn delete_list(
    CurrentUser(user_id): CurrentUser,
    list_id: i32,
    ext_cxn: &mut impl TransactableExternalConnectivity,
    list_service: &impl domain::list::driving_ports::ListPort,
) -> Result<Json<Confirmation>, ErrorResponse> {
    info!("Deleting list {list_id} for user {user_id}");
    let list_detect = persistence::db_list_driven_ports::DbDetectList {};
    let task_write = persistence::db_task_driven_ports::DbTaskWriter {};
    let list_write = persistence::db_list_driven_ports::DbListWriter {};

    list_service
        .delete_list(
            user_id,
            list_id,
            &mut *ext_cxn,
            &list_detect,
            &task_write,
            &list_write,
        )
        .await
        .map_err(handle_list_error)?;

    Ok(Json(Confirmation {
        flash: Flash::success("List deleted successfully."),
    }))
}
