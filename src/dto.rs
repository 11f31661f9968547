pub mod dashboard;
pub mod list;
pub mod task;

use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

/// One-shot notification attached to a page or mutation response. The client
/// surfaces it once and then discards it.
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(serde::Deserialize, Debug, PartialEq, Eq))]
pub struct Flash {
    pub success: Option<String>,
    pub error: Option<String>,
}

impl Flash {
    /// Builds the success flash accompanying a completed mutation
    pub fn success(message: impl Into<String>) -> Flash {
        Flash {
            success: Some(message.into()),
            error: None,
        }
    }
}

/// Response body for mutations which have nothing to report beyond their flash message
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(serde::Deserialize, Debug))]
pub struct Confirmation {
    pub flash: Flash,
}

/// Reusable OpenAPI error response definitions referenced from API route annotations
pub mod err_resps {
    #[allow(unused_imports)]
    use crate::routing_utils::BasicErrorResponse;
    use utoipa::ToResponse;

    #[derive(ToResponse)]
    #[response(
        description = "Submitted data was invalid",
        example = json!({
            "error_code": "invalid_input",
            "error_description": "Submitted data was invalid.",
            "extra_info": {
                "title": [ { "code": "length", "message": null, "params": { "min": 1, "max": 255 } } ]
            }
        })
    )]
    pub struct BasicError400(BasicErrorResponse);

    #[derive(ToResponse)]
    #[response(
        description = "Request arrived without a usable user identity",
        example = json!({
            "error_code": "unauthenticated",
            "error_description": "This endpoint requires an authenticated user.",
            "extra_info": null
        })
    )]
    pub struct BasicError401(BasicErrorResponse);

    #[derive(ToResponse)]
    #[response(
        description = "Entity could not be found (or belongs to another user)",
        example = json!({
            "error_code": "not_found",
            "error_description": "The requested entity could not be found.",
            "extra_info": null
        })
    )]
    pub struct BasicError404(BasicErrorResponse);

    #[derive(ToResponse)]
    #[response(
        description = "Something unexpectedly went wrong during the request",
        example = json!({
            "error_code": "internal_error",
            "error_description": "Could not access data to complete your request",
            "extra_info": null
        })
    )]
    pub struct BasicError500(BasicErrorResponse);
}

/// Registers DTO schemas shared across the API's OpenAPI documentation
#[derive(OpenApi)]
#[openapi(components(
    schemas(
        Flash,
        Confirmation,
        crate::routing_utils::BasicErrorResponse,
        crate::routing_utils::ExtraInfo,
        crate::routing_utils::ValidationErrorSchema,
        list::TaskList,
        list::NewList,
        list::UpdateList,
        list::InsertedList,
        list::ListsPage,
        task::TaskListRef,
        task::Task,
        task::NewTask,
        task::UpdateTask,
        task::InsertedTask,
        task::PaginatedTasks,
        task::TaskFilterEcho,
        task::TasksPage,
        dashboard::DashboardStats,
        dashboard::DashboardPage,
    ),
    responses(
        err_resps::BasicError400,
        err_resps::BasicError401,
        err_resps::BasicError404,
        err_resps::BasicError500,
    )
))]
pub struct OpenApiSchemas;
