use axum::extract::FromRequestParts;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use axum_macros::FromRequest;

use serde::Serialize;
use utoipa::openapi::{RefOr, Schema};
use utoipa::{ToSchema, openapi};

use validator::ValidationErrors;

/// Header carrying the verified ID of the requesting user, injected by the
/// authentication layer in front of this service
pub const USER_ID_HEADER: &str = "x-user-id";

/// Contains diagnostic information about an API failure
#[derive(Serialize, Debug, ToSchema)]
#[schema(example = json!({
    "error_code": "not_found",
    "error_description": "The requested entity could not be found.",
    "extra_info": null
}))]
pub struct BasicErrorResponse {
    error_code: String,
    error_description: String,
    extra_info: Option<ExtraInfo>,
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(untagged)]
pub enum ExtraInfo {
    ValidationIssues(ValidationErrorSchema),
    Message(String),
}

/// Stand-in OpenAPI schema for [ValidationErrors] which just provides an empty object
#[derive(Serialize, Debug)]
#[serde(transparent)]
pub struct ValidationErrorSchema(ValidationErrors);

impl<'schem> ToSchema<'schem> for ValidationErrorSchema {
    fn schema() -> (&'schem str, RefOr<Schema>) {
        (
            "ValidationErrorSchema",
            openapi::ObjectBuilder::new().into(),
        )
    }
}

/// Response type for requests targeting an entity that doesn't exist or that the
/// requesting user doesn't own. Both cases produce the same body so the API never
/// reveals whether somebody else's record exists.
pub struct NotFoundErrorResponse;

impl IntoResponse for NotFoundErrorResponse {
    fn into_response(self) -> Response {
        (
            StatusCode::NOT_FOUND,
            Json(BasicErrorResponse {
                error_code: "not_found".into(),
                error_description: "The requested entity could not be found.".into(),
                extra_info: None,
            }),
        )
            .into_response()
    }
}

/// Response type for unexpected failures while communicating with external systems,
/// produced from the error the driving port surfaced
pub struct GenericErrorResponse(pub anyhow::Error);

impl IntoResponse for GenericErrorResponse {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(BasicErrorResponse {
                error_code: "internal_error".into(),
                error_description: "Could not access data to complete your request".into(),
                extra_info: None,
            }),
        )
            .into_response()
    }
}

/// Response type that wraps validation errors and turns them into [BasicErrorResponse]s
pub struct ValidationErrorResponse(ValidationErrors);

impl IntoResponse for ValidationErrorResponse {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            Json(BasicErrorResponse {
                error_code: "invalid_input".into(),
                error_description: "Submitted data was invalid.".to_owned(),
                extra_info: Some(ExtraInfo::ValidationIssues(ValidationErrorSchema(self.0))),
            }),
        )
            .into_response()
    }
}

impl From<ValidationErrors> for ValidationErrorResponse {
    fn from(value: ValidationErrors) -> Self {
        Self(value)
    }
}

/// The verified identity of the requesting user. Session handling lives in front of
/// this service, which only trusts the [USER_ID_HEADER] header that layer injects.
pub struct CurrentUser(pub i32);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = UnauthenticatedErrorResponse;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|header| header.to_str().ok())
            .and_then(|header_str| header_str.parse::<i32>().ok());

        match user_id {
            Some(id) => Ok(CurrentUser(id)),
            None => Err(UnauthenticatedErrorResponse),
        }
    }
}

/// Response type produced when a request arrives without a usable user identity
pub struct UnauthenticatedErrorResponse;

impl IntoResponse for UnauthenticatedErrorResponse {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(BasicErrorResponse {
                error_code: "unauthenticated".into(),
                error_description: "This endpoint requires an authenticated user.".into(),
                extra_info: None,
            }),
        )
            .into_response()
    }
}

/// Wrapper for [axum::Json] which customizes the error response to use our
/// data structure for API errors
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(JsonErrorResponse))]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Response type representing JSON parse errors
pub struct JsonErrorResponse {
    parse_problem: String,
}

impl From<JsonRejection> for JsonErrorResponse {
    fn from(value: JsonRejection) -> Self {
        JsonErrorResponse {
            parse_problem: value.body_text(),
        }
    }
}

impl IntoResponse for JsonErrorResponse {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            axum::Json(BasicErrorResponse {
                error_code: "invalid_json".into(),
                error_description:
                    "The passed request body contained malformed or unreadable JSON.".into(),
                extra_info: Some(ExtraInfo::Message(self.parse_problem)),
            }),
        )
            .into_response()
    }
}
