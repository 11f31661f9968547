use crate::domain;
use crate::dto::Flash;
use chrono::{DateTime, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// DTO for a returned task list on the API, carrying the number of tasks currently on it
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, PartialEq, Eq, Debug))]
pub struct TaskList {
    #[schema(example = 4)]
    pub id: i32,
    #[schema(example = "Groceries")]
    pub title: String,
    #[schema(example = "Weekly shop")]
    pub description: Option<String>,
    #[schema(example = 3)]
    pub tasks_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<domain::list::ListWithTaskCount> for TaskList {
    fn from(value: domain::list::ListWithTaskCount) -> Self {
        TaskList {
            id: value.list.id,
            title: value.list.title,
            description: value.list.description,
            tasks_count: value.task_count,
            created_at: value.list.created_at,
            updated_at: value.list.updated_at,
        }
    }
}

/// DTO for creating a new task list via the API
#[derive(Deserialize, Display, Validate, ToSchema)]
#[display("{title}")]
#[cfg_attr(test, derive(Serialize))]
pub struct NewList {
    #[validate(length(min = 1, max = 255))]
    #[schema(example = "Groceries")]
    pub title: String,
    pub description: Option<String>,
}

impl From<NewList> for domain::list::NewList {
    fn from(value: NewList) -> Self {
        domain::list::NewList {
            title: value.title,
            description: value.description,
        }
    }
}

/// DTO for updating a task list's content via the API
#[derive(Deserialize, Validate, ToSchema)]
#[cfg_attr(test, derive(Serialize))]
pub struct UpdateList {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    pub description: Option<String>,
}

impl From<UpdateList> for domain::list::UpdateList {
    fn from(value: UpdateList) -> Self {
        domain::list::UpdateList {
            title: value.title,
            description: value.description,
        }
    }
}

/// DTO for a newly created task list
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, Debug))]
pub struct InsertedList {
    #[schema(example = 5)]
    pub id: i32,
    pub flash: Flash,
}

/// Page payload for the list overview
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, Debug))]
pub struct ListsPage {
    pub lists: Vec<TaskList>,
    pub flash: Option<Flash>,
}
