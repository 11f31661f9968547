use crate::domain;
use crate::dto::Flash;
use chrono::{DateTime, NaiveDate, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// Format accepted for task due dates
const DUE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Abbreviated reference to the list a task lives on
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, PartialEq, Eq, Debug))]
pub struct TaskListRef {
    #[schema(example = 4)]
    pub id: i32,
    #[schema(example = "Groceries")]
    pub title: String,
}

/// DTO for a returned task on the API
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, PartialEq, Eq, Debug))]
pub struct Task {
    #[schema(example = 10)]
    pub id: i32,
    #[schema(example = "Buy milk")]
    pub title: String,
    #[schema(example = "Two gallons")]
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub list: TaskListRef,
}

impl From<domain::task::TaskWithList> for Task {
    fn from(value: domain::task::TaskWithList) -> Self {
        Task {
            id: value.task.id,
            title: value.task.title,
            description: value.task.description,
            due_date: value.task.due_date,
            is_completed: value.task.is_completed,
            created_at: value.task.created_at,
            updated_at: value.task.updated_at,
            list: TaskListRef {
                id: value.task.list_id,
                title: value.list_title,
            },
        }
    }
}

/// Reports malformed due dates against the due_date field rather than failing
/// the whole body parse
fn valid_due_date(date_str: &str) -> Result<(), ValidationError> {
    if NaiveDate::parse_from_str(date_str, DUE_DATE_FORMAT).is_ok() {
        Ok(())
    } else {
        let mut date_error = ValidationError::new("invalid_date");
        date_error.message = Some("due dates must use the YYYY-MM-DD format".into());
        Err(date_error)
    }
}

/// Parses a due date which already passed validation
fn parse_due_date(date_str: Option<&str>) -> Option<NaiveDate> {
    date_str.and_then(|raw_date| NaiveDate::parse_from_str(raw_date, DUE_DATE_FORMAT).ok())
}

/// DTO for creating a new task via the API
#[derive(Deserialize, Display, Validate, ToSchema)]
#[display("{title} (list {list_id})")]
#[cfg_attr(test, derive(Serialize))]
pub struct NewTask {
    #[schema(example = 4)]
    pub list_id: i32,
    #[validate(length(min = 1, max = 255))]
    #[schema(example = "Buy milk")]
    pub title: String,
    pub description: Option<String>,
    #[validate(custom = "valid_due_date")]
    #[schema(example = "2026-09-01")]
    pub due_date: Option<String>,
    pub is_completed: Option<bool>,
}

impl From<NewTask> for domain::task::NewTask {
    fn from(value: NewTask) -> Self {
        domain::task::NewTask {
            list_id: value.list_id,
            title: value.title,
            description: value.description,
            due_date: parse_due_date(value.due_date.as_deref()),
            is_completed: value.is_completed.unwrap_or(false),
        }
    }
}

/// DTO for replacing a task's content via the API. Unlike [NewTask], the
/// completion flag is required so an update can never silently reset it.
#[derive(Deserialize, Validate, ToSchema)]
#[cfg_attr(test, derive(Serialize))]
pub struct UpdateTask {
    #[schema(example = 4)]
    pub list_id: i32,
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    pub description: Option<String>,
    #[validate(custom = "valid_due_date")]
    pub due_date: Option<String>,
    pub is_completed: bool,
}

impl From<UpdateTask> for domain::task::UpdateTask {
    fn from(value: UpdateTask) -> Self {
        domain::task::UpdateTask {
            list_id: value.list_id,
            title: value.title,
            description: value.description,
            due_date: parse_due_date(value.due_date.as_deref()),
            is_completed: value.is_completed,
        }
    }
}

/// DTO for a newly created task
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, Debug))]
pub struct InsertedTask {
    #[schema(example = 5)]
    pub id: i32,
    pub flash: Flash,
}

/// The search/filter parameters a task page was rendered with, echoed back so
/// the client can keep its controls in sync
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, PartialEq, Eq, Debug))]
pub struct TaskFilterEcho {
    #[schema(example = "milk")]
    pub search: String,
    #[schema(example = "pending")]
    pub filter: String,
}

impl TaskFilterEcho {
    pub fn new(search: Option<String>, filter: Option<String>) -> TaskFilterEcho {
        TaskFilterEcho {
            search: search.unwrap_or_default(),
            filter: filter.unwrap_or_else(|| "all".to_owned()),
        }
    }

    /// Translates the echoed parameters into domain search criteria. Unknown
    /// filter values degrade to "all" rather than failing the request.
    pub fn search_criteria(&self) -> domain::task::TaskFilters {
        domain::task::TaskFilters {
            search: if self.search.is_empty() {
                None
            } else {
                Some(self.search.clone())
            },
            completion: match self.filter.as_str() {
                "completed" => domain::task::CompletionFilter::Completed,
                "pending" => domain::task::CompletionFilter::Pending,
                _ => domain::task::CompletionFilter::All,
            },
        }
    }
}

/// One page of task search results in the pagination shape the front end consumes
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, Debug))]
pub struct PaginatedTasks {
    pub data: Vec<Task>,
    #[schema(example = 1)]
    pub current_page: i64,
    #[schema(example = 3)]
    pub last_page: i64,
    #[schema(example = 10)]
    pub per_page: i64,
    #[schema(example = 25)]
    pub total: i64,
    pub from: Option<i64>,
    pub to: Option<i64>,
    pub prev_page_url: Option<String>,
    pub next_page_url: Option<String>,
}

/// Query string for a task page link, serialized with the same parameter names
/// GET /tasks accepts
#[derive(Serialize)]
struct PageLinkQuery<'echo> {
    search: Option<&'echo str>,
    filter: &'echo str,
    page: i64,
}

fn page_url(page: i64, active_filters: &TaskFilterEcho) -> String {
    let query = PageLinkQuery {
        search: if active_filters.search.is_empty() {
            None
        } else {
            Some(&active_filters.search)
        },
        filter: &active_filters.filter,
        page,
    };
    let query_string = serde_urlencoded::to_string(&query).unwrap_or_default();

    format!("/tasks?{query_string}")
}

impl PaginatedTasks {
    /// Converts a page of search results into the wire shape, deriving the
    /// pagination bookkeeping and prev/next links. Links preserve the active
    /// search and filter parameters and are null at the respective edges.
    pub fn assemble(
        page: domain::task::TaskPage,
        active_filters: &TaskFilterEcho,
    ) -> PaginatedTasks {
        let last_page = if page.total == 0 {
            1
        } else {
            (page.total + page.page_size - 1) / page.page_size
        };
        let offset = (page.page - 1) * page.page_size;
        let (from, to) = if page.tasks.is_empty() {
            (None, None)
        } else {
            (Some(offset + 1), Some(offset + page.tasks.len() as i64))
        };
        let prev_page_url = (page.page > 1).then(|| page_url(page.page - 1, active_filters));
        let next_page_url =
            (page.page < last_page).then(|| page_url(page.page + 1, active_filters));

        PaginatedTasks {
            data: page.tasks.into_iter().map(Task::from).collect(),
            current_page: page.page,
            last_page,
            per_page: page.page_size,
            total: page.total,
            from,
            to,
            prev_page_url,
            next_page_url,
        }
    }
}

/// Page payload for the task search screen
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, Debug))]
pub struct TasksPage {
    pub tasks: PaginatedTasks,
    pub lists: Vec<TaskListRef>,
    pub filter: TaskFilterEcho,
    pub flash: Option<Flash>,
}
