use crate::domain;
use crate::domain::list::driven_ports::DetectList;
use crate::domain::task::driven_ports::{DetectTask, TaskReader, TaskWriter};
use crate::domain::task::driving_ports::TaskError;
use crate::external_connections::{
    ExternalConnectivity, TransactableExternalConnectivity, TransactionHandle,
};
use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use log::error;
use thiserror::Error;

/// A unit of work on one of a user's task lists
#[derive(PartialEq, Eq, Debug)]
#[cfg_attr(test, derive(Clone))]
pub struct Task {
    pub id: i32,
    pub list_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A task annotated with the title of the list it lives on
#[derive(PartialEq, Eq, Debug)]
#[cfg_attr(test, derive(Clone))]
pub struct TaskWithList {
    pub task: Task,
    pub list_title: String,
}

#[cfg_attr(test, derive(Clone, Debug))]
pub struct NewTask {
    pub list_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub is_completed: bool,
}

/// Full-representation update for a task. Tasks may move between lists the
/// user owns, and completion is toggled through this same update.
#[cfg_attr(test, derive(Clone, Debug))]
pub struct UpdateTask {
    pub list_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub is_completed: bool,
}

/// Restricts a task search by completion state
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CompletionFilter {
    All,
    Completed,
    Pending,
}

impl CompletionFilter {
    pub fn accepts(&self, is_completed: bool) -> bool {
        match self {
            CompletionFilter::All => true,
            CompletionFilter::Completed => is_completed,
            CompletionFilter::Pending => !is_completed,
        }
    }
}

/// Criteria applied to a task search. An absent or empty search term matches
/// every title.
#[cfg_attr(test, derive(Clone, Debug))]
pub struct TaskFilters {
    pub search: Option<String>,
    pub completion: CompletionFilter,
}

/// One page of task search results along with the numbers needed to render
/// pagination controls. [page] is the 1-based page that was actually fetched.
#[derive(PartialEq, Eq, Debug)]
#[cfg_attr(test, derive(Clone))]
pub struct TaskPage {
    pub tasks: Vec<TaskWithList>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

pub mod driven_ports {
    use super::*;
    use crate::external_connections::ExternalConnectivity;

    pub trait TaskReader {
        /// Fetch one page of tasks belonging to the given user's lists, in primary key order
        async fn page_for_user(
            &self,
            user_id: i32,
            filters: &TaskFilters,
            offset: i64,
            limit: i64,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Vec<TaskWithList>, anyhow::Error>;

        /// Count every task of the given user matching the filters
        async fn count_for_user(
            &self,
            user_id: i32,
            filters: &TaskFilters,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<i64, anyhow::Error>;

        /// Fetch every task belonging to the given user's lists, in primary key order
        async fn all_for_user(
            &self,
            user_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Vec<TaskWithList>, anyhow::Error>;

        /// Fetch the user's most recently updated tasks, newest first
        async fn recently_updated(
            &self,
            user_id: i32,
            limit: i64,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Vec<TaskWithList>, anyhow::Error>;
    }

    pub trait DetectTask {
        /// Report whether the given task exists on a list belonging to the given user
        async fn task_owned_by(
            &self,
            task_id: i32,
            user_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<bool, anyhow::Error>;
    }

    pub trait TaskWriter {
        async fn create_task(
            &self,
            new_task: &NewTask,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<i32, anyhow::Error>;

        async fn update_task(
            &self,
            task_id: i32,
            update: &UpdateTask,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<(), anyhow::Error>;

        async fn delete_task(
            &self,
            task_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<(), anyhow::Error>;

        /// Remove every task on the given list, reporting how many were removed
        async fn delete_tasks_in_list(
            &self,
            list_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<u64, anyhow::Error>;
    }
}

/// Error produced when a task can't be confirmed to belong to the requesting user
#[derive(Debug, Error)]
pub(super) enum TaskOwnershipErr {
    #[error("task with ID {0} does not exist for the requesting user")]
    NotOwned(i32),

    #[error(transparent)]
    PortError(#[from] anyhow::Error),
}

/// Authorization predicate invoked by every task mutation. A task on somebody
/// else's list is indistinguishable from one that doesn't exist.
pub(super) async fn verify_task_owned(
    task_id: i32,
    user_id: i32,
    ext_cxn: &mut impl ExternalConnectivity,
    task_detect: &impl DetectTask,
) -> Result<(), TaskOwnershipErr> {
    let task_is_owned = task_detect
        .task_owned_by(task_id, user_id, &mut *ext_cxn)
        .await?;

    if task_is_owned {
        Ok(())
    } else {
        Err(TaskOwnershipErr::NotOwned(task_id))
    }
}


pub mod driving_ports {
    use super::*;
    use crate::external_connections::{ExternalConnectivity, TransactableExternalConnectivity};
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum TaskError {
        #[error("The requested task did not exist.")]
        NotFound,
        #[error("The targeted list did not exist.")]
        ListNotFound,
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }

    impl From<TaskOwnershipErr> for TaskError {
        fn from(value: TaskOwnershipErr) -> Self {
            match value {
                TaskOwnershipErr::NotOwned(task_id) => {
                    error!("Task {} didn't exist for the requesting user.", task_id);
                    TaskError::NotFound
                }
                TaskOwnershipErr::PortError(err) => {
                    TaskError::from(err.context("Verifying task ownership"))
                }
            }
        }
    }

    impl From<domain::list::ListOwnershipErr> for TaskError {
        fn from(value: domain::list::ListOwnershipErr) -> Self {
            match value {
                domain::list::ListOwnershipErr::NotOwned(list_id) => {
                    error!(
                        "List {} didn't exist for the user targeted by a task mutation.",
                        list_id
                    );
                    TaskError::ListNotFound
                }
                domain::list::ListOwnershipErr::PortError(err) => {
                    TaskError::from(err.context("Verifying list ownership for a task"))
                }
            }
        }
    }

    #[cfg(test)]
    #[allow(clippy::items_after_test_module)]
    mod task_error_clone {
        use crate::domain::task::driving_ports::TaskError;
        use anyhow::anyhow;

        impl Clone for TaskError {
            fn clone(&self) -> Self {
                match self {
                    Self::NotFound => Self::NotFound,
                    Self::ListNotFound => Self::ListNotFound,
                    Self::PortError(err) => Self::PortError(anyhow!(format!("{}", err))),
                }
            }
        }
    }

    pub trait TaskPort {
        async fn search_tasks(
            &self,
            user_id: i32,
            filters: &TaskFilters,
            page: i64,
            page_size: i64,
            ext_cxn: &mut impl ExternalConnectivity,
            task_read: &impl driven_ports::TaskReader,
        ) -> Result<TaskPage, anyhow::Error>;
        async fn all_tasks(
            &self,
            user_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
            task_read: &impl driven_ports::TaskReader,
        ) -> Result<Vec<TaskWithList>, anyhow::Error>;
        async fn recent_tasks(
            &self,
            user_id: i32,
            limit: i64,
            ext_cxn: &mut impl ExternalConnectivity,
            task_read: &impl driven_ports::TaskReader,
        ) -> Result<Vec<TaskWithList>, anyhow::Error>;
        async fn create_task(
            &self,
            user_id: i32,
            new_task: &NewTask,
            ext_cxn: &mut impl TransactableExternalConnectivity,
            list_detect: &impl domain::list::driven_ports::DetectList,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<i32, TaskError>;
        async fn update_task(
            &self,
            user_id: i32,
            task_id: i32,
            update: &UpdateTask,
            ext_cxn: &mut impl TransactableExternalConnectivity,
            task_detect: &impl driven_ports::DetectTask,
            list_detect: &impl domain::list::driven_ports::DetectList,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<(), TaskError>;
        async fn delete_task(
            &self,
            user_id: i32,
            task_id: i32,
            ext_cxn: &mut impl TransactableExternalConnectivity,
            task_detect: &impl driven_ports::DetectTask,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<(), TaskError>;
    }
}

pub struct TaskService {}

impl driving_ports::TaskPort for TaskService {
    async fn search_tasks(
        &self,
        user_id: i32,
        filters: &TaskFilters,
        page: i64,
        page_size: i64,
        ext_cxn: &mut impl ExternalConnectivity,
        task_read: &impl TaskReader,
    ) -> Result<TaskPage, anyhow::Error> {
        // Page numbers below 1 behave as page 1 rather than failing the request
        let page = page.max(1);
        let offset = (page - 1) * page_size;

        let tasks = task_read
            .page_for_user(user_id, filters, offset, page_size, &mut *ext_cxn)
            .await
            .context("fetching a page of tasks")?;
        let total = task_read
            .count_for_user(user_id, filters, &mut *ext_cxn)
            .await
            .context("counting matching tasks")?;

        Ok(TaskPage {
            tasks,
            total,
            page,
            page_size,
        })
    }

    async fn all_tasks(
        &self,
        user_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
        task_read: &impl TaskReader,
    ) -> Result<Vec<TaskWithList>, anyhow::Error> {
        let tasks_result = task_read.all_for_user(user_id, &mut *ext_cxn).await;
        if let Err(ref port_err) = tasks_result {
            error!("Task fetch failure: {port_err}");
        }

        tasks_result.context("Failed fetching tasks for user")
    }

    async fn recent_tasks(
        &self,
        user_id: i32,
        limit: i64,
        ext_cxn: &mut impl ExternalConnectivity,
        task_read: &impl TaskReader,
    ) -> Result<Vec<TaskWithList>, anyhow::Error> {
        let tasks_result = task_read
            .recently_updated(user_id, limit, &mut *ext_cxn)
            .await;
        if let Err(ref port_err) = tasks_result {
            error!("Recent activity fetch failure: {port_err}");
        }

        tasks_result.context("Failed fetching recent activity for user")
    }

    async fn create_task(
        &self,
        user_id: i32,
        new_task: &NewTask,
        ext_cxn: &mut impl TransactableExternalConnectivity,
        list_detect: &impl DetectList,
        task_write: &impl TaskWriter,
    ) -> Result<i32, TaskError> {
        let mut txn = ext_cxn
            .start_transaction()
            .await
            .context("starting task create transaction")?;

        domain::list::verify_list_owned(new_task.list_id, user_id, &mut txn, list_detect).await?;
        let created_task_id = task_write
            .create_task(new_task, &mut txn)
            .await
            .context("creating a task")?;

        txn.commit().await.context("committing task create")?;
        Ok(created_task_id)
    }

    async fn update_task(
        &self,
        user_id: i32,
        task_id: i32,
        update: &UpdateTask,
        ext_cxn: &mut impl TransactableExternalConnectivity,
        task_detect: &impl DetectTask,
        list_detect: &impl DetectList,
        task_write: &impl TaskWriter,
    ) -> Result<(), TaskError> {
        let mut txn = ext_cxn
            .start_transaction()
            .await
            .context("starting task update transaction")?;

        verify_task_owned(task_id, user_id, &mut txn, task_detect).await?;
        // A task may move between lists, but only to another list the user owns
        domain::list::verify_list_owned(update.list_id, user_id, &mut txn, list_detect).await?;
        task_write
            .update_task(task_id, update, &mut txn)
            .await
            .context("updating a task")?;

        txn.commit().await.context("committing task update")?;
        Ok(())
    }

    async fn delete_task(
        &self,
        user_id: i32,
        task_id: i32,
        ext_cxn: &mut impl TransactableExternalConnectivity,
        task_detect: &impl DetectTask,
        task_write: &impl TaskWriter,
    ) -> Result<(), TaskError> {
        let mut txn = ext_cxn
            .start_transaction()
            .await
            .context("starting task delete transaction")?;

        verify_task_owned(task_id, user_id, &mut txn, task_detect).await?;
        task_write
            .delete_task(task_id, &mut txn)
            .await
            .context("deleting a task")?;

        txn.commit().await.context("committing task delete")?;
        Ok(())
    }
}
