use crate::domain;
use crate::domain::list::driven_ports::{DetectList, ListReader, ListWriter};
use crate::domain::list::driving_ports::ListError;
use crate::external_connections::{
    ExternalConnectivity, TransactableExternalConnectivity, TransactionHandle,
};
use anyhow::Context;
use chrono::{DateTime, Utc};
use log::error;
use thiserror::Error;

/// A list of tasks owned by a single user
#[derive(PartialEq, Eq, Debug)]
#[cfg_attr(test, derive(Clone))]
pub struct TaskList {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A task list along with the number of tasks currently on it
#[derive(PartialEq, Eq, Debug)]
#[cfg_attr(test, derive(Clone))]
pub struct ListWithTaskCount {
    pub list: TaskList,
    pub task_count: i64,
}

#[cfg_attr(test, derive(Clone, Debug))]
pub struct NewList {
    pub title: String,
    pub description: Option<String>,
}

#[cfg_attr(test, derive(Clone, Debug))]
pub struct UpdateList {
    pub title: String,
    pub description: Option<String>,
}

pub mod driven_ports {
    use super::*;
    use crate::external_connections::ExternalConnectivity;

    pub trait ListReader {
        /// Fetch every list the given user owns, in primary key order
        async fn all_for_user(
            &self,
            user_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Vec<ListWithTaskCount>, anyhow::Error>;
    }

    pub trait DetectList {
        /// Report whether the given list exists and belongs to the given user
        async fn list_owned_by(
            &self,
            list_id: i32,
            user_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<bool, anyhow::Error>;
    }

    pub trait ListWriter {
        async fn create_list(
            &self,
            user_id: i32,
            new_list: &NewList,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<i32, anyhow::Error>;

        async fn update_list(
            &self,
            list_id: i32,
            update: &UpdateList,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<(), anyhow::Error>;

        async fn delete_list(
            &self,
            list_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<(), anyhow::Error>;
    }
}

/// Error produced when a list can't be confirmed to belong to the requesting user
#[derive(Debug, Error)]
pub(super) enum ListOwnershipErr {
    #[error("list with ID {0} does not exist for the requesting user")]
    NotOwned(i32),

    #[error(transparent)]
    PortError(#[from] anyhow::Error),
}

/// Authorization predicate shared by every operation touching a list or its tasks.
/// A list owned by somebody else is indistinguishable from one that doesn't exist.
pub(super) async fn verify_list_owned(
    list_id: i32,
    user_id: i32,
    ext_cxn: &mut impl ExternalConnectivity,
    list_detect: &impl DetectList,
) -> Result<(), ListOwnershipErr> {
    let list_is_owned = list_detect
        .list_owned_by(list_id, user_id, &mut *ext_cxn)
        .await?;

    if list_is_owned {
        Ok(())
    } else {
        Err(ListOwnershipErr::NotOwned(list_id))
    }
}

#[cfg(test)]
mod verify_list_owned_tests {
    use super::*;
    use crate::domain::test_util::Connectivity;
    use crate::external_connections;
    use speculoos::prelude::*;
    use std::sync::RwLock;

    #[tokio::test]
    async fn detects_owned_list() {
        let list_persist = RwLock::new(test_util::InMemoryListPersistence::new_with_lists(&[
            test_util::NewListWithOwner {
                owner: 1,
                list: test_util::list_create_default(),
            },
        ]));
        let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();

        let owned_result = verify_list_owned(1, 1, &mut ext_cxn, &list_persist).await;
        assert_that!(owned_result).is_ok();
    }

    #[tokio::test]
    async fn rejects_list_owned_by_somebody_else() {
        let list_persist = RwLock::new(test_util::InMemoryListPersistence::new_with_lists(&[
            test_util::NewListWithOwner {
                owner: 2,
                list: test_util::list_create_default(),
            },
        ]));
        let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();

        let owned_result = verify_list_owned(1, 1, &mut ext_cxn, &list_persist).await;
        assert_that!(owned_result)
            .is_err()
            .matches(|err| matches!(err, ListOwnershipErr::NotOwned(1)));
    }

    #[tokio::test]
    async fn rejects_nonexistent_list() {
        let list_persist = test_util::InMemoryListPersistence::new_locked();
        let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();

        let owned_result = verify_list_owned(14, 1, &mut ext_cxn, &list_persist).await;
        assert_that!(owned_result)
            .is_err()
            .matches(|err| matches!(err, ListOwnershipErr::NotOwned(14)));
    }

    #[tokio::test]
    async fn propagates_port_error() {
        let mut raw_persist = test_util::InMemoryListPersistence::new();
        raw_persist.connected = Connectivity::Disconnected;
        let list_persist = RwLock::new(raw_persist);
        let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();

        let owned_result = verify_list_owned(1, 1, &mut ext_cxn, &list_persist).await;
        assert_that!(owned_result)
            .is_err()
            .matches(|err| matches!(err, ListOwnershipErr::PortError(_)));
    }
}

pub mod driving_ports {
    use super::*;
    use crate::external_connections::{ExternalConnectivity, TransactableExternalConnectivity};
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum ListError {
        #[error("The requested list did not exist.")]
        NotFound,
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }

    impl From<ListOwnershipErr> for ListError {
        fn from(value: ListOwnershipErr) -> Self {
            match value {
                ListOwnershipErr::NotOwned(list_id) => {
                    error!("List {} didn't exist for the requesting user.", list_id);
                    ListError::NotFound
                }
                ListOwnershipErr::PortError(err) => {
                    ListError::from(err.context("Verifying list ownership"))
                }
            }
        }
    }


    pub trait ListPort {
        async fn lists_for_user(
            &self,
            user_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
            list_read: &impl driven_ports::ListReader,
        ) -> Result<Vec<ListWithTaskCount>, anyhow::Error>;
        async fn create_list(
            &self,
            user_id: i32,
            new_list: &NewList,
            ext_cxn: &mut impl ExternalConnectivity,
            list_write: &impl driven_ports::ListWriter,
        ) -> Result<i32, anyhow::Error>;
        async fn update_list(
            &self,
            user_id: i32,
            list_id: i32,
            update: &UpdateList,
            ext_cxn: &mut impl TransactableExternalConnectivity,
            list_detect: &impl driven_ports::DetectList,
            list_write: &impl driven_ports::ListWriter,
        ) -> Result<(), ListError>;
        async fn delete_list(
            &self,
            user_id: i32,
            list_id: i32,
            ext_cxn: &mut impl TransactableExternalConnectivity,
            list_detect: &impl driven_ports::DetectList,
            task_write: &impl domain::task::driven_ports::TaskWriter,
            list_write: &impl driven_ports::ListWriter,
        ) -> Result<(), ListError>;
    }
}

pub struct ListService {}

impl driving_ports::ListPort for ListService {
    async fn lists_for_user(
        &self,
        user_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
        list_read: &impl ListReader,
    ) -> Result<Vec<ListWithTaskCount>, anyhow::Error> {
        let lists_result = list_read.all_for_user(user_id, &mut *ext_cxn).await;
        if let Err(ref port_err) = lists_result {
            error!("List fetch failure: {port_err}");
        }

        lists_result.context("Failed fetching lists for user")
    }

    async fn create_list(
        &self,
        user_id: i32,
        new_list: &NewList,
        ext_cxn: &mut impl ExternalConnectivity,
        list_write: &impl ListWriter,
    ) -> Result<i32, anyhow::Error> {
        let created_list_id = list_write
            .create_list(user_id, new_list, &mut *ext_cxn)
            .await
            .context("creating a list")?;

        Ok(created_list_id)
    }

    async fn update_list(
        &self,
        user_id: i32,
        list_id: i32,
        update: &UpdateList,
        ext_cxn: &mut impl TransactableExternalConnectivity,
        list_detect: &impl DetectList,
        list_write: &impl ListWriter,
    ) -> Result<(), ListError> {
        let mut txn = ext_cxn
            .start_transaction()
            .await
            .context("starting list update transaction")?;

        verify_list_owned(list_id, user_id, &mut txn, list_detect).await?;
        list_write
            .update_list(list_id, update, &mut txn)
            .await
            .context("updating a list")?;

        txn.commit().await.context("committing list update")?;
        Ok(())
    }

    async fn delete_list(
        &self,
        user_id: i32,
        list_id: i32,
        ext_cxn: &mut impl TransactableExternalConnectivity,
        list_detect: &impl DetectList,
        task_write: &impl domain::task::driven_ports::TaskWriter,
        list_write: &impl ListWriter,
    ) -> Result<(), ListError> {
        let mut txn = ext_cxn
            .start_transaction()
            .await
            .context("starting list delete transaction")?;

        verify_list_owned(list_id, user_id, &mut txn, list_detect).await?;

        // Tasks go first so the list's foreign key never dangles mid-transaction
        let removed_tasks = task_write
            .delete_tasks_in_list(list_id, &mut txn)
            .await
            .context("cascading task delete for a list")?;
        list_write
            .delete_list(list_id, &mut txn)
            .await
            .context("deleting a list")?;

        txn.commit().await.context("committing list delete")?;
        log::info!("Deleted list {list_id} along with {removed_tasks} of its tasks");
        Ok(())
    }
}
