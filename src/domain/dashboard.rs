use crate::domain::dashboard::driven_ports::StatReader;
use crate::external_connections::ExternalConnectivity;
use anyhow::Context;
use log::error;

/// Completion tally for a user's tasks. The overall task count is always
/// derived from this partition, so `total == completed + pending` holds by
/// construction.
#[derive(PartialEq, Eq, Debug)]
#[cfg_attr(test, derive(Clone, Copy))]
pub struct TaskTotals {
    pub completed: i64,
    pub pending: i64,
}

impl TaskTotals {
    pub fn total(&self) -> i64 {
        self.completed + self.pending
    }
}

/// Aggregate numbers shown on a user's dashboard
#[derive(PartialEq, Eq, Debug)]
#[cfg_attr(test, derive(Clone, Copy))]
pub struct DashboardStats {
    pub total_lists: i64,
    pub task_totals: TaskTotals,
}

pub mod driven_ports {
    use super::*;
    use crate::external_connections::ExternalConnectivity;

    pub trait StatReader {
        /// Count the lists the given user owns
        async fn list_count(
            &self,
            user_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<i64, anyhow::Error>;

        /// Tally the user's tasks, partitioned by completion state
        async fn task_totals(
            &self,
            user_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<TaskTotals, anyhow::Error>;
    }
}

pub mod driving_ports {
    use super::*;

    pub trait DashboardPort {
        async fn stats_for_user(
            &self,
            user_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
            stat_read: &impl driven_ports::StatReader,
        ) -> Result<DashboardStats, anyhow::Error>;
    }
}

pub struct DashboardService {}

impl driving_ports::DashboardPort for DashboardService {
    async fn stats_for_user(
        &self,
        user_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
        stat_read: &impl StatReader,
    ) -> Result<DashboardStats, anyhow::Error> {
        let total_lists = stat_read
            .list_count(user_id, &mut *ext_cxn)
            .await
            .context("counting a user's lists")?;
        let task_totals_result = stat_read.task_totals(user_id, &mut *ext_cxn).await;
        if let Err(ref port_err) = task_totals_result {
            error!("Task tally failure: {port_err}");
        }
        let task_totals = task_totals_result.context("tallying a user's tasks")?;

        Ok(DashboardStats {
            total_lists,
            task_totals,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::test_util::*;
    use super::*;
    use crate::domain::dashboard::driving_ports::DashboardPort;
    use crate::domain::test_util::Connectivity;
    use crate::external_connections;
    use speculoos::prelude::*;
    use std::sync::RwLock;

    #[tokio::test]
    async fn reports_stats_scoped_to_the_requesting_user() {
        let stat_persist = RwLock::new(InMemoryStatPersistence::new_with_stats(&[
            UserStats {
                user_id: 1,
                list_count: 2,
                totals: TaskTotals {
                    completed: 3,
                    pending: 4,
                },
            },
            UserStats {
                user_id: 2,
                list_count: 9,
                totals: TaskTotals {
                    completed: 9,
                    pending: 9,
                },
            },
        ]));
        let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();

        let stats = DashboardService {}
            .stats_for_user(1, &mut ext_cxn, &stat_persist)
            .await;
        assert_that!(stats).is_ok_containing(DashboardStats {
            total_lists: 2,
            task_totals: TaskTotals {
                completed: 3,
                pending: 4,
            },
        });
    }

    #[tokio::test]
    async fn total_tasks_is_the_sum_of_the_partition() {
        let totals = TaskTotals {
            completed: 7,
            pending: 5,
        };
        assert_that!(totals.total()).is_equal_to(12);
    }

    #[tokio::test]
    async fn reports_zeroes_for_a_user_with_no_data() {
        let stat_persist = InMemoryStatPersistence::new_locked();
        let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();

        let stats = DashboardService {}
            .stats_for_user(42, &mut ext_cxn, &stat_persist)
            .await;
        assert_that!(stats).is_ok_containing(DashboardStats {
            total_lists: 0,
            task_totals: TaskTotals {
                completed: 0,
                pending: 0,
            },
        });
    }

    #[tokio::test]
    async fn propagates_port_error() {
        let mut raw_persist = InMemoryStatPersistence::new();
        raw_persist.connected = Connectivity::Disconnected;
        let stat_persist = RwLock::new(raw_persist);
        let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();

        let stats = DashboardService {}
            .stats_for_user(1, &mut ext_cxn, &stat_persist)
            .await;
        assert_that!(stats).is_err();
    }
}
