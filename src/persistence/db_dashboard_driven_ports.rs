use crate::domain;
use crate::domain::dashboard::TaskTotals;
use crate::external_connections::{ConnectionHandle, ExternalConnectivity};
use anyhow::{Context, Error};
use sqlx::{FromRow, query_as};

pub struct DbStatReader;

/// Result of a single tally query partitioning a user's tasks by completion state.
/// The counts typecheck as optional but `count(*) FILTER` always produces a value.
#[derive(FromRow)]
struct TallyRow {
    completed: Option<i64>,
    pending: Option<i64>,
}

impl From<TallyRow> for TaskTotals {
    fn from(value: TallyRow) -> Self {
        TaskTotals {
            completed: value.completed.unwrap_or(0),
            pending: value.pending.unwrap_or(0),
        }
    }
}

impl domain::dashboard::driven_ports::StatReader for DbStatReader {
    async fn list_count(
        &self,
        user_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<i64, Error> {
        let mut cxn = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let lists = query_as::<_, super::Count>(
            // language=postgresql
            "SELECT count(*) AS count FROM task_list WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(cxn.borrow_connection())
        .await
        .context("trying to count a user's task lists")?;

        Ok(lists.count())
    }

    async fn task_totals(
        &self,
        user_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<TaskTotals, Error> {
        let mut cxn = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let tally = query_as::<_, TallyRow>(
            // language=postgresql
            "
            SELECT count(*) FILTER (WHERE t.is_completed) AS completed,
                   count(*) FILTER (WHERE NOT t.is_completed) AS pending
            FROM task t
            JOIN task_list tl ON tl.id = t.list_id
            WHERE tl.user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_one(cxn.borrow_connection())
        .await
        .context("trying to tally a user's tasks by completion state")?;

        Ok(TaskTotals::from(tally))
    }
}
