use crate::domain;
use crate::domain::list::{ListWithTaskCount, NewList, TaskList, UpdateList};
use crate::external_connections::{ConnectionHandle, ExternalConnectivity};
use anyhow::{Context, Error};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, query, query_as};

pub struct DbListReader;

#[derive(FromRow)]
struct TaskListRow {
    id: i32,
    title: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    task_count: i64,
}

impl From<TaskListRow> for ListWithTaskCount {
    fn from(value: TaskListRow) -> Self {
        ListWithTaskCount {
            list: TaskList {
                id: value.id,
                title: value.title,
                description: value.description,
                created_at: value.created_at,
                updated_at: value.updated_at,
            },
            task_count: value.task_count,
        }
    }
}

impl domain::list::driven_ports::ListReader for DbListReader {
    async fn all_for_user(
        &self,
        user_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Vec<ListWithTaskCount>, Error> {
        let mut cxn = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let lists: Vec<ListWithTaskCount> = query_as::<_, TaskListRow>(
            // language=postgresql
            "
            SELECT tl.id, tl.title, tl.description, tl.created_at, tl.updated_at,
                   (SELECT count(*) FROM task t WHERE t.list_id = tl.id) AS task_count
            FROM task_list tl
            WHERE tl.user_id = $1
            ORDER BY tl.id
            ",
        )
        .bind(user_id)
        .fetch_all(cxn.borrow_connection())
        .await
        .context("trying to fetch task lists for a user")?
        .into_iter()
        .map(ListWithTaskCount::from)
        .collect();

        Ok(lists)
    }
}

pub struct DbDetectList;

impl domain::list::driven_ports::DetectList for DbDetectList {
    async fn list_owned_by(
        &self,
        list_id: i32,
        user_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<bool, Error> {
        let mut cxn = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let matching_lists = query_as::<_, super::Count>(
            // language=postgresql
            "SELECT count(*) AS count FROM task_list WHERE id = $1 AND user_id = $2",
        )
        .bind(list_id)
        .bind(user_id)
        .fetch_one(cxn.borrow_connection())
        .await
        .context("trying to verify ownership of a task list")?;

        Ok(matching_lists.count() > 0)
    }
}

pub struct DbListWriter;

impl domain::list::driven_ports::ListWriter for DbListWriter {
    async fn create_list(
        &self,
        user_id: i32,
        new_list: &NewList,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<i32, Error> {
        let mut cxn = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let new_id = query_as::<_, super::NewId>(
            // language=postgresql
            "INSERT INTO task_list(user_id, title, description) VALUES ($1, $2, $3) RETURNING task_list.id",
        )
        .bind(user_id)
        .bind(&new_list.title)
        .bind(&new_list.description)
        .fetch_one(cxn.borrow_connection())
        .await
        .context("trying to insert a new task list into the database")?;

        Ok(new_id.id)
    }

    async fn update_list(
        &self,
        list_id: i32,
        update: &UpdateList,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<(), Error> {
        let mut cxn = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        query(
            // language=postgresql
            "UPDATE task_list SET title = $1, description = $2, updated_at = now() WHERE id = $3",
        )
        .bind(&update.title)
        .bind(&update.description)
        .bind(list_id)
        .execute(cxn.borrow_connection())
        .await
        .context("trying to update a task list in the database")?;

        Ok(())
    }

    async fn delete_list(
        &self,
        list_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<(), Error> {
        let mut cxn = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        query("DELETE FROM task_list WHERE id = $1")
            .bind(list_id)
            .execute(cxn.borrow_connection())
            .await
            .context("trying to remove a task list from the database")?;

        Ok(())
    }
}
