use crate::domain;
use crate::domain::task::{
    CompletionFilter, NewTask, Task, TaskFilters, TaskWithList, UpdateTask,
};
use crate::external_connections::{ConnectionHandle, ExternalConnectivity};
use anyhow::{Context, Error};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgArguments;
use sqlx::query::QueryAs;
use sqlx::{FromRow, Postgres, query, query_as};

pub struct DbTaskReader;

#[derive(FromRow)]
struct TaskRow {
    id: i32,
    list_id: i32,
    title: String,
    description: Option<String>,
    due_date: Option<NaiveDate>,
    is_completed: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    list_title: String,
}

impl From<TaskRow> for TaskWithList {
    fn from(value: TaskRow) -> Self {
        TaskWithList {
            task: Task {
                id: value.id,
                list_id: value.list_id,
                title: value.title,
                description: value.description,
                due_date: value.due_date,
                is_completed: value.is_completed,
                created_at: value.created_at,
                updated_at: value.updated_at,
            },
            list_title: value.list_title,
        }
    }
}

const TASK_SELECT: &str = "
    SELECT t.id, t.list_id, t.title, t.description, t.due_date, t.is_completed,
           t.created_at, t.updated_at, tl.title AS list_title
    FROM task t
    JOIN task_list tl ON tl.id = t.list_id
    WHERE tl.user_id = $1
";

/// Appends the WHERE clauses for a task search to a base query which already
/// binds the user ID as $1. Search terms bind as $2 when present; completion
/// filtering needs no parameter.
fn push_filter_sql(sql: &mut String, filters: &TaskFilters) {
    if filters.search.as_ref().is_some_and(|term| !term.is_empty()) {
        sql.push_str(" AND t.title ILIKE $2");
    }
    match filters.completion {
        CompletionFilter::All => {}
        CompletionFilter::Completed => sql.push_str(" AND t.is_completed = TRUE"),
        CompletionFilter::Pending => sql.push_str(" AND t.is_completed = FALSE"),
    }
}

/// Binds the search term for a query built with [push_filter_sql], if one applies
fn bind_search<'q, Row>(
    query: QueryAs<'q, Postgres, Row, PgArguments>,
    filters: &TaskFilters,
) -> QueryAs<'q, Postgres, Row, PgArguments> {
    match filters.search {
        Some(ref term) if !term.is_empty() => {
            query.bind(format!("%{}%", super::escape_like_pattern(term)))
        }
        _ => query,
    }
}

impl domain::task::driven_ports::TaskReader for DbTaskReader {
    async fn page_for_user(
        &self,
        user_id: i32,
        filters: &TaskFilters,
        offset: i64,
        limit: i64,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Vec<TaskWithList>, Error> {
        let mut cxn = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let mut sql = String::from(TASK_SELECT);
        push_filter_sql(&mut sql, filters);
        sql.push_str(" ORDER BY t.id LIMIT ");
        sql.push_str(&limit.to_string());
        sql.push_str(" OFFSET ");
        sql.push_str(&offset.to_string());

        let tasks_query = bind_search(query_as::<_, TaskRow>(&sql).bind(user_id), filters);
        let tasks: Vec<TaskWithList> = tasks_query
            .fetch_all(cxn.borrow_connection())
            .await
            .context("trying to fetch a page of tasks for a user")?
            .into_iter()
            .map(TaskWithList::from)
            .collect();

        Ok(tasks)
    }

    async fn count_for_user(
        &self,
        user_id: i32,
        filters: &TaskFilters,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<i64, Error> {
        let mut cxn = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let mut sql = String::from(
            // language=postgresql
            "
            SELECT count(*) AS count
            FROM task t
            JOIN task_list tl ON tl.id = t.list_id
            WHERE tl.user_id = $1
            ",
        );
        push_filter_sql(&mut sql, filters);

        let count_query = bind_search(query_as::<_, super::Count>(&sql).bind(user_id), filters);
        let matching_tasks = count_query
            .fetch_one(cxn.borrow_connection())
            .await
            .context("trying to count matching tasks for a user")?;

        Ok(matching_tasks.count())
    }

    async fn all_for_user(
        &self,
        user_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Vec<TaskWithList>, Error> {
        let mut cxn = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let sql = format!("{TASK_SELECT} ORDER BY t.id");
        let tasks: Vec<TaskWithList> = query_as::<_, TaskRow>(&sql)
            .bind(user_id)
            .fetch_all(cxn.borrow_connection())
            .await
            .context("trying to fetch all tasks for a user")?
            .into_iter()
            .map(TaskWithList::from)
            .collect();

        Ok(tasks)
    }

    async fn recently_updated(
        &self,
        user_id: i32,
        limit: i64,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Vec<TaskWithList>, Error> {
        let mut cxn = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        // ID breaks ties so rows updated in the same instant keep a stable order
        let sql = format!("{TASK_SELECT} ORDER BY t.updated_at DESC, t.id DESC LIMIT $2");
        let tasks: Vec<TaskWithList> = query_as::<_, TaskRow>(&sql)
            .bind(user_id)
            .bind(limit)
            .fetch_all(cxn.borrow_connection())
            .await
            .context("trying to fetch recently updated tasks for a user")?
            .into_iter()
            .map(TaskWithList::from)
            .collect();

        Ok(tasks)
    }
}

pub struct DbDetectTask;

impl domain::task::driven_ports::DetectTask for DbDetectTask {
    async fn task_owned_by(
        &self,
        task_id: i32,
        user_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<bool, Error> {
        let mut cxn = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let matching_tasks = query_as::<_, super::Count>(
            // language=postgresql
            "
            SELECT count(*) AS count
            FROM task t
            JOIN task_list tl ON tl.id = t.list_id
            WHERE t.id = $1 AND tl.user_id = $2
            ",
        )
        .bind(task_id)
        .bind(user_id)
        .fetch_one(cxn.borrow_connection())
        .await
        .context("trying to verify ownership of a task")?;

        Ok(matching_tasks.count() > 0)
    }
}

pub struct DbTaskWriter;

impl domain::task::driven_ports::TaskWriter for DbTaskWriter {
    async fn create_task(
        &self,
        new_task: &NewTask,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<i32, Error> {
        let mut cxn = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let new_id = query_as::<_, super::NewId>(
            // language=postgresql
            "
            INSERT INTO task(list_id, title, description, due_date, is_completed)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING task.id
            ",
        )
        .bind(new_task.list_id)
        .bind(&new_task.title)
        .bind(&new_task.description)
        .bind(new_task.due_date)
        .bind(new_task.is_completed)
        .fetch_one(cxn.borrow_connection())
        .await
        .context("trying to insert a new task into the database")?;

        Ok(new_id.id)
    }

    async fn update_task(
        &self,
        task_id: i32,
        update: &UpdateTask,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<(), Error> {
        let mut cxn = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        query(
            // language=postgresql
            "
            UPDATE task
            SET list_id = $1, title = $2, description = $3, due_date = $4,
                is_completed = $5, updated_at = now()
            WHERE id = $6
            ",
        )
        .bind(update.list_id)
        .bind(&update.title)
        .bind(&update.description)
        .bind(update.due_date)
        .bind(update.is_completed)
        .bind(task_id)
        .execute(cxn.borrow_connection())
        .await
        .context("trying to update a task in the database")?;

        Ok(())
    }

    async fn delete_task(
        &self,
        task_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<(), Error> {
        let mut cxn = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        query("DELETE FROM task WHERE id = $1")
            .bind(task_id)
            .execute(cxn.borrow_connection())
            .await
            .context("trying to remove a task from the database")?;

        Ok(())
    }

    async fn delete_tasks_in_list(
        &self,
        list_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<u64, Error> {
        let mut cxn = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let delete_result = query("DELETE FROM task WHERE list_id = $1")
            .bind(list_id)
            .execute(cxn.borrow_connection())
            .await
            .context("trying to remove a list's tasks from the database")?;

        Ok(delete_result.rows_affected())
    }
}
