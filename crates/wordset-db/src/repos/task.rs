use chrono::Utc;
use sqlx::SqliteConnection;
use wordset_core::{FailureReason, Task, TaskState};

use crate::{models::TaskRow, Error, Result};

#[derive(Debug, Clone, Copy, Default)]
pub struct TaskRepo;

impl TaskRepo {
    /// Create a `pending` task for the study set and return its store-assigned ID
    pub async fn insert(&self, conn: &mut SqliteConnection, study_set_id: i64) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO tasks (study_set_id, state, created_at) VALUES (?, 'pending', ?)",
        )
        .bind(study_set_id)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Get task by ID
    pub async fn get(&self, conn: &mut SqliteConnection, task_id: i64) -> Result<Option<Task>> {
        let row = sqlx::query_as::<_, TaskRow>("SELECT * FROM tasks WHERE id = ?")
            .bind(task_id)
            .fetch_optional(&mut *conn)
            .await?;

        row.map(Task::try_from).transpose()
    }

    /// Get all tasks of a study set, newest first
    pub async fn get_all_for(
        &self,
        conn: &mut SqliteConnection,
        study_set_id: i64,
    ) -> Result<Vec<Task>> {
        let rows = sqlx::query_as::<_, TaskRow>(
            "SELECT * FROM tasks WHERE study_set_id = ? ORDER BY id DESC",
        )
        .bind(study_set_id)
        .fetch_all(&mut *conn)
        .await?;

        rows.into_iter().map(Task::try_from).collect()
    }

    /// Move a pending task to `done`
    pub async fn complete(&self, conn: &mut SqliteConnection, task_id: i64) -> Result<()> {
        self.finish(conn, task_id, TaskState::Done, None).await
    }

    /// Move a pending task to `failed`, recording why
    pub async fn fail(
        &self,
        conn: &mut SqliteConnection,
        task_id: i64,
        reason: FailureReason,
    ) -> Result<()> {
        self.finish(conn, task_id, TaskState::Failed, Some(reason))
            .await
    }

    /// Fail every pending task. Returns how many were updated.
    pub async fn fail_all_pending(
        &self,
        conn: &mut SqliteConnection,
        reason: FailureReason,
    ) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE tasks SET state = 'failed', failure = ?, finished_at = ? WHERE state = 'pending'",
        )
        .bind(reason.as_str())
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected())
    }

    // The `state = 'pending'` guard makes the terminal write a compare-and-set:
    // a task can leave `pending` only once.
    async fn finish(
        &self,
        conn: &mut SqliteConnection,
        task_id: i64,
        state: TaskState,
        failure: Option<FailureReason>,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET state = ?, failure = ?, finished_at = ?
            WHERE id = ? AND state = 'pending'
            "#,
        )
        .bind(state.as_str())
        .bind(failure.map(|f| f.as_str()))
        .bind(Utc::now())
        .bind(task_id)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(());
        }

        match self.get(conn, task_id).await? {
            Some(task) => {
                task.ensure_transition(state)?;
                Err(Error::Decode(format!(
                    "task {task_id} is pending but could not be finalized"
                )))
            }
            None => Err(Error::TaskNotFound(task_id)),
        }
    }
}
