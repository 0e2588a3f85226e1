use wordset_core::Task;
use wordset_db::Database;

use crate::{Resource, Result, ServiceError};

/// Read side of fill tasks.
#[derive(Clone)]
pub struct TaskService {
    db: Database,
}

impl TaskService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Current state of a task. Any caller may read any task.
    pub async fn get(&self, task_id: i64) -> Result<Task> {
        let mut conn = self.db.acquire().await?;
        self.db
            .repos()
            .tasks
            .get(&mut conn, task_id)
            .await?
            .ok_or(ServiceError::NotFound(Resource::Task))
    }

    pub async fn list_for(&self, study_set_id: i64) -> Result<Vec<Task>> {
        let mut conn = self.db.acquire().await?;
        Ok(self
            .db
            .repos()
            .tasks
            .get_all_for(&mut conn, study_set_id)
            .await?)
    }
}
