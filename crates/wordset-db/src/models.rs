use chrono::{DateTime, Utc};
use sqlx::FromRow;
use wordset_core::{Definition, FailureReason, StudySet, Task, TaskState};

use crate::{Error, Result};

#[derive(Debug, Clone, FromRow)]
pub struct StudySetRow {
    pub id: i64,
    pub owner_id: String,
    pub name: String,
    pub description: String,
    pub phrase_language: String,
    pub definition_language: String,
    pub created_at: DateTime<Utc>,
}

impl From<StudySetRow> for StudySet {
    fn from(row: StudySetRow) -> Self {
        StudySet {
            id: row.id,
            owner_id: row.owner_id,
            name: row.name,
            description: row.description,
            phrase_language: row.phrase_language,
            definition_language: row.definition_language,
            created_at: row.created_at,
        }
    }
}

/// Sentences are stored as a JSON array in a TEXT column.
#[derive(Debug, Clone, FromRow)]
pub struct DefinitionRow {
    pub id: i64,
    pub study_set_id: i64,
    pub phrase: String,
    pub meaning: String,
    pub sentences: String,
}

impl TryFrom<DefinitionRow> for Definition {
    type Error = Error;

    fn try_from(row: DefinitionRow) -> Result<Self> {
        let sentences = serde_json::from_str(&row.sentences)?;
        Ok(Definition {
            id: row.id,
            study_set_id: row.study_set_id,
            phrase: row.phrase,
            meaning: row.meaning,
            sentences,
        })
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct TaskRow {
    pub id: i64,
    pub study_set_id: i64,
    pub state: String,
    pub failure: Option<String>,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl TryFrom<TaskRow> for Task {
    type Error = Error;

    fn try_from(row: TaskRow) -> Result<Self> {
        let state: TaskState = row.state.parse()?;
        let failure = row
            .failure
            .as_deref()
            .map(str::parse::<FailureReason>)
            .transpose()?;

        if state == TaskState::Failed && failure.is_none() {
            return Err(Error::Decode(format!("task {} failed without a reason", row.id)));
        }

        Ok(Task {
            id: row.id,
            study_set_id: row.study_set_id,
            state,
            failure,
            created_at: row.created_at,
            finished_at: row.finished_at,
        })
    }
}
