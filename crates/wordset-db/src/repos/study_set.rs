use chrono::Utc;
use sqlx::SqliteConnection;
use wordset_core::{NewStudySet, StudySet, UpdateStudySet};

use crate::{models::StudySetRow, Result};

#[derive(Debug, Clone, Copy, Default)]
pub struct StudySetRepo;

impl StudySetRepo {
    /// Get all study sets, newest first
    pub async fn get_all(&self, conn: &mut SqliteConnection) -> Result<Vec<StudySet>> {
        let rows = sqlx::query_as::<_, StudySetRow>(
            "SELECT * FROM study_sets ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows.into_iter().map(StudySet::from).collect())
    }

    /// Get study sets created by the given user
    pub async fn get_owned_by(
        &self,
        conn: &mut SqliteConnection,
        owner_id: &str,
    ) -> Result<Vec<StudySet>> {
        let rows = sqlx::query_as::<_, StudySetRow>(
            "SELECT * FROM study_sets WHERE owner_id = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(owner_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows.into_iter().map(StudySet::from).collect())
    }

    /// Get study set by ID
    pub async fn get_by_id(
        &self,
        conn: &mut SqliteConnection,
        study_set_id: i64,
    ) -> Result<Option<StudySet>> {
        let row = sqlx::query_as::<_, StudySetRow>("SELECT * FROM study_sets WHERE id = ?")
            .bind(study_set_id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(row.map(StudySet::from))
    }

    pub async fn exists(&self, conn: &mut SqliteConnection, study_set_id: i64) -> Result<bool> {
        let exists: i64 =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM study_sets WHERE id = ?)")
                .bind(study_set_id)
                .fetch_one(&mut *conn)
                .await?;

        Ok(exists == 1)
    }

    /// Insert a study set and return its ID
    pub async fn insert(
        &self,
        conn: &mut SqliteConnection,
        owner_id: &str,
        data: &NewStudySet,
    ) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO study_sets (
                owner_id, name, description, phrase_language, definition_language, created_at
            ) VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(owner_id)
        .bind(&data.name)
        .bind(&data.description)
        .bind(&data.phrase_language)
        .bind(&data.definition_language)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Replace the descriptive fields. Returns false when no row matched.
    pub async fn update(
        &self,
        conn: &mut SqliteConnection,
        study_set_id: i64,
        data: &UpdateStudySet,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE study_sets
            SET name = ?, description = ?, phrase_language = ?, definition_language = ?
            WHERE id = ?
            "#,
        )
        .bind(&data.name)
        .bind(&data.description)
        .bind(&data.phrase_language)
        .bind(&data.definition_language)
        .bind(study_set_id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a study set. Definitions and tasks go with it (ON DELETE CASCADE).
    pub async fn delete(&self, conn: &mut SqliteConnection, study_set_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM study_sets WHERE id = ?")
            .bind(study_set_id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
