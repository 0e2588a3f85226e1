use sqlx::SqliteConnection;
use wordset_core::{Definition, NewDefinition};

use crate::{models::DefinitionRow, Result};

#[derive(Debug, Clone, Copy, Default)]
pub struct DefinitionRepo;

impl DefinitionRepo {
    /// Get all definitions of a study set
    pub async fn get_all_for(
        &self,
        conn: &mut SqliteConnection,
        study_set_id: i64,
    ) -> Result<Vec<Definition>> {
        let rows = sqlx::query_as::<_, DefinitionRow>(
            "SELECT * FROM definitions WHERE study_set_id = ? ORDER BY id",
        )
        .bind(study_set_id)
        .fetch_all(&mut *conn)
        .await?;

        rows.into_iter().map(Definition::try_from).collect()
    }

    pub async fn insert(
        &self,
        conn: &mut SqliteConnection,
        study_set_id: i64,
        data: &NewDefinition,
    ) -> Result<()> {
        let sentences = serde_json::to_string(&data.sentences)?;

        sqlx::query(
            r#"
            INSERT INTO definitions (study_set_id, phrase, meaning, sentences)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(study_set_id)
        .bind(&data.phrase)
        .bind(&data.meaning)
        .bind(sentences)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Replace a definition of the given study set. Returns false when no row matched.
    pub async fn update(
        &self,
        conn: &mut SqliteConnection,
        study_set_id: i64,
        definition_id: i64,
        data: &NewDefinition,
    ) -> Result<bool> {
        let sentences = serde_json::to_string(&data.sentences)?;

        let result = sqlx::query(
            r#"
            UPDATE definitions
            SET phrase = ?, meaning = ?, sentences = ?
            WHERE id = ? AND study_set_id = ?
            "#,
        )
        .bind(&data.phrase)
        .bind(&data.meaning)
        .bind(sentences)
        .bind(definition_id)
        .bind(study_set_id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete a definition of the given study set. Returns false when no row matched.
    pub async fn delete(
        &self,
        conn: &mut SqliteConnection,
        study_set_id: i64,
        definition_id: i64,
    ) -> Result<bool> {
        let result = sqlx::query("DELETE FROM definitions WHERE id = ? AND study_set_id = ?")
            .bind(definition_id)
            .bind(study_set_id)
            .execute(&mut *conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
