use wordset_core::{Definition, NewDefinition};
use wordset_db::{Database, Repos, SqliteConnection};

use crate::{check_ownership, Resource, Result, ServiceError};

/// Validate and insert a batch of definitions on the caller's handle.
///
/// Manual creation and generated fills both write through here, so a batch is
/// only ever as atomic as the transaction it runs on.
pub(crate) async fn insert_all(
    conn: &mut SqliteConnection,
    repos: Repos,
    study_set_id: i64,
    definitions: &[NewDefinition],
) -> Result<usize> {
    for definition in definitions {
        definition.validate()?;
        repos
            .definitions
            .insert(conn, study_set_id, definition)
            .await?;
    }
    Ok(definitions.len())
}

#[derive(Clone)]
pub struct DefinitionService {
    db: Database,
}

impl DefinitionService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// All definitions of an existing study set
    pub async fn list(&self, study_set_id: i64) -> Result<Vec<Definition>> {
        self.db
            .atomic(move |conn, repos| {
                Box::pin(async move {
                    if !repos.study_sets.exists(conn, study_set_id).await? {
                        return Err(ServiceError::NotFound(Resource::StudySet));
                    }
                    Ok(repos.definitions.get_all_for(conn, study_set_id).await?)
                })
            })
            .await
    }

    pub async fn create(
        &self,
        user_id: &str,
        study_set_id: i64,
        definitions: Vec<NewDefinition>,
    ) -> Result<usize> {
        let owner = user_id.to_string();

        let count = self
            .db
            .atomic(move |conn, repos| {
                Box::pin(async move {
                    check_ownership(conn, repos, &owner, study_set_id).await?;
                    insert_all(conn, repos, study_set_id, &definitions).await
                })
            })
            .await?;

        tracing::info!(study_set_id, count, "definitions created");
        Ok(count)
    }

    pub async fn update(
        &self,
        user_id: &str,
        study_set_id: i64,
        definition_id: i64,
        data: NewDefinition,
    ) -> Result<()> {
        data.validate()?;
        let owner = user_id.to_string();

        self.db
            .atomic(move |conn, repos| {
                Box::pin(async move {
                    check_ownership(conn, repos, &owner, study_set_id).await?;
                    if !repos
                        .definitions
                        .update(conn, study_set_id, definition_id, &data)
                        .await?
                    {
                        return Err(ServiceError::NotFound(Resource::Definition));
                    }
                    Ok(())
                })
            })
            .await
    }

    pub async fn delete(&self, user_id: &str, study_set_id: i64, definition_id: i64) -> Result<()> {
        let owner = user_id.to_string();

        self.db
            .atomic(move |conn, repos| {
                Box::pin(async move {
                    check_ownership(conn, repos, &owner, study_set_id).await?;
                    if !repos
                        .definitions
                        .delete(conn, study_set_id, definition_id)
                        .await?
                    {
                        return Err(ServiceError::NotFound(Resource::Definition));
                    }
                    Ok(())
                })
            })
            .await
    }
}
