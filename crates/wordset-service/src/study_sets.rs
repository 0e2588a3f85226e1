use wordset_core::{NewStudySet, StudySet, UpdateStudySet};
use wordset_db::Database;

use crate::{check_ownership, Resource, Result, ServiceError};

#[derive(Clone)]
pub struct StudySetService {
    db: Database,
}

impl StudySetService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub async fn list(&self) -> Result<Vec<StudySet>> {
        let mut conn = self.db.acquire().await?;
        Ok(self.db.repos().study_sets.get_all(&mut conn).await?)
    }

    pub async fn list_owned_by(&self, user_id: &str) -> Result<Vec<StudySet>> {
        let mut conn = self.db.acquire().await?;
        Ok(self
            .db
            .repos()
            .study_sets
            .get_owned_by(&mut conn, user_id)
            .await?)
    }

    pub async fn get(&self, study_set_id: i64) -> Result<StudySet> {
        let mut conn = self.db.acquire().await?;
        self.db
            .repos()
            .study_sets
            .get_by_id(&mut conn, study_set_id)
            .await?
            .ok_or(ServiceError::NotFound(Resource::StudySet))
    }

    pub async fn create(&self, user_id: &str, data: NewStudySet) -> Result<StudySet> {
        data.validate()?;
        let owner = user_id.to_string();

        let study_set = self
            .db
            .atomic(move |conn, repos| {
                Box::pin(async move {
                    let id = repos.study_sets.insert(conn, &owner, &data).await?;
                    repos
                        .study_sets
                        .get_by_id(conn, id)
                        .await?
                        .ok_or(ServiceError::NotFound(Resource::StudySet))
                })
            })
            .await?;

        tracing::info!(study_set_id = study_set.id, owner = %study_set.owner_id, "study set created");
        Ok(study_set)
    }

    pub async fn update(
        &self,
        user_id: &str,
        study_set_id: i64,
        data: UpdateStudySet,
    ) -> Result<StudySet> {
        data.validate()?;
        let owner = user_id.to_string();

        self.db
            .atomic(move |conn, repos| {
                Box::pin(async move {
                    check_ownership(conn, repos, &owner, study_set_id).await?;
                    repos.study_sets.update(conn, study_set_id, &data).await?;
                    repos
                        .study_sets
                        .get_by_id(conn, study_set_id)
                        .await?
                        .ok_or(ServiceError::NotFound(Resource::StudySet))
                })
            })
            .await
    }

    pub async fn delete(&self, user_id: &str, study_set_id: i64) -> Result<()> {
        let owner = user_id.to_string();

        self.db
            .atomic(move |conn, repos| {
                Box::pin(async move {
                    check_ownership(conn, repos, &owner, study_set_id).await?;
                    repos.study_sets.delete(conn, study_set_id).await?;
                    Ok::<_, ServiceError>(())
                })
            })
            .await?;

        tracing::info!(study_set_id, "study set deleted");
        Ok(())
    }
}
