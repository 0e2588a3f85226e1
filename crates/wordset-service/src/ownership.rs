use wordset_core::StudySet;
use wordset_db::{Repos, SqliteConnection};

use crate::{Resource, Result, ServiceError};

/// Load a study set and make sure `user_id` owns it.
///
/// Guards before a write must run this on the same transaction as the write,
/// so the set cannot disappear between the check and the mutation.
pub async fn check_ownership(
    conn: &mut SqliteConnection,
    repos: Repos,
    user_id: &str,
    study_set_id: i64,
) -> Result<StudySet> {
    let study_set = repos
        .study_sets
        .get_by_id(conn, study_set_id)
        .await?
        .ok_or(ServiceError::NotFound(Resource::StudySet))?;

    if !study_set.is_owned_by(user_id) {
        return Err(ServiceError::Forbidden);
    }

    Ok(study_set)
}
