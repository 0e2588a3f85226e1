use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub const MAX_NAME_LEN: usize = 128;
pub const MAX_DESCRIPTION_LEN: usize = 512;

/// A named, owned collection of definitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudySet {
    pub id: i64,
    pub owner_id: String,
    pub name: String,
    pub description: String,
    pub phrase_language: String,
    pub definition_language: String,
    pub created_at: DateTime<Utc>,
}

impl StudySet {
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.owner_id == user_id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStudySet {
    pub name: String,
    pub description: String,
    pub phrase_language: String,
    pub definition_language: String,
}

impl NewStudySet {
    pub fn validate(&self) -> Result<()> {
        validate_fields(
            &self.name,
            &self.description,
            &self.phrase_language,
            &self.definition_language,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStudySet {
    pub name: String,
    pub description: String,
    pub phrase_language: String,
    pub definition_language: String,
}

impl UpdateStudySet {
    pub fn validate(&self) -> Result<()> {
        validate_fields(
            &self.name,
            &self.description,
            &self.phrase_language,
            &self.definition_language,
        )
    }
}

fn validate_fields(
    name: &str,
    description: &str,
    phrase_language: &str,
    definition_language: &str,
) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::Validation("name is required".to_string()));
    }
    if !name.is_ascii() || name.len() > MAX_NAME_LEN {
        return Err(Error::Validation(format!(
            "name must be ASCII and at most {MAX_NAME_LEN} characters"
        )));
    }
    if description.trim().is_empty() {
        return Err(Error::Validation("description is required".to_string()));
    }
    if !description.is_ascii() || description.len() > MAX_DESCRIPTION_LEN {
        return Err(Error::Validation(format!(
            "description must be ASCII and at most {MAX_DESCRIPTION_LEN} characters"
        )));
    }
    if phrase_language.trim().is_empty() || definition_language.trim().is_empty() {
        return Err(Error::Validation(
            "phrase and definition languages are required".to_string(),
        ));
    }
    Ok(())
}
