use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub const MAX_PHRASE_LEN: usize = 256;
pub const MAX_MEANING_LEN: usize = 256;

/// A phrase with its meaning and example sentences, belonging to one study set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Definition {
    pub id: i64,
    pub study_set_id: i64,
    pub phrase: String,
    pub meaning: String,
    pub sentences: Vec<String>,
}

/// Payload for inserting or replacing a definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDefinition {
    pub phrase: String,
    pub meaning: String,
    #[serde(default)]
    pub sentences: Vec<String>,
}

impl NewDefinition {
    pub fn new(phrase: impl Into<String>, meaning: impl Into<String>) -> Self {
        Self {
            phrase: phrase.into(),
            meaning: meaning.into(),
            sentences: Vec::new(),
        }
    }

    pub fn with_sentences(mut self, sentences: Vec<String>) -> Self {
        self.sentences = sentences;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.phrase.trim().is_empty() {
            return Err(Error::Validation("phrase is required".to_string()));
        }
        if self.phrase.chars().count() > MAX_PHRASE_LEN {
            return Err(Error::Validation(format!(
                "phrase must be at most {MAX_PHRASE_LEN} characters"
            )));
        }
        if self.meaning.trim().is_empty() {
            return Err(Error::Validation("meaning is required".to_string()));
        }
        if self.meaning.chars().count() > MAX_MEANING_LEN {
            return Err(Error::Validation(format!(
                "meaning must be at most {MAX_MEANING_LEN} characters"
            )));
        }
        Ok(())
    }
}
