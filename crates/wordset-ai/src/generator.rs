use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use wordset_core::{NewDefinition, StudySet};

/// Descriptive metadata of a study set, used as the generation prompt input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetGenerationRequest {
    pub name: String,
    pub description: String,
    pub phrase_language: String,
    pub definition_language: String,
}

impl From<&StudySet> for SetGenerationRequest {
    fn from(set: &StudySet) -> Self {
        Self {
            name: set.name.clone(),
            description: set.description.clone(),
            phrase_language: set.phrase_language.clone(),
            definition_language: set.definition_language.clone(),
        }
    }
}

impl SetGenerationRequest {
    /// Render the user message sent alongside the system prompt
    pub fn to_prompt(&self) -> String {
        format!(
            "word_set_title: {:?}\ndescription: {:?}\nphrase_language: {}\nmeaning_language: {}",
            self.name, self.description, self.phrase_language, self.definition_language
        )
    }
}

/// Produces a batch of definitions for a study set.
///
/// Any `Err` is a hard failure: callers do not interpret partial results.
/// Cancellation is expressed by dropping the returned future.
#[async_trait]
pub trait DefinitionGenerator: Send + Sync {
    async fn generate_definitions(
        &self,
        request: &SetGenerationRequest,
    ) -> crate::Result<Vec<NewDefinition>>;
}
