pub mod error;
pub mod generator;
pub mod openai;

// Re-exports
pub use error::{Error, Result};
pub use generator::{DefinitionGenerator, SetGenerationRequest};
pub use openai::{OpenAiConfig, OpenAiGenerator};
