pub mod definitions;
pub mod error;
pub mod ownership;
pub mod runner;
pub mod study_sets;
pub mod tasks;

// Re-exports
pub use definitions::DefinitionService;
pub use error::{Resource, Result, ServiceError};
pub use ownership::check_ownership;
pub use runner::{FillConfig, FillRunner};
pub use study_sets::StudySetService;
pub use tasks::TaskService;
