pub mod definition;
pub mod error;
pub mod study_set;
pub mod task;

// Re-exports
pub use definition::{Definition, NewDefinition};
pub use error::{Error, Result};
pub use study_set::{NewStudySet, StudySet, UpdateStudySet};
pub use task::{FailureReason, Task, TaskState};
