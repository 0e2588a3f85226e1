//! Stateless repositories.
//!
//! Repositories hold no connection of their own: every call takes the
//! execution handle explicitly, so the same repository works against a pooled
//! connection or an open transaction and can be shared freely between tasks.

mod definition;
mod study_set;
mod task;

pub use definition::DefinitionRepo;
pub use study_set::StudySetRepo;
pub use task::TaskRepo;

/// The family of repositories handed to an `atomic` closure.
#[derive(Debug, Clone, Copy, Default)]
pub struct Repos {
    pub study_sets: StudySetRepo,
    pub definitions: DefinitionRepo,
    pub tasks: TaskRepo,
}
