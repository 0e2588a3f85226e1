pub mod definition;
pub mod health;
pub mod study_set;
pub mod task;
