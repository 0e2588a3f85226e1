pub mod database;
pub mod error;
pub mod models;
pub mod repos;

// Re-exports
pub use database::{Database, DatabaseConfig};
pub use error::{Error, Result};
pub use repos::{DefinitionRepo, Repos, StudySetRepo, TaskRepo};
pub use sqlx::SqliteConnection;
