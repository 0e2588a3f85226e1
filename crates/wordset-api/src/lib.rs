pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

// Re-exports
pub use config::AppConfig;
pub use error::{ApiError, ErrorResponse};
pub use routes::create_router;
pub use state::ApiState;
