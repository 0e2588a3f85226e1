use axum::{
    routing::{get, post, put},
    Router,
};
use std::time::Duration;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::{handlers, state::ApiState};

pub fn create_router(state: ApiState, request_timeout: Duration) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health::health_check))

        // Study set endpoints
        .route(
            "/study-sets",
            get(handlers::study_set::list_study_sets).post(handlers::study_set::create_study_set),
        )
        .route(
            "/study-sets/:study_set_id",
            get(handlers::study_set::get_study_set)
                .put(handlers::study_set::update_study_set)
                .delete(handlers::study_set::delete_study_set),
        )

        // Definition endpoints
        .route(
            "/study-sets/:study_set_id/definitions",
            get(handlers::definition::list_definitions)
                .post(handlers::definition::create_definitions),
        )
        .route(
            "/study-sets/:study_set_id/definitions/:definition_id",
            put(handlers::definition::update_definition)
                .delete(handlers::definition::delete_definition),
        )

        // Fill tasks
        .route("/study-sets/:study_set_id/fill", post(handlers::task::fill_study_set))
        .route("/tasks/:task_id", get(handlers::task::get_task))

        // Add state
        .with_state(state)

        // Bound request handling; fill workers run outside of it
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
