pub mod health;
pub mod story;
pub mod taste;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/story-both", post(story::story_both))
        .route("/api/taste/feedback", post(taste::feedback))
        .route("/api/taste/set", post(taste::set))
        .with_state(state)
}
