// Library exports for testing and reusability

pub mod cache;
pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod exposure;
pub mod history;
pub mod llm;
pub mod models;
pub mod providers;
pub mod routes;
pub mod services;
pub mod story;
pub mod taste;
pub mod tts;

// Re-export commonly used types
pub use error::{AppError, Result};

use story::Narrator;
use taste::TasteStore;

// App state for sharing across the application
pub struct AppState {
    pub narrator: Narrator,
    pub tastes: TasteStore,
}
